//! SQL identifiers.
//!
//! Every table, column and constraint name that reaches the SQL text goes through
//! [`Ident`]. Unquoted segments must match `[A-Za-z_][A-Za-z0-9_$]*`; quoted segments
//! accept anything but NUL and are rendered with `"` doubled. Segments are joined with `.`.
//!
//! ```ignore
//! use pgstmt::Ident;
//!
//! let t = Ident::parse("public.film")?;
//! assert_eq!(t.to_sql(), "public.film");
//! let c = Ident::parse(r#""Film"."Title""#)?;
//! assert_eq!(c.last().to_sql(), r#""Title""#);
//! # Ok::<(), pgstmt::StmtError>(())
//! ```

use crate::error::{StmtError, StmtResult};
use std::iter::Peekable;
use std::str::Chars;

/// One dot-separated segment of an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Plain(String),
    Quoted(String),
}

impl Segment {
    fn write_sql(&self, out: &mut String) {
        match self {
            Segment::Plain(name) => out.push_str(name),
            Segment::Quoted(name) => {
                out.push('"');
                out.push_str(&name.replace('"', "\"\""));
                out.push('"');
            }
        }
    }
}

/// A validated, possibly qualified, SQL identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    segments: Vec<Segment>,
}

impl Ident {
    /// Parse `name`, `schema.table`, `table.column` or quoted forms such as `"Film"."Title"`.
    pub fn parse(input: &str) -> StmtResult<Self> {
        if input.is_empty() {
            return Err(StmtError::validation("identifier cannot be empty"));
        }
        if input.contains('\0') {
            return Err(StmtError::validation(
                "identifier cannot contain a NUL character",
            ));
        }

        let mut chars = input.chars().peekable();
        let mut segments = Vec::new();
        loop {
            let segment = if chars.peek() == Some(&'"') {
                chars.next();
                parse_quoted(&mut chars)?
            } else {
                parse_plain(&mut chars, input)?
            };
            segments.push(segment);

            match chars.next() {
                None => break,
                Some('.') if chars.peek().is_none() => {
                    return Err(StmtError::validation(format!(
                        "identifier '{input}' ends with '.'"
                    )));
                }
                Some('.') => {}
                Some(c) => {
                    return Err(StmtError::validation(format!(
                        "unexpected '{c}' after quoted segment in '{input}'"
                    )));
                }
            }
        }

        Ok(Self { segments })
    }

    /// A single quoted segment, kept verbatim (case and punctuation preserved).
    pub fn quoted(name: &str) -> StmtResult<Self> {
        if name.is_empty() || name.contains('\0') {
            return Err(StmtError::validation(format!(
                "invalid quoted identifier {name:?}"
            )));
        }
        Ok(Self {
            segments: vec![Segment::Quoted(name.to_string())],
        })
    }

    /// Whether the identifier has more than one segment (`table.column`).
    pub fn is_qualified(&self) -> bool {
        self.segments.len() > 1
    }

    /// The last segment on its own, e.g. `column` for `film.column`.
    pub fn last(&self) -> Ident {
        Ident {
            segments: self.segments.last().cloned().into_iter().collect(),
        }
    }

    /// Unescaped name of the last segment.
    pub fn name(&self) -> &str {
        match self.segments.last() {
            Some(Segment::Plain(s)) | Some(Segment::Quoted(s)) => s,
            None => "",
        }
    }

    /// Render as SQL text.
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        self.write_sql(&mut out);
        out
    }

    pub(crate) fn write_sql(&self, out: &mut String) {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            segment.write_sql(out);
        }
    }
}

fn parse_quoted(chars: &mut Peekable<Chars<'_>>) -> StmtResult<Segment> {
    let mut name = String::new();
    loop {
        match chars.next() {
            Some('"') if chars.peek() == Some(&'"') => {
                chars.next();
                name.push('"');
            }
            Some('"') => break,
            Some(c) => name.push(c),
            None => return Err(StmtError::validation("unterminated quoted identifier")),
        }
    }
    if name.is_empty() {
        return Err(StmtError::validation("quoted identifier cannot be empty"));
    }
    Ok(Segment::Quoted(name))
}

fn parse_plain(chars: &mut Peekable<Chars<'_>>, input: &str) -> StmtResult<Segment> {
    let mut name = String::new();
    while let Some(&c) = chars.peek() {
        if c == '.' {
            break;
        }
        let ok = if name.is_empty() {
            c == '_' || c.is_ascii_alphabetic()
        } else {
            c == '_' || c == '$' || c.is_ascii_alphanumeric()
        };
        if !ok {
            return Err(StmtError::validation(format!(
                "invalid character '{c}' in identifier '{input}'"
            )));
        }
        name.push(c);
        chars.next();
    }
    if name.is_empty() {
        return Err(StmtError::validation(format!(
            "empty segment in identifier '{input}'"
        )));
    }
    Ok(Segment::Plain(name))
}

/// Conversion into an [`Ident`], used by builder entry points.
pub trait IntoIdent {
    fn into_ident(self) -> StmtResult<Ident>;
}

impl IntoIdent for Ident {
    fn into_ident(self) -> StmtResult<Ident> {
        Ok(self)
    }
}

impl IntoIdent for &Ident {
    fn into_ident(self) -> StmtResult<Ident> {
        Ok(self.clone())
    }
}

impl IntoIdent for &str {
    fn into_ident(self) -> StmtResult<Ident> {
        Ident::parse(self)
    }
}

impl IntoIdent for String {
    fn into_ident(self) -> StmtResult<Ident> {
        Ident::parse(&self)
    }
}

impl IntoIdent for &String {
    fn into_ident(self) -> StmtResult<Ident> {
        Ident::parse(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_and_dotted() {
        assert_eq!(Ident::parse("film").unwrap().to_sql(), "film");
        assert_eq!(
            Ident::parse("public.film.title").unwrap().to_sql(),
            "public.film.title"
        );
        assert_eq!(Ident::parse("a_$1").unwrap().to_sql(), "a_$1");
    }

    #[test]
    fn quoted_segments_escape_quotes() {
        let id = Ident::parse(r#"public."Odd""Name""#).unwrap();
        assert_eq!(id.to_sql(), r#"public."Odd""Name""#);
        assert_eq!(id.name(), r#"Odd"Name"#);
        assert_eq!(Ident::quoted("Has Space").unwrap().to_sql(), r#""Has Space""#);
    }

    #[test]
    fn last_segment() {
        let id = Ident::parse("film.title").unwrap();
        assert!(id.is_qualified());
        assert_eq!(id.last().to_sql(), "title");
        assert!(!id.last().is_qualified());
    }

    #[test]
    fn rejects_injection_attempts() {
        for bad in [
            "",
            "1abc",
            "film; DROP TABLE film",
            "film.",
            ".film",
            "a..b",
            "\"unterminated",
            "\"\"",
            "\"x\"y",
            "a b",
        ] {
            let err = Ident::parse(bad).unwrap_err();
            assert!(err.is_validation(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn into_ident_impls() {
        assert_eq!("film".into_ident().unwrap(), Ident::parse("film").unwrap());
        assert_eq!(
            String::from("film.title").into_ident().unwrap().name(),
            "title"
        );
    }
}
