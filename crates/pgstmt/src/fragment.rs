//! SQL fragments and their linearization into text plus parameters.
//!
//! Every statement compiles into a [`Fragment`] tree. [`Fragment::serialize`] walks it
//! depth-first, left to right, and numbers each [`Fragment::Param`] as `$1, $2, ...` in
//! visitation order. Because numbering happens in one pass over the finished tree, no
//! clause ever needs to know how many parameters precede it.

use crate::ident::Ident;
use crate::param::{Param, ParamList};

/// A compiled statement: SQL text with `$n` placeholders and the values that bind them.
#[derive(Clone, Debug, Default)]
pub struct CompiledSql {
    pub sql: String,
    pub params: ParamList,
}

/// One node of a statement under construction.
#[derive(Clone, Debug)]
pub enum Fragment {
    /// Builder-owned keyword text.
    Literal(&'static str),
    /// Caller-supplied SQL, emitted verbatim.
    Raw(String),
    /// Validated identifier.
    Ident(Ident),
    /// Bound value, rendered as the next `$n`.
    Param(Param),
    /// Children joined by `sep`. Children that render no text are skipped.
    Seq {
        items: Vec<Fragment>,
        sep: Option<&'static str>,
    },
}

impl Fragment {
    pub fn literal(text: &'static str) -> Self {
        Fragment::Literal(text)
    }

    pub fn raw(text: impl Into<String>) -> Self {
        Fragment::Raw(text.into())
    }

    pub fn ident(ident: Ident) -> Self {
        Fragment::Ident(ident)
    }

    pub fn param(param: Param) -> Self {
        Fragment::Param(param)
    }

    /// Items interspersed with `sep`; never a leading or trailing separator.
    pub fn seq(items: Vec<Fragment>, sep: &'static str) -> Self {
        Fragment::Seq {
            items,
            sep: Some(sep),
        }
    }

    /// Items written back to back.
    pub fn concat(items: Vec<Fragment>) -> Self {
        Fragment::Seq { items, sep: None }
    }

    /// The fragment that renders nothing.
    pub fn empty() -> Self {
        Fragment::Literal("")
    }

    /// `( inner )`
    pub fn parens(inner: Fragment) -> Self {
        Fragment::concat(vec![
            Fragment::Literal("("),
            inner,
            Fragment::Literal(")"),
        ])
    }

    /// True when serializing would produce no text.
    pub fn is_empty(&self) -> bool {
        match self {
            Fragment::Literal(s) => s.is_empty(),
            Fragment::Raw(s) => s.is_empty(),
            Fragment::Ident(_) | Fragment::Param(_) => false,
            Fragment::Seq { items, .. } => items.iter().all(Fragment::is_empty),
        }
    }

    /// Linearize into SQL text and ordered parameters.
    pub fn serialize(&self) -> CompiledSql {
        let mut out = CompiledSql::default();
        self.write_into(&mut out);
        out
    }

    fn write_into(&self, out: &mut CompiledSql) {
        match self {
            Fragment::Literal(s) => out.sql.push_str(s),
            Fragment::Raw(s) => out.sql.push_str(s),
            Fragment::Ident(ident) => ident.write_sql(&mut out.sql),
            Fragment::Param(param) => {
                let idx = out.params.push(param.clone());
                out.sql.push('$');
                out.sql.push_str(&idx.to_string());
            }
            Fragment::Seq { items, sep } => {
                let mut first = true;
                for item in items.iter().filter(|item| !item.is_empty()) {
                    if !first {
                        if let Some(sep) = sep {
                            out.sql.push_str(sep);
                        }
                    }
                    first = false;
                    item.write_into(out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(name: &str) -> Fragment {
        Fragment::ident(Ident::parse(name).unwrap())
    }

    #[test]
    fn params_numbered_in_visitation_order() {
        let f = Fragment::seq(
            vec![
                Fragment::concat(vec![
                    col("a"),
                    Fragment::literal(" = "),
                    Fragment::param(Param::new(1i32)),
                ]),
                Fragment::parens(Fragment::seq(
                    vec![
                        Fragment::concat(vec![
                            col("b"),
                            Fragment::literal(" = "),
                            Fragment::param(Param::new(2i32)),
                        ]),
                        Fragment::concat(vec![
                            col("c"),
                            Fragment::literal(" = "),
                            Fragment::param(Param::new(3i32)),
                        ]),
                    ],
                    " OR ",
                )),
            ],
            " AND ",
        );
        let compiled = f.serialize();
        assert_eq!(compiled.sql, "a = $1 AND (b = $2 OR c = $3)");
        assert_eq!(compiled.params.debug_values(), vec!["1", "2", "3"]);
    }

    #[test]
    fn multi_digit_placeholders() {
        let f = Fragment::seq((0..12i32).map(|i| Fragment::param(Param::new(i))).collect(), ", ");
        let compiled = f.serialize();
        assert_eq!(
            compiled.sql,
            "$1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12"
        );
        assert_eq!(compiled.params.len(), 12);
    }

    #[test]
    fn separator_only_between_non_empty_items() {
        let f = Fragment::seq(
            vec![
                Fragment::empty(),
                Fragment::literal("SELECT *"),
                Fragment::concat(vec![]),
                Fragment::raw("FROM film"),
                Fragment::raw(""),
            ],
            " ",
        );
        assert_eq!(f.serialize().sql, "SELECT * FROM film");
    }

    #[test]
    fn empty_detection() {
        assert!(Fragment::empty().is_empty());
        assert!(Fragment::seq(vec![Fragment::empty(), Fragment::raw("")], ", ").is_empty());
        assert!(!Fragment::param(Param::new(0i32)).is_empty());
        assert!(!Fragment::parens(Fragment::empty()).is_empty());
    }

    #[test]
    fn raw_is_verbatim_and_idents_are_escaped() {
        let f = Fragment::seq(
            vec![
                Fragment::raw("now()"),
                Fragment::ident(Ident::quoted("we\"ird").unwrap()),
            ],
            ", ",
        );
        assert_eq!(f.serialize().sql, r#"now(), "we""ird""#);
    }

    #[test]
    fn serialize_is_repeatable() {
        let f = Fragment::concat(vec![col("x"), Fragment::literal(" = "), Fragment::param(Param::new(5i64))]);
        let a = f.serialize();
        let b = f.serialize();
        assert_eq!(a.sql, b.sql);
        assert_eq!(a.params.len(), b.params.len());
    }
}
