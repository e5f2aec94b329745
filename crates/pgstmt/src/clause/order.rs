//! ORDER BY clauses.
//!
//! Direction and null-ordering tokens are stored as given and checked when the statement
//! compiles, so a bad token surfaces as a validation error before anything is sent.

use crate::error::{StmtError, StmtResult};
use crate::fragment::Fragment;
use crate::ident::Ident;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl AsRef<str> for Direction {
    fn as_ref(&self) -> &str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Nulls {
    First,
    Last,
}

impl AsRef<str> for Nulls {
    fn as_ref(&self) -> &str {
        match self {
            Nulls::First => "FIRST",
            Nulls::Last => "LAST",
        }
    }
}

/// One ORDER BY entry.
#[derive(Clone, Debug)]
pub struct OrderSpec {
    by: String,
    direction: String,
    nulls: Option<String>,
}

impl OrderSpec {
    /// Ascending order on `by`.
    pub fn new(by: impl Into<String>) -> Self {
        Self {
            by: by.into(),
            direction: Direction::Asc.as_ref().to_string(),
            nulls: None,
        }
    }

    pub fn asc(by: impl Into<String>) -> Self {
        Self::new(by)
    }

    pub fn desc(by: impl Into<String>) -> Self {
        Self::new(by).direction(Direction::Desc)
    }

    /// Set the direction token (`ASC` / `DESC`, case-insensitive).
    pub fn direction(mut self, direction: impl AsRef<str>) -> Self {
        self.direction = direction.as_ref().to_string();
        self
    }

    /// Set the null-ordering token (`FIRST` / `LAST`, case-insensitive).
    pub fn nulls(mut self, nulls: impl AsRef<str>) -> Self {
        self.nulls = Some(nulls.as_ref().to_string());
        self
    }

    pub fn nulls_first(self) -> Self {
        self.nulls(Nulls::First)
    }

    pub fn nulls_last(self) -> Self {
        self.nulls(Nulls::Last)
    }

    pub(crate) fn to_fragment(&self) -> StmtResult<Fragment> {
        let column = Ident::parse(&self.by)?;
        let direction = match self.direction.to_ascii_uppercase().as_str() {
            "ASC" => " ASC",
            "DESC" => " DESC",
            _ => {
                return Err(StmtError::validation(format!(
                    "invalid ORDER BY direction '{}' for '{}': expected ASC or DESC",
                    self.direction, self.by
                )));
            }
        };
        let nulls = match self.nulls.as_deref().map(str::to_ascii_uppercase).as_deref() {
            None => "",
            Some("FIRST") => " NULLS FIRST",
            Some("LAST") => " NULLS LAST",
            Some(_) => {
                return Err(StmtError::validation(format!(
                    "invalid ORDER BY nulls '{}' for '{}': expected FIRST or LAST",
                    self.nulls.as_deref().unwrap_or_default(),
                    self.by
                )));
            }
        };
        Ok(Fragment::concat(vec![
            Fragment::ident(column),
            Fragment::literal(direction),
            Fragment::literal(nulls),
        ]))
    }
}

/// `ORDER BY a ASC, b DESC NULLS LAST`, or nothing for an empty list.
pub(crate) fn compile_order(specs: &[OrderSpec]) -> StmtResult<Fragment> {
    if specs.is_empty() {
        return Ok(Fragment::empty());
    }
    let items = specs
        .iter()
        .map(OrderSpec::to_fragment)
        .collect::<StmtResult<Vec<_>>>()?;
    Ok(Fragment::concat(vec![
        Fragment::literal("ORDER BY "),
        Fragment::seq(items, ", "),
    ]))
}
