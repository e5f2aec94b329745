//! Column selection lists (`SELECT ...`, `RETURNING ...`).

use crate::error::StmtResult;
use crate::fragment::Fragment;
use crate::ident::Ident;

/// A column reference, classified once when it enters a builder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ColumnSpec {
    /// `title`
    Bare(Ident),
    /// `film.title`
    Qualified(Ident),
    /// `film.*`
    TableWildcard(Ident),
    /// `*`
    AllWildcard,
}

impl ColumnSpec {
    pub fn parse(input: &str) -> StmtResult<Self> {
        let input = input.trim();
        if input == "*" {
            return Ok(ColumnSpec::AllWildcard);
        }
        if let Some(table) = input.strip_suffix(".*") {
            return Ok(ColumnSpec::TableWildcard(Ident::parse(table)?));
        }
        let ident = Ident::parse(input)?;
        Ok(if ident.is_qualified() {
            ColumnSpec::Qualified(ident)
        } else {
            ColumnSpec::Bare(ident)
        })
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, ColumnSpec::TableWildcard(_) | ColumnSpec::AllWildcard)
    }

    pub(crate) fn to_fragment(&self) -> Fragment {
        match self {
            ColumnSpec::Bare(ident) | ColumnSpec::Qualified(ident) => Fragment::ident(ident.clone()),
            ColumnSpec::TableWildcard(table) => {
                Fragment::concat(vec![Fragment::ident(table.clone()), Fragment::literal(".*")])
            }
            ColumnSpec::AllWildcard => Fragment::literal("*"),
        }
    }
}

/// Wildcards first, then explicit columns, each group in input order. Duplicates are kept.
/// An empty list selects `*`.
pub fn construct_column_selection(specs: &[ColumnSpec]) -> Fragment {
    if specs.is_empty() {
        return Fragment::literal("*");
    }
    let (wildcards, explicit): (Vec<&ColumnSpec>, Vec<&ColumnSpec>) =
        specs.iter().partition(|spec| spec.is_wildcard());
    Fragment::seq(
        wildcards
            .into_iter()
            .chain(explicit)
            .map(ColumnSpec::to_fragment)
            .collect(),
        ", ",
    )
}

/// `RETURNING <columns>`, or nothing for an empty list.
pub(crate) fn returning_clause(specs: &[ColumnSpec]) -> Fragment {
    if specs.is_empty() {
        return Fragment::empty();
    }
    Fragment::concat(vec![
        Fragment::literal("RETURNING "),
        construct_column_selection(specs),
    ])
}

/// Parse each column into `out`, returning the first failure message.
pub(crate) fn parse_into(columns: &[&str], out: &mut Vec<ColumnSpec>) -> Option<String> {
    for column in columns {
        match ColumnSpec::parse(column) {
            Ok(spec) => out.push(spec),
            Err(err) => return Some(err.to_string()),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specs(cols: &[&str]) -> Vec<ColumnSpec> {
        cols.iter().map(|c| ColumnSpec::parse(c).unwrap()).collect()
    }

    fn sql(cols: &[&str]) -> String {
        construct_column_selection(&specs(cols)).serialize().sql
    }

    #[test]
    fn classifies_specs() {
        assert_eq!(ColumnSpec::parse("*").unwrap(), ColumnSpec::AllWildcard);
        assert!(matches!(ColumnSpec::parse("film.*").unwrap(), ColumnSpec::TableWildcard(_)));
        assert!(matches!(ColumnSpec::parse("film.title").unwrap(), ColumnSpec::Qualified(_)));
        assert!(matches!(ColumnSpec::parse("title").unwrap(), ColumnSpec::Bare(_)));
        assert!(ColumnSpec::parse("count(*)").is_err());
        assert!(ColumnSpec::parse("").is_err());
    }

    #[test]
    fn empty_selection_is_star() {
        assert_eq!(sql(&[]), "*");
    }

    #[test]
    fn star_and_column_kept_in_order() {
        assert_eq!(sql(&["*", "film_id"]), "*, film_id");
    }

    #[test]
    fn wildcards_move_to_front() {
        assert_eq!(
            sql(&["title", "film.*", "language.name", "*"]),
            "film.*, *, title, language.name"
        );
    }

    #[test]
    fn duplicates_are_not_removed() {
        assert_eq!(sql(&["title", "title"]), "title, title");
    }

    #[test]
    fn returning_clause_empty_and_filled() {
        assert!(returning_clause(&[]).is_empty());
        assert_eq!(
            returning_clause(&specs(&["film_id", "title"])).serialize().sql,
            "RETURNING film_id, title"
        );
    }
}
