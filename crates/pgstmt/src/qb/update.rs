//! UPDATE builder.

use crate::clause::columns::{self, ColumnSpec, returning_clause};
use crate::error::{StmtError, StmtResult};
use crate::executor;
use crate::fragment::Fragment;
use crate::ident::Ident;
use crate::param::Param;
use crate::predicate::{Filter, Predicate};
use crate::qb::fail_on;
use crate::qb::traits::{Statement, StatementKind};
use crate::values::ValueMap;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

#[derive(Clone, Debug)]
enum SetValue {
    Param(Param),
    Raw(String),
}

/// UPDATE query builder.
///
/// Compiling fails unless at least one column is set and a filter is present;
/// use [`Filter::match_all`] to update every row on purpose.
#[derive(Clone, Debug)]
pub struct UpdateQb {
    table: String,
    sets: Vec<(String, SetValue)>,
    predicate: Predicate,
    returning: Vec<ColumnSpec>,
    build_error: Option<String>,
}

impl UpdateQb {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            sets: Vec::new(),
            predicate: Predicate::new(),
            returning: Vec::new(),
            build_error: None,
        }
    }

    fn put(&mut self, column: &str, value: SetValue) {
        match self.sets.iter_mut().find(|(c, _)| c == column) {
            Some(slot) => slot.1 = value,
            None => self.sets.push((column.to_string(), value)),
        }
    }

    /// `SET column = $n`. Setting a column again replaces the earlier value.
    pub fn set_column<T: ToSql + Send + Sync + 'static>(mut self, column: &str, value: T) -> Self {
        self.put(column, SetValue::Param(Param::new(value)));
        self
    }

    /// Set every column in `values`, merging with earlier calls.
    pub fn set_many(mut self, values: ValueMap) -> Self {
        for (column, value) in values.iter() {
            self.put(column, SetValue::Param(value.clone()));
        }
        self
    }

    /// `SET column = <expr>` with a raw SQL expression, e.g. `now()`.
    pub fn set_raw(mut self, column: &str, expr: impl Into<String>) -> Self {
        self.put(column, SetValue::Raw(expr.into()));
        self
    }

    /// Add RETURNING columns; repeated calls append.
    pub fn returning(mut self, columns: &[&str]) -> Self {
        if let Some(err) = columns::parse_into(columns, &mut self.returning) {
            if self.build_error.is_none() {
                self.build_error = Some(err);
            }
        }
        self
    }

    fn set_clause(&self) -> StmtResult<Fragment> {
        if self.sets.is_empty() {
            return Err(StmtError::validation(
                "UPDATE requires at least one SET column",
            ));
        }
        let assignments = self
            .sets
            .iter()
            .map(|(column, value)| -> StmtResult<Fragment> {
                // SET targets cannot be table-qualified.
                let column = Ident::parse(column)?.last();
                let value = match value {
                    SetValue::Param(p) => Fragment::param(p.clone()),
                    SetValue::Raw(sql) => Fragment::raw(sql.clone()),
                };
                Ok(Fragment::concat(vec![
                    Fragment::ident(column),
                    Fragment::literal(" = "),
                    value,
                ]))
            })
            .collect::<StmtResult<Vec<_>>>()?;
        Ok(Fragment::concat(vec![
            Fragment::literal("SET "),
            Fragment::seq(assignments, ", "),
        ]))
    }
}

impl Filter for UpdateQb {
    fn predicate_mut(&mut self) -> &mut Predicate {
        &mut self.predicate
    }
}

impl Statement for UpdateQb {
    type Output = Vec<Row>;

    const KIND: StatementKind = StatementKind::Update;

    fn to_fragment(&self) -> StmtResult<Fragment> {
        fail_on(&self.build_error)?;
        let table = Ident::parse(&self.table)?;
        let set = self.set_clause()?;
        let filter = self.predicate.where_clause()?;
        self.predicate.require_non_empty("no WHERE conditions")?;

        Ok(Fragment::seq(
            vec![
                Fragment::literal("UPDATE"),
                Fragment::ident(table),
                set,
                filter,
                returning_clause(&self.returning),
            ],
            " ",
        ))
    }

    fn transform(&self, rows: Vec<Row>) -> StmtResult<Vec<Row>> {
        executor::passthrough(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qb::update;

    #[test]
    fn set_then_where() {
        let compiled = update("film")
            .set_column("title", "X")
            .eq("film_id", 7i32)
            .compile()
            .unwrap();
        assert_eq!(compiled.sql, "UPDATE film SET title = $1 WHERE film_id = $2");
        assert_eq!(compiled.params.debug_values(), ["\"X\"", "7"]);
    }

    #[test]
    fn match_all_with_returning() {
        let qb = update("film")
            .match_all()
            .set_column("title", "X")
            .returning(&["title"]);
        assert_eq!(
            qb.to_sql(),
            "UPDATE film SET title = $1 WHERE TRUE RETURNING title"
        );
    }

    #[test]
    fn no_filter_is_rejected() {
        let err = update("film").set_column("title", "X").compile().unwrap_err();
        assert_eq!(err.to_string(), "Validation error: no WHERE conditions");

        // An empty nested group does not count as a filter.
        assert!(update("film")
            .set_column("title", "X")
            .nest(|g| g)
            .compile()
            .is_err());
    }

    #[test]
    fn no_set_is_rejected() {
        assert!(update("film").match_all().compile().unwrap_err().is_validation());
    }

    #[test]
    fn set_merging_keeps_position_last_write_wins() {
        let compiled = update("film")
            .set_column("title", "A")
            .set_many(ValueMap::new().set("rating", "PG").set("title", "B"))
            .set_raw("last_update", "now()")
            .eq("film_id", 1i32)
            .compile()
            .unwrap();
        assert_eq!(
            compiled.sql,
            "UPDATE film SET title = $1, rating = $2, last_update = now() WHERE film_id = $3"
        );
        assert_eq!(compiled.params.debug_values(), ["\"B\"", "\"PG\"", "1"]);
    }

    #[test]
    fn qualified_set_target_uses_column_name() {
        let qb = update("film").set_column("film.title", "A").match_all();
        assert_eq!(qb.to_sql(), "UPDATE film SET title = $1 WHERE TRUE");
    }
}
