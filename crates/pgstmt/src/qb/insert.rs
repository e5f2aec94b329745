//! INSERT builder with optional ON CONFLICT and RETURNING.

use crate::clause::columns::{self, ColumnSpec, returning_clause};
use crate::clause::conflict::{ConflictAction, ConflictSpec, ConflictTarget, UpdateSet};
use crate::error::{StmtError, StmtResult};
use crate::executor;
use crate::fragment::Fragment;
use crate::ident::Ident;
use crate::predicate::{Filter, Predicate};
use crate::qb::fail_on;
use crate::qb::traits::{Statement, StatementKind};
use crate::schema::SchemaRegistry;
use crate::values::ValueMap;
use tokio_postgres::Row;

/// INSERT query builder.
///
/// Columns come from the first row; every other row must set exactly the same columns
/// (in any order).
#[derive(Clone, Debug)]
pub struct InsertQb {
    table: String,
    rows: Vec<ValueMap>,
    conflict: Option<ConflictSpec>,
    returning: Vec<ColumnSpec>,
    build_error: Option<String>,
}

impl InsertQb {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            rows: Vec::new(),
            conflict: None,
            returning: Vec::new(),
            build_error: None,
        }
    }

    /// Append one row.
    pub fn values(mut self, row: ValueMap) -> Self {
        self.rows.push(row);
        self
    }

    /// Append several rows.
    pub fn values_many(mut self, rows: impl IntoIterator<Item = ValueMap>) -> Self {
        self.rows.extend(rows);
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

    /// `ON CONFLICT (columns) ...`
    pub fn on_conflict(self, columns: &[&str]) -> OnConflictQb {
        let target = ConflictTarget::Columns(columns.iter().map(|c| c.to_string()).collect());
        OnConflictQb::new(self, target)
    }

    /// `ON CONFLICT ON CONSTRAINT name ...`
    pub fn on_conflict_on_constraint(self, name: &str) -> OnConflictQb {
        OnConflictQb::new(self, ConflictTarget::Constraint(name.to_string()))
    }

    /// Check table, columns and conflict constraint against `registry`.
    ///
    /// Optional and never run implicitly; compilation passes names through as written.
    pub fn check_schema(&self, registry: &SchemaRegistry) -> StmtResult<()> {
        let table = registry.get_table(&self.table).ok_or_else(|| {
            StmtError::validation(format!("table '{}' is not registered", self.table))
        })?;

        for row in &self.rows {
            for column in row.columns() {
                table.require_column(column)?;
            }
        }

        if let Some(conflict) = &self.conflict {
            match &conflict.target {
                ConflictTarget::Columns(cols) => {
                    for column in cols {
                        table.require_column(column)?;
                    }
                }
                ConflictTarget::Constraint(name) => table.require_constraint(name)?,
            }
            if let ConflictAction::DoUpdate(set) = &conflict.action {
                match set {
                    UpdateSet::AllInserted => {}
                    UpdateSet::Columns(cols) => {
                        for column in cols {
                            table.require_column(column)?;
                        }
                    }
                    UpdateSet::Values(values) => {
                        for column in values.columns() {
                            table.require_column(column)?;
                        }
                    }
                }
            }
        }

        for spec in &self.returning {
            if let ColumnSpec::Bare(ident) | ColumnSpec::Qualified(ident) = spec {
                table.require_column(ident.name())?;
            }
        }
        Ok(())
    }

    /// Target columns, unqualified: `actor.first_name` inserts into `first_name`.
    fn insert_columns(&self) -> StmtResult<Vec<Ident>> {
        let Some(row) = self.rows.first() else {
            return Ok(Vec::new());
        };
        let mut columns: Vec<Ident> = Vec::with_capacity(row.len());
        for column in row.columns() {
            let ident = Ident::parse(column)?.last();
            if columns.contains(&ident) {
                return Err(StmtError::validation(format!(
                    "INSERT sets column '{}' more than once",
                    ident.name()
                )));
            }
            columns.push(ident);
        }
        Ok(columns)
    }

    fn values_clause(&self, columns: &[Ident]) -> StmtResult<Fragment> {
        let Some(first) = self.rows.first() else {
            return Err(StmtError::validation(
                "INSERT requires at least one row of values",
            ));
        };

        if columns.is_empty() {
            if self.rows.len() > 1 {
                return Err(StmtError::validation(
                    "multi-row INSERT requires at least one column",
                ));
            }
            return Ok(Fragment::literal("DEFAULT VALUES"));
        }

        let mut tuples = Vec::with_capacity(self.rows.len());
        for (i, row) in self.rows.iter().enumerate() {
            if row.len() != first.len() || !first.columns().all(|c| row.contains(c)) {
                return Err(StmtError::validation(format!(
                    "INSERT row {} sets different columns than row 1",
                    i + 1
                )));
            }
            let values = first
                .columns()
                .filter_map(|c| row.get(c))
                .cloned()
                .map(Fragment::param)
                .collect();
            tuples.push(Fragment::parens(Fragment::seq(values, ", ")));
        }

        let names = columns.iter().cloned().map(Fragment::ident).collect();
        Ok(Fragment::seq(
            vec![
                Fragment::parens(Fragment::seq(names, ", ")),
                Fragment::literal("VALUES"),
                Fragment::seq(tuples, ", "),
            ],
            " ",
        ))
    }
}

impl Statement for InsertQb {
    type Output = Vec<Row>;

    const KIND: StatementKind = StatementKind::Insert;

    fn to_fragment(&self) -> StmtResult<Fragment> {
        fail_on(&self.build_error)?;
        let table = Ident::parse(&self.table)?;
        let columns = self.insert_columns()?;
        let values = self.values_clause(&columns)?;
        let conflict = match &self.conflict {
            Some(spec) => spec.to_fragment(&columns)?,
            None => Fragment::empty(),
        };

        Ok(Fragment::seq(
            vec![
                Fragment::literal("INSERT INTO"),
                Fragment::ident(table),
                values,
                conflict,
                returning_clause(&self.returning),
            ],
            " ",
        ))
    }

    fn transform(&self, rows: Vec<Row>) -> StmtResult<Vec<Row>> {
        executor::passthrough(rows)
    }
}

/// Returned by [`InsertQb::on_conflict`]; pick the conflict action to get the INSERT back.
///
/// Setting a conflict clause again replaces the previous one.
#[must_use = "choose do_nothing() or a do_update_* action to get the statement back"]
#[derive(Debug)]
pub struct OnConflictQb {
    insert: InsertQb,
    target: ConflictTarget,
    filter: Predicate,
}

impl OnConflictQb {
    fn new(insert: InsertQb, target: ConflictTarget) -> Self {
        Self {
            insert,
            target,
            filter: Predicate::new(),
        }
    }

    /// Filter for the conflict action: an index predicate for `DO NOTHING`,
    /// the `WHERE` of `DO UPDATE`.
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filter = self.filter.merge(predicate);
        self
    }

    /// `DO NOTHING`
    pub fn do_nothing(self) -> InsertQb {
        self.finish(ConflictAction::DoNothing)
    }

    /// `DO UPDATE SET c = EXCLUDED.c` for every inserted column.
    pub fn do_update_set(self) -> InsertQb {
        self.finish(ConflictAction::DoUpdate(UpdateSet::AllInserted))
    }

    /// `DO UPDATE SET c = EXCLUDED.c` for the listed columns only.
    pub fn do_update_columns(self, columns: &[&str]) -> InsertQb {
        let columns = columns.iter().map(|c| c.to_string()).collect();
        self.finish(ConflictAction::DoUpdate(UpdateSet::Columns(columns)))
    }

    /// `DO UPDATE SET (a, b) = ROW($n, $m)` with explicit values.
    pub fn do_update_values(self, values: ValueMap) -> InsertQb {
        self.finish(ConflictAction::DoUpdate(UpdateSet::Values(values)))
    }

    fn finish(self, action: ConflictAction) -> InsertQb {
        let mut insert = self.insert;
        insert.conflict = Some(ConflictSpec {
            target: self.target,
            action,
            filter: self.filter,
        });
        insert
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qb::insert;

    fn actor(first: &'static str, last: &'static str) -> ValueMap {
        ValueMap::new().set("first_name", first).set("last_name", last)
    }

    #[test]
    fn single_row() {
        let compiled = insert("actor").values(actor("foo", "bar")).compile().unwrap();
        assert_eq!(
            compiled.sql,
            "INSERT INTO actor (first_name, last_name) VALUES ($1, $2)"
        );
        assert_eq!(compiled.params.debug_values(), ["\"foo\"", "\"bar\""]);
    }

    #[test]
    fn multi_row_uses_first_row_column_order() {
        let compiled = insert("actor")
            .values(actor("a", "b"))
            .values(ValueMap::new().set("last_name", "d").set("first_name", "c"))
            .compile()
            .unwrap();
        assert_eq!(
            compiled.sql,
            "INSERT INTO actor (first_name, last_name) VALUES ($1, $2), ($3, $4)"
        );
        assert_eq!(
            compiled.params.debug_values(),
            ["\"a\"", "\"b\"", "\"c\"", "\"d\""]
        );
    }

    #[test]
    fn empty_insert_is_rejected() {
        let err = insert("actor").compile().unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn mismatched_rows_are_rejected() {
        let err = insert("actor")
            .values(actor("a", "b"))
            .values(ValueMap::new().set("first_name", "c"))
            .compile()
            .unwrap_err();
        assert!(err.to_string().contains("row 2"));

        let renamed = insert("actor")
            .values(actor("a", "b"))
            .values(ValueMap::new().set("first_name", "c").set("nickname", "d"))
            .compile();
        assert!(renamed.is_err());
    }

    #[test]
    fn qualified_columns_insert_unqualified() {
        let compiled = insert("actor")
            .values(ValueMap::new().set("actor.first_name", "foo"))
            .on_conflict(&["actor_id"])
            .do_update_set()
            .compile()
            .unwrap();
        assert_eq!(
            compiled.sql,
            "INSERT INTO actor (first_name) VALUES ($1) \
             ON CONFLICT (actor_id) DO UPDATE SET first_name = EXCLUDED.first_name"
        );

        let err = insert("actor")
            .values(ValueMap::new().set("actor.first_name", "foo").set("first_name", "bar"))
            .compile()
            .unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("first_name"));
    }

    #[test]
    fn default_values_for_single_empty_row() {
        let qb = insert("actor").values(ValueMap::new()).returning(&["actor_id"]);
        assert_eq!(qb.to_sql(), "INSERT INTO actor DEFAULT VALUES RETURNING actor_id");
        assert!(insert("actor")
            .values(ValueMap::new())
            .values(ValueMap::new())
            .compile()
            .is_err());
    }

    #[test]
    fn on_conflict_do_nothing() {
        let qb = insert("actor")
            .values(ValueMap::new().set("actor_id", 1i32).set("first_name", "foo"))
            .on_conflict(&["actor_id"])
            .do_nothing();
        assert_eq!(
            qb.to_sql(),
            "INSERT INTO actor (actor_id, first_name) VALUES ($1, $2) \
             ON CONFLICT (actor_id) DO NOTHING"
        );
    }

    #[test]
    fn on_conflict_do_update_set_all_with_returning() {
        let qb = insert("actor")
            .values(ValueMap::new().set("actor_id", 1i32).set("first_name", "foo"))
            .on_conflict_on_constraint("actor_pkey")
            .do_update_set()
            .returning(&["actor_id"])
            .returning(&["first_name"]);
        assert_eq!(
            qb.to_sql(),
            "INSERT INTO actor (actor_id, first_name) VALUES ($1, $2) \
             ON CONFLICT ON CONSTRAINT actor_pkey DO UPDATE SET \
             actor_id = EXCLUDED.actor_id, first_name = EXCLUDED.first_name \
             RETURNING actor_id, first_name"
        );
    }

    #[test]
    fn do_update_values_params_follow_insert_params() {
        let compiled = insert("actor")
            .values(ValueMap::new().set("actor_id", 1i32).set("first_name", "foo"))
            .on_conflict(&["actor_id"])
            .filter(Predicate::new().template("actor.first_name <> ?", vec![crate::Param::new("keep")]))
            .do_update_values(ValueMap::new().set("first_name", "bar"))
            .compile()
            .unwrap();
        assert_eq!(
            compiled.sql,
            "INSERT INTO actor (actor_id, first_name) VALUES ($1, $2) \
             ON CONFLICT (actor_id) DO UPDATE SET (first_name) = ROW($3) \
             WHERE actor.first_name <> $4"
        );
        assert_eq!(
            compiled.params.debug_values(),
            ["1", "\"foo\"", "\"bar\"", "\"keep\""]
        );
    }

    #[test]
    fn last_conflict_clause_wins() {
        let qb = insert("actor")
            .values(ValueMap::new().set("actor_id", 1i32))
            .on_conflict(&["actor_id"])
            .do_update_set()
            .on_conflict(&["actor_id"])
            .do_nothing();
        assert!(qb.to_sql().ends_with("ON CONFLICT (actor_id) DO NOTHING"));
    }

    #[test]
    fn malformed_conflict_target_is_rejected() {
        let err = insert("actor")
            .values(actor("a", "b"))
            .on_conflict(&[])
            .do_nothing()
            .compile()
            .unwrap_err();
        assert!(err.is_validation());
    }
}
