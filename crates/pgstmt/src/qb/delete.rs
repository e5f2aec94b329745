//! DELETE builder.

use crate::clause::columns::{self, ColumnSpec, returning_clause};
use crate::error::StmtResult;
use crate::executor;
use crate::fragment::Fragment;
use crate::ident::Ident;
use crate::predicate::{Filter, Predicate};
use crate::qb::fail_on;
use crate::qb::traits::{Statement, StatementKind};
use tokio_postgres::Row;

/// DELETE query builder.
///
/// Compiling without a filter fails; use [`Filter::match_all`] to delete every row.
#[derive(Clone, Debug)]
pub struct DeleteQb {
    table: String,
    predicate: Predicate,
    returning: Vec<ColumnSpec>,
    build_error: Option<String>,
}

impl DeleteQb {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            predicate: Predicate::new(),
            returning: Vec::new(),
            build_error: None,
        }
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
}

impl Filter for DeleteQb {
    fn predicate_mut(&mut self) -> &mut Predicate {
        &mut self.predicate
    }
}

impl Statement for DeleteQb {
    type Output = Vec<Row>;

    const KIND: StatementKind = StatementKind::Delete;

    fn to_fragment(&self) -> StmtResult<Fragment> {
        fail_on(&self.build_error)?;
        let table = Ident::parse(&self.table)?;
        let filter = self.predicate.where_clause()?;
        self.predicate.require_non_empty("no WHERE conditions")?;

        Ok(Fragment::seq(
            vec![
                Fragment::literal("DELETE FROM"),
                Fragment::ident(table),
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
