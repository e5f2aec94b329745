//! Row mapping.

use crate::error::{StmtError, StmtResult};
use tokio_postgres::Row;
use tokio_postgres::types::FromSql;

/// Build a value from one result row.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> StmtResult<Self>;
}

/// Typed column access that reports failures as [`StmtError::Decode`].
pub trait RowExt {
    fn try_get_column<T>(&self, column: &str) -> StmtResult<T>
    where
        T: for<'a> FromSql<'a>;
}

impl RowExt for Row {
    fn try_get_column<T>(&self, column: &str) -> StmtResult<T>
    where
        T: for<'a> FromSql<'a>,
    {
        self.try_get(column)
            .map_err(|e| StmtError::decode(column, e.to_string()))
    }
}
