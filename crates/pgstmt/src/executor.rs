//! Executor capability and result transforms.
//!
//! An [`Executor`] is anything that can take SQL text plus parameters and return rows:
//! a client, a transaction, a pooled client or a pool. Driver errors are handed back
//! unchanged inside [`StmtError::Execution`] together with the submitted SQL.

use crate::error::{StmtError, StmtResult};
use std::future::Future;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

/// Submits compiled statements.
pub trait Executor: Send + Sync {
    /// Run `sql` with `params` and return every row.
    fn submit(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = StmtResult<Vec<Row>>> + Send;
}

impl Executor for tokio_postgres::Client {
    async fn submit(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> StmtResult<Vec<Row>> {
        self.query(sql, params)
            .await
            .map_err(|e| StmtError::execution(sql, e))
    }
}

impl Executor for tokio_postgres::Transaction<'_> {
    async fn submit(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> StmtResult<Vec<Row>> {
        self.query(sql, params)
            .await
            .map_err(|e| StmtError::execution(sql, e))
    }
}

#[cfg(feature = "pool")]
impl Executor for deadpool_postgres::Client {
    async fn submit(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> StmtResult<Vec<Row>> {
        let client: &tokio_postgres::Client = self;
        client.submit(sql, params).await
    }
}

#[cfg(feature = "pool")]
impl Executor for deadpool_postgres::Transaction<'_> {
    async fn submit(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> StmtResult<Vec<Row>> {
        let tx: &tokio_postgres::Transaction<'_> = self;
        tx.submit(sql, params).await
    }
}

/// Checks out a connection for the duration of one statement.
#[cfg(feature = "pool")]
impl Executor for deadpool_postgres::Pool {
    async fn submit(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> StmtResult<Vec<Row>> {
        let client = self.get().await?;
        client.submit(sql, params).await
    }
}

impl<E: Executor> Executor for &E {
    async fn submit(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> StmtResult<Vec<Row>> {
        (**self).submit(sql, params).await
    }
}

/// Row passthrough transform.
pub fn passthrough(rows: Vec<Row>) -> StmtResult<Vec<Row>> {
    Ok(rows)
}

/// Scalar transform for `SELECT COUNT(*)`: the first column of the first row as `i64`.
pub fn scalar_count(rows: Vec<Row>) -> StmtResult<i64> {
    let row = rows
        .first()
        .ok_or_else(|| StmtError::not_found("COUNT(*) returned no rows"))?;
    row.try_get::<_, i64>(0)
        .map_err(|e| StmtError::decode("count", e.to_string()))
}
