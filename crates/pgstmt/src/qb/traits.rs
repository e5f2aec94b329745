//! Statement traits: compile, run, transform.

use crate::error::StmtResult;
use crate::executor::Executor;
use crate::fragment::{CompiledSql, Fragment};
use crate::log::SqlLog;
use crate::row::FromRow;
use std::future::Future;
use tokio_postgres::Row;

/// Statement kind, used for logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Count,
    Insert,
    Update,
    Delete,
}

/// A buildable, runnable SQL statement.
///
/// `compile()` is pure: it never mutates the builder and can be called any number of
/// times. All validation happens there, so a rejected statement never reaches the executor.
pub trait Statement: Sync {
    /// Result shape produced by [`Statement::transform`].
    type Output: Send;

    const KIND: StatementKind;

    /// Assemble the statement's fragment tree, validating builder state.
    fn to_fragment(&self) -> StmtResult<Fragment>;

    /// Map raw rows into [`Statement::Output`].
    fn transform(&self, rows: Vec<Row>) -> StmtResult<Self::Output>;

    /// Compile into SQL text and ordered parameters.
    fn compile(&self) -> StmtResult<CompiledSql> {
        Ok(self.to_fragment()?.serialize())
    }

    /// Debug helper: the SQL text, or the validation error as a SQL comment.
    fn to_sql(&self) -> String {
        match self.compile() {
            Ok(compiled) => compiled.sql,
            Err(err) => format!("/* {err} */"),
        }
    }

    /// Compile, submit and transform, logging with the default [`SqlLog`].
    fn run(
        &self,
        exec: &impl Executor,
    ) -> impl Future<Output = StmtResult<Self::Output>> + Send {
        async move {
            let log = SqlLog::default();
            self.run_with(exec, &log).await
        }
    }

    /// Compile, submit and transform, logging through `log`.
    fn run_with(
        &self,
        exec: &impl Executor,
        log: &SqlLog,
    ) -> impl Future<Output = StmtResult<Self::Output>> + Send {
        async move {
            let compiled = self.compile()?;
            log.submitting(Self::KIND, &compiled);

            let params = compiled.params.as_refs();
            let rows = match exec.submit(&compiled.sql, &params).await {
                Ok(rows) => rows,
                Err(err) => {
                    log.failed(Self::KIND, &err);
                    return Err(err);
                }
            };
            log.finished(Self::KIND, rows.len());
            self.transform(rows)
        }
    }
}

/// Row-mapping helpers for statements that return rows.
pub trait FetchRows: Statement<Output = Vec<Row>> {
    /// Run and map every row to `T`.
    fn fetch_all<T: FromRow + Send>(
        &self,
        exec: &impl Executor,
    ) -> impl Future<Output = StmtResult<Vec<T>>> + Send {
        async move {
            let rows = self.run(exec).await?;
            rows.iter().map(T::from_row).collect()
        }
    }

    /// Run and map the first row, if any.
    fn fetch_optional<T: FromRow + Send>(
        &self,
        exec: &impl Executor,
    ) -> impl Future<Output = StmtResult<Option<T>>> + Send {
        async move {
            let rows = self.run(exec).await?;
            rows.first().map(T::from_row).transpose()
        }
    }
}

impl<S: Statement<Output = Vec<Row>>> FetchRows for S {}
