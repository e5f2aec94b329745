//! SQL logging through `tracing`.
//!
//! Events use the `pgstmt.sql` target, so they can be filtered with e.g.
//! `RUST_LOG=pgstmt.sql=debug`.

use crate::error::StmtError;
use crate::fragment::CompiledSql;
use crate::qb::StatementKind;
use std::borrow::Cow;
use tracing::Level;

/// Logging settings for [`crate::Statement::run_with`].
#[derive(Debug, Clone)]
pub struct SqlLog {
    /// Level of the "submitting" and "finished" events.
    pub level: Level,
    /// Truncate long SQL (in chars). `None` disables truncation.
    pub max_sql_length: Option<usize>,
}

impl Default for SqlLog {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            max_sql_length: Some(200),
        }
    }
}

macro_rules! emit_at_level {
    ($level:expr, $($field:tt)*) => {
        match $level {
            Level::ERROR => tracing::error!($($field)*),
            Level::WARN => tracing::warn!($($field)*),
            Level::INFO => tracing::info!($($field)*),
            Level::DEBUG => tracing::debug!($($field)*),
            Level::TRACE => tracing::trace!($($field)*),
        }
    };
}

impl SqlLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    pub(crate) fn truncate<'a>(&self, sql: &'a str) -> Cow<'a, str> {
        let Some(max) = self.max_sql_length else {
            return Cow::Borrowed(sql);
        };
        match sql.char_indices().nth(max) {
            Some((cut, _)) => Cow::Owned(format!("{}...", &sql[..cut])),
            None => Cow::Borrowed(sql),
        }
    }

    pub(crate) fn submitting(&self, kind: StatementKind, compiled: &CompiledSql) {
        let sql = self.truncate(&compiled.sql);
        emit_at_level!(
            self.level,
            target: "pgstmt.sql",
            kind = ?kind,
            param_count = compiled.params.len(),
            sql = %sql,
            "submitting statement"
        );
    }

    pub(crate) fn finished(&self, kind: StatementKind, rows: usize) {
        emit_at_level!(
            self.level,
            target: "pgstmt.sql",
            kind = ?kind,
            rows,
            "statement finished"
        );
    }

    pub(crate) fn failed(&self, kind: StatementKind, err: &StmtError) {
        tracing::warn!(
            target: "pgstmt.sql",
            kind = ?kind,
            sqlstate = err.db_code().unwrap_or("-"),
            error = %err,
            "statement failed"
        );
    }
}
