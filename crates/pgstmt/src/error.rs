//! Error types for pgstmt

use thiserror::Error;

/// Result type alias for pgstmt operations
pub type StmtResult<T> = Result<T, StmtError>;

/// Errors raised while compiling or running a statement.
#[derive(Debug, Error)]
pub enum StmtError {
    /// Statement rejected before any I/O (empty mutation filter, bad order token, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Error returned by the database for a submitted statement.
    ///
    /// The driver error is kept untouched in `source`; `sql` is the text that was sent.
    #[error("Execution error: {source} (sql: {sql})")]
    Execution {
        sql: String,
        #[source]
        source: tokio_postgres::Error,
    },

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Expected a row but the statement returned none
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid connection settings
    #[error("Connection error: {0}")]
    Connection(String),

    /// Pool checkout or construction error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),
}

impl StmtError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Attach the submitted SQL to a driver error.
    pub fn execution(sql: impl Into<String>, source: tokio_postgres::Error) -> Self {
        Self::Execution {
            sql: sql.into(),
            source,
        }
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// SQLSTATE code of the database error, if the server reported one.
    pub fn db_code(&self) -> Option<&str> {
        match self {
            Self::Execution { source, .. } => source.as_db_error().map(|db| db.code().code()),
            _ => None,
        }
    }

    /// Check if the database rejected the statement with a unique violation (23505).
    pub fn is_unique_violation(&self) -> bool {
        self.db_code() == Some("23505")
    }

    /// Name of the constraint involved in the database error, if any.
    pub fn constraint(&self) -> Option<&str> {
        match self {
            Self::Execution { source, .. } => source.as_db_error().and_then(|db| db.constraint()),
            _ => None,
        }
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for StmtError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}
