//! Connection pool configuration.

use crate::error::{StmtError, StmtResult};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use serde::Deserialize;
use tokio_postgres::NoTls;

/// How a connection is checked when it goes back into the pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recycling {
    /// Only check that the connection is not closed.
    #[default]
    Fast,
    /// Run a test query before reuse.
    Verified,
}

impl From<Recycling> for RecyclingMethod {
    fn from(value: Recycling) -> Self {
        match value {
            Recycling::Fast => RecyclingMethod::Fast,
            Recycling::Verified => RecyclingMethod::Verified,
        }
    }
}

/// Pool settings. Deserializable, so it can live in an application config file.
///
/// ```ignore
/// let pool = PoolConfig::new("postgres://localhost/pagila").max_size(8).build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub database_url: String,
    pub max_size: usize,
    pub recycling: Recycling,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_size: 16,
            recycling: Recycling::Fast,
        }
    }
}

impl PoolConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Self::default()
        }
    }

    /// Read `DATABASE_URL` and, optionally, `PGSTMT_POOL_MAX_SIZE`.
    pub fn from_env() -> StmtResult<Self> {
        let url = std::env::var("DATABASE_URL")
            .map_err(|_| StmtError::Connection("DATABASE_URL is not set".to_string()))?;
        let mut config = Self::new(url);
        if let Ok(raw) = std::env::var("PGSTMT_POOL_MAX_SIZE") {
            config.max_size = raw.parse().map_err(|_| {
                StmtError::Connection(format!("invalid PGSTMT_POOL_MAX_SIZE '{raw}'"))
            })?;
        }
        Ok(config)
    }

    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn recycling(mut self, recycling: Recycling) -> Self {
        self.recycling = recycling;
        self
    }

    /// Build the pool. Connections are opened lazily on first checkout.
    pub fn build(&self) -> StmtResult<Pool> {
        if self.max_size == 0 {
            return Err(StmtError::Connection(
                "pool max_size must be at least 1".to_string(),
            ));
        }
        let pg_config: tokio_postgres::Config = self
            .database_url
            .parse()
            .map_err(|e: tokio_postgres::Error| StmtError::Connection(e.to_string()))?;

        let manager = Manager::from_config(
            pg_config,
            NoTls,
            ManagerConfig {
                recycling_method: self.recycling.into(),
            },
        );
        Pool::builder(manager)
            .max_size(self.max_size)
            .build()
            .map_err(|e| StmtError::Pool(e.to_string()))
    }
}

/// Create a pool with default settings.
pub fn create_pool(database_url: &str) -> StmtResult<Pool> {
    PoolConfig::new(database_url).build()
}
