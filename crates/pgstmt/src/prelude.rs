//! Common imports:
//!
//! ```ignore
//! use pgstmt::prelude::*;
//! ```

pub use crate::qb;
pub use crate::{
    Executor, FetchRows, Filter, FromRow, OrderSpec, Param, Predicate, RowExt, SqlLog, Statement,
    StmtError, StmtResult, ValueMap,
};

#[cfg(feature = "pool")]
pub use crate::{PoolConfig, create_pool};
