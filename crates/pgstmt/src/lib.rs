//! # pgstmt
//!
//! A composable PostgreSQL statement builder.
//!
//! Statements are assembled from clause calls on owned builder values, compiled into
//! one SQL string with `$n` placeholders plus the ordered parameter values, and run
//! against any [`Executor`] (a client, a transaction, a pooled client or a pool).
//!
//! ## Features
//!
//! - **Injection-safe names**: every table/column name is validated as an [`Ident`];
//!   only explicitly raw snippets bypass escaping
//! - **Positional parameters**: numbered in one pass over the finished statement
//! - **Safe defaults**: UPDATE and DELETE refuse to compile without a filter unless
//!   `match_all()` says so; INSERT needs at least one row
//! - **Result transforms**: rows pass through, `count()` yields an `i64`
//! - **Logging**: each submitted statement is logged through `tracing` (target `pgstmt.sql`)
//!
//! ```ignore
//! use pgstmt::prelude::*;
//!
//! let pool = create_pool("postgres://localhost/pagila")?;
//!
//! let rows = qb::select("film")
//!     .select(&["film_id", "title"])
//!     .is_in("rating", ["PG", "G"])
//!     .order_by_spec(OrderSpec::desc("length").nulls_last())
//!     .limit(10)
//!     .run(&pool)
//!     .await?;
//!
//! let total: i64 = qb::select("film").match_all().count().run(&pool).await?;
//! ```

pub mod clause;
pub mod error;
pub mod executor;
pub mod fragment;
pub mod ident;
pub mod log;
pub mod param;
pub mod predicate;
pub mod prelude;
pub mod qb;
pub mod row;
pub mod schema;
pub mod values;

#[cfg(feature = "pool")]
pub mod pool;

pub use clause::{
    ColumnSpec, ConflictAction, ConflictTarget, Direction, JoinKind, LockMode, Nulls, OrderSpec,
    UpdateSet, WaitPolicy, construct_column_selection,
};
pub use error::{StmtError, StmtResult};
pub use executor::{Executor, passthrough, scalar_count};
pub use fragment::{CompiledSql, Fragment};
pub use ident::{Ident, IntoIdent};
pub use log::SqlLog;
pub use param::{Param, ParamList};
pub use predicate::{Connector, Filter, Predicate};
pub use qb::{
    CountQb, DeleteQb, FetchRows, InsertQb, LockScope, OnConflictQb, SelectQb, Statement,
    StatementKind, UpdateQb, delete, insert, select, update,
};
pub use row::{FromRow, RowExt};
pub use schema::{SchemaRegistry, TableSchema};
pub use values::ValueMap;

#[cfg(feature = "pool")]
pub use pool::{PoolConfig, Recycling, create_pool};
