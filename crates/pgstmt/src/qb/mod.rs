//! Statement builders.
//!
//! Each builder is an owned value: clause methods take `self` and hand it back, so a
//! statement has exactly one owner while it is being built. Nothing is validated until
//! [`Statement::compile`] (or `run`), which returns a [`crate::StmtError::Validation`]
//! before any I/O when the statement is malformed.
//!
//! ```ignore
//! use pgstmt::prelude::*;
//!
//! // SELECT
//! let films = qb::select("film")
//!     .eq("rating", "PG")
//!     .order_by("title")
//!     .limit(10)
//!     .run(&client)
//!     .await?;
//!
//! // SELECT COUNT(*)
//! let n: i64 = qb::select("film").eq("rating", "PG").count().run(&client).await?;
//!
//! // INSERT ... ON CONFLICT
//! qb::insert("actor")
//!     .values(ValueMap::new().set("actor_id", 1i32).set("first_name", "foo"))
//!     .on_conflict(&["actor_id"])
//!     .do_nothing()
//!     .run(&client)
//!     .await?;
//!
//! // UPDATE / DELETE require a filter (or an explicit match_all())
//! qb::update("film").set_column("title", "X").match_all().run(&client).await?;
//! qb::delete("film").eq("film_id", 1i32).run(&client).await?;
//! ```

mod delete;
mod insert;
mod select;
mod traits;
mod update;

pub use delete::DeleteQb;
pub use insert::{InsertQb, OnConflictQb};
pub use select::{CountQb, LockScope, SelectQb};
pub use traits::{FetchRows, Statement, StatementKind};
pub use update::UpdateQb;

use crate::error::{StmtError, StmtResult};
use crate::fragment::Fragment;
use crate::param::Param;

/// Create a SELECT builder for `table`.
pub fn select(table: &str) -> SelectQb {
    SelectQb::new(table)
}

/// Create an INSERT builder for `table`.
pub fn insert(table: &str) -> InsertQb {
    InsertQb::new(table)
}

/// Create an UPDATE builder for `table`.
pub fn update(table: &str) -> UpdateQb {
    UpdateQb::new(table)
}

/// Create a DELETE builder for `table`.
pub fn delete(table: &str) -> DeleteQb {
    DeleteQb::new(table)
}

pub(crate) fn fail_on(build_error: &Option<String>) -> StmtResult<()> {
    match build_error {
        Some(err) => Err(StmtError::validation(err.clone())),
        None => Ok(()),
    }
}

/// `<keyword>$n` for an optional bound value.
pub(crate) fn bound(keyword: &'static str, value: Option<i64>) -> Fragment {
    match value {
        Some(v) => Fragment::concat(vec![
            Fragment::literal(keyword),
            Fragment::param(Param::new(v)),
        ]),
        None => Fragment::empty(),
    }
}
