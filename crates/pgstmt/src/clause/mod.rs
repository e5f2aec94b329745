//! Clause builders shared by the statement compilers.

pub mod columns;
pub mod conflict;
pub mod join;
pub mod lock;
pub mod order;

pub use columns::{ColumnSpec, construct_column_selection};
pub use conflict::{ConflictAction, ConflictSpec, ConflictTarget, UpdateSet};
pub use join::{JoinCondition, JoinKind, JoinSpec};
pub use lock::{LockMode, LockSpec, WaitPolicy};
pub use order::{Direction, Nulls, OrderSpec};
