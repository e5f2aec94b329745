//! SELECT builder.

use crate::clause::columns::{self, ColumnSpec, construct_column_selection};
use crate::clause::join::{JoinCondition, JoinKind, JoinSpec, compile_joins};
use crate::clause::lock::{LockMode, LockSpec, WaitPolicy, compile_locks};
use crate::clause::order::{OrderSpec, compile_order};
use crate::error::StmtResult;
use crate::executor;
use crate::fragment::Fragment;
use crate::ident::{Ident, IntoIdent};
use crate::predicate::{Filter, Predicate};
use crate::qb::traits::{Statement, StatementKind};
use crate::qb::{bound, fail_on};
use tokio_postgres::Row;

/// SELECT query builder.
///
/// ```ignore
/// let rows = qb::select("film")
///     .select(&["film_id", "title"])
///     .eq("rating", "PG")
///     .order_by("title")
///     .limit(10)
///     .run(&client)
///     .await?;
/// ```
#[derive(Clone, Debug)]
pub struct SelectQb {
    table: String,
    columns: Vec<ColumnSpec>,
    joins: Vec<JoinSpec>,
    predicate: Predicate,
    order: Vec<OrderSpec>,
    limit: Option<i64>,
    offset: Option<i64>,
    locks: Vec<LockSpec>,
    build_error: Option<String>,
}

impl SelectQb {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            columns: Vec::new(),
            joins: Vec::new(),
            predicate: Predicate::new(),
            order: Vec::new(),
            limit: None,
            offset: None,
            locks: Vec::new(),
            build_error: None,
        }
    }

    fn record_error(&mut self, message: String) {
        if self.build_error.is_none() {
            self.build_error = Some(message);
        }
    }

    fn resolve(&mut self, name: impl IntoIdent) -> Option<Ident> {
        match name.into_ident() {
            Ok(ident) => Some(ident),
            Err(err) => {
                self.record_error(err.to_string());
                None
            }
        }
    }

    /// Add projected columns. The first call replaces the implicit `*`; later calls append.
    ///
    /// Accepts `col`, `table.col`, `table.*` and `*`.
    pub fn select(mut self, columns: &[&str]) -> Self {
        if let Some(err) = columns::parse_into(columns, &mut self.columns) {
            self.record_error(err);
        }
        self
    }

    /// Add already-classified columns.
    pub fn select_specs(mut self, specs: impl IntoIterator<Item = ColumnSpec>) -> Self {
        self.columns.extend(specs);
        self
    }

    fn join(mut self, kind: JoinKind, table: &str, condition: Option<JoinCondition>) -> Self {
        if let (Some(table), Some(condition)) = (self.resolve(table), condition) {
            self.joins.push(JoinSpec {
                kind,
                table,
                condition,
            });
        }
        self
    }

    fn columns_condition(&mut self, a: &str, b: &str) -> Option<JoinCondition> {
        let a = self.resolve(a)?;
        let b = self.resolve(b)?;
        Some(JoinCondition::Columns(a, b))
    }

    /// `LEFT JOIN table ON a = b`
    pub fn left_join(mut self, table: &str, a: &str, b: &str) -> Self {
        let condition = self.columns_condition(a, b);
        self.join(JoinKind::Left, table, condition)
    }

    /// `LEFT JOIN table ON <condition>` with a raw condition.
    pub fn left_join_on(self, table: &str, condition: impl Into<String>) -> Self {
        self.join(JoinKind::Left, table, Some(JoinCondition::Raw(condition.into())))
    }

    /// `INNER JOIN table ON a = b`
    pub fn inner_join(mut self, table: &str, a: &str, b: &str) -> Self {
        let condition = self.columns_condition(a, b);
        self.join(JoinKind::Inner, table, condition)
    }

    /// `INNER JOIN table ON <condition>` with a raw condition.
    pub fn inner_join_on(self, table: &str, condition: impl Into<String>) -> Self {
        self.join(JoinKind::Inner, table, Some(JoinCondition::Raw(condition.into())))
    }

    /// Order ascending by `column`.
    pub fn order_by(self, column: &str) -> Self {
        self.order_by_spec(OrderSpec::asc(column))
    }

    /// Order descending by `column`.
    pub fn order_by_desc(self, column: &str) -> Self {
        self.order_by_spec(OrderSpec::desc(column))
    }

    pub fn order_by_spec(mut self, spec: OrderSpec) -> Self {
        self.order.push(spec);
        self
    }

    pub fn order_by_specs(mut self, specs: impl IntoIterator<Item = OrderSpec>) -> Self {
        self.order.extend(specs);
        self
    }

    /// `LIMIT $n`
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// `OFFSET $n`
    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    fn lock(mut self, mode: LockMode, of: &[&str]) -> LockScope {
        let mut spec = LockSpec::new(mode);
        for table in of {
            if let Some(table) = self.resolve(*table) {
                spec.of.push(table);
            }
        }
        self.locks.push(spec);
        LockScope { qb: self }
    }

    /// `FOR UPDATE [OF ...]`
    pub fn for_update(self, of: &[&str]) -> LockScope {
        self.lock(LockMode::Update, of)
    }

    /// `FOR NO KEY UPDATE [OF ...]`
    pub fn for_no_key_update(self, of: &[&str]) -> LockScope {
        self.lock(LockMode::NoKeyUpdate, of)
    }

    /// `FOR SHARE [OF ...]`
    pub fn for_share(self, of: &[&str]) -> LockScope {
        self.lock(LockMode::Share, of)
    }

    /// `FOR KEY SHARE [OF ...]`
    pub fn for_key_share(self, of: &[&str]) -> LockScope {
        self.lock(LockMode::KeyShare, of)
    }

    /// Switch to `SELECT COUNT(*)`, keeping table, joins and filters.
    pub fn count(self) -> CountQb {
        CountQb { select: self }
    }

    fn from_clause(&self) -> StmtResult<Fragment> {
        let table = Ident::parse(&self.table)?;
        Ok(Fragment::seq(
            vec![
                Fragment::literal("FROM"),
                Fragment::ident(table),
                compile_joins(&self.joins),
                self.predicate.where_clause()?,
            ],
            " ",
        ))
    }
}

impl Filter for SelectQb {
    fn predicate_mut(&mut self) -> &mut Predicate {
        &mut self.predicate
    }
}

impl Statement for SelectQb {
    type Output = Vec<Row>;

    const KIND: StatementKind = StatementKind::Select;

    fn to_fragment(&self) -> StmtResult<Fragment> {
        fail_on(&self.build_error)?;
        Ok(Fragment::seq(
            vec![
                Fragment::literal("SELECT"),
                construct_column_selection(&self.columns),
                self.from_clause()?,
                compile_order(&self.order)?,
                bound("LIMIT ", self.limit),
                bound("OFFSET ", self.offset),
                compile_locks(&self.locks),
            ],
            " ",
        ))
    }

    fn transform(&self, rows: Vec<Row>) -> StmtResult<Vec<Row>> {
        executor::passthrough(rows)
    }
}

/// Returned by the locking methods. Exposes only the wait policy of the lock just added;
/// every method hands the statement back.
#[must_use = "call no_wait(), skip_locked() or finish() to get the statement back"]
#[derive(Debug)]
pub struct LockScope {
    qb: SelectQb,
}

impl LockScope {
    /// `NOWAIT`
    pub fn no_wait(self) -> SelectQb {
        self.wait(WaitPolicy::NoWait)
    }

    /// `SKIP LOCKED`
    pub fn skip_locked(self) -> SelectQb {
        self.wait(WaitPolicy::SkipLocked)
    }

    /// Keep the default (wait for locks).
    pub fn finish(self) -> SelectQb {
        self.qb
    }

    fn wait(mut self, policy: WaitPolicy) -> SelectQb {
        if let Some(last) = self.qb.locks.last_mut() {
            last.wait = policy;
        }
        self.qb
    }
}

/// `SELECT COUNT(*)` over a [`SelectQb`]'s table, joins and filters.
///
/// Projection, ordering, paging and locks are dropped; the output is the count as `i64`.
#[derive(Clone, Debug)]
pub struct CountQb {
    select: SelectQb,
}

impl Filter for CountQb {
    fn predicate_mut(&mut self) -> &mut Predicate {
        &mut self.select.predicate
    }
}

impl Statement for CountQb {
    type Output = i64;

    const KIND: StatementKind = StatementKind::Count;

    fn to_fragment(&self) -> StmtResult<Fragment> {
        fail_on(&self.select.build_error)?;
        Ok(Fragment::seq(
            vec![
                Fragment::literal("SELECT COUNT(*)"),
                self.select.from_clause()?,
            ],
            " ",
        ))
    }

    fn transform(&self, rows: Vec<Row>) -> StmtResult<i64> {
        executor::scalar_count(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qb::select;

    #[test]
    fn select_star_by_default() {
        assert_eq!(select("film").to_sql(), "SELECT * FROM film");
    }

    #[test]
    fn first_select_replaces_star_then_merges() {
        let qb = select("film").select(&["film_id"]).select(&["title", "*"]);
        assert_eq!(qb.to_sql(), "SELECT *, film_id, title FROM film");
    }

    #[test]
    fn limit_and_offset_are_bound() {
        let compiled = select("film")
            .match_all()
            .limit(1)
            .offset(20)
            .compile()
            .unwrap();
        assert_eq!(
            compiled.sql,
            "SELECT * FROM film WHERE TRUE LIMIT $1 OFFSET $2"
        );
        assert_eq!(compiled.params.debug_values(), ["1", "20"]);
    }

    #[test]
    fn clause_order() {
        let qb = select("film")
            .select(&["film.title", "language.name"])
            .left_join("language", "film.language_id", "language.language_id")
            .eq("film.rating", "PG")
            .order_by_desc("film.length")
            .order_by("film.title")
            .limit(5)
            .for_update(&["film"])
            .skip_locked();
        assert_eq!(
            qb.to_sql(),
            "SELECT film.title, language.name FROM film \
             LEFT JOIN language ON film.language_id = language.language_id \
             WHERE film.rating = $1 ORDER BY film.length DESC, film.title ASC \
             LIMIT $2 FOR UPDATE OF film SKIP LOCKED"
        );
    }

    #[test]
    fn lock_wait_applies_to_latest_lock_only() {
        let qb = select("film")
            .for_share(&[])
            .finish()
            .for_update(&["film"])
            .no_wait();
        assert_eq!(
            qb.to_sql(),
            "SELECT * FROM film FOR SHARE FOR UPDATE OF film NOWAIT"
        );
    }

    #[test]
    fn count_drops_projection_order_limit_and_locks() {
        let qb = select("film")
            .select(&["title"])
            .inner_join_on("film_actor", "film_actor.film_id = film.film_id")
            .eq("film_actor.actor_id", 1i32)
            .order_by("title")
            .limit(10)
            .for_key_share(&[])
            .finish()
            .count();
        let compiled = qb.compile().unwrap();
        assert_eq!(
            compiled.sql,
            "SELECT COUNT(*) FROM film INNER JOIN film_actor ON film_actor.film_id = film.film_id \
             WHERE film_actor.actor_id = $1"
        );
        assert_eq!(compiled.params.len(), 1);
    }

    #[test]
    fn count_accepts_more_filters() {
        let qb = select("film").count().eq("rating", "G");
        assert_eq!(qb.to_sql(), "SELECT COUNT(*) FROM film WHERE rating = $1");
    }

    #[test]
    fn invalid_order_token_fails_before_io() {
        let err = select("film")
            .order_by_spec(OrderSpec::new("title").direction("SIDEWAYS"))
            .compile()
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn bad_identifiers_surface_at_compile() {
        assert!(select("film; --").compile().unwrap_err().is_validation());
        assert!(select("film").select(&["title AS t"]).compile().is_err());
        assert!(select("film").left_join("lang uage", "a", "b").compile().is_err());
        assert!(select("film").for_update(&["x y"]).finish().compile().is_err());
        assert!(select("film").select(&["bad col"]).count().compile().is_err());
    }

    #[test]
    fn compile_is_idempotent() {
        let qb = select("film").eq("film_id", 1i32).limit(1);
        let a = qb.compile().unwrap();
        let b = qb.compile().unwrap();
        assert_eq!(a.sql, b.sql);
        assert_eq!(a.params.debug_values(), b.params.debug_values());
    }
}
