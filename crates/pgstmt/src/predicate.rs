//! WHERE-style predicates.
//!
//! A [`Predicate`] is an ordered list of conditions, each tagged with the connector that
//! joins it to everything before it. Compilation folds the list left to right. When an
//! `AND` follows a prefix that contains `OR`, the prefix is parenthesized, so
//! `.eq("a", 1).or_eq("b", 2).eq("c", 3)` reads as `(a = $1 OR b = $2) AND c = $3`.
//!
//! Sentinels:
//! - `is_in(col, [])` compiles to `FALSE`, `not_in(col, [])` to `TRUE`
//! - `match_all()` compiles to `TRUE` and marks "no filtering, on purpose"
//! - an empty predicate compiles to nothing; statements decide whether that is allowed

use crate::error::{StmtError, StmtResult};
use crate::fragment::Fragment;
use crate::ident::{Ident, IntoIdent};
use crate::param::Param;
use crate::values::ValueMap;
use tokio_postgres::types::ToSql;

/// How a condition joins the conditions before it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Connector {
    And,
    Or,
}

#[derive(Clone, Debug)]
enum Condition {
    Equals(Vec<(Ident, Param)>),
    In {
        column: Ident,
        values: Vec<Param>,
        negated: bool,
    },
    Raw(Fragment),
    MatchAll,
    Nested(Predicate),
}

impl Condition {
    fn to_fragment(&self) -> Fragment {
        match self {
            Condition::Equals(pairs) => {
                let mut parts: Vec<Fragment> = pairs
                    .iter()
                    .map(|(column, value)| {
                        Fragment::concat(vec![
                            Fragment::ident(column.clone()),
                            Fragment::literal(" = "),
                            Fragment::param(value.clone()),
                        ])
                    })
                    .collect();
                match parts.len() {
                    0 => Fragment::empty(),
                    1 => parts.remove(0),
                    _ => Fragment::parens(Fragment::seq(parts, " AND ")),
                }
            }
            Condition::In {
                column,
                values,
                negated,
            } => {
                if values.is_empty() {
                    return Fragment::literal(if *negated { "TRUE" } else { "FALSE" });
                }
                Fragment::concat(vec![
                    Fragment::ident(column.clone()),
                    Fragment::literal(if *negated { " NOT IN (" } else { " IN (" }),
                    Fragment::seq(values.iter().cloned().map(Fragment::param).collect(), ", "),
                    Fragment::literal(")"),
                ])
            }
            Condition::Raw(fragment) => fragment.clone(),
            Condition::MatchAll => Fragment::literal("TRUE"),
            Condition::Nested(inner) => {
                let body = inner.to_fragment();
                if body.is_empty() {
                    body
                } else {
                    Fragment::parens(body)
                }
            }
        }
    }
}

#[derive(Clone, Debug)]
struct Entry {
    connector: Connector,
    condition: Condition,
}

/// An ordered, boolean-connected list of filter conditions.
#[derive(Clone, Debug, Default)]
pub struct Predicate {
    entries: Vec<Entry>,
    build_error: Option<String>,
}

impl Predicate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether compiling would produce no text. `match_all()` is not empty.
    pub fn is_empty(&self) -> bool {
        self.to_fragment().is_empty()
    }

    /// Fail with a validation error carrying `message` when the predicate is empty.
    pub fn require_non_empty(&self, message: &str) -> StmtResult<()> {
        if self.is_empty() {
            return Err(StmtError::validation(message));
        }
        Ok(())
    }

    /// Compile into a fragment, surfacing any identifier or template error recorded while building.
    pub fn compile(&self) -> StmtResult<Fragment> {
        if let Some(err) = &self.build_error {
            return Err(StmtError::validation(err.clone()));
        }
        Ok(self.to_fragment())
    }

    /// `WHERE <predicate>`, or nothing when empty.
    pub(crate) fn where_clause(&self) -> StmtResult<Fragment> {
        let body = self.compile()?;
        if body.is_empty() {
            return Ok(body);
        }
        Ok(Fragment::concat(vec![Fragment::literal("WHERE "), body]))
    }

    pub(crate) fn to_fragment(&self) -> Fragment {
        let mut acc: Option<Fragment> = None;
        let mut prefix_has_or = false;

        for entry in &self.entries {
            let next = entry.condition.to_fragment();
            if next.is_empty() {
                continue;
            }
            acc = Some(match acc {
                None => next,
                Some(prev) => match entry.connector {
                    Connector::And => {
                        let left = if prefix_has_or {
                            Fragment::parens(prev)
                        } else {
                            prev
                        };
                        prefix_has_or = false;
                        Fragment::seq(vec![left, next], " AND ")
                    }
                    Connector::Or => {
                        prefix_has_or = true;
                        Fragment::seq(vec![prev, next], " OR ")
                    }
                },
            });
        }

        acc.unwrap_or_else(Fragment::empty)
    }

    fn record_error(&mut self, message: String) {
        if self.build_error.is_none() {
            self.build_error = Some(message);
        }
    }

    fn resolve(&mut self, column: impl IntoIdent) -> Option<Ident> {
        match column.into_ident() {
            Ok(ident) => Some(ident),
            Err(err) => {
                self.record_error(err.to_string());
                None
            }
        }
    }

    fn push(&mut self, connector: Connector, condition: Condition) {
        self.entries.push(Entry {
            connector,
            condition,
        });
    }

    pub(crate) fn push_eq(&mut self, connector: Connector, column: impl IntoIdent, value: Param) {
        if let Some(column) = self.resolve(column) {
            self.push(connector, Condition::Equals(vec![(column, value)]));
        }
    }

    pub(crate) fn push_eq_map(&mut self, connector: Connector, map: ValueMap) {
        let mut pairs = Vec::with_capacity(map.len());
        for (column, value) in map.iter() {
            match self.resolve(column) {
                Some(ident) => pairs.push((ident, value.clone())),
                None => return,
            }
        }
        self.push(connector, Condition::Equals(pairs));
    }

    pub(crate) fn push_in(
        &mut self,
        connector: Connector,
        column: impl IntoIdent,
        values: Vec<Param>,
        negated: bool,
    ) {
        if let Some(column) = self.resolve(column) {
            self.push(
                connector,
                Condition::In {
                    column,
                    values,
                    negated,
                },
            );
        }
    }

    pub(crate) fn push_raw(&mut self, connector: Connector, sql: String) {
        self.push(connector, Condition::Raw(Fragment::raw(sql)));
    }

    pub(crate) fn push_template(&mut self, connector: Connector, sql: &str, params: Vec<Param>) {
        match template_fragment(sql, params) {
            Ok(fragment) => self.push(connector, Condition::Raw(fragment)),
            Err(message) => self.record_error(message),
        }
    }

    pub(crate) fn push_match_all(&mut self) {
        self.push(Connector::And, Condition::MatchAll);
    }

    pub(crate) fn push_nested(&mut self, connector: Connector, mut inner: Predicate) {
        if let Some(err) = inner.build_error.take() {
            self.record_error(err);
        }
        self.push(connector, Condition::Nested(inner));
    }

    /// AND `other` onto this predicate. An OR-containing `other` is kept as one group so
    /// its ORs never bind against this predicate's last condition.
    pub(crate) fn append(&mut self, mut other: Predicate) {
        if let Some(err) = other.build_error.take() {
            self.record_error(err);
        }
        if self.is_empty() {
            self.entries.append(&mut other.entries);
            return;
        }

        let has_or = other
            .entries
            .iter()
            .skip(1)
            .any(|entry| entry.connector == Connector::Or);
        if has_or {
            self.push(Connector::And, Condition::Nested(other));
            return;
        }
        for mut entry in other.entries {
            entry.connector = Connector::And;
            self.entries.push(entry);
        }
    }
}

/// Bind one parameter per `?` in `sql`. `??` is a literal `?`, for the jsonb operators.
fn template_fragment(sql: &str, params: Vec<Param>) -> Result<Fragment, String> {
    let given = params.len();
    let mut params = params.into_iter();
    let mut items = Vec::new();
    let mut chunk = String::new();
    let mut placeholders = 0;

    let mut chars = sql.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '?' {
            chunk.push(c);
            continue;
        }
        if chars.peek() == Some(&'?') {
            chars.next();
            chunk.push('?');
            continue;
        }
        placeholders += 1;
        items.push(Fragment::raw(std::mem::take(&mut chunk)));
        if let Some(param) = params.next() {
            items.push(Fragment::param(param));
        }
    }
    items.push(Fragment::raw(chunk));

    if placeholders != given {
        return Err(format!(
            "template {sql:?} has {placeholders} placeholder(s) but {given} value(s) were given"
        ));
    }
    Ok(Fragment::concat(items))
}

/// Filtering operations shared by [`Predicate`] and every statement that carries one.
///
/// Column arguments are validated as identifiers; a bad name is reported when the
/// statement compiles.
pub trait Filter: Sized {
    /// The predicate this value accumulates into.
    fn predicate_mut(&mut self) -> &mut Predicate;

    /// `column = value`, AND-connected.
    fn eq<T: ToSql + Send + Sync + 'static>(mut self, column: impl IntoIdent, value: T) -> Self {
        self.predicate_mut()
            .push_eq(Connector::And, column, Param::new(value));
        self
    }

    /// `column = value`, OR-connected.
    fn or_eq<T: ToSql + Send + Sync + 'static>(mut self, column: impl IntoIdent, value: T) -> Self {
        self.predicate_mut()
            .push_eq(Connector::Or, column, Param::new(value));
        self
    }

    /// One equality per entry, grouped as `(a = $1 AND b = $2)`.
    fn eq_map(mut self, map: ValueMap) -> Self {
        self.predicate_mut().push_eq_map(Connector::And, map);
        self
    }

    /// `column IN (...)`; an empty set compiles to `FALSE`.
    fn is_in<T, I>(mut self, column: impl IntoIdent, values: I) -> Self
    where
        T: ToSql + Send + Sync + 'static,
        I: IntoIterator<Item = T>,
    {
        let values = values.into_iter().map(Param::new).collect();
        self.predicate_mut()
            .push_in(Connector::And, column, values, false);
        self
    }

    /// OR-connected [`Filter::is_in`].
    fn or_is_in<T, I>(mut self, column: impl IntoIdent, values: I) -> Self
    where
        T: ToSql + Send + Sync + 'static,
        I: IntoIterator<Item = T>,
    {
        let values = values.into_iter().map(Param::new).collect();
        self.predicate_mut()
            .push_in(Connector::Or, column, values, false);
        self
    }

    /// `column NOT IN (...)`; an empty set compiles to `TRUE`.
    fn not_in<T, I>(mut self, column: impl IntoIdent, values: I) -> Self
    where
        T: ToSql + Send + Sync + 'static,
        I: IntoIterator<Item = T>,
    {
        let values = values.into_iter().map(Param::new).collect();
        self.predicate_mut()
            .push_in(Connector::And, column, values, true);
        self
    }

    /// Raw condition, emitted verbatim. Never pass user input here.
    fn raw(mut self, sql: impl Into<String>) -> Self {
        self.predicate_mut().push_raw(Connector::And, sql.into());
        self
    }

    /// OR-connected [`Filter::raw`].
    fn or_raw(mut self, sql: impl Into<String>) -> Self {
        self.predicate_mut().push_raw(Connector::Or, sql.into());
        self
    }

    /// Raw condition with `?` placeholders, bound to `params` in order.
    ///
    /// Write `??` for a literal `?`, e.g. the jsonb `??`, `??|` and `??&` operators or a
    /// `'??'` string literal.
    fn template(mut self, sql: &str, params: Vec<Param>) -> Self {
        self.predicate_mut()
            .push_template(Connector::And, sql, params);
        self
    }

    /// Match every row (`TRUE`). Lets UPDATE and DELETE run without other conditions.
    fn match_all(mut self) -> Self {
        self.predicate_mut().push_match_all();
        self
    }

    /// Build a parenthesized group on a fresh predicate and AND it in.
    fn nest(mut self, build: impl FnOnce(Predicate) -> Predicate) -> Self {
        let inner = build(Predicate::new());
        self.predicate_mut().push_nested(Connector::And, inner);
        self
    }

    /// OR-connected [`Filter::nest`].
    fn or_nest(mut self, build: impl FnOnce(Predicate) -> Predicate) -> Self {
        let inner = build(Predicate::new());
        self.predicate_mut().push_nested(Connector::Or, inner);
        self
    }

    /// AND another predicate onto this one. OR-containing predicates stay grouped.
    fn merge(mut self, other: Predicate) -> Self {
        self.predicate_mut().append(other);
        self
    }
}

impl Filter for Predicate {
    fn predicate_mut(&mut self) -> &mut Predicate {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(p: &Predicate) -> (String, Vec<String>) {
        let compiled = p.compile().unwrap().serialize();
        (compiled.sql, compiled.params.debug_values())
    }

    #[test]
    fn empty_predicate_renders_nothing() {
        let p = Predicate::new();
        assert!(p.is_empty());
        assert_eq!(render(&p).0, "");
        let err = p.require_non_empty("no WHERE conditions").unwrap_err();
        assert_eq!(err.to_string(), "Validation error: no WHERE conditions");
    }

    #[test]
    fn and_chain() {
        let p = Predicate::new().eq("film_id", 1i32).eq("title", "ACE");
        assert_eq!(
            render(&p),
            ("film_id = $1 AND title = $2".to_string(), vec!["1".into(), "\"ACE\"".into()])
        );
    }

    #[test]
    fn eq_map_groups_columns() {
        let p = Predicate::new().eq_map(ValueMap::new().set("a", 1i32).set("b", 2i32));
        assert_eq!(render(&p).0, "(a = $1 AND b = $2)");
        let single = Predicate::new().eq_map(ValueMap::new().set("a", 1i32));
        assert_eq!(render(&single).0, "a = $1");
        assert!(Predicate::new().eq_map(ValueMap::new()).is_empty());
    }

    #[test]
    fn empty_in_is_false_constant() {
        let p = Predicate::new().is_in("film_id", Vec::<i32>::new());
        assert_eq!(render(&p), ("FALSE".to_string(), vec![]));
        let n = Predicate::new().not_in("film_id", Vec::<i32>::new());
        assert_eq!(render(&n).0, "TRUE");
    }

    #[test]
    fn in_list_binds_each_value() {
        let p = Predicate::new()
            .eq("rating", "PG")
            .is_in("film_id", [1i32, 2, 3]);
        assert_eq!(
            render(&p).0,
            "rating = $1 AND film_id IN ($2, $3, $4)"
        );
        let n = Predicate::new().not_in("film_id", [9i32]);
        assert_eq!(render(&n).0, "film_id NOT IN ($1)");
    }

    #[test]
    fn match_all_is_true_and_not_empty() {
        let p = Predicate::new().match_all();
        assert!(!p.is_empty());
        assert_eq!(render(&p).0, "TRUE");
        assert!(p.require_non_empty("no WHERE conditions").is_ok());
    }

    #[test]
    fn or_prefix_is_parenthesized_before_and() {
        let p = Predicate::new()
            .eq("a", 1i32)
            .or_eq("b", 2i32)
            .eq("c", 3i32);
        assert_eq!(render(&p).0, "(a = $1 OR b = $2) AND c = $3");

        let q = Predicate::new().eq("a", 1i32).or_eq("b", 2i32).or_eq("c", 3i32);
        assert_eq!(render(&q).0, "a = $1 OR b = $2 OR c = $3");
    }

    #[test]
    fn nest_keeps_inner_structure() {
        let p = Predicate::new()
            .eq("store_id", 1i32)
            .nest(|g| g.eq("rating", "PG").or_eq("rating", "G"));
        assert_eq!(
            render(&p).0,
            "store_id = $1 AND (rating = $2 OR rating = $3)"
        );

        let o = Predicate::new()
            .eq("a", 1i32)
            .or_nest(|g| g.eq("b", 2i32).eq("c", 3i32));
        assert_eq!(render(&o).0, "a = $1 OR (b = $2 AND c = $3)");
    }

    #[test]
    fn empty_nested_group_is_skipped() {
        let p = Predicate::new().eq("a", 1i32).nest(|g| g);
        assert_eq!(render(&p).0, "a = $1");
        assert!(Predicate::new().nest(|g| g).is_empty());
    }

    #[test]
    fn merge_is_and_of_both_with_params_in_order() {
        let p = Predicate::new().eq("a", 1i32).is_in("b", [2i32, 3]);
        let q = Predicate::new().eq("c", 4i32).raw("d IS NULL");

        let (p_sql, p_params) = render(&p);
        let (q_sql, q_params) = render(&q);
        let (m_sql, m_params) = render(&p.clone().merge(q));

        assert_eq!(m_sql, "a = $1 AND b IN ($2, $3) AND c = $4 AND d IS NULL");
        assert_eq!(
            m_sql,
            format!("{p_sql} AND {}", q_sql.replace("$1", "$4"))
        );
        assert_eq!(m_params, [p_params, q_params].concat());
    }

    #[test]
    fn merge_groups_or_containing_predicate() {
        let p = Predicate::new().eq("store_id", 1i32);
        let q = Predicate::new().eq("rating", "PG").or_eq("rating", "G");

        let (sql, params) = render(&p.merge(q));
        assert_eq!(sql, "store_id = $1 AND (rating = $2 OR rating = $3)");
        assert_eq!(params, ["1", "\"PG\"", "\"G\""]);
    }

    #[test]
    fn merge_never_turns_leading_or_into_or() {
        let p = Predicate::new().eq("store_id", 1i32);
        let q = Predicate::new().or_eq("rating", "G");
        assert_eq!(render(&p.merge(q)).0, "store_id = $1 AND rating = $2");

        let p = Predicate::new().eq("a", 1i32).or_eq("b", 2i32);
        let q = Predicate::new().or_eq("c", 3i32).or_eq("d", 4i32);
        assert_eq!(render(&p.merge(q)).0, "(a = $1 OR b = $2) AND (c = $3 OR d = $4)");
    }

    #[test]
    fn merge_into_empty_is_identity() {
        let q = Predicate::new().eq("c", 4i32);
        assert_eq!(render(&Predicate::new().merge(q.clone())), render(&q));
    }

    #[test]
    fn template_binds_placeholders() {
        let p = Predicate::new()
            .eq("a", 1i32)
            .template("length > ? AND length < ?", vec![Param::new(60i16), Param::new(90i16)]);
        assert_eq!(
            render(&p),
            (
                "a = $1 AND length > $2 AND length < $3".to_string(),
                vec!["1".into(), "60".into(), "90".into()]
            )
        );
    }

    #[test]
    fn template_escapes_literal_question_marks() {
        let p = Predicate::new()
            .template("meta ?? ?", vec![Param::new("rating")])
            .template("tags ??| ? AND note <> '??'", vec![Param::new(vec!["a", "b"])]);
        assert_eq!(
            render(&p).0,
            "meta ? $1 AND tags ?| $2 AND note <> '?'"
        );
        assert!(Predicate::new().template("meta ?? 'x'", vec![]).compile().is_ok());
        assert!(Predicate::new().template("meta ?? 'x'", vec![Param::new(1i32)]).compile().is_err());
    }

    #[test]
    fn template_arity_mismatch_fails_at_compile() {
        let p = Predicate::new().template("x = ? OR y = ?", vec![Param::new(1i32)]);
        let err = p.compile().unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("2 placeholder(s)"));
    }

    #[test]
    fn bad_column_name_fails_at_compile() {
        let p = Predicate::new().eq("title; DROP TABLE film", "x");
        assert!(p.compile().unwrap_err().is_validation());

        let nested = Predicate::new().nest(|g| g.eq("bad name", 1i32));
        assert!(nested.compile().is_err());
    }

    #[test]
    fn compile_is_idempotent() {
        let p = Predicate::new().eq("a", 1i32).or_eq("b", 2i32);
        assert_eq!(render(&p), render(&p));
    }
}
