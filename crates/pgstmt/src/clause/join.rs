//! JOIN clauses. Joins are emitted in the order they were added; no join-graph checks.

use crate::fragment::Fragment;
use crate::ident::Ident;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinKind {
    Left,
    Inner,
}

impl JoinKind {
    fn keyword(self) -> &'static str {
        match self {
            JoinKind::Left => "LEFT JOIN ",
            JoinKind::Inner => "INNER JOIN ",
        }
    }
}

#[derive(Clone, Debug)]
pub enum JoinCondition {
    /// `a = b`
    Columns(Ident, Ident),
    /// Caller-supplied condition, emitted verbatim.
    Raw(String),
}

#[derive(Clone, Debug)]
pub struct JoinSpec {
    pub kind: JoinKind,
    pub table: Ident,
    pub condition: JoinCondition,
}

impl JoinSpec {
    pub(crate) fn to_fragment(&self) -> Fragment {
        let condition = match &self.condition {
            JoinCondition::Columns(a, b) => Fragment::concat(vec![
                Fragment::ident(a.clone()),
                Fragment::literal(" = "),
                Fragment::ident(b.clone()),
            ]),
            JoinCondition::Raw(sql) => Fragment::raw(sql.clone()),
        };
        Fragment::concat(vec![
            Fragment::literal(self.kind.keyword()),
            Fragment::ident(self.table.clone()),
            Fragment::literal(" ON "),
            condition,
        ])
    }
}

pub(crate) fn compile_joins(joins: &[JoinSpec]) -> Fragment {
    Fragment::seq(joins.iter().map(JoinSpec::to_fragment).collect(), " ")
}
