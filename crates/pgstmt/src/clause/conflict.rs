//! `ON CONFLICT` clauses for INSERT.

use crate::error::{StmtError, StmtResult};
use crate::fragment::Fragment;
use crate::ident::Ident;
use crate::predicate::Predicate;
use crate::values::ValueMap;

/// What the conflict is detected on.
#[derive(Clone, Debug)]
pub enum ConflictTarget {
    /// `(a, b)`
    Columns(Vec<String>),
    /// `ON CONSTRAINT name`
    Constraint(String),
}

/// Which columns `DO UPDATE` rewrites.
#[derive(Clone, Debug)]
pub enum UpdateSet {
    /// Every inserted column, from `EXCLUDED`.
    AllInserted,
    /// The listed columns, from `EXCLUDED`.
    Columns(Vec<String>),
    /// Explicit values: `SET (a, b) = ROW($1, $2)`.
    Values(ValueMap),
}

#[derive(Clone, Debug)]
pub enum ConflictAction {
    DoNothing,
    DoUpdate(UpdateSet),
}

/// A complete `ON CONFLICT` clause.
///
/// For `DO NOTHING` the filter is the conflict target's index predicate
/// (`ON CONFLICT (a) WHERE ... DO NOTHING`); for `DO UPDATE` it becomes the trailing
/// `WHERE` of the update action.
#[derive(Clone, Debug)]
pub struct ConflictSpec {
    pub target: ConflictTarget,
    pub action: ConflictAction,
    pub filter: Predicate,
}

impl ConflictSpec {
    /// Render against the INSERT's column list (used by `UpdateSet::AllInserted`).
    pub(crate) fn to_fragment(&self, inserted: &[Ident]) -> StmtResult<Fragment> {
        let target = self.target_fragment()?;
        let filter = self.filter.compile()?;

        let action = match &self.action {
            ConflictAction::DoNothing => {
                if !filter.is_empty() && matches!(self.target, ConflictTarget::Constraint(_)) {
                    return Err(StmtError::validation(
                        "ON CONFLICT ON CONSTRAINT cannot take an index predicate",
                    ));
                }
                Fragment::seq(
                    vec![where_prefixed(filter), Fragment::literal("DO NOTHING")],
                    " ",
                )
            }
            ConflictAction::DoUpdate(set) => Fragment::seq(
                vec![
                    Fragment::literal("DO UPDATE SET"),
                    update_set(set, inserted)?,
                    where_prefixed(filter),
                ],
                " ",
            ),
        };

        Ok(Fragment::seq(
            vec![Fragment::literal("ON CONFLICT"), target, action],
            " ",
        ))
    }

    fn target_fragment(&self) -> StmtResult<Fragment> {
        match &self.target {
            ConflictTarget::Columns(columns) => {
                if columns.is_empty() {
                    return Err(StmtError::validation(
                        "ON CONFLICT requires at least one target column",
                    ));
                }
                let idents = columns
                    .iter()
                    .map(|c| Ident::parse(c).map(Fragment::ident))
                    .collect::<StmtResult<Vec<_>>>()?;
                Ok(Fragment::parens(Fragment::seq(idents, ", ")))
            }
            ConflictTarget::Constraint(name) => {
                let name = Ident::parse(name).map_err(|e| {
                    StmtError::validation(format!("ON CONFLICT ON CONSTRAINT: {e}"))
                })?;
                Ok(Fragment::concat(vec![
                    Fragment::literal("ON CONSTRAINT "),
                    Fragment::ident(name),
                ]))
            }
        }
    }
}

fn where_prefixed(body: Fragment) -> Fragment {
    if body.is_empty() {
        return body;
    }
    Fragment::concat(vec![Fragment::literal("WHERE "), body])
}

/// `col = EXCLUDED.col` for one column; the target is always the unqualified name.
fn excluded_assignment(column: &Ident) -> Fragment {
    let name = column.last();
    Fragment::concat(vec![
        Fragment::ident(name.clone()),
        Fragment::literal(" = EXCLUDED."),
        Fragment::ident(name),
    ])
}

fn update_set(set: &UpdateSet, inserted: &[Ident]) -> StmtResult<Fragment> {
    let assignments = match set {
        UpdateSet::AllInserted => inserted.iter().map(excluded_assignment).collect::<Vec<_>>(),
        UpdateSet::Columns(columns) => columns
            .iter()
            .map(|c| Ident::parse(c).map(|ident| excluded_assignment(&ident)))
            .collect::<StmtResult<Vec<_>>>()?,
        UpdateSet::Values(values) => {
            if values.is_empty() {
                return Err(StmtError::validation(
                    "ON CONFLICT DO UPDATE requires at least one value",
                ));
            }
            let mut columns = Vec::with_capacity(values.len());
            let mut params = Vec::with_capacity(values.len());
            for (column, value) in values.iter() {
                columns.push(Fragment::ident(Ident::parse(column)?.last()));
                params.push(Fragment::param(value.clone()));
            }
            return Ok(Fragment::concat(vec![
                Fragment::parens(Fragment::seq(columns, ", ")),
                Fragment::literal(" = ROW("),
                Fragment::seq(params, ", "),
                Fragment::literal(")"),
            ]));
        }
    };

    if assignments.is_empty() {
        return Err(StmtError::validation(
            "ON CONFLICT DO UPDATE requires at least one column",
        ));
    }
    Ok(Fragment::seq(assignments, ", "))
}
