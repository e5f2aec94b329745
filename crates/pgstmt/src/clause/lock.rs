//! Row-locking clauses (`FOR UPDATE`, `FOR SHARE`, ...).

use crate::fragment::Fragment;
use crate::ident::Ident;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockMode {
    Update,
    NoKeyUpdate,
    Share,
    KeyShare,
}

impl LockMode {
    fn keyword(self) -> &'static str {
        match self {
            LockMode::Update => "FOR UPDATE",
            LockMode::NoKeyUpdate => "FOR NO KEY UPDATE",
            LockMode::Share => "FOR SHARE",
            LockMode::KeyShare => "FOR KEY SHARE",
        }
    }
}

/// What to do when a row is already locked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WaitPolicy {
    #[default]
    Wait,
    NoWait,
    SkipLocked,
}

#[derive(Clone, Debug)]
pub struct LockSpec {
    pub mode: LockMode,
    pub of: Vec<Ident>,
    pub wait: WaitPolicy,
}

impl LockSpec {
    pub fn new(mode: LockMode) -> Self {
        Self {
            mode,
            of: Vec::new(),
            wait: WaitPolicy::Wait,
        }
    }

    pub(crate) fn to_fragment(&self) -> Fragment {
        let of = if self.of.is_empty() {
            Fragment::empty()
        } else {
            Fragment::concat(vec![
                Fragment::literal("OF "),
                Fragment::seq(self.of.iter().cloned().map(Fragment::ident).collect(), ", "),
            ])
        };
        let wait = match self.wait {
            WaitPolicy::Wait => Fragment::empty(),
            WaitPolicy::NoWait => Fragment::literal("NOWAIT"),
            WaitPolicy::SkipLocked => Fragment::literal("SKIP LOCKED"),
        };
        Fragment::seq(vec![Fragment::literal(self.mode.keyword()), of, wait], " ")
    }
}

pub(crate) fn compile_locks(locks: &[LockSpec]) -> Fragment {
    Fragment::seq(locks.iter().map(LockSpec::to_fragment).collect(), " ")
}
