//! 符号状态格：锁状态 × 路径条件。
//!
//! A CFG edge carries a [`StateSet`], one [`SymbolicState`] per distinct
//! (held locks, path condition) combination that reaches it.

pub mod abstract_state;
pub mod execution_state;

use std::fmt;

use itertools::Itertools;
use serde::Serialize;

pub use abstract_state::{AbstractState, AcquireOutcome, Lock, ReleaseOutcome};
pub use execution_state::{EQUALITY_MARK, ExecutionState, equality_subject};

/// One flow fact: if `execution` holds, the locks in `locks` are held.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SymbolicState {
    pub locks: AbstractState,
    pub execution: ExecutionState,
}

impl SymbolicState {
    /// No lock held, any path.
    pub fn initial() -> Self {
        Self::default()
    }

    pub fn new(locks: AbstractState, execution: ExecutionState) -> Self {
        Self { locks, execution }
    }

    /// Independent copy for a diverging path.
    pub fn fork(&self) -> Self {
        self.clone()
    }
}

impl fmt::Display for SymbolicState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} | {}>", self.locks, self.execution)
    }
}

/// Flow facts of one edge, free of structural duplicates.
#[derive(Clone, Debug, Default, Serialize)]
pub struct StateSet {
    states: Vec<SymbolicState>,
}

impl StateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(state: SymbolicState) -> Self {
        Self {
            states: vec![state],
        }
    }

    /// Adds `state` unless an equal one is present.
    pub fn insert(&mut self, state: SymbolicState) -> bool {
        if self.contains(&state) {
            return false;
        }
        self.states.push(state);
        true
    }

    pub fn contains(&self, state: &SymbolicState) -> bool {
        self.states.iter().any(|s| s == state)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SymbolicState> {
        self.states.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, SymbolicState> {
        self.states.iter_mut()
    }

    pub fn extend_from(&mut self, other: &StateSet) {
        for state in other.iter() {
            self.insert(state.clone());
        }
    }

    /// Whether replacing `old` with `self` is a change: sizes differ, or some
    /// fact of `self` has no equal in `old`.
    pub fn differs_from(&self, old: &StateSet) -> bool {
        self.len() != old.len() || self.iter().any(|s| !old.contains(s))
    }
}

/// Set equality, independent of insertion order.
impl PartialEq for StateSet {
    fn eq(&self, other: &Self) -> bool {
        !self.differs_from(other) && !other.differs_from(self)
    }
}

impl Eq for StateSet {}

impl FromIterator<SymbolicState> for StateSet {
    fn from_iter<I: IntoIterator<Item = SymbolicState>>(iter: I) -> Self {
        let mut set = StateSet::new();
        for state in iter {
            set.insert(state);
        }
        set
    }
}

impl IntoIterator for StateSet {
    type Item = SymbolicState;
    type IntoIter = std::vec::IntoIter<SymbolicState>;

    fn into_iter(self) -> Self::IntoIter {
        self.states.into_iter()
    }
}

impl<'a> IntoIterator for &'a StateSet {
    type Item = &'a SymbolicState;
    type IntoIter = std::slice::Iter<'a, SymbolicState>;

    fn into_iter(self) -> Self::IntoIter {
        self.states.iter()
    }
}

impl fmt::Display for StateSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.states.iter().join(", "))
    }
}
