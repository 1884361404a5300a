use std::fmt;

use itertools::Itertools;
use serde::Serialize;
use smallvec::SmallVec;

/// A lock as seen by one analysis run, identified by name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Lock {
    pub name: String,
    /// Path condition most recently recorded when the lock was touched.
    pub pre_condition: String,
}

impl Lock {
    pub fn new(name: impl Into<String>, pre_condition: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pre_condition: pre_condition.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AcquireOutcome {
    Acquired,
    /// The acquire cancelled an earlier unmatched release of the same lock.
    Matched,
    /// The lock was already held on this path.
    Reacquired,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReleaseOutcome {
    Released,
    /// No acquire precedes this release on the path.
    Unmatched,
    /// Unmatched, and an unmatched release of the lock was already pending.
    DoubleRelease,
}

type Locks = SmallVec<[Lock; 2]>;

/// Held locks and pending unmatched releases along one path.
///
/// `init` holds exactly when both collections are empty.
#[derive(Clone, Debug, Serialize)]
pub struct AbstractState {
    init: bool,
    held: Locks,
    pending: Locks,
}

impl Default for AbstractState {
    fn default() -> Self {
        Self::new()
    }
}

impl AbstractState {
    pub fn new() -> Self {
        Self {
            init: true,
            held: SmallVec::new(),
            pending: SmallVec::new(),
        }
    }

    pub fn is_init(&self) -> bool {
        self.init
    }

    pub fn held(&self) -> &[Lock] {
        &self.held
    }

    pub fn pending_releases(&self) -> &[Lock] {
        &self.pending
    }

    pub fn holds(&self, name: &str) -> bool {
        self.held.iter().any(|l| l.name == name)
    }

    pub fn has_pending_release(&self, name: &str) -> bool {
        self.pending.iter().any(|l| l.name == name)
    }

    pub fn add(&mut self, name: &str, pre_condition: &str) -> AcquireOutcome {
        let outcome = if let Some(pos) = self.pending.iter().position(|l| l.name == name) {
            self.pending.remove(pos);
            AcquireOutcome::Matched
        } else {
            let outcome = if self.holds(name) {
                AcquireOutcome::Reacquired
            } else {
                AcquireOutcome::Acquired
            };
            self.held.push(Lock::new(name, pre_condition));
            outcome
        };
        self.normalize();
        outcome
    }

    pub fn delete(&mut self, name: &str, pre_condition: &str) -> ReleaseOutcome {
        let outcome = if let Some(pos) = self.held.iter().position(|l| l.name == name) {
            self.held.remove(pos);
            ReleaseOutcome::Released
        } else {
            let outcome = if self.has_pending_release(name) {
                ReleaseOutcome::DoubleRelease
            } else {
                ReleaseOutcome::Unmatched
            };
            self.pending.push(Lock::new(name, pre_condition));
            outcome
        };
        self.normalize();
        outcome
    }

    /// Folds `other` into `self`: its held locks are acquired and its pending
    /// releases are applied as releases. Not commutative.
    ///
    /// Merge points do not go through here: grouping builds one fresh
    /// representative per bucket instead.
    pub fn reconcile(&mut self, other: &AbstractState) {
        for lock in &other.held {
            self.add(&lock.name, &lock.pre_condition);
        }
        let releases: Vec<Lock> = other.pending.to_vec();
        for lock in releases {
            self.delete(&lock.name, &lock.pre_condition);
        }
        self.normalize();
    }

    fn normalize(&mut self) {
        self.init = self.held.is_empty() && self.pending.is_empty();
    }

    fn sorted_names(locks: &[Lock]) -> Vec<&str> {
        locks.iter().map(|l| l.name.as_str()).sorted().collect()
    }
}

/// Compares `init` and the multisets of lock names; pre-conditions are ignored.
impl PartialEq for AbstractState {
    fn eq(&self, other: &Self) -> bool {
        self.init == other.init
            && Self::sorted_names(&self.held) == Self::sorted_names(&other.held)
            && Self::sorted_names(&self.pending) == Self::sorted_names(&other.pending)
    }
}

impl Eq for AbstractState {}

impl fmt::Display for AbstractState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.init {
            return write!(f, "init");
        }
        write!(
            f,
            "held[{}] pending[{}]",
            self.held.iter().map(|l| &l.name).join(", "),
            self.pending.iter().map(|l| &l.name).join(", ")
        )
    }
}
