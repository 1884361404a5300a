//! 状态分组：把一条边上的事实集合压缩为每种锁状态一个代表。
//!
//! Facts are bucketed by lock state: one bucket for facts holding nothing,
//! one per held lock name, and one per pending-release name for facts that
//! only carry unmatched releases. Each bucket yields a single representative
//! whose path condition merges the contributors' conditions.

use std::collections::{BTreeMap, BTreeSet};
use std::collections::btree_map::Entry;

use indexmap::{IndexMap, IndexSet};

use crate::analysis::state::{
    AbstractState, ExecutionState, StateSet, SymbolicState, equality_subject,
};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum Bucket {
    Init,
    Held(String),
    Pending(String),
}

pub fn group(states: StateSet) -> StateSet {
    if states.len() <= 1 {
        return states;
    }
    let mut buckets: IndexMap<Bucket, Vec<&SymbolicState>> = IndexMap::new();
    for state in &states {
        if state.locks.is_init() {
            buckets.entry(Bucket::Init).or_default().push(state);
            continue;
        }
        let held: IndexSet<&str> = state.locks.held().iter().map(|l| l.name.as_str()).collect();
        let keys: Vec<Bucket> = if held.is_empty() {
            let pending: IndexSet<&str> = state
                .locks
                .pending_releases()
                .iter()
                .map(|l| l.name.as_str())
                .collect();
            pending
                .into_iter()
                .map(|name| Bucket::Pending(name.to_string()))
                .collect()
        } else {
            held.into_iter()
                .map(|name| Bucket::Held(name.to_string()))
                .collect()
        };
        for key in keys {
            buckets.entry(key).or_default().push(state);
        }
    }
    buckets
        .iter()
        .map(|(bucket, members)| representative(bucket, members))
        .collect()
}

fn representative(bucket: &Bucket, members: &[&SymbolicState]) -> SymbolicState {
    let mut locks = AbstractState::new();
    match bucket {
        Bucket::Init => {}
        Bucket::Held(name) => {
            let pre = members
                .iter()
                .flat_map(|s| s.locks.held())
                .find(|l| &l.name == name)
                .map(|l| l.pre_condition.clone())
                .unwrap_or_default();
            locks.add(name, &pre);
        }
        Bucket::Pending(name) => {
            let pre = members
                .iter()
                .flat_map(|s| s.locks.pending_releases())
                .find(|l| &l.name == name)
                .map(|l| l.pre_condition.clone())
                .unwrap_or_default();
            locks.delete(name, &pre);
        }
    }
    let paths: Vec<&ExecutionState> = members.iter().map(|s| &s.execution).collect();
    SymbolicState::new(locks, merge_paths(&paths))
}

/// Path condition shared by a bucket.
///
/// Any unconstrained contributor makes the result unconstrained. Otherwise
/// plain predicates are merged with the larger of the true/false groups
/// inserted first, so on a conflict the minority side is what gets dropped.
/// Equality predicates survive only when every contributor that mentions
/// the subject agrees on the exact predicate and value.
pub fn merge_paths(paths: &[&ExecutionState]) -> ExecutionState {
    if paths.iter().any(|p| p.is_all()) {
        return ExecutionState::unconstrained();
    }
    if paths.iter().all(|p| p.is_none()) {
        return ExecutionState::unreachable();
    }

    let mut trues = BTreeSet::new();
    let mut falses = BTreeSet::new();
    let mut equalities: BTreeMap<&str, Option<(&str, bool)>> = BTreeMap::new();
    for path in paths.iter().filter(|p| !p.is_none()) {
        for (name, &value) in path.conditions() {
            if let Some(subject) = equality_subject(name) {
                match equalities.entry(subject) {
                    Entry::Vacant(slot) => {
                        slot.insert(Some((name.as_str(), value)));
                    }
                    Entry::Occupied(mut slot) => {
                        if *slot.get() != Some((name.as_str(), value)) {
                            slot.insert(None);
                        }
                    }
                }
            } else if value {
                trues.insert(name.as_str());
            } else {
                falses.insert(name.as_str());
            }
        }
    }

    let mut merged = ExecutionState::unconstrained();
    let (major, minor) = if trues.len() > falses.len() {
        ((trues, true), (falses, false))
    } else {
        ((falses, false), (trues, true))
    };
    for (names, value) in [major, minor] {
        for name in names {
            merged.reconcile_constraint(name, value);
        }
    }
    for (name, value) in equalities.into_values().flatten() {
        merged.reconcile_constraint(name, value);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_path(mut state: SymbolicState, conditions: &[(&str, bool)]) -> SymbolicState {
        for (name, value) in conditions {
            state.execution.update(name, *value);
        }
        state
    }

    fn holding(name: &str) -> SymbolicState {
        let mut state = SymbolicState::initial();
        state.locks.add(name, "");
        state
    }

    #[test]
    fn small_sets_pass_through() {
        let set = StateSet::single(with_path(holding("@m"), &[("%c", true)]));
        assert_eq!(group(set.clone()), set);
    }

    #[test]
    fn one_representative_per_lock_state() {
        let set: StateSet = [
            with_path(SymbolicState::initial(), &[("%a", true)]),
            with_path(SymbolicState::initial(), &[("%a", false)]),
            with_path(holding("@m"), &[("%b", true)]),
            with_path(holding("@m"), &[("%b", true), ("%c", false)]),
        ]
        .into_iter()
        .collect();
        let grouped = group(set);
        assert_eq!(grouped.len(), 2);

        let init = grouped.iter().find(|s| s.locks.is_init()).unwrap();
        // %a=true and %a=false cancel out.
        assert!(init.execution.is_all());
        let held = grouped.iter().find(|s| s.locks.holds("@m")).unwrap();
        assert_eq!(held.execution.get("%b"), Some(true));
        assert_eq!(held.execution.get("%c"), Some(false));
    }

    #[test]
    fn unconstrained_contributor_wins_per_bucket() {
        let set: StateSet = [
            SymbolicState::initial(),
            with_path(SymbolicState::initial(), &[("%a", true)]),
            with_path(holding("@m"), &[("%b", true)]),
        ]
        .into_iter()
        .collect();
        let grouped = group(set);
        let init = grouped.iter().find(|s| s.locks.is_init()).unwrap();
        assert!(init.execution.is_all());
        // The top from the init bucket does not leak into the lock bucket.
        let held = grouped.iter().find(|s| s.locks.holds("@m")).unwrap();
        assert_eq!(held.execution.get("%b"), Some(true));
    }

    #[test]
    fn pending_releases_survive() {
        let mut released = SymbolicState::initial();
        released.locks.delete("@m", "");
        let set: StateSet = [SymbolicState::initial(), with_path(released, &[("%x", true)])]
            .into_iter()
            .collect();
        let grouped = group(set);
        assert_eq!(grouped.len(), 2);
        assert!(grouped.iter().any(|s| s.locks.has_pending_release("@m")));
    }

    #[test]
    fn equalities_merge_by_exact_value() {
        let set: StateSet = [
            with_path(SymbolicState::initial(), &[("%s==1", true), ("%t==2", true)]),
            with_path(SymbolicState::initial(), &[("%s==1", true), ("%t==3", true), ("%u", true)]),
        ]
        .into_iter()
        .collect();
        let grouped = group(set);
        let state = grouped.iter().next().unwrap();
        assert_eq!(state.execution.get("%s==1"), Some(true));
        assert_eq!(state.execution.get("%t==2"), None);
        assert_eq!(state.execution.get("%t==3"), None);
    }

    #[test]
    fn grouping_is_idempotent() {
        let set: StateSet = [
            with_path(SymbolicState::initial(), &[("%a", true), ("%b", false)]),
            with_path(holding("@m"), &[("%a", false)]),
            with_path(holding("@m"), &[("%c", true)]),
        ]
        .into_iter()
        .collect();
        let once = group(set);
        let twice = group(once.clone());
        assert_eq!(once, twice);
    }
}
