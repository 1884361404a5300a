use std::collections::BTreeMap;
use std::fmt;

use itertools::Itertools;
use serde::Serialize;

/// Marker of equality predicates such as `%x==3`.
pub const EQUALITY_MARK: &str = "==";

/// Subject of an equality predicate (`%x` for `%x==3`), `None` for plain predicates.
pub fn equality_subject(name: &str) -> Option<&str> {
    name.find(EQUALITY_MARK).map(|pos| &name[..pos])
}

/// Path condition of a flow fact.
///
/// `all` is the top element (any path), `none` the bottom (no path). With a
/// non-empty constraint map both flags are false.
#[derive(Clone, Debug, Serialize)]
pub struct ExecutionState {
    all: bool,
    none: bool,
    conditions: BTreeMap<String, bool>,
    last_condition: String,
}

impl Default for ExecutionState {
    fn default() -> Self {
        Self::unconstrained()
    }
}

impl ExecutionState {
    pub fn unconstrained() -> Self {
        Self {
            all: true,
            none: false,
            conditions: BTreeMap::new(),
            last_condition: String::new(),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            all: false,
            none: true,
            ..Self::unconstrained()
        }
    }

    pub fn is_all(&self) -> bool {
        self.all
    }

    pub fn is_none(&self) -> bool {
        self.none
    }

    pub fn conditions(&self) -> &BTreeMap<String, bool> {
        &self.conditions
    }

    pub fn get(&self, name: &str) -> Option<bool> {
        self.conditions.get(name).copied()
    }

    /// The predicate most recently added along this path.
    pub fn last_condition(&self) -> &str {
        &self.last_condition
    }

    /// Records `name == value` for this path.
    ///
    /// Returns false, leaving the state untouched, when the path already
    /// records the opposite value. For an equality predicate whose subject is
    /// already fixed by another equality, the update is a no-op; it fails only
    /// when both claim to hold.
    pub fn update(&mut self, name: &str, value: bool) -> bool {
        if let Some(existing) = self.get(name) {
            return existing == value;
        }
        if let Some(subject) = equality_subject(name) {
            let sibling = self
                .conditions
                .iter()
                .find(|(key, _)| equality_subject(key) == Some(subject));
            if let Some((_, &fixed)) = sibling {
                return !(fixed && value);
            }
        }
        self.insert(name, value);
        true
    }

    fn insert(&mut self, name: &str, value: bool) {
        self.conditions.insert(name.to_string(), value);
        self.all = false;
        self.none = false;
        self.last_condition = name.to_string();
    }

    /// Folds `other` into `self`. Top absorbs everything, bottom only itself;
    /// otherwise `other`'s constraints are applied with [`Self::update`].
    ///
    /// Grouping merges path conditions with [`Self::reconcile_constraint`]
    /// instead, which drops contradictions rather than rejecting them.
    pub fn reconcile(&mut self, other: &ExecutionState) {
        self.all |= other.all;
        self.none &= other.none;
        if self.all {
            self.none = false;
            self.conditions.clear();
            return;
        }
        if self.none {
            self.conditions.clear();
            return;
        }
        for (name, value) in &other.conditions {
            self.update(name, *value);
        }
    }

    /// Inserts a constraint while merging facts. A constraint already present
    /// with the other value is dropped instead; dropping the last one widens
    /// the state to top.
    pub fn reconcile_constraint(&mut self, name: &str, value: bool) {
        match self.get(name) {
            Some(existing) if existing != value => {
                self.conditions.remove(name);
                if self.conditions.is_empty() {
                    self.all = true;
                    self.none = false;
                }
            }
            Some(_) => {}
            None => self.insert(name, value),
        }
    }
}

/// Compares the flags and the constraint maps; `last_condition` is ignored.
impl PartialEq for ExecutionState {
    fn eq(&self, other: &Self) -> bool {
        if self.all != other.all || self.none != other.none {
            return false;
        }
        if self.all || self.none {
            return true;
        }
        self.conditions == other.conditions
    }
}

impl Eq for ExecutionState {}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.all {
            return write!(f, "all");
        }
        if self.none {
            return write!(f, "none");
        }
        write!(
            f,
            "{{{}}}",
            self.conditions
                .iter()
                .map(|(name, value)| if *value {
                    name.clone()
                } else {
                    format!("!{}", name)
                })
                .join(" && ")
        )
    }
}
