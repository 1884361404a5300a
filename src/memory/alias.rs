//! Three-valued alias queries over function-scoped values.
//!
//! The analysis never computes points-to information itself. It asks an
//! [`AliasOracle`] whether two lock operands denote the same lock and
//! compares the answer against a configured threshold.

use serde::{Deserialize, Serialize};

use crate::ir::{Operand, Program};
use crate::util::FuncId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AliasKind {
    #[serde(alias = "unrelated")]
    No,
    May,
    Must,
}

impl AliasKind {
    /// Whether this answer is strong enough for `threshold`. `No` never is.
    pub fn satisfies(self, threshold: AliasKind) -> bool {
        self != AliasKind::No && self >= threshold
    }
}

/// A value together with the function it lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AliasId {
    pub func: FuncId,
    pub value: Operand,
}

impl AliasId {
    pub fn new(func: FuncId, value: Operand) -> Self {
        Self { func, value }
    }

    /// Scope and textual name. Globals are unscoped.
    pub fn scoped_name(&self, program: &Program) -> (Option<String>, String) {
        let name = program.value_name(self.func, self.value);
        match self.value {
            Operand::Global(_) => (None, name),
            _ => (Some(program.function(self.func).name.clone()), name),
        }
    }
}

pub trait AliasOracle {
    fn alias(&self, program: &Program, a: AliasId, b: AliasId) -> AliasKind;

    fn is_alias(&self, program: &Program, a: AliasId, b: AliasId, threshold: AliasKind) -> bool {
        self.alias(program, a, b).satisfies(threshold)
    }
}

/// Values alias exactly when they carry the same name in the same scope.
#[derive(Debug, Default, Clone, Copy)]
pub struct NameAlias;

impl AliasOracle for NameAlias {
    fn alias(&self, program: &Program, a: AliasId, b: AliasId) -> AliasKind {
        if a.value.is_const() || b.value.is_const() {
            return AliasKind::No;
        }
        if a == b || a.scoped_name(program) == b.scoped_name(program) {
            AliasKind::Must
        } else {
            AliasKind::No
        }
    }
}

/// Treats every pair of locks as the same lock.
#[derive(Debug, Default, Clone, Copy)]
pub struct UniversalAlias;

impl AliasOracle for UniversalAlias {
    fn alias(&self, _program: &Program, _a: AliasId, _b: AliasId) -> AliasKind {
        AliasKind::Must
    }
}
