//! Def-use bookkeeping for one function: which value each instruction is
//! derived from (its parent) and which instructions use each result.

use std::collections::HashSet;

use crate::ir::{Function, InstKind, Operand};
use crate::util::{IndexVec, InstId};

#[derive(Eq, PartialEq, Clone, Copy, Debug)]
pub enum DefUse {
    /// The instruction's result is derived from this operand.
    Def,
    /// The operand is only read.
    Use,
}

/// How `kind` relates to its operand at `position`.
pub fn categorize(kind: &InstKind, position: usize) -> DefUse {
    match kind {
        InstKind::Other { .. } if position == 0 => DefUse::Def,
        InstKind::Cmp { lhs, .. } => {
            let derived = if lhs.is_const() { 1 } else { 0 };
            if position == derived {
                DefUse::Def
            } else {
                DefUse::Use
            }
        }
        _ => DefUse::Use,
    }
}

/// Parent links and use counts, built once per analyzed function.
#[derive(Debug, Clone)]
pub struct DefUseChains {
    parents: IndexVec<InstId, Option<Operand>>,
    uses: IndexVec<InstId, usize>,
}

impl DefUseChains {
    pub fn new(func: &Function) -> Self {
        let mut parents = IndexVec::from_elem(None, func.insts.len());
        let mut uses = IndexVec::from_elem(0usize, func.insts.len());
        for (id, inst) in func.insts.iter_enumerated() {
            for (position, operand) in inst.kind.operands().into_iter().enumerate() {
                if let Operand::Inst(def) = operand {
                    uses[def] += 1;
                }
                if parents[id].is_none() && categorize(&inst.kind, position) == DefUse::Def {
                    parents[id] = Some(operand);
                }
            }
        }
        Self { parents, uses }
    }

    pub fn parent(&self, inst: InstId) -> Option<Operand> {
        self.parents.get(inst).copied().flatten()
    }

    /// Follows parent links from `operand` to the value it ultimately derives from.
    pub fn root(&self, operand: Operand) -> Operand {
        let mut cur = operand;
        let mut seen = HashSet::new();
        while let Operand::Inst(id) = cur {
            if !seen.insert(id) {
                break;
            }
            match self.parent(id) {
                Some(parent) => cur = parent,
                None => break,
            }
        }
        cur
    }

    pub fn use_count(&self, inst: InstId) -> usize {
        self.uses.get(inst).copied().unwrap_or(0)
    }

    pub fn has_uses(&self, inst: InstId) -> bool {
        self.use_count(inst) > 0
    }
}
