//! Pairs acquires with the releases that follow them and classifies each
//! pair by how control flow relates the two calls.

use std::collections::HashSet;
use std::fmt;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::analysis::controldep::ControlDependence;
use crate::analysis::executor::FunctionContext;
use crate::concurrency::locks::LockOp;
use crate::ir::{InstKind, Operand};
use crate::memory::AliasId;
use crate::util::{BlockId, InstId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LockPattern {
    /// Acquire and release run under the same control conditions.
    Direct,
    /// Both calls sit under tests of the same value.
    IfGuarded,
    /// The release depends on a test of the acquire's result.
    TestBeforeUse,
    Other,
}

impl fmt::Display for LockPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            LockPattern::Direct => "direct",
            LockPattern::IfGuarded => "if-guarded",
            LockPattern::TestBeforeUse => "test-before-use",
            LockPattern::Other => "other",
        };
        write!(f, "{}", text)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LockPair {
    pub acquire: InstId,
    pub release: InstId,
}

fn site_op(ctx: &FunctionContext<'_>, inst: InstId, lock: AliasId) -> Option<LockOp> {
    ctx.sites
        .get(&inst)?
        .iter()
        .find(|site| ctx.site_matches(site, lock))
        .map(|site| site.op)
}

/// Acquires of `lock` paired with the first release reached after them.
///
/// Blocks are walked depth first, remembering the last unmatched acquire
/// along the current path. An acquire is paired at most once.
pub fn find_pairs(ctx: &FunctionContext<'_>, lock: AliasId) -> Vec<LockPair> {
    let func = ctx.func;
    let Some(entry) = func.entry_block() else {
        return Vec::new();
    };
    let mut pairs = IndexSet::new();
    let mut matched = HashSet::new();
    let mut visited = HashSet::new();
    let mut stack: Vec<(BlockId, Option<InstId>)> = vec![(entry, None)];

    while let Some((bb, mut last)) = stack.pop() {
        if !visited.insert((bb, last)) {
            continue;
        }
        for &inst in &func.blocks[bb].insts {
            match site_op(ctx, inst, lock) {
                Some(LockOp::Acquire) => last = Some(inst),
                Some(LockOp::Release) => {
                    if let Some(acquire) = last.take() {
                        if matched.insert(acquire) {
                            pairs.insert(LockPair {
                                acquire,
                                release: inst,
                            });
                        }
                    }
                }
                None => {}
            }
        }
        for succ in func.block_successors(bb).into_iter().rev() {
            stack.push((succ, last));
        }
    }
    pairs.into_iter().collect()
}

/// Value the branch ending `bb` ultimately tests.
fn branch_root(ctx: &FunctionContext<'_>, bb: BlockId) -> Option<Operand> {
    let term = ctx.func.terminator(bb)?;
    match ctx.func.inst(term).kind {
        InstKind::CondBr { cond, .. } => Some(ctx.chains.root(cond)),
        InstKind::Switch { value, .. } => Some(ctx.chains.root(value)),
        _ => None,
    }
}

pub fn classify(ctx: &FunctionContext<'_>, cdg: &ControlDependence, pair: LockPair) -> LockPattern {
    let acquire_bb = ctx.func.block_of(pair.acquire);
    let release_bb = ctx.func.block_of(pair.release);
    if acquire_bb == release_bb {
        return LockPattern::Direct;
    }
    let acquire_dep = cdg.dependence(acquire_bb);
    let release_dep = cdg.dependence(release_bb);
    if acquire_dep == release_dep {
        return LockPattern::Direct;
    }
    let tested = ctx.chains.has_uses(pair.acquire);
    match (acquire_dep, release_dep) {
        (None, Some(_)) if tested => LockPattern::TestBeforeUse,
        (None, Some(_)) => LockPattern::Direct,
        (Some(_), None) => LockPattern::Other,
        (Some(a), Some(r)) => {
            let guard = branch_root(ctx, a);
            if guard.is_some() && guard == branch_root(ctx, r) {
                LockPattern::IfGuarded
            } else if tested {
                LockPattern::TestBeforeUse
            } else {
                LockPattern::Other
            }
        }
        (None, None) => LockPattern::Direct,
    }
}
