//! 控制依赖图：每个基本块映射到控制其是否执行的最近分支块。
//!
//! A depth-first walk from the entry visits every CFG edge `parent -> child`.
//! When `child` is not the immediate post-dominator of `parent`, the branch
//! at the end of `parent` decides whether `child` runs. Otherwise `child`
//! inherits whatever controls `parent`. `None` means the block depends only
//! on function entry.

use std::collections::HashSet;

use indexmap::IndexMap;
use petgraph::visit::{Control, DfsEvent, depth_first_search};

use crate::analysis::postdom::PostDominators;
use crate::graph::BlockGraph;
use crate::util::BlockId;

#[derive(Debug, Clone, Default)]
pub struct ControlDependence {
    deps: IndexMap<BlockId, Option<BlockId>>,
}

impl ControlDependence {
    pub fn compute(graph: &BlockGraph, pdom: &PostDominators) -> Self {
        let mut cdg = Self::default();
        let Some(entry) = graph.entry() else {
            return cdg;
        };
        cdg.deps.insert(entry, None);
        depth_first_search(graph.graph(), Some(graph.node(entry)), |event| {
            if let DfsEvent::TreeEdge(u, v)
            | DfsEvent::BackEdge(u, v)
            | DfsEvent::CrossForwardEdge(u, v) = event
            {
                if let (Some(parent), Some(child)) = (graph.block(u), graph.block(v)) {
                    if !cdg.deps.contains_key(&child) {
                        let dep = cdg.resolve(pdom, parent, child);
                        cdg.deps.insert(child, dep);
                    }
                }
            }
            Control::<()>::Continue
        });
        // Blocks the walk never reaches depend on nothing.
        for node in graph.graph().node_indices() {
            if let Some(bb) = graph.block(node) {
                cdg.deps.entry(bb).or_insert(None);
            }
        }
        cdg
    }

    fn resolve(&self, pdom: &PostDominators, parent: BlockId, child: BlockId) -> Option<BlockId> {
        let mut parent = parent;
        let mut seen = HashSet::new();
        loop {
            if pdom.immediate(parent) != Some(child) {
                return Some(parent);
            }
            match self.deps.get(&parent) {
                Some(Some(up)) if seen.insert(*up) => parent = *up,
                _ => return None,
            }
        }
    }

    /// Nearest controlling block of `bb`, `None` when it depends only on entry.
    pub fn dependence(&self, bb: BlockId) -> Option<BlockId> {
        self.deps.get(&bb).copied().flatten()
    }
}
