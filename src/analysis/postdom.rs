use petgraph::algo::dominators;
use petgraph::visit::Reversed;

use crate::graph::BlockGraph;
use crate::util::{BlockId, IndexVec};

/// Immediate post-dominators of a function's blocks.
///
/// Computed as dominators of the reversed block graph rooted at the virtual
/// exit. A block whose immediate post-dominator is the virtual exit, or that
/// cannot reach an exit at all, has none.
#[derive(Debug, Clone)]
pub struct PostDominators {
    ipdom: IndexVec<BlockId, Option<BlockId>>,
}

impl PostDominators {
    pub fn compute(graph: &BlockGraph) -> Self {
        let doms = dominators::simple_fast(Reversed(graph.graph()), graph.exit_node());
        let len = graph.graph().node_count() - 1;
        let ipdom = (0..len)
            .map(|i| {
                let bb = BlockId::new(i as u32);
                doms.immediate_dominator(graph.node(bb))
                    .and_then(|node| graph.block(node))
            })
            .collect();
        Self { ipdom }
    }

    pub fn immediate(&self, bb: BlockId) -> Option<BlockId> {
        self.ipdom.get(bb).copied().flatten()
    }
}
