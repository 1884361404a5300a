//! Basic-block level control-flow graph with a virtual exit node that every
//! returning block flows into.

use log::warn;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::ir::Function;
use crate::util::{BlockId, IndexVec};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockNode {
    Block(BlockId),
    Exit,
}

pub struct BlockGraph {
    graph: DiGraph<BlockNode, ()>,
    nodes: IndexVec<BlockId, NodeIndex>,
    exit: NodeIndex,
}

impl BlockGraph {
    pub fn new(func: &Function) -> Self {
        let mut graph = DiGraph::new();
        let nodes: IndexVec<BlockId, NodeIndex> = func
            .blocks
            .indices()
            .map(|bb| graph.add_node(BlockNode::Block(bb)))
            .collect();
        let exit = graph.add_node(BlockNode::Exit);

        for bb in func.blocks.indices() {
            match func.terminator(bb) {
                Some(term) if func.inst(term).kind.is_exit() => {
                    graph.update_edge(nodes[bb], exit, ());
                }
                Some(term) => {
                    for succ in func.inst(term).kind.successors() {
                        graph.update_edge(nodes[bb], nodes[succ], ());
                    }
                }
                None => {
                    warn!(
                        "block {} of `{}` has no terminator, treating it as an exit",
                        func.blocks[bb].name, func.name
                    );
                    graph.update_edge(nodes[bb], exit, ());
                }
            }
        }
        Self { graph, nodes, exit }
    }

    pub fn graph(&self) -> &DiGraph<BlockNode, ()> {
        &self.graph
    }

    pub fn entry(&self) -> Option<BlockId> {
        self.nodes.indices().next()
    }

    pub fn node(&self, bb: BlockId) -> NodeIndex {
        self.nodes[bb]
    }

    pub fn exit_node(&self) -> NodeIndex {
        self.exit
    }

    pub fn block(&self, node: NodeIndex) -> Option<BlockId> {
        match self.graph[node] {
            BlockNode::Block(bb) => Some(bb),
            BlockNode::Exit => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Operand;
    use crate::ir::builder::ProgramBuilder;
    use petgraph::Direction::Incoming;

    #[test]
    fn diamond_has_merge_predecessors() {
        let mut pb = ProgramBuilder::new("p");
        let f = pb.function("f", &["c"]);
        {
            let mut b = pb.body(f);
            let entry = b.block("entry");
            let left = b.block("left");
            let right = b.block("right");
            let join = b.block("join");
            b.cond_br(entry, Operand::Arg(0), left, right);
            b.br(left, join);
            b.br(right, join);
            b.ret(join);
        }
        let program = pb.build().unwrap();
        let graph = BlockGraph::new(program.function(f));
        let join = BlockId::new(3);
        let mut preds: Vec<BlockId> = graph
            .graph()
            .neighbors_directed(graph.node(join), Incoming)
            .filter_map(|n| graph.block(n))
            .collect();
        preds.sort();
        assert_eq!(preds, vec![BlockId::new(1), BlockId::new(2)]);
        assert_eq!(graph.graph().neighbors(graph.node(BlockId::new(0))).count(), 2);
        assert!(graph.graph().contains_edge(graph.node(join), graph.exit_node()));
    }
}
