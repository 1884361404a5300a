//! Instruction-level control-flow edges, materialized on demand.
//!
//! Every function exit (return or unreachable) flows into a synthetic
//! [`Node::Return`], which carries a self-loop exit edge. Edges are plain
//! values keyed by their endpoints.

use indexmap::{IndexMap, IndexSet};
use log::warn;

use crate::ir::{Function, InstKind};
use crate::util::{BlockId, InstId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Node {
    Inst(InstId),
    Return,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Edge {
    /// `None` only for the synthetic entry edge.
    pub src: Option<Node>,
    pub dst: Node,
}

impl Edge {
    pub fn new(src: Option<Node>, dst: Node) -> Self {
        Self { src, dst }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Path {
    Taken,
    NotTaken,
}

impl Path {
    pub fn is_taken(self) -> bool {
        matches!(self, Path::Taken)
    }
}

pub struct EdgeModel<'a> {
    func: &'a Function,
    out: IndexMap<(Node, Path), Edge>,
    return_sites: IndexSet<InstId>,
}

impl<'a> EdgeModel<'a> {
    pub fn new(func: &'a Function) -> Self {
        Self {
            func,
            out: IndexMap::new(),
            return_sites: IndexSet::new(),
        }
    }

    pub fn entry_edge(&self) -> Option<Edge> {
        self.func
            .entry_inst()
            .map(|inst| Edge::new(None, Node::Inst(inst)))
    }

    pub fn exit_edge(&self) -> Edge {
        Edge::new(Some(Node::Return), Node::Return)
    }

    /// A two-way branch whose targets differ.
    pub fn is_conditional(&self, inst: InstId) -> bool {
        matches!(
            self.func.inst(inst).kind,
            InstKind::CondBr { then_bb, else_bb, .. } if then_bb != else_bb
        )
    }

    /// Outgoing edge of `node`. `path` only matters for conditional branches.
    pub fn out_edge(&mut self, node: Node, path: Path) -> Edge {
        let path = match node {
            Node::Inst(inst) if self.is_conditional(inst) => path,
            _ => Path::Taken,
        };
        if let Some(edge) = self.out.get(&(node, path)) {
            return *edge;
        }
        let dst = match node {
            Node::Return => Node::Return,
            Node::Inst(inst) => self.successor(inst, path),
        };
        let edge = Edge::new(Some(node), dst);
        self.out.insert((node, path), edge);
        edge
    }

    fn successor(&mut self, inst: InstId, path: Path) -> Node {
        let func = self.func;
        match &func.inst(inst).kind {
            InstKind::CondBr {
                then_bb, else_bb, ..
            } => {
                let target = if path.is_taken() { *then_bb } else { *else_bb };
                self.block_head(target)
            }
            InstKind::Br { target } => self.block_head(*target),
            InstKind::Ret { .. } | InstKind::Unreachable => {
                self.return_sites.insert(inst);
                Node::Return
            }
            InstKind::Switch { default, .. } => {
                warn!(
                    "switch {} in `{}` only follows its default successor",
                    inst, func.name
                );
                self.block_head(*default)
            }
            _ => match func.next_inst(inst) {
                Some(next) => Node::Inst(next),
                None => {
                    warn!(
                        "block {} of `{}` ends without a terminator",
                        func.block_of(inst),
                        func.name
                    );
                    self.return_sites.insert(inst);
                    Node::Return
                }
            },
        }
    }

    fn block_head(&self, bb: BlockId) -> Node {
        match self.func.first_inst(bb) {
            Some(inst) => Node::Inst(inst),
            None => {
                warn!("block {} of `{}` is empty", bb, self.func.name);
                Node::Return
            }
        }
    }

    /// Every distinct edge entering `inst`, materializing the predecessors'
    /// out-edges as needed. The entry edge comes first for the entry instruction.
    pub fn in_edges(&mut self, inst: InstId) -> Vec<Edge> {
        let mut edges = IndexSet::new();
        let target = Node::Inst(inst);
        if let Some(prev) = self.func.prev_inst(inst) {
            edges.insert(self.out_edge(Node::Inst(prev), Path::Taken));
            return edges.into_iter().collect();
        }
        if self.func.entry_inst() == Some(inst) {
            edges.insert(Edge::new(None, target));
        }
        let bb = self.func.block_of(inst);
        let preds: Vec<InstId> = self
            .func
            .blocks
            .indices()
            .filter(|pred| self.func.block_successors(*pred).contains(&bb))
            .filter_map(|pred| self.func.terminator(pred))
            .collect();
        for term in preds {
            for path in [Path::Taken, Path::NotTaken] {
                let edge = self.out_edge(Node::Inst(term), path);
                if edge.dst == target {
                    edges.insert(edge);
                }
            }
        }
        // Out-edges computed earlier that reach `inst` from elsewhere.
        for edge in self.out.values() {
            if edge.dst == target {
                edges.insert(*edge);
            }
        }
        edges.into_iter().collect()
    }

    /// Incoming edge number `slot`: 0 is the primary edge, 1 the second
    /// distinct one at merge points.
    pub fn in_edge(&mut self, inst: InstId, slot: usize) -> Option<Edge> {
        self.in_edges(inst).get(slot).copied()
    }

    /// Edges from every exit instruction seen so far into the return node.
    pub fn return_edges(&self) -> Vec<Edge> {
        self.return_sites
            .iter()
            .map(|site| Edge::new(Some(Node::Inst(*site)), Node::Return))
            .collect()
    }
}
