//! 对程序中所有函数创建CallGraph
//! 过程间分析按照它自底向上地处理函数

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use petgraph::Direction::Outgoing;
use petgraph::algo;
use petgraph::dot::{Config, Dot};
use petgraph::graph::NodeIndex;
use petgraph::{Directed, Graph};

use crate::ir::{Callee, Program};
use crate::util::{FuncId, IndexVec, InstId};

/// 使用NodeIndex作为函数的id
pub type FunctionNodeId = NodeIndex;

/// WithBody：有函数体的函数；WithoutBody：只有声明（例如锁原语）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallGraphNode {
    WithBody(FuncId),
    WithoutBody(FuncId),
}

impl CallGraphNode {
    pub fn function(&self) -> FuncId {
        match self {
            CallGraphNode::WithBody(id) | CallGraphNode::WithoutBody(id) => *id,
        }
    }
}

/// 函数调用图
/// f1--|[i3, i7]|-->f2
/// 代表f1在调用点i3和i7处调用f2
pub struct CallGraph {
    pub graph: Graph<CallGraphNode, Vec<InstId>, Directed>,
    nodes: IndexVec<FuncId, FunctionNodeId>,
    recursive: HashSet<FuncId>,
}

impl CallGraph {
    pub fn new(program: &Program) -> Self {
        let mut graph: Graph<CallGraphNode, Vec<InstId>, Directed> = Graph::new();
        let nodes: IndexVec<FuncId, FunctionNodeId> = program
            .functions
            .iter_enumerated()
            .map(|(id, func)| {
                let node = if func.is_declaration() {
                    CallGraphNode::WithoutBody(id)
                } else {
                    CallGraphNode::WithBody(id)
                };
                graph.add_node(node)
            })
            .collect();

        for (caller, func) in program.defined_functions() {
            for (inst, callee, _) in func.call_sites() {
                // 间接调用没有静态目标
                let Callee::Direct(callee) = callee else {
                    continue;
                };
                let (source, target) = (nodes[caller], nodes[*callee]);
                match graph.find_edge(source, target) {
                    Some(edge) => {
                        if let Some(sites) = graph.edge_weight_mut(edge) {
                            sites.push(inst);
                        }
                    }
                    None => {
                        graph.add_edge(source, target, vec![inst]);
                    }
                }
            }
        }

        let mut recursive = HashSet::new();
        for scc in algo::tarjan_scc(&graph) {
            let cyclic = scc.len() > 1 || graph.contains_edge(scc[0], scc[0]);
            if cyclic {
                recursive.extend(scc.iter().map(|n| graph[*n].function()));
            }
        }

        Self {
            graph,
            nodes,
            recursive,
        }
    }

    pub fn index_to_function(&self, idx: FunctionNodeId) -> Option<FuncId> {
        self.graph.node_weight(idx).map(CallGraphNode::function)
    }

    /// 找出被调用者，按函数id排序
    pub fn callees(&self, source: FuncId) -> Vec<FuncId> {
        let mut callees: Vec<FuncId> = self
            .graph
            .neighbors_directed(self.nodes[source], Outgoing)
            .filter_map(|n| self.index_to_function(n))
            .collect();
        callees.sort();
        callees
    }

    /// 函数是否处在调用环上（包括直接递归）
    pub fn is_recursive(&self, func: FuncId) -> bool {
        self.recursive.contains(&func)
    }

    /// callgraph的dot输出，节点以函数名标注
    pub fn dot(&self, program: &Program) -> String {
        let named = self.graph.map(
            |_, node| program.function(node.function()).name.clone(),
            |_, sites| sites.len(),
        );
        format!(
            "digraph G {{\n{:?}\n}}",
            Dot::with_config(&named, &[Config::GraphContentOnly])
        )
    }

    pub fn write_dot<P: AsRef<Path>>(&self, program: &Program, path: P) -> std::io::Result<()> {
        let dot = self.dot(program);
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, dot)
    }
}
