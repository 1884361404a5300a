pub mod block_graph;
pub mod callgraph;

pub use block_graph::{BlockGraph, BlockNode};
pub use callgraph::CallGraph;
