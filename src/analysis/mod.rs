pub mod controldep;
pub mod defuse;
pub mod edges;
pub mod executor;
pub mod grouping;
pub mod inter;
pub mod pattern;
pub mod postdom;
pub mod state;
pub mod worklist;

pub use inter::analyze_program;
