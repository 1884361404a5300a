pub mod ids;
pub mod index_vec;

pub use ids::{BlockId, FuncId, GlobalId, InstId};
pub use index_vec::{Idx, IndexVec};
