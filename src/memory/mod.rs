pub mod alias;
pub mod alias_sets;

pub use alias::{AliasId, AliasKind, AliasOracle, NameAlias, UniversalAlias};
pub use alias_sets::{AliasSetError, AliasSets};
