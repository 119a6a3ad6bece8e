//! Harvest Query Evaluator
//!
//! This is the main library crate that re-exports all evaluator components.

pub use harvest_core as core;
pub use harvest_protocol as protocol;
pub use harvest_query as query;
pub use harvest_server as server;

// Re-export commonly used types
pub use harvest_core::{
    AndGroup, Branch, CanonicalValue, Context, Error, Expression, Ident, Leaf, Param, Predicate,
    Query, Result, normalize,
};

pub use harvest_protocol::{Codec, CodecRegistry};
pub use harvest_query::{
    Catalog, Evaluator, MemoryEngine, Plan, QueryEngine, QueryNode, ResultSet, translate,
};
pub use harvest_server::{Server, ServerConfig};
