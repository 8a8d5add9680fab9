//! Core graph store
//!
//! This module implements the typed property graph data model:
//! - Nodes identified by (type tag, integer id) with a property bag
//! - Directed, typed relationships with a property bag and a sequence id
//! - Multiple relationships between the same pair of nodes
//! - In-memory arenas with adjacency and type indices

pub mod edge;
pub mod node;
pub mod property;
pub mod store;
pub mod types;

// Re-export main types
pub use edge::Edge;
pub use node::Node;
pub use property::{properties, PropertyMap, PropertyValue};
pub use store::{GraphError, GraphResult, GraphStore, MAX_ID};
pub use types::{Direction, EdgeId, EdgeType, Label, NodeId, NodeRef};
