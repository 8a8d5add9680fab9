//! Pathgraph
//!
//! An embedded, in-memory store for typed nodes and typed, directed,
//! property-bearing relationships, with a small command language on top.
//!
//! # Modules
//!
//! - `graph`: property bags, nodes, relationships and the arena-backed store
//! - `query`: command parser, condition evaluation, traversal and pattern matching
//! - `persistence`: whole-graph JSON export and import
//! - `protocol`: a lock-guarded session shared between async tasks
//! - `config`: engine tunables, loadable from YAML
//!
//! ## Example Usage
//!
//! ```rust
//! use pathgraph::graph::{properties, Direction, EdgeType, GraphStore, NodeRef, PropertyValue};
//! use pathgraph::query::{traverse, CompareOp, Condition};
//!
//! let mut store = GraphStore::new();
//!
//! let alice = store
//!     .create_node("Person", Some(1.into()), properties([("name", PropertyValue::from("Alice")), ("age", 30i64.into())]))
//!     .unwrap();
//! let acme = store
//!     .create_node("Company", Some(101.into()), properties([("name", "Acme Inc.")]))
//!     .unwrap();
//! store
//!     .create_relationship("WORKS_AT", &alice, &acme, properties([("since", 2018i64)]))
//!     .unwrap();
//!
//! let young = Condition::compare("Person", "age", CompareOp::Lt, 35i64);
//! let paths = traverse(&store, &NodeRef::new("Person", 1), &EdgeType::new("WORKS_AT"), Direction::Outgoing, &young).unwrap();
//! assert_eq!(paths[0].describe(), vec!["Person:1", "WORKS_AT", "Company:101"]);
//! ```
//!
//! The same through the command language:
//!
//! ```rust
//! use pathgraph::{GraphStore, QueryEngine};
//!
//! let engine = QueryEngine::new();
//! let mut store = GraphStore::new();
//! engine.execute(r#"CREATE NODE Person {id: 1, name: "Alice"}"#, &mut store).unwrap();
//! engine.execute(r#"CREATE NODE Person {id: 2, name: "Bob"}"#, &mut store).unwrap();
//! engine.execute("CREATE RELATIONSHIP KNOWS FROM Person(id=1) TO Person(id=2)", &mut store).unwrap();
//!
//! let output = engine.execute("MATCH (a:Person)-[r:KNOWS]->(b:Person)", &mut store).unwrap();
//! assert_eq!(output.records().len(), 1);
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod graph;
pub mod persistence;
pub mod protocol;
pub mod query;

// Re-export main types for convenience
pub use graph::{
    Direction, Edge, EdgeId, EdgeType, GraphError, GraphResult, GraphStore, Label, Node, NodeId,
    NodeRef, PropertyMap, PropertyValue,
};

pub use query::{
    parse_command, Command, CommandOutput, Condition, ExecutionError, ParseError, QueryEngine,
    QueryError, QueryResult,
};

pub use persistence::{export_json, import_json, PersistenceError, PersistenceResult};

pub use protocol::Session;

pub use config::{ConfigError, EngineConfig};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        let ver = version();
        assert!(!ver.is_empty());
        assert_eq!(ver, "0.1.0");
    }
}
