//! Query processing module
//!
//! - `parser`: command text to [`Command`]
//! - `executor`: predicate evaluation, traversal and pattern matching
//! - [`QueryEngine`]: runs a parsed command against a store

pub mod ast;
pub mod executor;
pub mod parser;

// Re-export main types
pub use ast::{
    Command, CompareOp, Condition, NodePattern, RelationshipPattern, Template, TraversalStep,
};
pub use executor::{
    match_pattern, traverse, traverse_steps, Binding, Bindings, Entity, ExecutionError,
    ExecutionResult, NeighborRecord, Path, PathRecord,
};
pub use parser::{parse_command, parse_condition, ParseError, ParseResult};

use crate::config::EngineConfig;
use crate::graph::{EdgeId, GraphError, GraphStore, NodeId, NodeRef, PropertyMap, PropertyValue};
use crate::persistence::{self, PersistenceError};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

/// Errors surfaced by [`QueryEngine`]
#[derive(Error, Debug)]
pub enum QueryError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl From<GraphError> for QueryError {
    fn from(e: GraphError) -> Self {
        QueryError::Execution(ExecutionError::Graph(e))
    }
}

impl QueryError {
    /// The underlying store error, if any
    pub fn graph_error(&self) -> Option<&GraphError> {
        match self {
            QueryError::Execution(ExecutionError::Graph(e)) => Some(e),
            QueryError::Persistence(PersistenceError::Graph(e)) => Some(e),
            _ => None,
        }
    }
}

pub type QueryResult<T> = Result<T, QueryError>;

/// Outcome of one command
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandOutput {
    NodeCreated(NodeRef),
    RelationshipCreated { id: EdgeId },
    Node(serde_json::Value),
    Neighbors(Vec<NeighborRecord>),
    NodeUpdated(NodeRef),
    NodeDeleted {
        node: NodeRef,
        relationships_removed: usize,
    },
    RelationshipUpdated { id: EdgeId },
    RelationshipDeleted { id: EdgeId },
    Paths(Vec<PathRecord>),
    Exported {
        path: PathBuf,
        nodes: usize,
        relationships: usize,
    },
    Imported {
        path: PathBuf,
        nodes: usize,
        relationships: usize,
    },
}

impl CommandOutput {
    /// Result rows: one JSON object per record, or a single status object
    pub fn records(&self) -> Vec<serde_json::Value> {
        match self {
            CommandOutput::Node(record) => vec![record.clone()],
            CommandOutput::Neighbors(records) => records.iter().map(to_json_value).collect(),
            CommandOutput::Paths(records) => records.iter().map(to_json_value).collect(),
            other => vec![to_json_value(other)],
        }
    }

    /// Short human-readable summary
    pub fn summary(&self) -> String {
        match self {
            CommandOutput::NodeCreated(node) => format!("Created node {}", node),
            CommandOutput::RelationshipCreated { id } => format!("Created relationship {}", id),
            CommandOutput::Node(_) => "1 node".to_string(),
            CommandOutput::Neighbors(records) => format!("{} neighbor(s)", records.len()),
            CommandOutput::NodeUpdated(node) => format!("Updated node {}", node),
            CommandOutput::NodeDeleted {
                node,
                relationships_removed,
            } => format!(
                "Deleted node {} and {} relationship(s)",
                node, relationships_removed
            ),
            CommandOutput::RelationshipUpdated { id } => format!("Updated relationship {}", id),
            CommandOutput::RelationshipDeleted { id } => format!("Deleted relationship {}", id),
            CommandOutput::Paths(records) => format!("{} result(s)", records.len()),
            CommandOutput::Exported {
                path,
                nodes,
                relationships,
            } => format!(
                "Exported {} node(s) and {} relationship(s) to {}",
                nodes,
                relationships,
                path.display()
            ),
            CommandOutput::Imported {
                path,
                nodes,
                relationships,
            } => format!(
                "Imported {} node(s) and {} relationship(s) from {}",
                nodes,
                relationships,
                path.display()
            ),
        }
    }
}

/// Query engine - parses commands and runs them against a store
#[derive(Debug, Clone, Default)]
pub struct QueryEngine {
    config: EngineConfig,
}

impl QueryEngine {
    /// Create a new query engine with default settings
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Parse and execute one command
    pub fn execute(&self, input: &str, store: &mut GraphStore) -> QueryResult<CommandOutput> {
        let command = parse_command(input)?;
        self.run(command, store)
    }

    /// Execute an already parsed command
    pub fn run(&self, command: Command, store: &mut GraphStore) -> QueryResult<CommandOutput> {
        debug!(
            "Executing {} ({})",
            command.name(),
            if command.is_read_only() { "read" } else { "write" }
        );

        match command {
            Command::CreateNode { label, properties } => {
                let (id, properties) = split_identity(properties)?;
                let node = store.create_node(label, id, properties)?;
                Ok(CommandOutput::NodeCreated(node))
            }
            Command::CreateRelationship {
                edge_type,
                from,
                to,
                properties,
            } => {
                let id = store.create_relationship(edge_type, &from, &to, properties)?;
                Ok(CommandOutput::RelationshipCreated { id })
            }
            Command::GetNode(node) => Ok(CommandOutput::Node(store.get_node(&node)?.to_record())),
            Command::GetNeighbors {
                node,
                edge_type,
                direction,
            } => {
                let neighbors = store
                    .get_neighbors(&node, edge_type.as_ref(), direction)?
                    .into_iter()
                    .map(|(neighbor, edge)| NeighborRecord::new(neighbor, edge))
                    .collect();
                Ok(CommandOutput::Neighbors(neighbors))
            }
            Command::UpdateNode { node, properties } => {
                store.update_node(&node, properties)?;
                Ok(CommandOutput::NodeUpdated(node))
            }
            Command::DeleteNode(node) => {
                let before = store.relationship_count();
                store.delete_node(&node)?;
                Ok(CommandOutput::NodeDeleted {
                    node,
                    relationships_removed: before - store.relationship_count(),
                })
            }
            Command::UpdateRelationship {
                edge_type,
                from,
                to,
                properties,
            } => {
                store.get_node(&from)?;
                store.get_node(&to)?;
                let id = store
                    .find_relationship(&edge_type, &from, &to)
                    .ok_or(GraphError::RelationshipNotFound {
                        edge_type,
                        from,
                        to,
                    })?;
                store.update_relationship(id, properties)?;
                Ok(CommandOutput::RelationshipUpdated { id })
            }
            Command::DeleteRelationship(id) => {
                store.delete_relationship(id)?;
                Ok(CommandOutput::RelationshipDeleted { id })
            }
            Command::Traverse {
                start,
                steps,
                condition,
            } => {
                let paths = traverse_steps(store, &start, &steps, &condition, self.config.max_hops)?;
                Ok(CommandOutput::Paths(paths.iter().map(Path::to_record).collect()))
            }
            Command::Match {
                template,
                condition,
            } => {
                let bindings = match_pattern(store, &template, &condition)?;
                Ok(CommandOutput::Paths(
                    bindings.iter().map(Binding::to_record).collect(),
                ))
            }
            Command::Export(path) => {
                persistence::export_json(store, &path, self.config.pretty_json)?;
                Ok(CommandOutput::Exported {
                    path,
                    nodes: store.node_count(),
                    relationships: store.relationship_count(),
                })
            }
            Command::Import(path) => {
                // The current store is replaced only once the whole file is accepted
                let imported = persistence::import_json(&path)?;
                *store = imported;
                Ok(CommandOutput::Imported {
                    path,
                    nodes: store.node_count(),
                    relationships: store.relationship_count(),
                })
            }
        }
    }
}

fn to_json_value<T: Serialize>(value: &T) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
}

/// Pull the `id` key out of a CREATE NODE property block
fn split_identity(mut properties: PropertyMap) -> Result<(Option<NodeId>, PropertyMap), GraphError> {
    match properties.shift_remove("id") {
        None => Ok((None, properties)),
        Some(PropertyValue::Integer(id)) if id >= 0 => Ok((Some(NodeId::new(id as u64)), properties)),
        Some(other) => Err(GraphError::InvalidProperty {
            key: "id".to_string(),
            reason: format!("node id must be a non-negative integer, got {}", other),
        }),
    }
}
