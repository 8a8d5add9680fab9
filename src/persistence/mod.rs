//! Persistence layer
//!
//! Whole-graph snapshots as JSON documents. There is no incremental log:
//! a graph is exported in one piece and imported into a fresh store.

pub mod json;

pub use json::{
    export_json, from_document, from_json_str, import_json, to_document, to_json_string,
    GraphDocument, NodeDocument, RelationshipDocument,
};

use crate::graph::GraphError;
use thiserror::Error;

/// Persistence errors
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid graph document: {0}")]
    Graph(#[from] GraphError),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;
