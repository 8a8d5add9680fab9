//! Query execution: condition evaluation, traversal and pattern matching
//!
//! All three run synchronously against a borrowed [`GraphStore`] and hand
//! back results that borrow from it.
//!
//! [`GraphStore`]: crate::graph::GraphStore

pub mod matcher;
pub mod predicate;
pub mod record;
pub mod traversal;

pub use matcher::match_pattern;
pub use predicate::{evaluate, Bindings, Entity};
pub use record::{Binding, NeighborRecord, Path, PathRecord};
pub use traversal::{traverse, traverse_steps};

use crate::graph::GraphError;
use thiserror::Error;

/// Execution errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    /// Graph store error
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// Template rejected before search
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    /// Traversal asked for more steps than the engine allows
    #[error("Traversal of {requested} hops exceeds the limit of {limit}")]
    HopLimitExceeded { requested: usize, limit: usize },
}

pub type ExecutionResult<T> = Result<T, ExecutionError>;
