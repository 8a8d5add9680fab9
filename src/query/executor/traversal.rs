//! Constrained traversal from a start node
//!
//! Depth-first expansion along a list of steps. Every node on a path is
//! visible to the condition under its label and every relationship under
//! its type; when a name occurs twice the occurrence nearest the start wins.

use super::predicate::{evaluate, Bindings, Entity};
use super::record::Path;
use super::{ExecutionError, ExecutionResult};
use crate::graph::{Direction, EdgeType, GraphStore, NodeRef};
use crate::query::ast::{Condition, TraversalStep};
use tracing::debug;

/// Single-hop traversal
///
/// Returns one `[start, relationship, neighbor]` path per relationship of
/// `edge_type` in `direction` whose path satisfies `condition`, in
/// relationship insertion order.
pub fn traverse<'a>(
    store: &'a GraphStore,
    start: &NodeRef,
    edge_type: &EdgeType,
    direction: Direction,
    condition: &Condition,
) -> ExecutionResult<Vec<Path<'a>>> {
    let step = TraversalStep::any(edge_type.clone(), direction);
    traverse_steps(store, start, std::slice::from_ref(&step), condition, 1)
}

/// Multi-hop traversal bounded by `max_hops`
pub fn traverse_steps<'a>(
    store: &'a GraphStore,
    start: &NodeRef,
    steps: &[TraversalStep],
    condition: &Condition,
    max_hops: usize,
) -> ExecutionResult<Vec<Path<'a>>> {
    if steps.len() > max_hops {
        return Err(ExecutionError::HopLimitExceeded {
            requested: steps.len(),
            limit: max_hops,
        });
    }

    let start_node = store.get_node(start)?;
    let mut path = Path::new(start_node);
    let mut results = Vec::new();
    expand(store, steps, condition, &mut path, &mut results)?;

    debug!(
        "Traversal from {} over {} step(s) produced {} path(s)",
        start,
        steps.len(),
        results.len()
    );
    Ok(results)
}

fn expand<'a>(
    store: &'a GraphStore,
    steps: &[TraversalStep],
    condition: &Condition,
    path: &mut Path<'a>,
    results: &mut Vec<Path<'a>>,
) -> ExecutionResult<()> {
    let Some(step) = steps.get(path.len()) else {
        if evaluate(condition, &*path) {
            results.push(path.clone());
        }
        return Ok(());
    };

    let current = path.end().node_ref();
    for (neighbor, relationship) in store.get_neighbors(&current, Some(&step.edge_type), step.direction)? {
        if step
            .target_label
            .as_ref()
            .is_some_and(|label| &neighbor.label != label)
        {
            continue;
        }
        path.push(relationship, neighbor);
        expand(store, steps, condition, path, results)?;
        path.pop();
    }
    Ok(())
}

impl Bindings for Path<'_> {
    fn resolve(&self, variable: &str) -> Option<Entity<'_>> {
        for (i, node) in self.nodes.iter().enumerate() {
            if node.label.as_str() == variable {
                return Some(Entity::Node(*node));
            }
            if let Some(relationship) = self.relationships.get(i) {
                if relationship.edge_type.as_str() == variable {
                    return Some(Entity::Edge(*relationship));
                }
            }
        }
        None
    }
}
