//! Pattern matching against a structural template
//!
//! The template is validated against the store first, then searched with
//! backtracking over an explicit stack of candidate frames. Candidates at
//! every level come in insertion order, so results are deterministic.

use super::predicate::{evaluate, Entity};
use super::record::{Binding, Path};
use super::{ExecutionError, ExecutionResult};
use crate::graph::{Edge, GraphStore, Node};
use crate::query::ast::{Condition, Template};
use indexmap::IndexMap;
use std::collections::HashMap;
use tracing::debug;

/// Type constraint a variable name is declared with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot<'t> {
    Node(&'t str),
    Relationship(&'t str),
}

/// Candidates for one template level and the position of the next one to try
struct Frame<'a> {
    candidates: Vec<(Option<&'a Edge>, &'a Node)>,
    next: usize,
}

/// Enumerate every binding of `template` in `store` that satisfies `condition`
pub fn match_pattern<'a>(
    store: &'a GraphStore,
    template: &Template,
    condition: &Condition,
) -> ExecutionResult<Vec<Binding<'a>>> {
    validate(store, template, condition)?;

    // For each slot, the first earlier slot bound to the same variable
    let node_alias = first_occurrence(template.node_slots().map(|n| n.variable.as_deref()));
    let edge_alias = first_occurrence(template.relationship_slots().map(|r| r.variable.as_deref()));

    let mut results = Vec::new();
    let mut nodes: Vec<&'a Node> = Vec::new();
    let mut edges: Vec<&'a Edge> = Vec::new();
    let mut stack = vec![Frame {
        candidates: store
            .get_nodes_by_label(&template.start.label)
            .into_iter()
            .map(|node| (None, node))
            .collect(),
        next: 0,
    }];

    while let Some(depth) = stack.len().checked_sub(1) {
        // Undo the choice previously made at this level
        if nodes.len() > depth {
            nodes.pop();
            if depth > 0 {
                edges.pop();
            }
        }

        let frame = &mut stack[depth];
        let Some(&(edge, node)) = frame.candidates.get(frame.next) else {
            stack.pop();
            continue;
        };
        frame.next += 1;

        if let Some(first) = node_alias[depth] {
            if !Entity::Node(nodes[first]).same_as(&Entity::Node(node)) {
                continue;
            }
        }
        if let (Some(edge), Some(first)) = (edge, depth.checked_sub(1).and_then(|i| edge_alias[i])) {
            if edges[first].id != edge.id {
                continue;
            }
        }

        nodes.push(node);
        if let Some(edge) = edge {
            edges.push(edge);
        }

        if depth == template.segments.len() {
            let binding = bind(template, &nodes, &edges);
            if evaluate(condition, &binding) {
                results.push(binding);
            }
            continue;
        }

        let (relationship, next_node) = &template.segments[depth];
        let candidates = store
            .get_neighbors(&node.node_ref(), Some(&relationship.edge_type), relationship.direction)?
            .into_iter()
            .filter(|(neighbor, _)| neighbor.label == next_node.label)
            .map(|(neighbor, edge)| (Some(edge), neighbor))
            .collect();
        stack.push(Frame {
            candidates,
            next: 0,
        });
    }

    debug!("Pattern produced {} binding(s)", results.len());
    Ok(results)
}

/// Reject templates that can never be evaluated consistently
fn validate(store: &GraphStore, template: &Template, condition: &Condition) -> ExecutionResult<()> {
    let mut declared: HashMap<&str, Slot<'_>> = HashMap::new();

    for node in template.node_slots() {
        if !store.has_label(&node.label) {
            return Err(ExecutionError::InvalidPattern(format!(
                "unknown node label '{}'",
                node.label
            )));
        }
        declare(&mut declared, node.variable.as_deref(), Slot::Node(node.label.as_str()))?;
    }
    for relationship in template.relationship_slots() {
        if !store.has_edge_type(&relationship.edge_type) {
            return Err(ExecutionError::InvalidPattern(format!(
                "unknown relationship type '{}'",
                relationship.edge_type
            )));
        }
        declare(
            &mut declared,
            relationship.variable.as_deref(),
            Slot::Relationship(relationship.edge_type.as_str()),
        )?;
    }

    if let Some(unknown) = condition
        .variables()
        .into_iter()
        .find(|name| !declared.contains_key(name))
    {
        return Err(ExecutionError::InvalidPattern(format!(
            "condition references undeclared variable '{}'",
            unknown
        )));
    }
    Ok(())
}

fn declare<'t>(
    declared: &mut HashMap<&'t str, Slot<'t>>,
    name: Option<&'t str>,
    slot: Slot<'t>,
) -> ExecutionResult<()> {
    let Some(name) = name else {
        return Ok(());
    };
    match declared.get(name) {
        None => {
            declared.insert(name, slot);
            Ok(())
        }
        Some(existing) if *existing == slot => Ok(()),
        Some(Slot::Node(_)) if matches!(slot, Slot::Node(_)) => Err(ExecutionError::InvalidPattern(
            format!("node variable '{}' is declared with conflicting labels", name),
        )),
        Some(Slot::Relationship(_)) if matches!(slot, Slot::Relationship(_)) => {
            Err(ExecutionError::InvalidPattern(format!(
                "relationship variable '{}' is declared with conflicting types",
                name
            )))
        }
        Some(_) => Err(ExecutionError::InvalidPattern(format!(
            "variable '{}' is used for both a node and a relationship",
            name
        ))),
    }
}

fn first_occurrence<'t>(names: impl Iterator<Item = Option<&'t str>>) -> Vec<Option<usize>> {
    let names: Vec<Option<&str>> = names.collect();
    names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let name = (*name)?;
            names[..i].iter().position(|earlier| *earlier == Some(name))
        })
        .collect()
}

fn bind<'a>(template: &Template, nodes: &[&'a Node], edges: &[&'a Edge]) -> Binding<'a> {
    let mut variables = IndexMap::new();
    let mut path = Path::new(nodes[0]);

    if let Some(name) = &template.start.variable {
        variables.insert(name.clone(), Entity::Node(nodes[0]));
    }
    for (i, (relationship, node)) in template.segments.iter().enumerate() {
        path.push(edges[i], nodes[i + 1]);
        if let Some(name) = &relationship.variable {
            variables
                .entry(name.clone())
                .or_insert(Entity::Edge(edges[i]));
        }
        if let Some(name) = &node.variable {
            variables
                .entry(name.clone())
                .or_insert(Entity::Node(nodes[i + 1]));
        }
    }

    Binding { variables, path }
}
