//! Result structures for traversal and pattern matching
//!
//! `Path` and `Binding` borrow from the store; `PathRecord` and
//! `NeighborRecord` are the owned, serializable forms handed to callers.

use super::predicate::{Bindings, Entity};
use crate::graph::{Edge, Node};
use indexmap::IndexMap;
use serde::Serialize;

/// A concrete path: `nodes.len() == relationships.len() + 1`
#[derive(Debug, Clone)]
pub struct Path<'a> {
    pub nodes: Vec<&'a Node>,
    pub relationships: Vec<&'a Edge>,
}

impl<'a> Path<'a> {
    pub fn new(start: &'a Node) -> Self {
        Path {
            nodes: vec![start],
            relationships: Vec::new(),
        }
    }

    /// Extend by one hop
    pub fn push(&mut self, relationship: &'a Edge, node: &'a Node) {
        self.relationships.push(relationship);
        self.nodes.push(node);
    }

    /// Drop the last hop; the start node is never removed
    pub fn pop(&mut self) {
        if self.relationships.pop().is_some() {
            self.nodes.pop();
        }
    }

    /// Number of hops
    pub fn len(&self) -> usize {
        self.relationships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relationships.is_empty()
    }

    /// Last node of the path
    pub fn end(&self) -> &'a Node {
        self.nodes[self.nodes.len() - 1]
    }

    /// Interleaved node/relationship summary: `["Person:1", "WORKS_AT", "Company:101"]`
    pub fn describe(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.nodes.len() + self.relationships.len());
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                out.push(self.relationships[i - 1].edge_type.to_string());
            }
            out.push(node.node_ref().to_string());
        }
        out
    }

    pub fn to_record(&self) -> PathRecord {
        PathRecord {
            path: self.describe(),
            nodes: self.nodes.iter().map(|n| n.to_record()).collect(),
            relationships: self.relationships.iter().map(|r| r.to_record()).collect(),
            bindings: None,
        }
    }
}

/// One complete match of a template
#[derive(Debug, Clone)]
pub struct Binding<'a> {
    /// Variable name -> bound entity, in template order
    pub variables: IndexMap<String, Entity<'a>>,
    pub path: Path<'a>,
}

impl<'a> Binding<'a> {
    pub fn get(&self, variable: &str) -> Option<Entity<'a>> {
        self.variables.get(variable).copied()
    }

    pub fn to_record(&self) -> PathRecord {
        let mut record = self.path.to_record();
        record.bindings = Some(
            self.variables
                .iter()
                .map(|(name, entity)| (name.clone(), entity.to_string()))
                .collect(),
        );
        record
    }
}

impl Bindings for Binding<'_> {
    fn resolve(&self, variable: &str) -> Option<Entity<'_>> {
        self.get(variable)
    }
}

/// Serializable path (and optional bindings) record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathRecord {
    pub path: Vec<String>,
    pub nodes: Vec<serde_json::Value>,
    pub relationships: Vec<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bindings: Option<IndexMap<String, String>>,
}

/// Serializable neighbor record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NeighborRecord {
    pub node: serde_json::Value,
    pub relationship: serde_json::Value,
}

impl NeighborRecord {
    pub fn new(node: &Node, relationship: &Edge) -> Self {
        NeighborRecord {
            node: node.to_record(),
            relationship: relationship.to_record(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeId, NodeRef};
    use serde_json::json;

    #[test]
    fn test_path_record_shape() {
        let person = Node::new("Person", 1);
        let company = Node::new("Company", 101);
        let works_at = Edge::new(
            EdgeId::new(1),
            "WORKS_AT",
            NodeRef::new("Person", 1),
            NodeRef::new("Company", 101),
        );

        let mut path = Path::new(&person);
        path.push(&works_at, &company);
        assert_eq!(path.len(), 1);
        assert_eq!(path.end().id, company.id);

        let record = serde_json::to_value(path.to_record()).unwrap();
        assert_eq!(
            record,
            json!({
                "path": ["Person:1", "WORKS_AT", "Company:101"],
                "nodes": [{"id": 1, "type": "Person"}, {"id": 101, "type": "Company"}],
                "relationships": [{"type": "WORKS_AT", "from": 1, "to": 101}]
            })
        );

        path.pop();
        path.pop();
        assert!(path.is_empty());
        assert_eq!(path.describe(), vec!["Person:1"]);
    }

    #[test]
    fn test_binding_record_lists_variables() {
        let a = Node::new("Person", 1);
        let b = Node::new("Person", 2);
        let knows = Edge::new(EdgeId::new(4), "KNOWS", a.node_ref(), b.node_ref());

        let mut path = Path::new(&a);
        path.push(&knows, &b);
        let mut variables = IndexMap::new();
        variables.insert("a".to_string(), Entity::Node(&a));
        variables.insert("r".to_string(), Entity::Edge(&knows));
        variables.insert("b".to_string(), Entity::Node(&b));
        let binding = Binding { variables, path };

        let record = binding.to_record();
        assert_eq!(
            serde_json::to_value(record.bindings).unwrap(),
            json!({"a": "Person:1", "r": "KNOWS#4", "b": "Person:2"})
        );
    }
}
