//! Condition evaluation against bound variables
//!
//! Evaluation never fails. A missing property or unbound variable makes a
//! comparison false (true for `!=`); values of incomparable kinds make every
//! operator false.

use crate::graph::{Edge, Node, PropertyValue};
use crate::query::ast::{CompareOp, Condition};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

/// A node or relationship bound to a variable
#[derive(Debug, Clone, Copy)]
pub enum Entity<'a> {
    Node(&'a Node),
    Edge(&'a Edge),
}

impl<'a> Entity<'a> {
    /// Property lookup; `id` falls back to the entity's own id
    pub fn property(&self, key: &str) -> Option<Cow<'a, PropertyValue>> {
        match *self {
            Entity::Node(node) => match node.get_property(key) {
                Some(value) => Some(Cow::Borrowed(value)),
                None if key == "id" => id_value(node.id.as_u64()),
                None => None,
            },
            Entity::Edge(edge) => {
                if key == "id" {
                    id_value(edge.id.as_u64())
                } else {
                    edge.get_property(key).map(Cow::Borrowed)
                }
            }
        }
    }

    /// Same node or relationship
    pub fn same_as(&self, other: &Entity<'_>) -> bool {
        match (self, other) {
            (Entity::Node(a), Entity::Node(b)) => a.is(&b.node_ref()),
            (Entity::Edge(a), Entity::Edge(b)) => a.id == b.id,
            _ => false,
        }
    }
}

/// An id that does not fit an integer value reads as absent
fn id_value<'a>(id: u64) -> Option<Cow<'a, PropertyValue>> {
    i64::try_from(id).ok().map(|id| Cow::Owned(PropertyValue::Integer(id)))
}

impl fmt::Display for Entity<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::Node(node) => write!(f, "{}:{}", node.label, node.id),
            Entity::Edge(edge) => write!(f, "{}#{}", edge.edge_type, edge.id),
        }
    }
}

/// Variable environment a condition is evaluated in
pub trait Bindings {
    fn resolve(&self, variable: &str) -> Option<Entity<'_>>;
}

impl<'a> Bindings for HashMap<String, Entity<'a>> {
    fn resolve(&self, variable: &str) -> Option<Entity<'_>> {
        self.get(variable).copied()
    }
}

impl<'a> Bindings for indexmap::IndexMap<String, Entity<'a>> {
    fn resolve(&self, variable: &str) -> Option<Entity<'_>> {
        self.get(variable).copied()
    }
}

/// Evaluate a condition; `And`/`Or` short-circuit left to right
pub fn evaluate<B: Bindings + ?Sized>(condition: &Condition, bindings: &B) -> bool {
    match condition {
        Condition::True => true,
        Condition::Comparison {
            variable,
            property,
            op,
            value,
        } => match bindings
            .resolve(variable)
            .and_then(|entity| entity.property(property))
        {
            Some(actual) => compare(&actual, *op, value),
            None => *op == CompareOp::Ne,
        },
        Condition::And(left, right) => evaluate(left, bindings) && evaluate(right, bindings),
        Condition::Or(left, right) => evaluate(left, bindings) || evaluate(right, bindings),
    }
}

/// Apply a comparison operator; incomparable kinds give `false`
pub fn compare(left: &PropertyValue, op: CompareOp, right: &PropertyValue) -> bool {
    match op {
        CompareOp::Eq => left.loose_eq(right) == Some(true),
        CompareOp::Ne => left.loose_eq(right) == Some(false),
        CompareOp::Lt => left.loose_cmp(right) == Some(Ordering::Less),
        CompareOp::Le => matches!(left.loose_cmp(right), Some(Ordering::Less | Ordering::Equal)),
        CompareOp::Gt => left.loose_cmp(right) == Some(Ordering::Greater),
        CompareOp::Ge => matches!(
            left.loose_cmp(right),
            Some(Ordering::Greater | Ordering::Equal)
        ),
    }
}

impl Condition {
    /// Evaluate against a variable environment
    pub fn evaluate<B: Bindings + ?Sized>(&self, bindings: &B) -> bool {
        evaluate(self, bindings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{properties, EdgeId, NodeId, NodeRef, MAX_ID};

    fn alice() -> Node {
        Node::new_with_properties(
            "Person",
            1,
            properties([("name", PropertyValue::from("Alice")), ("age", 30i64.into())]),
        )
    }

    fn env<'a>(pairs: &[(&str, Entity<'a>)]) -> HashMap<String, Entity<'a>> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_numeric_comparisons() {
        let node = alice();
        let bindings = env(&[("Person", Entity::Node(&node))]);

        assert!(Condition::compare("Person", "age", CompareOp::Lt, 35i64).evaluate(&bindings));
        assert!(!Condition::compare("Person", "age", CompareOp::Lt, 20i64).evaluate(&bindings));
        assert!(Condition::compare("Person", "age", CompareOp::Le, 30i64).evaluate(&bindings));
        assert!(Condition::compare("Person", "age", CompareOp::Ge, 29.5).evaluate(&bindings));
        assert!(Condition::compare("Person", "age", CompareOp::Eq, 30.0).evaluate(&bindings));
    }

    #[test]
    fn test_absent_property_and_unbound_variable() {
        let node = alice();
        let bindings = env(&[("p", Entity::Node(&node))]);

        for op in [CompareOp::Lt, CompareOp::Le, CompareOp::Gt, CompareOp::Ge, CompareOp::Eq] {
            assert!(!Condition::compare("p", "email", op, "x").evaluate(&bindings));
            assert!(!Condition::compare("q", "name", op, "x").evaluate(&bindings));
        }
        assert!(Condition::compare("p", "email", CompareOp::Ne, "x").evaluate(&bindings));
        assert!(Condition::compare("q", "name", CompareOp::Ne, "x").evaluate(&bindings));
    }

    #[test]
    fn test_type_mismatch_is_false_for_every_operator() {
        let node = alice();
        let bindings = env(&[("p", Entity::Node(&node))]);

        for op in [
            CompareOp::Lt,
            CompareOp::Le,
            CompareOp::Gt,
            CompareOp::Ge,
            CompareOp::Eq,
            CompareOp::Ne,
        ] {
            assert!(!Condition::compare("p", "age", op, "30").evaluate(&bindings));
            assert!(!Condition::compare("p", "name", op, 1i64).evaluate(&bindings));
        }
    }

    #[test]
    fn test_booleans_only_support_equality() {
        let mut node = alice();
        node.set_property("active", true);
        let bindings = env(&[("p", Entity::Node(&node))]);

        assert!(Condition::compare("p", "active", CompareOp::Eq, true).evaluate(&bindings));
        assert!(Condition::compare("p", "active", CompareOp::Ne, false).evaluate(&bindings));
        assert!(!Condition::compare("p", "active", CompareOp::Gt, false).evaluate(&bindings));
    }

    #[test]
    fn test_id_resolves_to_identity() {
        let node = alice();
        let mut edge = Edge::new(
            EdgeId::new(7),
            "KNOWS",
            NodeRef::new("Person", 1),
            NodeRef::new("Person", 2),
        );
        edge.set_property("id", 99i64);
        let bindings = env(&[("p", Entity::Node(&node)), ("r", Entity::Edge(&edge))]);

        assert!(Condition::compare("p", "id", CompareOp::Eq, 1i64).evaluate(&bindings));
        assert!(Condition::compare("r", "id", CompareOp::Eq, 7i64).evaluate(&bindings));
    }

    #[test]
    fn test_id_beyond_integer_range_reads_as_absent() {
        let node = Node::new("Person", NodeId::new(u64::MAX));
        let bindings = env(&[("p", Entity::Node(&node))]);

        assert!(Entity::Node(&node).property("id").is_none());
        assert!(!Condition::compare("p", "id", CompareOp::Gt, 0i64).evaluate(&bindings));
        assert!(!Condition::compare("p", "id", CompareOp::Eq, -1i64).evaluate(&bindings));
        assert!(Condition::compare("p", "id", CompareOp::Ne, 0i64).evaluate(&bindings));

        let top = Node::new("Person", NodeId::new(MAX_ID));
        let bindings = env(&[("p", Entity::Node(&top))]);
        assert!(Condition::compare("p", "id", CompareOp::Eq, i64::MAX).evaluate(&bindings));
    }

    #[test]
    fn test_same_as_uses_identity() {
        let node = alice();
        let twin = Node::new("Person", 1);
        let other = Node::new("Company", 1);

        assert!(Entity::Node(&node).same_as(&Entity::Node(&twin)));
        assert!(!Entity::Node(&node).same_as(&Entity::Node(&other)));
    }

    #[test]
    fn test_and_or_short_circuit() {
        let node = alice();
        let bindings = env(&[("p", Entity::Node(&node))]);
        let yes = Condition::compare("p", "name", CompareOp::Eq, "Alice");
        let no = Condition::compare("p", "name", CompareOp::Eq, "Bob");

        assert!(yes.clone().or(no.clone()).evaluate(&bindings));
        assert!(!yes.clone().and(no.clone()).evaluate(&bindings));
        assert!(no.clone().or(yes.clone()).evaluate(&bindings));
        assert!(Condition::True.evaluate(&bindings));
    }

    #[test]
    fn test_entity_display() {
        let node = alice();
        let edge = Edge::new(
            EdgeId::new(3),
            "KNOWS",
            NodeRef::new("Person", 1),
            NodeRef::new("Person", 2),
        );
        assert_eq!(Entity::Node(&node).to_string(), "Person:1");
        assert_eq!(Entity::Edge(&edge).to_string(), "KNOWS#3");
    }
}
