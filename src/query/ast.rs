//! Abstract Syntax Tree for graph commands
//!
//! Every command the parser accepts maps onto one `Command` variant. The
//! structural template of `MATCH` and the steps of `TRAVERSE` are kept as
//! plain data so the executor can validate them before any search.

use crate::graph::{Direction, EdgeId, EdgeType, Label, NodeRef, PropertyMap, PropertyValue};
use std::fmt;
use std::path::PathBuf;

/// A parsed command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// CREATE NODE Person {id: 1, name: "Alice"}
    CreateNode {
        label: Label,
        properties: PropertyMap,
    },
    /// CREATE RELATIONSHIP WORKS_AT FROM Person(id=1) TO Company(id=101) {since: 2018}
    CreateRelationship {
        edge_type: EdgeType,
        from: NodeRef,
        to: NodeRef,
        properties: PropertyMap,
    },
    /// GET NODE Person 1
    GetNode(NodeRef),
    /// GET NEIGHBORS Person 1 [WITH RELATIONSHIP KNOWS] [DIRECTION BOTH]
    GetNeighbors {
        node: NodeRef,
        edge_type: Option<EdgeType>,
        direction: Direction,
    },
    /// UPDATE NODE Person 1 {age: 31}
    UpdateNode {
        node: NodeRef,
        properties: PropertyMap,
    },
    /// DELETE NODE Person 1
    DeleteNode(NodeRef),
    /// UPDATE RELATIONSHIP WORKS_AT FROM Person(id=1) TO Company(id=101) {role: "Lead"}
    UpdateRelationship {
        edge_type: EdgeType,
        from: NodeRef,
        to: NodeRef,
        properties: PropertyMap,
    },
    /// DELETE RELATIONSHIP 3
    DeleteRelationship(EdgeId),
    /// TRAVERSE Person(id=1) -[WORKS_AT]-> Company [WHERE ...]
    Traverse {
        start: NodeRef,
        steps: Vec<TraversalStep>,
        condition: Condition,
    },
    /// MATCH (a:Person)-[r:KNOWS]->(b:Person) [WHERE ...]
    Match {
        template: Template,
        condition: Condition,
    },
    /// EXPORT TO JSON graph.json
    Export(PathBuf),
    /// IMPORT FROM JSON graph.json
    Import(PathBuf),
}

impl Command {
    /// True when the command never mutates the store
    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            Command::GetNode(_)
                | Command::GetNeighbors { .. }
                | Command::Traverse { .. }
                | Command::Match { .. }
                | Command::Export(_)
        )
    }

    /// Command keyword(s), used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Command::CreateNode { .. } => "CREATE NODE",
            Command::CreateRelationship { .. } => "CREATE RELATIONSHIP",
            Command::GetNode(_) => "GET NODE",
            Command::GetNeighbors { .. } => "GET NEIGHBORS",
            Command::UpdateNode { .. } => "UPDATE NODE",
            Command::DeleteNode(_) => "DELETE NODE",
            Command::UpdateRelationship { .. } => "UPDATE RELATIONSHIP",
            Command::DeleteRelationship(_) => "DELETE RELATIONSHIP",
            Command::Traverse { .. } => "TRAVERSE",
            Command::Match { .. } => "MATCH",
            Command::Export(_) => "EXPORT",
            Command::Import(_) => "IMPORT",
        }
    }
}

/// One hop of a traversal
#[derive(Debug, Clone, PartialEq)]
pub struct TraversalStep {
    /// Relationship type to follow
    pub edge_type: EdgeType,
    /// Outgoing (`-[R]->`) or incoming (`<-[R]-`)
    pub direction: Direction,
    /// Required label of the node reached, if any
    pub target_label: Option<Label>,
}

impl TraversalStep {
    pub fn new(edge_type: impl Into<EdgeType>, direction: Direction, target_label: impl Into<Label>) -> Self {
        TraversalStep {
            edge_type: edge_type.into(),
            direction,
            target_label: Some(target_label.into()),
        }
    }

    /// Step that accepts any label at the far end
    pub fn any(edge_type: impl Into<EdgeType>, direction: Direction) -> Self {
        TraversalStep {
            edge_type: edge_type.into(),
            direction,
            target_label: None,
        }
    }
}

/// Node slot of a pattern: `(a:Person)` or `(:Person)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodePattern {
    pub variable: Option<String>,
    pub label: Label,
}

impl NodePattern {
    pub fn new(variable: Option<&str>, label: impl Into<Label>) -> Self {
        NodePattern {
            variable: variable.map(str::to_string),
            label: label.into(),
        }
    }
}

/// Relationship slot of a pattern: `-[r:KNOWS]->` or `<-[:KNOWS]-`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipPattern {
    pub variable: Option<String>,
    pub edge_type: EdgeType,
    /// `Outgoing` or `Incoming`, relative to the preceding node slot
    pub direction: Direction,
}

impl RelationshipPattern {
    pub fn new(variable: Option<&str>, edge_type: impl Into<EdgeType>, direction: Direction) -> Self {
        RelationshipPattern {
            variable: variable.map(str::to_string),
            edge_type: edge_type.into(),
            direction,
        }
    }
}

/// Structural template: a start node slot followed by (relationship, node) segments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub start: NodePattern,
    pub segments: Vec<(RelationshipPattern, NodePattern)>,
}

impl Template {
    pub fn new(start: NodePattern) -> Self {
        Template {
            start,
            segments: Vec::new(),
        }
    }

    /// Append a segment (builder style)
    pub fn then(mut self, relationship: RelationshipPattern, node: NodePattern) -> Self {
        self.segments.push((relationship, node));
        self
    }

    /// Node slots in path order
    pub fn node_slots(&self) -> impl Iterator<Item = &NodePattern> {
        std::iter::once(&self.start).chain(self.segments.iter().map(|(_, n)| n))
    }

    /// Relationship slots in path order
    pub fn relationship_slots(&self) -> impl Iterator<Item = &RelationshipPattern> {
        self.segments.iter().map(|(r, _)| r)
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
        };
        write!(f, "{}", symbol)
    }
}

/// Boolean filter over bound variables
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Always true (no WHERE clause)
    True,
    /// `variable.property op literal`
    Comparison {
        variable: String,
        property: String,
        op: CompareOp,
        value: PropertyValue,
    },
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
}

impl Condition {
    pub fn compare(
        variable: impl Into<String>,
        property: impl Into<String>,
        op: CompareOp,
        value: impl Into<PropertyValue>,
    ) -> Self {
        Condition::Comparison {
            variable: variable.into(),
            property: property.into(),
            op,
            value: value.into(),
        }
    }

    pub fn and(self, other: Condition) -> Self {
        Condition::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Condition) -> Self {
        Condition::Or(Box::new(self), Box::new(other))
    }

    /// Variables referenced anywhere in the tree, in first-use order
    pub fn variables(&self) -> Vec<&str> {
        let mut names = Vec::new();
        let mut stack = vec![self];
        while let Some(condition) = stack.pop() {
            match condition {
                Condition::True => {}
                Condition::Comparison { variable, .. } => {
                    if !names.contains(&variable.as_str()) {
                        names.push(variable.as_str());
                    }
                }
                Condition::And(left, right) | Condition::Or(left, right) => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }
        names
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::True => write!(f, "TRUE"),
            Condition::Comparison {
                variable,
                property,
                op,
                value,
            } => write!(f, "{}.{} {} {}", variable, property, op, value),
            Condition::And(left, right) => write!(f, "({} AND {})", left, right),
            Condition::Or(left, right) => write!(f, "({} OR {})", left, right),
        }
    }
}
