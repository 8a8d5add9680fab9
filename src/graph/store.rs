//! In-memory graph storage implementation
//!
//! Nodes and relationships live in two arenas addressed by slot number.
//! Adjacency lists and the type indices hold slot numbers only, so the
//! mutual node/relationship references never form ownership cycles.
//! Slots are handed out monotonically and never reused, which makes slot
//! order the same as insertion order everywhere.

use super::edge::Edge;
use super::node::Node;
use super::property::PropertyMap;
use super::types::{Direction, EdgeId, EdgeType, Label, NodeId, NodeRef};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during graph operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Node {0} not found")]
    NodeNotFound(NodeRef),

    #[error("Relationship {0} not found")]
    EdgeNotFound(EdgeId),

    #[error("No {edge_type} relationship from {from} to {to}")]
    RelationshipNotFound {
        edge_type: EdgeType,
        from: NodeRef,
        to: NodeRef,
    },

    #[error("Node {0} already exists")]
    DuplicateIdentity(NodeRef),

    #[error("Relationship {0} already exists")]
    DuplicateRelationship(EdgeId),

    #[error("Invalid property '{key}': {reason}")]
    InvalidProperty { key: String, reason: String },
}

impl GraphError {
    /// True for the "referenced entity is absent" variants
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            GraphError::NodeNotFound(_)
                | GraphError::EdgeNotFound(_)
                | GraphError::RelationshipNotFound { .. }
        )
    }
}

pub type GraphResult<T> = Result<T, GraphError>;

/// Largest node or relationship id the store accepts
pub const MAX_ID: u64 = i64::MAX as u64;

/// In-memory graph storage
///
/// - nodes / edges: arenas of live entities (`None` marks a deleted slot)
/// - node_slots / edge_slots: identity -> arena slot
/// - outgoing / incoming: node slot -> edge slots, in insertion order
/// - label_index / edge_type_index: type tag -> slots, in insertion order
#[derive(Debug)]
pub struct GraphStore {
    /// Node arena
    nodes: Vec<Option<Node>>,

    /// Edge arena
    edges: Vec<Option<Edge>>,

    /// Node identity lookup
    node_slots: HashMap<NodeRef, usize>,

    /// Edge identity lookup
    edge_slots: HashMap<EdgeId, usize>,

    /// Outgoing edges for each node slot (adjacency list)
    outgoing: Vec<Vec<usize>>,

    /// Incoming edges for each node slot (adjacency list)
    incoming: Vec<Vec<usize>>,

    /// Label index; entries survive when emptied so the tag stays known
    label_index: HashMap<Label, Vec<usize>>,

    /// Edge type index; same retention rule as `label_index`
    edge_type_index: HashMap<EdgeType, Vec<usize>>,

    /// Next id to assign per label
    next_node_ids: HashMap<Label, u64>,

    /// Next relationship sequence id
    next_edge_id: u64,
}

impl GraphStore {
    /// Create a new empty graph store
    pub fn new() -> Self {
        GraphStore {
            nodes: Vec::new(),
            edges: Vec::new(),
            node_slots: HashMap::new(),
            edge_slots: HashMap::new(),
            outgoing: Vec::new(),
            incoming: Vec::new(),
            label_index: HashMap::new(),
            edge_type_index: HashMap::new(),
            next_node_ids: HashMap::new(),
            next_edge_id: 1,
        }
    }

    // ============================================================
    // Nodes
    // ============================================================

    /// Create a node
    ///
    /// When `id` is `None` the next free id for the label is assigned.
    pub fn create_node(
        &mut self,
        label: impl Into<Label>,
        id: Option<NodeId>,
        properties: PropertyMap,
    ) -> GraphResult<NodeRef> {
        let label = label.into();
        validate_node_properties(&properties)?;

        let id = id.unwrap_or_else(|| self.next_node_id(&label));
        check_id(id.as_u64())?;
        let node_ref = NodeRef::new(label.clone(), id);
        if self.node_slots.contains_key(&node_ref) {
            return Err(GraphError::DuplicateIdentity(node_ref));
        }

        self.insert_node(Node::new_with_properties(label, id, properties));
        debug!("Created node {}", node_ref);
        Ok(node_ref)
    }

    /// Get a node by identity
    pub fn get_node(&self, node: &NodeRef) -> GraphResult<&Node> {
        let slot = self.node_slot(node)?;
        self.nodes[slot]
            .as_ref()
            .ok_or_else(|| GraphError::NodeNotFound(node.clone()))
    }

    /// Check if a node exists
    pub fn has_node(&self, node: &NodeRef) -> bool {
        self.node_slots.contains_key(node)
    }

    /// Merge a property patch into an existing node
    pub fn update_node(&mut self, node: &NodeRef, patch: PropertyMap) -> GraphResult<()> {
        let slot = self.node_slot(node)?;
        validate_node_properties(&patch)?;

        let target = self.nodes[slot]
            .as_mut()
            .ok_or_else(|| GraphError::NodeNotFound(node.clone()))?;
        target.merge_properties(patch);
        debug!("Updated node {}", node);
        Ok(())
    }

    /// Delete a node and all its connected edges
    pub fn delete_node(&mut self, node: &NodeRef) -> GraphResult<Node> {
        let slot = self.node_slot(node)?;
        let removed = self.nodes[slot]
            .take()
            .ok_or_else(|| GraphError::NodeNotFound(node.clone()))?;

        let outgoing = std::mem::take(&mut self.outgoing[slot]);
        let incoming = std::mem::take(&mut self.incoming[slot]);
        let mut cascaded = 0;
        for edge_slot in merge_slots(&outgoing, &incoming) {
            if self.detach_edge(edge_slot).is_some() {
                cascaded += 1;
            }
        }

        if let Some(slots) = self.label_index.get_mut(&removed.label) {
            slots.retain(|&s| s != slot);
        }
        self.node_slots.remove(node);

        debug!("Deleted node {} ({} relationships cascaded)", node, cascaded);
        Ok(removed)
    }

    // ============================================================
    // Relationships
    // ============================================================

    /// Create a relationship between two existing nodes
    pub fn create_relationship(
        &mut self,
        edge_type: impl Into<EdgeType>,
        source: &NodeRef,
        target: &NodeRef,
        properties: PropertyMap,
    ) -> GraphResult<EdgeId> {
        // Validate nodes exist
        self.node_slot(source)?;
        self.node_slot(target)?;
        validate_properties(&properties)?;
        check_id(self.next_edge_id)?;

        let edge_id = EdgeId::new(self.next_edge_id);
        self.next_edge_id += 1;

        let edge = Edge::new_with_properties(
            edge_id,
            edge_type,
            source.clone(),
            target.clone(),
            properties,
        );
        debug!("Created relationship {} {} -> {}", edge.edge_type, source, target);
        self.insert_edge(edge);
        Ok(edge_id)
    }

    /// Get a relationship by id
    pub fn get_relationship(&self, id: EdgeId) -> GraphResult<&Edge> {
        self.edge_slots
            .get(&id)
            .and_then(|&slot| self.edges[slot].as_ref())
            .ok_or(GraphError::EdgeNotFound(id))
    }

    /// Check if a relationship exists
    pub fn has_relationship(&self, id: EdgeId) -> bool {
        self.edge_slots.contains_key(&id)
    }

    /// Merge a property patch into an existing relationship
    pub fn update_relationship(&mut self, id: EdgeId, patch: PropertyMap) -> GraphResult<()> {
        let slot = *self.edge_slots.get(&id).ok_or(GraphError::EdgeNotFound(id))?;
        validate_properties(&patch)?;

        let edge = self.edges[slot].as_mut().ok_or(GraphError::EdgeNotFound(id))?;
        edge.merge_properties(patch);
        debug!("Updated relationship {}", id);
        Ok(())
    }

    /// First relationship of `edge_type` going from `source` to `target`
    pub fn find_relationship(
        &self,
        edge_type: &EdgeType,
        source: &NodeRef,
        target: &NodeRef,
    ) -> Option<EdgeId> {
        let slot = *self.node_slots.get(source)?;
        self.outgoing[slot]
            .iter()
            .filter_map(|&e| self.edges[e].as_ref())
            .find(|e| &e.edge_type == edge_type && &e.target == target)
            .map(|e| e.id)
    }

    /// Delete a relationship; both endpoints stay
    pub fn delete_relationship(&mut self, id: EdgeId) -> GraphResult<Edge> {
        let slot = *self.edge_slots.get(&id).ok_or(GraphError::EdgeNotFound(id))?;
        let edge = self.detach_edge(slot).ok_or(GraphError::EdgeNotFound(id))?;
        debug!("Deleted relationship {}", id);
        Ok(edge)
    }

    /// Neighbors of a node as `(neighbor, relationship)` pairs
    ///
    /// Results follow relationship insertion order. With `Direction::Both`
    /// a self-loop is reported once.
    pub fn get_neighbors(
        &self,
        node: &NodeRef,
        edge_type: Option<&EdgeType>,
        direction: Direction,
    ) -> GraphResult<Vec<(&Node, &Edge)>> {
        let slot = self.node_slot(node)?;

        let edge_slots = match direction {
            Direction::Outgoing => self.outgoing[slot].clone(),
            Direction::Incoming => self.incoming[slot].clone(),
            Direction::Both => merge_slots(&self.outgoing[slot], &self.incoming[slot]),
        };

        let neighbors = edge_slots
            .into_iter()
            .filter_map(|e| self.edges[e].as_ref())
            .filter(|edge| edge_type.map_or(true, |t| &edge.edge_type == t))
            .filter_map(|edge| {
                let other = edge.other_end(node);
                self.node_slots
                    .get(other)
                    .and_then(|&s| self.nodes[s].as_ref())
                    .map(|n| (n, edge))
            })
            .collect();

        Ok(neighbors)
    }

    // ============================================================
    // Scans
    // ============================================================

    /// All nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().flatten()
    }

    /// All relationships in insertion order
    pub fn relationships(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter().flatten()
    }

    /// Get all nodes with a specific label
    pub fn get_nodes_by_label(&self, label: &Label) -> Vec<&Node> {
        self.label_index
            .get(label)
            .map(|slots| slots.iter().filter_map(|&s| self.nodes[s].as_ref()).collect())
            .unwrap_or_default()
    }

    /// Get all relationships of a specific type
    pub fn get_edges_by_type(&self, edge_type: &EdgeType) -> Vec<&Edge> {
        self.edge_type_index
            .get(edge_type)
            .map(|slots| slots.iter().filter_map(|&s| self.edges[s].as_ref()).collect())
            .unwrap_or_default()
    }

    /// Whether any node has ever carried this label
    pub fn has_label(&self, label: &Label) -> bool {
        self.label_index.contains_key(label)
    }

    /// Whether any relationship has ever carried this type
    pub fn has_edge_type(&self, edge_type: &EdgeType) -> bool {
        self.edge_type_index.contains_key(edge_type)
    }

    /// Get total number of nodes
    pub fn node_count(&self) -> usize {
        self.node_slots.len()
    }

    /// Get total number of relationships
    pub fn relationship_count(&self) -> usize {
        self.edge_slots.len()
    }

    /// Clear all data from the graph
    pub fn clear(&mut self) {
        *self = GraphStore::new();
    }

    // ============================================================
    // Recovery methods - used to rebuild a graph from an export
    // ============================================================

    /// Insert a node keeping its persisted identity
    pub fn insert_recovered_node(&mut self, node: Node) -> GraphResult<()> {
        let node_ref = node.node_ref();
        if self.node_slots.contains_key(&node_ref) {
            return Err(GraphError::DuplicateIdentity(node_ref));
        }
        check_id(node.id.as_u64())?;
        validate_node_properties(&node.properties)?;
        self.insert_node(node);
        Ok(())
    }

    /// Insert a relationship keeping its persisted id
    ///
    /// Source and target nodes must already exist.
    pub fn insert_recovered_edge(&mut self, edge: Edge) -> GraphResult<()> {
        if self.edge_slots.contains_key(&edge.id) {
            return Err(GraphError::DuplicateRelationship(edge.id));
        }
        check_id(edge.id.as_u64())?;
        self.node_slot(&edge.source)?;
        self.node_slot(&edge.target)?;
        validate_properties(&edge.properties)?;

        // Update next_edge_id to be higher than any recovered edge
        if edge.id.as_u64() >= self.next_edge_id {
            self.next_edge_id = edge.id.as_u64() + 1;
        }
        self.insert_edge(edge);
        Ok(())
    }

    // ============================================================
    // Internals
    // ============================================================

    fn node_slot(&self, node: &NodeRef) -> GraphResult<usize> {
        self.node_slots
            .get(node)
            .copied()
            .ok_or_else(|| GraphError::NodeNotFound(node.clone()))
    }

    fn next_node_id(&self, label: &Label) -> NodeId {
        NodeId::new(self.next_node_ids.get(label).copied().unwrap_or(1))
    }

    fn insert_node(&mut self, node: Node) {
        let slot = self.nodes.len();
        let node_ref = node.node_ref();

        let next = self.next_node_ids.entry(node.label.clone()).or_insert(1);
        if node.id.as_u64() >= *next {
            *next = node.id.as_u64() + 1;
        }
        self.label_index
            .entry(node.label.clone())
            .or_default()
            .push(slot);

        self.nodes.push(Some(node));
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        self.node_slots.insert(node_ref, slot);
    }

    /// Endpoints must have been validated by the caller
    fn insert_edge(&mut self, edge: Edge) {
        let slot = self.edges.len();
        let source = self.node_slots[&edge.source];
        let target = self.node_slots[&edge.target];

        self.outgoing[source].push(slot);
        self.incoming[target].push(slot);
        self.edge_type_index
            .entry(edge.edge_type.clone())
            .or_default()
            .push(slot);
        self.edge_slots.insert(edge.id, slot);
        self.edges.push(Some(edge));
    }

    /// Remove an edge from the arena and from every index that mentions it
    fn detach_edge(&mut self, slot: usize) -> Option<Edge> {
        let edge = self.edges.get_mut(slot)?.take()?;

        if let Some(&s) = self.node_slots.get(&edge.source) {
            self.outgoing[s].retain(|&e| e != slot);
        }
        if let Some(&t) = self.node_slots.get(&edge.target) {
            self.incoming[t].retain(|&e| e != slot);
        }
        if let Some(slots) = self.edge_type_index.get_mut(&edge.edge_type) {
            slots.retain(|&e| e != slot);
        }
        self.edge_slots.remove(&edge.id);
        Some(edge)
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Merge two ascending slot lists, dropping duplicates
fn merge_slots(a: &[usize], b: &[usize]) -> Vec<usize> {
    let mut merged = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() || j < b.len() {
        let next = match (a.get(i), b.get(j)) {
            (Some(&x), Some(&y)) if x < y => {
                i += 1;
                x
            }
            (Some(&x), Some(&y)) if x > y => {
                j += 1;
                y
            }
            (Some(&x), Some(_)) => {
                i += 1;
                j += 1;
                x
            }
            (Some(&x), None) => {
                i += 1;
                x
            }
            (None, Some(&y)) => {
                j += 1;
                y
            }
            (None, None) => break,
        };
        merged.push(next);
    }
    merged
}

/// Ids above `MAX_ID` cannot be read back as integer property values
fn check_id(id: u64) -> GraphResult<()> {
    if id > MAX_ID {
        return Err(GraphError::InvalidProperty {
            key: "id".to_string(),
            reason: format!("id {} exceeds the maximum of {}", id, MAX_ID),
        });
    }
    Ok(())
}

fn validate_properties(properties: &PropertyMap) -> GraphResult<()> {
    for (key, value) in properties {
        if key.is_empty() {
            return Err(GraphError::InvalidProperty {
                key: key.clone(),
                reason: "property names must not be empty".to_string(),
            });
        }
        value.validate().map_err(|reason| GraphError::InvalidProperty {
            key: key.clone(),
            reason,
        })?;
    }
    Ok(())
}

fn validate_node_properties(properties: &PropertyMap) -> GraphResult<()> {
    if properties.contains_key("id") {
        return Err(GraphError::InvalidProperty {
            key: "id".to_string(),
            reason: "the id is part of the node identity".to_string(),
        });
    }
    validate_properties(properties)
}
