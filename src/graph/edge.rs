//! Relationship implementation for the typed property graph

use super::property::{PropertyMap, PropertyValue};
use super::types::{EdgeId, EdgeType, NodeRef};
use serde::{Deserialize, Serialize};

/// A directed, typed relationship between two nodes
///
/// The store owns every `Edge`; endpoints only keep adjacency entries
/// pointing back at it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Store-wide sequence id
    pub id: EdgeId,

    /// Type of relationship (e.g., "KNOWS", "WORKS_AT")
    #[serde(rename = "type")]
    pub edge_type: EdgeType,

    /// Source node (edge goes FROM this node)
    #[serde(rename = "from")]
    pub source: NodeRef,

    /// Target node (edge goes TO this node)
    #[serde(rename = "to")]
    pub target: NodeRef,

    /// Properties associated with this edge
    pub properties: PropertyMap,
}

impl Edge {
    /// Create a new directed edge
    pub fn new(
        id: EdgeId,
        edge_type: impl Into<EdgeType>,
        source: NodeRef,
        target: NodeRef,
    ) -> Self {
        Edge {
            id,
            edge_type: edge_type.into(),
            source,
            target,
            properties: PropertyMap::new(),
        }
    }

    /// Create a new edge with properties
    pub fn new_with_properties(
        id: EdgeId,
        edge_type: impl Into<EdgeType>,
        source: NodeRef,
        target: NodeRef,
        properties: PropertyMap,
    ) -> Self {
        Edge {
            id,
            edge_type: edge_type.into(),
            source,
            target,
            properties,
        }
    }

    /// Set a property value
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        self.properties.insert(key.into(), value.into());
    }

    /// Get a property value
    pub fn get_property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    /// Merge a patch into the bag, appending new keys
    pub fn merge_properties(&mut self, patch: PropertyMap) {
        for (key, value) in patch {
            self.properties.insert(key, value);
        }
    }

    /// The endpoint opposite `node`
    pub fn other_end(&self, node: &NodeRef) -> &NodeRef {
        if &self.source == node {
            &self.target
        } else {
            &self.source
        }
    }

    /// Result-record form: `{"type": "WORKS_AT", "from": 1, "to": 101, ...properties}`
    pub fn to_record(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        map.insert(
            "type".to_string(),
            serde_json::Value::String(self.edge_type.as_str().to_string()),
        );
        map.insert("from".to_string(), serde_json::Value::from(self.source.id.as_u64()));
        map.insert("to".to_string(), serde_json::Value::from(self.target.id.as_u64()));
        for (key, value) in &self.properties {
            map.entry(key.clone()).or_insert_with(|| value.to_json());
        }
        serde_json::Value::Object(map)
    }
}
