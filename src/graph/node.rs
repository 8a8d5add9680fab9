//! Node implementation for the typed property graph

use super::property::{PropertyMap, PropertyValue};
use super::types::{Label, NodeId, NodeRef};
use serde::{Deserialize, Serialize};

/// A typed node
///
/// Identity is the pair (label, id) and never changes after creation;
/// properties are mutable through the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Type tag of this node
    #[serde(rename = "type")]
    pub label: Label,

    /// Id, unique among nodes of the same label
    pub id: NodeId,

    /// Properties associated with this node
    pub properties: PropertyMap,
}

impl Node {
    /// Create a new node without properties
    pub fn new(label: impl Into<Label>, id: impl Into<NodeId>) -> Self {
        Node {
            label: label.into(),
            id: id.into(),
            properties: PropertyMap::new(),
        }
    }

    /// Create a new node with properties
    pub fn new_with_properties(
        label: impl Into<Label>,
        id: impl Into<NodeId>,
        properties: PropertyMap,
    ) -> Self {
        Node {
            label: label.into(),
            id: id.into(),
            properties,
        }
    }

    /// Identity of this node
    pub fn node_ref(&self) -> NodeRef {
        NodeRef {
            label: self.label.clone(),
            id: self.id,
        }
    }

    /// Check whether this node has the given identity
    pub fn is(&self, node: &NodeRef) -> bool {
        self.id == node.id && self.label == node.label
    }

    /// Set a property value
    pub fn set_property(
        &mut self,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Option<PropertyValue> {
        self.properties.insert(key.into(), value.into())
    }

    /// Get a property value
    pub fn get_property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    /// Merge a patch into the bag: existing keys keep their slot, new keys are appended
    pub fn merge_properties(&mut self, patch: PropertyMap) {
        for (key, value) in patch {
            self.properties.insert(key, value);
        }
    }

    /// Check if property exists
    pub fn has_property(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    /// Result-record form: `{"id": 1, "type": "Person", ...properties}`
    pub fn to_record(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        map.insert("id".to_string(), serde_json::Value::from(self.id.as_u64()));
        map.insert(
            "type".to_string(),
            serde_json::Value::String(self.label.as_str().to_string()),
        );
        for (key, value) in &self.properties {
            map.entry(key.clone()).or_insert_with(|| value.to_json());
        }
        serde_json::Value::Object(map)
    }
}
