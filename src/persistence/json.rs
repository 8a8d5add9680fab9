//! JSON export and import of a whole graph
//!
//! Document layout:
//!
//! ```json
//! {
//!   "nodes": [{"type": "Person", "id": 1, "properties": {"name": "Alice"}}],
//!   "relationships": [{"type": "WORKS_AT", "id": 1,
//!                      "from": {"type": "Person", "id": 1},
//!                      "to": {"type": "Company", "id": 101},
//!                      "properties": {"since": 2018}}]
//! }
//! ```
//!
//! Nodes, relationships and property keys keep their order in both
//! directions.

use super::{PersistenceError, PersistenceResult};
use crate::graph::property::properties_to_json;
use crate::graph::{
    Edge, EdgeId, EdgeType, GraphError, GraphStore, Label, Node, NodeId, NodeRef, PropertyMap,
    PropertyValue,
};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

type JsonMap = serde_json::Map<String, serde_json::Value>;

/// Serialized form of a whole graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default)]
    pub nodes: Vec<NodeDocument>,
    #[serde(default)]
    pub relationships: Vec<RelationshipDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDocument {
    #[serde(rename = "type")]
    pub label: Label,
    pub id: NodeId,
    #[serde(default)]
    pub properties: JsonMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipDocument {
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
    pub id: EdgeId,
    pub from: NodeRef,
    pub to: NodeRef,
    #[serde(default)]
    pub properties: JsonMap,
}

/// Snapshot a store into a document
pub fn to_document(store: &GraphStore) -> GraphDocument {
    GraphDocument {
        nodes: store
            .nodes()
            .map(|node| NodeDocument {
                label: node.label.clone(),
                id: node.id,
                properties: properties_to_json(&node.properties),
            })
            .collect(),
        relationships: store
            .relationships()
            .map(|edge| RelationshipDocument {
                edge_type: edge.edge_type.clone(),
                id: edge.id,
                from: edge.source.clone(),
                to: edge.target.clone(),
                properties: properties_to_json(&edge.properties),
            })
            .collect(),
    }
}

/// Rebuild a fresh store from a document
///
/// Fails on the first duplicate identity, dangling endpoint or unsupported
/// property value; nothing partial is returned.
pub fn from_document(document: GraphDocument) -> PersistenceResult<GraphStore> {
    let mut store = GraphStore::new();

    for node in document.nodes {
        let properties = properties_from_json(node.properties)?;
        store.insert_recovered_node(Node::new_with_properties(node.label, node.id, properties))?;
    }
    for rel in document.relationships {
        let properties = properties_from_json(rel.properties)?;
        store.insert_recovered_edge(Edge::new_with_properties(
            rel.id,
            rel.edge_type,
            rel.from,
            rel.to,
            properties,
        ))?;
    }

    Ok(store)
}

fn properties_from_json(map: JsonMap) -> Result<PropertyMap, GraphError> {
    map.into_iter()
        .map(|(key, value)| match PropertyValue::from_json(value) {
            Ok(value) => Ok((key, value)),
            Err(reason) => Err(GraphError::InvalidProperty { key, reason }),
        })
        .collect()
}

/// Serialize a store to a JSON string
pub fn to_json_string(store: &GraphStore, pretty: bool) -> PersistenceResult<String> {
    let document = to_document(store);
    let text = if pretty {
        serde_json::to_string_pretty(&document)?
    } else {
        serde_json::to_string(&document)?
    };
    Ok(text)
}

/// Parse a JSON string into a fresh store
pub fn from_json_str(text: &str) -> PersistenceResult<GraphStore> {
    let document: GraphDocument = serde_json::from_str(text)?;
    from_document(document)
}

/// Write the store to `path`
///
/// The document goes to a hidden temporary sibling, is synced, then renamed
/// over the target.
pub fn export_json(store: &GraphStore, path: impl AsRef<Path>, pretty: bool) -> PersistenceResult<()> {
    let path = path.as_ref();
    let document = to_document(store);
    let temp = temp_sibling(path);

    let written = write_document(&document, &temp, pretty).and_then(|_| {
        fs::rename(&temp, path)?;
        Ok(())
    });
    if let Err(e) = written {
        if let Err(cleanup) = fs::remove_file(&temp) {
            warn!("Failed to remove {:?}: {}", temp, cleanup);
        }
        return Err(e);
    }

    info!(
        "Exported {} nodes and {} relationships to {:?}",
        document.nodes.len(),
        document.relationships.len(),
        path
    );
    Ok(())
}

fn write_document(document: &GraphDocument, path: &Path, pretty: bool) -> PersistenceResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    if pretty {
        serde_json::to_writer_pretty(&mut writer, document)?;
    } else {
        serde_json::to_writer(&mut writer, document)?;
    }
    writer.write_all(b"\n")?;
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "graph.json".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}

/// Read a store from `path`
pub fn import_json(path: impl AsRef<Path>) -> PersistenceResult<GraphStore> {
    let path = path.as_ref();
    debug!("Importing graph from {:?}", path);

    let result = File::open(path)
        .map_err(PersistenceError::from)
        .and_then(|file| Ok(serde_json::from_reader::<_, GraphDocument>(BufReader::new(file))?))
        .and_then(from_document);

    match result {
        Ok(store) => {
            info!(
                "Imported {} nodes and {} relationships from {:?}",
                store.node_count(),
                store.relationship_count(),
                path
            );
            Ok(store)
        }
        Err(e) => {
            warn!("Rejected import from {:?}: {}", path, e);
            Err(e)
        }
    }
}
