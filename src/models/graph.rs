//! Graph models for documents and their relationships.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Identifier of a document node, unique within a graph.
pub type NodeId = i64;

/// Identifier of a relationship edge, unique within a graph.
pub type EdgeId = i64;

/// A document positioned in 3D space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    /// Node ID.
    pub id: NodeId,
    /// Display name (shown as the node label).
    pub name: String,
    /// Path or URL of the document whose first page becomes the preview.
    #[serde(alias = "path")]
    pub document_path: String,
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
    /// Z coordinate.
    pub z: f32,
}

/// A labeled relationship between two documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Edge ID.
    pub id: EdgeId,
    /// Source node ID.
    pub source: NodeId,
    /// Target node ID.
    pub target: NodeId,
    /// Freeform label text.
    #[serde(default)]
    pub value: String,
}

/// Nodes and edges as supplied by the caller (JSON file, sample data, tests).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
    /// Document nodes.
    pub nodes: Vec<GraphNode>,
    /// Relationship edges.
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
}

impl GraphData {
    /// Parse a graph from its JSON representation.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The three-document demo graph.
    pub fn sample() -> Self {
        let node = |id, name: &str, path: &str, x, y, z| GraphNode {
            id,
            name: name.to_string(),
            document_path: path.to_string(),
            x,
            y,
            z,
        };
        let edge = |id, source, target, value: &str| GraphEdge {
            id,
            source,
            target,
            value: value.to_string(),
        };

        Self {
            nodes: vec![
                node(1, "File1.pdf", "/path/to/File1.pdf", -2.0, 0.0, 0.0),
                node(2, "File2.pdf", "/path/to/File2.pdf", 0.0, 2.0, 0.0),
                node(3, "File3.pdf", "/path/to/File3.pdf", 2.0, -2.0, 2.0),
            ],
            edges: vec![
                edge(1, 1, 2, "related"),
                edge(2, 2, 3, "cites"),
                edge(3, 1, 3, ""),
            ],
        }
    }

    /// Find a node by ID.
    pub fn node(&self, id: NodeId) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Find an edge by ID.
    pub fn edge(&self, id: EdgeId) -> Option<&GraphEdge> {
        self.edges.iter().find(|e| e.id == id)
    }
}

/// The caller's input set for one viewport.
///
/// Identity is pointer identity of the two shared vectors: replacing either
/// `Arc` is a new input and causes a full remount, while cloning the input
/// keeps it identical.
#[derive(Debug, Clone)]
pub struct GraphInput {
    /// Document nodes.
    pub nodes: Arc<Vec<GraphNode>>,
    /// Relationship edges.
    pub edges: Arc<Vec<GraphEdge>>,
}

impl GraphInput {
    /// Wrap freshly supplied nodes and edges.
    pub fn new(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Self {
        Self {
            nodes: Arc::new(nodes),
            edges: Arc::new(edges),
        }
    }

    /// Whether both halves are the same allocations as `other`.
    pub fn same_identity(&self, other: &GraphInput) -> bool {
        Arc::ptr_eq(&self.nodes, &other.nodes) && Arc::ptr_eq(&self.edges, &other.edges)
    }

    /// Find an edge by ID.
    pub fn edge(&self, id: EdgeId) -> Option<&GraphEdge> {
        self.edges.iter().find(|e| e.id == id)
    }

    /// A new input with one edge's value replaced.
    ///
    /// Nodes keep their identity; the edge list is a fresh allocation, so the
    /// result is a different input and triggers a rebuild.
    pub fn with_edge_value(&self, id: EdgeId, value: &str) -> Self {
        let edges = self
            .edges
            .iter()
            .map(|e| {
                if e.id == id {
                    GraphEdge {
                        value: value.to_string(),
                        ..e.clone()
                    }
                } else {
                    e.clone()
                }
            })
            .collect();
        Self {
            nodes: Arc::clone(&self.nodes),
            edges: Arc::new(edges),
        }
    }
}

impl From<GraphData> for GraphInput {
    fn from(data: GraphData) -> Self {
        Self::new(data.nodes, data.edges)
    }
}
