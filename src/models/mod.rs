//! Domain models for the document graph.

mod graph;

pub use graph::{EdgeId, GraphData, GraphEdge, GraphInput, GraphNode, NodeId};
