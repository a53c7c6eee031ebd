//! Scene registries for one mount session.
//!
//! A [`SceneHandle`] owns every visual built from one input set: nodes, their
//! name labels (parallel to nodes), and edges. Registries are built in one go
//! by [`SceneHandle::mount`] and torn down together by [`SceneHandle::dispose`];
//! nothing is patched incrementally except edge labels and preview planes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use bevy::prelude::*;
use thiserror::Error;

use crate::config::SceneSettings;
use crate::documents::PageBitmap;
use crate::models::{EdgeId, GraphEdge, GraphNode, NodeId};
use crate::visualization::constants::COLOR_NODE;
use crate::visualization::factory::{EntityFactory, VisualEdge, VisualId, VisualLabel, VisualNode};
use crate::visualization::textures::preview_plane_for;

static NEXT_SESSION: AtomicU64 = AtomicU64::new(1);

/// Errors raised by scene operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error("Drawing surface has no area ({width}x{height})")]
    EmptySurface { width: f32, height: f32 },

    #[error("No rendered edge with visual id {0:?}")]
    UnknownVisual(VisualId),

    #[error("No rendered edge with id {0}")]
    UnknownEdge(EdgeId),

    #[error("Mount session has been disposed")]
    SessionClosed,
}

/// Identifies one mount session; shared with its in-flight texture loads.
///
/// Disposing the session flips the shared liveness flag, so every clone held
/// by a pending task observes the unmount.
#[derive(Debug, Clone)]
pub struct SessionToken {
    id: u64,
    live: Arc<AtomicBool>,
}

impl SessionToken {
    fn issue() -> Self {
        Self {
            id: NEXT_SESSION.fetch_add(1, Ordering::Relaxed),
            live: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Session number, unique per process.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Whether the session is still mounted.
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    fn invalidate(&self) {
        self.live.store(false, Ordering::Release);
    }
}

impl PartialEq for SessionToken {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for SessionToken {}

/// Material shared by every node sphere of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeMaterial {
    pub color: Color,
}

/// Result of attaching a loaded page to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewAttach {
    /// The node now carries a preview plane.
    Attached,
    /// The load belongs to a disposed or replaced session and was dropped.
    Stale,
    /// No node with that ID in this session.
    UnknownNode,
    /// The load failed; the node keeps its sphere without a preview.
    Failed,
}

/// Label positions for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelPositions {
    /// One per node, in registry order.
    pub nodes: Vec<Vec3>,
    /// One per edge, in registry order.
    pub edges: Vec<Vec3>,
}

/// Place node labels `offset` above their node and edge labels at the
/// midpoint of the edge's current line vertices.
pub fn compute_label_positions(
    nodes: &[VisualNode],
    edges: &[VisualEdge],
    offset: f32,
) -> LabelPositions {
    LabelPositions {
        nodes: nodes
            .iter()
            .map(|n| n.position + Vec3::Y * offset)
            .collect(),
        edges: edges.iter().map(|e| e.line.midpoint()).collect(),
    }
}

/// Live visuals of one mount session.
#[derive(Debug)]
pub struct SceneHandle {
    token: SessionToken,
    factory: EntityFactory,
    nodes: Vec<VisualNode>,
    labels: Vec<VisualLabel>,
    edges: Vec<VisualEdge>,
    material: Option<NodeMaterial>,
    skipped_edges: Vec<EdgeId>,
}

impl SceneHandle {
    /// Build every visual for `nodes` and `edges`.
    ///
    /// Edges whose source or target is not among `nodes` are skipped.
    pub fn mount(nodes: &[GraphNode], edges: &[GraphEdge], settings: SceneSettings) -> Self {
        let mut factory = EntityFactory::new(settings);
        let token = SessionToken::issue();

        let mut visual_nodes = Vec::with_capacity(nodes.len());
        let mut labels = Vec::with_capacity(nodes.len());
        let mut index_by_id: HashMap<NodeId, usize> = HashMap::with_capacity(nodes.len());

        for node in nodes {
            index_by_id.entry(node.id).or_insert(visual_nodes.len());
            visual_nodes.push(factory.build_node(node));
            labels.push(factory.build_label(&node.name));
        }

        let mut visual_edges = Vec::with_capacity(edges.len());
        let mut skipped_edges = Vec::new();
        for edge in edges {
            let source = index_by_id.get(&edge.source).map(|&i| &visual_nodes[i]);
            let target = index_by_id.get(&edge.target).map(|&i| &visual_nodes[i]);
            match (source, target) {
                (Some(source), Some(target)) => {
                    visual_edges.push(factory.build_edge(source, target, &edge.value, edge.id));
                }
                _ => {
                    tracing::debug!(
                        edge = edge.id,
                        source = edge.source,
                        target = edge.target,
                        "Skipping edge with unresolved endpoint"
                    );
                    skipped_edges.push(edge.id);
                }
            }
        }

        let mut handle = Self {
            token,
            factory,
            nodes: visual_nodes,
            labels,
            edges: visual_edges,
            material: Some(NodeMaterial { color: COLOR_NODE }),
            skipped_edges,
        };
        handle.tick();

        tracing::info!(
            session = handle.token.id(),
            nodes = handle.nodes.len(),
            edges = handle.edges.len(),
            skipped = handle.skipped_edges.len(),
            "Mounted scene"
        );
        handle
    }

    /// Token of this session.
    pub fn token(&self) -> &SessionToken {
        &self.token
    }

    /// Whether the session has not been disposed.
    pub fn is_live(&self) -> bool {
        self.token.is_live()
    }

    /// Settings the visuals were built with.
    pub fn settings(&self) -> &SceneSettings {
        self.factory.settings()
    }

    pub fn nodes(&self) -> &[VisualNode] {
        &self.nodes
    }

    /// Node name labels, parallel to [`SceneHandle::nodes`].
    pub fn labels(&self) -> &[VisualLabel] {
        &self.labels
    }

    pub fn edges(&self) -> &[VisualEdge] {
        &self.edges
    }

    /// Graph IDs of edges dropped for unresolved endpoints.
    pub fn skipped_edges(&self) -> &[EdgeId] {
        &self.skipped_edges
    }

    /// The shared node material, until disposed.
    pub fn material(&self) -> Option<&NodeMaterial> {
        self.material.as_ref()
    }

    /// Find a node visual by graph node ID.
    pub fn node(&self, node_id: NodeId) -> Option<&VisualNode> {
        self.nodes.iter().find(|n| n.node_id == node_id)
    }

    /// Find an edge visual by its visual ID.
    pub fn edge(&self, visual_id: VisualId) -> Option<&VisualEdge> {
        self.edges.iter().find(|e| e.visual_id == visual_id)
    }

    /// Find an edge visual by graph edge ID.
    pub fn edge_by_graph_id(&self, edge_id: EdgeId) -> Option<&VisualEdge> {
        self.edges.iter().find(|e| e.edge_id == edge_id)
    }

    /// Number of nodes carrying a preview plane.
    pub fn preview_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.preview.is_some()).count()
    }

    /// Reposition every label for the current frame.
    pub fn tick(&mut self) {
        let positions =
            compute_label_positions(&self.nodes, &self.edges, self.factory.settings().label_offset);

        for (label, position) in self.labels.iter_mut().zip(positions.nodes) {
            label.position = position;
        }
        for (edge, position) in self.edges.iter_mut().zip(positions.edges) {
            edge.label.position = position;
        }
    }

    /// Remove every visual and release the shared material.
    ///
    /// The material is handed back on the first call only; later calls
    /// return `None`.
    pub fn dispose(&mut self) -> Option<NodeMaterial> {
        self.token.invalidate();
        self.nodes.clear();
        self.labels.clear();
        self.edges.clear();

        let material = self.material.take();
        if material.is_some() {
            tracing::info!(session = self.token.id(), "Disposed scene");
        }
        material
    }

    /// Replace the label of one edge, leaving its line and every other edge untouched.
    pub fn update_edge_label(
        &mut self,
        edge_visual: VisualId,
        text: &str,
    ) -> Result<&VisualEdge, SceneError> {
        if !self.is_live() {
            return Err(SceneError::SessionClosed);
        }
        let idx = self
            .edges
            .iter()
            .position(|e| e.visual_id == edge_visual)
            .ok_or(SceneError::UnknownVisual(edge_visual))?;

        let mut label = self.factory.build_label(text);
        let edge = &mut self.edges[idx];
        label.position = edge.line.midpoint();
        edge.label = label;
        edge.text = text.to_string();

        Ok(&self.edges[idx])
    }

    /// Give a node its page preview, if `token` still names this live session.
    pub fn attach_preview(
        &mut self,
        token: &SessionToken,
        node_id: NodeId,
        bitmap: Arc<PageBitmap>,
    ) -> PreviewAttach {
        if *token != self.token || !self.token.is_live() {
            return PreviewAttach::Stale;
        }
        let settings = self.factory.settings().clone();
        let Some(node) = self.nodes.iter_mut().find(|n| n.node_id == node_id) else {
            return PreviewAttach::UnknownNode;
        };
        node.preview = Some(preview_plane_for(node, bitmap, &settings));
        PreviewAttach::Attached
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GraphData;

    fn sample_handle() -> SceneHandle {
        let graph = GraphData::sample();
        SceneHandle::mount(&graph.nodes, &graph.edges, SceneSettings::default())
    }

    fn dangling(id: EdgeId, source: NodeId, target: NodeId) -> GraphEdge {
        GraphEdge {
            id,
            source,
            target,
            value: "dangling".to_string(),
        }
    }

    #[test]
    fn test_mount_counts() {
        let handle = sample_handle();
        assert_eq!(handle.nodes().len(), 3);
        assert_eq!(handle.labels().len(), 3);
        assert_eq!(handle.edges().len(), 3);
        assert!(handle.skipped_edges().is_empty());
        assert!(handle.material().is_some());
    }

    #[test]
    fn test_dangling_edges_are_skipped() {
        let mut graph = GraphData::sample();
        graph.edges.push(dangling(8, 1, 99));
        graph.edges.push(dangling(9, 42, 2));

        let handle = SceneHandle::mount(&graph.nodes, &graph.edges, SceneSettings::default());

        assert_eq!(handle.edges().len(), 3);
        assert!(handle.edges().len() < graph.edges.len());
        assert_eq!(handle.skipped_edges(), &[8, 9]);
        assert!(handle.edge_by_graph_id(8).is_none());
        assert!(handle.edge_by_graph_id(9).is_none());
    }

    #[test]
    fn test_edge_endpoints_exist_in_node_registry() {
        let handle = sample_handle();
        for edge in handle.edges() {
            assert!(handle.nodes().iter().any(|n| n.visual_id == edge.source));
            assert!(handle.nodes().iter().any(|n| n.visual_id == edge.target));
        }
    }

    #[test]
    fn test_compute_label_positions() {
        let handle = sample_handle();
        let positions = compute_label_positions(handle.nodes(), handle.edges(), 0.3);

        assert_eq!(positions.nodes[0], Vec3::new(-2.0, 0.3, 0.0));
        assert!(positions.nodes[2].abs_diff_eq(Vec3::new(2.0, -1.7, 2.0), 1e-6));
        assert_eq!(positions.edges[0], Vec3::new(-1.0, 1.0, 0.0));
        assert_eq!(positions.edges[1], Vec3::new(1.0, 0.0, 1.0));
    }

    #[test]
    fn test_mount_places_labels() {
        let handle = sample_handle();
        assert_eq!(handle.labels()[1].text, "File2.pdf");
        assert_eq!(handle.labels()[1].position, Vec3::new(0.0, 2.3, 0.0));
        assert_eq!(handle.edges()[0].label.position, Vec3::new(-1.0, 1.0, 0.0));
    }

    #[test]
    fn test_tick_follows_live_line_vertices() {
        let mut handle = sample_handle();
        handle.edges[0].line.positions = [Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0)];

        handle.tick();

        assert_eq!(handle.edges()[0].label.position, Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let mut handle = sample_handle();

        let first = handle.dispose();
        let second = handle.dispose();

        assert_eq!(first, Some(NodeMaterial { color: COLOR_NODE }));
        assert_eq!(second, None);
        assert!(handle.nodes().is_empty());
        assert!(handle.edges().is_empty());
        assert!(!handle.is_live());
        handle.tick();
    }

    #[test]
    fn test_update_edge_label_round_trip() {
        let mut handle = sample_handle();
        let before = handle.edge_by_graph_id(1).unwrap().clone();
        let other = handle.edge_by_graph_id(2).unwrap().clone();

        let updated = handle.update_edge_label(before.visual_id, "foo").unwrap();

        assert_eq!(updated.text, "foo");
        assert_eq!(updated.label.text, "foo");
        assert_eq!(updated.line, before.line);
        assert_ne!(updated.label.visual_id, before.label.visual_id);
        assert_eq!(updated.label.position, before.line.midpoint());

        let untouched = handle.edge_by_graph_id(2).unwrap();
        assert_eq!(untouched.label, other.label);
        assert_eq!(handle.edge(before.visual_id).unwrap().label.text, "foo");
        assert!(handle.edge(before.label.visual_id).is_none());
    }

    #[test]
    fn test_update_edge_label_errors() {
        let mut handle = sample_handle();
        let node_visual = handle.nodes()[0].visual_id;
        assert_eq!(
            handle.update_edge_label(node_visual, "x").unwrap_err(),
            SceneError::UnknownVisual(node_visual)
        );

        let edge_visual = handle.edges()[0].visual_id;
        handle.dispose();
        assert_eq!(
            handle.update_edge_label(edge_visual, "x").unwrap_err(),
            SceneError::SessionClosed
        );
    }

    #[test]
    fn test_attach_preview_guards_session() {
        let mut handle = sample_handle();
        let other = sample_handle();
        let bitmap = Arc::new(PageBitmap::solid(2, 4, [255; 4]));

        assert_eq!(
            handle.attach_preview(other.token(), 1, bitmap.clone()),
            PreviewAttach::Stale
        );
        let token = handle.token().clone();
        assert_eq!(
            handle.attach_preview(&token, 99, bitmap.clone()),
            PreviewAttach::UnknownNode
        );
        assert_eq!(
            handle.attach_preview(&token, 1, bitmap.clone()),
            PreviewAttach::Attached
        );
        assert_eq!(handle.preview_count(), 1);

        handle.dispose();
        assert!(!token.is_live());
        assert_eq!(
            handle.attach_preview(&token, 2, bitmap),
            PreviewAttach::Stale
        );
    }

    #[test]
    fn test_sessions_have_distinct_tokens() {
        let a = sample_handle();
        let b = sample_handle();
        assert_ne!(a.token(), b.token());
        assert!(a.token().id() < b.token().id());
    }
}
