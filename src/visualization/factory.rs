//! Visual records for graph entities and the factory that builds them.
//!
//! Records are plain data addressed by [`VisualId`]; the back-reference from a
//! visual to its graph entity is the graph ID stored alongside it.

use std::sync::Arc;

use bevy::prelude::*;

use crate::config::SceneSettings;
use crate::documents::PageBitmap;
use crate::models::{EdgeId, GraphNode, NodeId};
use crate::visualization::constants::COLOR_LABEL;

/// Stable ID of a visual within one mount session. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VisualId(u32);

impl VisualId {
    /// Raw numeric value.
    pub fn get(self) -> u32 {
        self.0
    }
}

/// Monotonic [`VisualId`] allocator.
#[derive(Debug, Default)]
pub struct VisualIds {
    next: u32,
}

impl VisualIds {
    /// Allocate the next unused ID.
    pub fn allocate(&mut self) -> VisualId {
        let id = VisualId(self.next);
        self.next += 1;
        id
    }
}

/// Font and size of a billboard label.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelStyle {
    /// Font size used to draw the text.
    pub font_size: f32,
    /// Text color.
    pub color: Color,
    /// World-space billboard size (width, height).
    pub scale: Vec2,
}

/// Camera-facing text sprite.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualLabel {
    pub visual_id: VisualId,
    /// Text drawn on the billboard.
    pub text: String,
    pub style: LabelStyle,
    /// World position, refreshed every frame.
    pub position: Vec3,
}

/// Thin textured plane showing a document's first page.
#[derive(Debug, Clone)]
pub struct PreviewPlane {
    /// Rendered page.
    pub bitmap: Arc<PageBitmap>,
    /// Plane center.
    pub center: Vec3,
    /// Plane size (width, height).
    pub size: Vec2,
}

/// Sphere representing one document node.
#[derive(Debug, Clone)]
pub struct VisualNode {
    pub visual_id: VisualId,
    /// Graph node this visual represents.
    pub node_id: NodeId,
    /// Node name (label text).
    pub name: String,
    /// Sphere center.
    pub position: Vec3,
    /// Sphere radius.
    pub radius: f32,
    /// Page preview, once its texture has loaded.
    pub preview: Option<PreviewPlane>,
}

/// Two-vertex line buffer of an edge.
#[derive(Debug, Clone, PartialEq)]
pub struct LineGeometry {
    /// Geometry identity; unchanged for the life of the edge.
    pub id: VisualId,
    /// Start and end vertices.
    pub positions: [Vec3; 2],
}

impl LineGeometry {
    /// Midpoint of the current vertices.
    pub fn midpoint(&self) -> Vec3 {
        (self.positions[0] + self.positions[1]) / 2.0
    }

    /// Segment length.
    pub fn length(&self) -> f32 {
        self.positions[0].distance(self.positions[1])
    }
}

/// Line segment and label representing one relationship.
#[derive(Debug, Clone)]
pub struct VisualEdge {
    pub visual_id: VisualId,
    /// Graph edge this visual represents.
    pub edge_id: EdgeId,
    /// Visual of the source node.
    pub source: VisualId,
    /// Visual of the target node.
    pub target: VisualId,
    /// Currently displayed text.
    pub text: String,
    pub line: LineGeometry,
    pub label: VisualLabel,
}

/// Builds visuals for one mount session.
#[derive(Debug)]
pub struct EntityFactory {
    settings: SceneSettings,
    ids: VisualIds,
}

impl EntityFactory {
    /// Create a factory with fresh visual IDs.
    pub fn new(settings: SceneSettings) -> Self {
        Self {
            settings,
            ids: VisualIds::default(),
        }
    }

    /// Settings the factory builds with.
    pub fn settings(&self) -> &SceneSettings {
        &self.settings
    }

    /// Style shared by every label.
    pub fn label_style(&self) -> LabelStyle {
        LabelStyle {
            font_size: self.settings.label_font_size,
            color: COLOR_LABEL,
            scale: Vec2::from_array(self.settings.label_scale),
        }
    }

    /// Build a fixed-radius sphere at the node's position.
    pub fn build_node(&mut self, node: &GraphNode) -> VisualNode {
        VisualNode {
            visual_id: self.ids.allocate(),
            node_id: node.id,
            name: node.name.clone(),
            position: Vec3::new(node.x, node.y, node.z),
            radius: self.settings.node_radius,
            preview: None,
        }
    }

    /// Build a billboard label for `text`, positioned at the origin.
    pub fn build_label(&mut self, text: &str) -> VisualLabel {
        VisualLabel {
            visual_id: self.ids.allocate(),
            text: text.to_string(),
            style: self.label_style(),
            position: Vec3::ZERO,
        }
    }

    /// Build a straight segment between two nodes with a label at its midpoint.
    ///
    /// Endpoints are captured now; the line does not follow later node moves.
    pub fn build_edge(
        &mut self,
        source: &VisualNode,
        target: &VisualNode,
        text: &str,
        id: EdgeId,
    ) -> VisualEdge {
        let visual_id = self.ids.allocate();
        let line = LineGeometry {
            id: self.ids.allocate(),
            positions: [source.position, target.position],
        };
        let mut label = self.build_label(text);
        label.position = line.midpoint();

        VisualEdge {
            visual_id,
            edge_id: id,
            source: source.visual_id,
            target: target.visual_id,
            text: text.to_string(),
            line,
            label,
        }
    }
}
