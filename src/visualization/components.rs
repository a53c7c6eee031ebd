//! ECS components mirroring the scene registries.
//!
//! Entities carry graph IDs at most; the registry in the mounted
//! `ViewportController` stays the source of truth for positions and text.

use bevy::prelude::*;

use crate::models::EdgeId;

/// Sphere mesh of a document node.
#[derive(Component, Debug)]
pub struct NodeSphere;

/// Screen-space text following a node name label.
#[derive(Component, Debug)]
pub struct NodeLabel {
    /// Index in the registry's label list.
    pub index: usize,
}

/// Cylinder mesh of an edge segment.
#[derive(Component, Debug)]
pub struct EdgeLine {
    pub edge_id: EdgeId,
}

/// Screen-space text following an edge label.
#[derive(Component, Debug)]
pub struct EdgeLabel {
    pub edge_id: EdgeId,
}

/// Textured plane showing a node's first page.
#[derive(Component, Debug)]
pub struct NodePreview;

/// Marker component for the info panel container.
#[derive(Component)]
pub struct InfoPanel;

/// Marker component for the info panel text content.
#[derive(Component)]
pub struct InfoPanelText;

/// Marker for the loading status line.
#[derive(Component)]
pub struct StatusText;
