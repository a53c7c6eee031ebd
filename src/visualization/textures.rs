//! Node preview textures from document first pages.
//!
//! Every node of a session gets its own load; loads run concurrently and are
//! independent, so one failing document only leaves its own node without a
//! preview. Results carry the session token they were issued under and are
//! dropped if that session is gone by the time they arrive.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use bevy::prelude::*;
use futures::future::join_all;
use futures::FutureExt;
use thiserror::Error;

use crate::config::SceneSettings;
use crate::documents::{DocumentError, DocumentSource, PageBitmap};
use crate::models::{GraphNode, NodeId};
use crate::visualization::factory::{PreviewPlane, VisualNode};
use crate::visualization::registry::SessionToken;

/// Errors from loading one node's preview.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("Page bitmap for {path} is malformed ({width}x{height}, {bytes} bytes)")]
    InvalidBitmap {
        path: String,
        width: u32,
        height: u32,
        bytes: usize,
    },

    #[error("Mount session closed before the preview loaded")]
    SessionClosed,

    #[error("Rendering {path} panicked")]
    Panicked { path: String },
}

/// One node's pending preview load.
#[derive(Debug, Clone)]
pub struct TextureRequest {
    /// Session the load belongs to.
    pub token: SessionToken,
    /// Node receiving the preview.
    pub node_id: NodeId,
    /// Document to render.
    pub path: String,
}

/// Settled preview load.
#[derive(Debug)]
pub struct TextureOutcome {
    pub token: SessionToken,
    pub node_id: NodeId,
    pub result: Result<Arc<PageBitmap>, TextureError>,
}

/// One request per node, all under `token`.
pub fn requests_for(token: &SessionToken, nodes: &[GraphNode]) -> Vec<TextureRequest> {
    nodes
        .iter()
        .map(|node| TextureRequest {
            token: token.clone(),
            node_id: node.id,
            path: node.document_path.clone(),
        })
        .collect()
}

/// Render the first page of a node's document.
///
/// Failures are logged here and reported in the outcome. A panicking source
/// is reported as [`TextureError::Panicked`], so every request settles.
pub async fn load_node_texture(
    source: &dyn DocumentSource,
    request: TextureRequest,
    scale: f32,
) -> TextureOutcome {
    let result = AssertUnwindSafe(render_checked(source, &request, scale))
        .catch_unwind()
        .await
        .unwrap_or_else(|_| {
            Err(TextureError::Panicked {
                path: request.path.clone(),
            })
        });

    match &result {
        Ok(bitmap) => tracing::debug!(
            node = request.node_id,
            width = bitmap.width,
            height = bitmap.height,
            "Loaded document preview"
        ),
        Err(TextureError::SessionClosed) => tracing::debug!(
            node = request.node_id,
            session = request.token.id(),
            "Dropping preview load for closed session"
        ),
        Err(e) => tracing::error!(
            node = request.node_id,
            path = %request.path,
            error = %e,
            "Failed to load document preview"
        ),
    }

    TextureOutcome {
        token: request.token,
        node_id: request.node_id,
        result,
    }
}

async fn render_checked(
    source: &dyn DocumentSource,
    request: &TextureRequest,
    scale: f32,
) -> Result<Arc<PageBitmap>, TextureError> {
    if !request.token.is_live() {
        return Err(TextureError::SessionClosed);
    }

    let bitmap = source.render_first_page(&request.path, scale).await?;
    if !bitmap.is_well_formed() {
        return Err(TextureError::InvalidBitmap {
            path: request.path.clone(),
            width: bitmap.width,
            height: bitmap.height,
            bytes: bitmap.rgba.len(),
        });
    }

    if !request.token.is_live() {
        return Err(TextureError::SessionClosed);
    }
    Ok(Arc::new(bitmap))
}

/// Run every request concurrently and wait for all of them to settle.
pub async fn load_all(
    source: &dyn DocumentSource,
    requests: Vec<TextureRequest>,
    scale: f32,
) -> Vec<TextureOutcome> {
    join_all(
        requests
            .into_iter()
            .map(|request| load_node_texture(source, request, scale)),
    )
    .await
}

/// Plane just behind a node sphere, sized to the page's aspect ratio.
pub fn preview_plane_for(
    node: &VisualNode,
    bitmap: Arc<PageBitmap>,
    settings: &SceneSettings,
) -> PreviewPlane {
    let width = settings.preview_width;
    let size = Vec2::new(width, width * bitmap.aspect());
    let center = node.position - Vec3::Z * (node.radius + settings.preview_gap);

    PreviewPlane {
        bitmap,
        center,
        size,
    }
}
