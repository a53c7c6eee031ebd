//! ECS resources for viewer state.
//!
//! Resources are global singleton data - there's only one instance
//! of each resource in the entire app.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use bevy::prelude::*;
use tokio::runtime::Handle as RuntimeHandle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::documents::DocumentSource;
use crate::models::{EdgeId, GraphEdge, NodeId};
use crate::visualization::controller::{EdgeSelectedCallback, ViewportController};
use crate::visualization::textures::{load_node_texture, TextureOutcome, TextureRequest};

// =============================================================================
// Viewport
// =============================================================================

/// The mounted viewport.
#[derive(Resource)]
pub struct ViewerController(pub ViewportController);

// =============================================================================
// Selection
// =============================================================================

/// Selections reported by the controller's callback, drained once per frame.
#[derive(Resource, Clone, Default)]
pub struct SelectionInbox(pub Arc<Mutex<Vec<Option<GraphEdge>>>>);

impl SelectionInbox {
    /// Callback that records every selection into this inbox.
    pub fn callback(&self) -> EdgeSelectedCallback {
        let inbox = Arc::clone(&self.0);
        Box::new(move |edge: Option<&GraphEdge>| {
            if let Ok(mut pending) = inbox.lock() {
                pending.push(edge.cloned());
            }
        })
    }

    /// Take every selection recorded since the last drain.
    pub fn drain(&self) -> Vec<Option<GraphEdge>> {
        self.0
            .lock()
            .map(|mut pending| std::mem::take(&mut *pending))
            .unwrap_or_default()
    }
}

/// Emitted on every click resolution; `None` means deselection.
#[derive(Event, Debug, Clone)]
pub struct EdgeSelected(pub Option<GraphEdge>);

/// Currently selected edge, as last reported.
#[derive(Resource, Default, Debug)]
pub struct SelectedEdge {
    pub edge: Option<GraphEdge>,
}

impl SelectedEdge {
    pub fn id(&self) -> Option<EdgeId> {
        self.edge.as_ref().map(|e| e.id)
    }
}

/// In-viewport editor for the selected edge's label.
#[derive(Resource, Default, Debug)]
pub struct LabelEditor {
    /// Edge being edited.
    pub edge_id: Option<EdgeId>,
    /// Committed value, restored on Escape.
    pub original: String,
    /// Text as typed so far.
    pub buffer: String,
}

impl LabelEditor {
    pub fn is_active(&self) -> bool {
        self.edge_id.is_some()
    }

    /// Start editing `edge`.
    pub fn open(&mut self, edge: &GraphEdge) {
        self.edge_id = Some(edge.id);
        self.original = edge.value.clone();
        self.buffer = edge.value.clone();
    }

    pub fn close(&mut self) {
        *self = Self::default();
    }

    /// Whether the buffer differs from the committed value.
    pub fn is_dirty(&self) -> bool {
        self.is_active() && self.buffer != self.original
    }
}

/// Pointer travel since the last left press, to tell clicks from drags.
#[derive(Resource, Default, Debug)]
pub struct ClickTracker {
    pub pressed: bool,
    pub travel: f32,
}

// =============================================================================
// Scene Mirror
// =============================================================================

/// Meshes and materials shared across sessions.
#[derive(Resource)]
pub struct SceneAssets {
    /// Unit sphere, scaled to each node's radius.
    pub sphere: Handle<Mesh>,
    /// Unit-height cylinder, scaled to each edge's length.
    pub edge: Handle<Mesh>,
    pub edge_normal: Handle<StandardMaterial>,
    pub edge_selected: Handle<StandardMaterial>,
}

/// Entities spawned for the current mount session.
#[derive(Resource, Default)]
pub struct SceneEntities {
    /// Session the entities were spawned for.
    pub session: Option<u64>,
    /// Spheres, edge lines, and label texts.
    pub spawned: Vec<Entity>,
    /// Preview planes by node.
    pub previews: HashMap<NodeId, Entity>,
    /// The session's shared node material.
    pub node_material: Option<Handle<StandardMaterial>>,
}

impl SceneEntities {
    /// Despawn everything and release the session's node material.
    pub fn clear(&mut self, commands: &mut Commands, materials: &mut Assets<StandardMaterial>) {
        for entity in self.spawned.drain(..) {
            commands.entity(entity).despawn_recursive();
        }
        for (_, entity) in self.previews.drain() {
            commands.entity(entity).despawn_recursive();
        }
        if let Some(handle) = self.node_material.take() {
            materials.remove(&handle);
        }
        self.session = None;
    }
}

// =============================================================================
// Texture Loading
// =============================================================================

/// Runs preview loads on the tokio runtime and collects their outcomes.
///
/// The receiver is wrapped in a Mutex because Bevy resources must be
/// Send + Sync.
#[derive(Resource)]
pub struct TextureLoader {
    runtime: RuntimeHandle,
    source: Arc<dyn DocumentSource>,
    scale: f32,
    sender: mpsc::UnboundedSender<TextureOutcome>,
    receiver: Mutex<mpsc::UnboundedReceiver<TextureOutcome>>,
    tasks: Vec<JoinHandle<()>>,
}

impl TextureLoader {
    pub fn new(runtime: RuntimeHandle, source: Arc<dyn DocumentSource>, scale: f32) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            runtime,
            source,
            scale,
            sender,
            receiver: Mutex::new(receiver),
            tasks: Vec::new(),
        }
    }

    /// Abort loads from a previous session and start `requests`.
    pub fn replace(&mut self, requests: Vec<TextureRequest>) {
        self.abort_all();
        self.spawn(requests);
    }

    /// Start one task per request.
    pub fn spawn(&mut self, requests: Vec<TextureRequest>) {
        self.tasks.retain(|task| !task.is_finished());
        for request in requests {
            let source = Arc::clone(&self.source);
            let sender = self.sender.clone();
            let scale = self.scale;
            self.tasks.push(self.runtime.spawn(async move {
                let outcome = load_node_texture(source.as_ref(), request, scale).await;
                if sender.send(outcome).is_err() {
                    tracing::debug!("Viewer closed before preview arrived");
                }
            }));
        }
    }

    /// Abort every outstanding load.
    pub fn abort_all(&mut self) {
        let outstanding = self.tasks.iter().filter(|t| !t.is_finished()).count();
        for task in self.tasks.drain(..) {
            task.abort();
        }
        if outstanding > 0 {
            tracing::debug!(outstanding, "Aborted preview loads");
        }
    }

    /// Outcomes that arrived since the last call.
    pub fn drain(&self) -> Vec<TextureOutcome> {
        let Ok(mut receiver) = self.receiver.lock() else {
            return Vec::new();
        };
        let mut outcomes = Vec::new();
        while let Ok(outcome) = receiver.try_recv() {
            outcomes.push(outcome);
        }
        outcomes
    }
}

impl Drop for TextureLoader {
    fn drop(&mut self) {
        self.abort_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CameraSettings, SceneSettings};
    use crate::models::GraphData;
    use crate::visualization::controller::MountState;
    use crate::visualization::picking::ViewportRect;
    use crate::visualization::registry::PreviewAttach;
    use crate::visualization::textures::tests::FakeSource;
    use std::time::Duration;

    #[test]
    fn test_inbox_collects_callback_selections() {
        let inbox = SelectionInbox::default();
        let mut callback = inbox.callback();
        let edge = GraphData::sample().edges[0].clone();

        callback(Some(&edge));
        callback(None);

        assert_eq!(inbox.drain(), vec![Some(edge), None]);
        assert!(inbox.drain().is_empty());
    }

    #[test]
    fn test_label_editor_tracks_dirty_state() {
        let mut editor = LabelEditor::default();
        assert!(!editor.is_dirty());

        editor.open(&GraphData::sample().edges[1]);
        assert!(editor.is_active());
        assert_eq!(editor.buffer, "cites");
        assert!(!editor.is_dirty());

        editor.buffer.push('!');
        assert!(editor.is_dirty());

        editor.close();
        assert!(!editor.is_active());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_loader_delivers_outcomes() {
        let (controller, requests) = ViewportController::mount(
            CameraSettings::default(),
            SceneSettings::default(),
            ViewportRect::sized(800.0, 600.0),
            GraphData::sample().into(),
            SelectionInbox::default().callback(),
        )
        .unwrap();
        let mut loader = TextureLoader::new(
            RuntimeHandle::current(),
            Arc::new(FakeSource::default()),
            1.0,
        );

        loader.spawn(requests);

        let outcomes = drain_until(&loader, 3).await;
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes.iter().all(|o| o.token == *controller.token()));
        assert!(outcomes.iter().all(|o| o.result.is_ok()));
    }

    async fn drain_until(loader: &TextureLoader, count: usize) -> Vec<TextureOutcome> {
        let mut outcomes = Vec::new();
        for _ in 0..100 {
            outcomes.extend(loader.drain());
            if outcomes.len() >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        outcomes
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_panicking_load_still_reaches_ready() {
        let mut graph = GraphData::sample();
        graph.nodes[1].document_path = "/path/to/panic.pdf".to_string();
        let (mut controller, requests) = ViewportController::mount(
            CameraSettings::default(),
            SceneSettings::default(),
            ViewportRect::sized(800.0, 600.0),
            graph.into(),
            SelectionInbox::default().callback(),
        )
        .unwrap();
        let mut loader = TextureLoader::new(
            RuntimeHandle::current(),
            Arc::new(FakeSource::default()),
            1.0,
        );

        loader.spawn(requests);
        let outcomes = drain_until(&loader, 3).await;
        assert_eq!(outcomes.len(), 3);

        let attaches: Vec<_> = outcomes
            .into_iter()
            .map(|o| (o.node_id, controller.complete_texture(o)))
            .collect();

        assert!(attaches.contains(&(2, PreviewAttach::Failed)));
        assert_eq!(controller.state(), MountState::Ready);
        assert_eq!(controller.scene().preview_count(), 2);
        assert!(controller.scene().node(2).unwrap().preview.is_none());
    }
}
