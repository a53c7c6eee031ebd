//! Mountable viewport: scene lifecycle, camera, clicks, and loading state.
//!
//! The controller owns the current [`SceneHandle`] and rebuilds it whenever
//! the caller's [`GraphInput`] changes identity. Texture loads are not run
//! here; mounting hands back [`TextureRequest`]s and the host feeds each
//! settled [`TextureOutcome`] into [`ViewportController::complete_texture`].

use bevy::prelude::*;

use crate::config::{CameraSettings, SceneSettings};
use crate::models::{EdgeId, GraphEdge, GraphInput};
use crate::visualization::camera::OrbitControls;
use crate::visualization::picking::{resolve_click, ViewCamera, ViewportRect};
use crate::visualization::registry::{
    NodeMaterial, PreviewAttach, SceneError, SceneHandle, SessionToken,
};
use crate::visualization::textures::{requests_for, TextureOutcome, TextureRequest};

/// Called with the selected edge, or `None` when a click hit nothing.
pub type EdgeSelectedCallback = Box<dyn FnMut(Option<&GraphEdge>) + Send + Sync>;

/// Mount lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountState {
    /// No scene is mounted.
    Initializing,
    /// Scene is mounted; some node previews have not settled yet.
    Loading { pending: usize },
    /// Every node preview has settled, loaded or failed.
    Ready,
}

/// One mounted 3D viewport.
pub struct ViewportController {
    scene_settings: SceneSettings,
    orbit: OrbitControls,
    rect: ViewportRect,
    camera: ViewCamera,
    input: GraphInput,
    scene: SceneHandle,
    state: MountState,
    on_edge_selected: Option<EdgeSelectedCallback>,
}

impl std::fmt::Debug for ViewportController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewportController")
            .field("session", &self.scene.token().id())
            .field("state", &self.state)
            .field("rect", &self.rect)
            .field("attached", &self.on_edge_selected.is_some())
            .finish()
    }
}

impl ViewportController {
    /// Mount a viewport over `rect` showing `input`.
    ///
    /// Returns the controller and the preview loads the host should run.
    pub fn mount(
        camera: CameraSettings,
        scene: SceneSettings,
        rect: ViewportRect,
        input: GraphInput,
        on_edge_selected: EdgeSelectedCallback,
    ) -> Result<(Self, Vec<TextureRequest>), SceneError> {
        let aspect = rect.aspect().ok_or(SceneError::EmptySurface {
            width: rect.width,
            height: rect.height,
        })?;

        let orbit = OrbitControls::new(camera);
        let view = orbit.view_camera(aspect);
        let handle = SceneHandle::mount(&input.nodes, &input.edges, scene.clone());

        let mut controller = Self {
            scene_settings: scene,
            orbit,
            rect,
            camera: view,
            input,
            scene: handle,
            state: MountState::Initializing,
            on_edge_selected: Some(on_edge_selected),
        };
        let requests = controller.begin_loading();
        Ok((controller, requests))
    }

    fn begin_loading(&mut self) -> Vec<TextureRequest> {
        let requests = requests_for(self.scene.token(), &self.input.nodes);
        self.state = if requests.is_empty() {
            MountState::Ready
        } else {
            MountState::Loading {
                pending: requests.len(),
            }
        };
        requests
    }

    /// Replace the input set.
    ///
    /// The same input (by identity) is a no-op. Anything else tears the scene
    /// down and mounts a fresh one, returning its preview loads.
    pub fn set_input(&mut self, input: GraphInput) -> Vec<TextureRequest> {
        if !self.is_mounted() || self.input.same_identity(&input) {
            return Vec::new();
        }

        self.scene.dispose();
        self.input = input;
        self.scene = SceneHandle::mount(
            &self.input.nodes,
            &self.input.edges,
            self.scene_settings.clone(),
        );
        self.begin_loading()
    }

    /// Apply a settled preview load.
    ///
    /// Outcomes from a replaced or unmounted session are dropped and leave
    /// the loading state untouched.
    pub fn complete_texture(&mut self, outcome: TextureOutcome) -> PreviewAttach {
        if !self.is_mounted() || outcome.token != *self.scene.token() {
            tracing::warn!(
                node = outcome.node_id,
                session = outcome.token.id(),
                "Dropping preview for a closed session"
            );
            return PreviewAttach::Stale;
        }

        let attach = match outcome.result {
            Ok(bitmap) => self
                .scene
                .attach_preview(&outcome.token, outcome.node_id, bitmap),
            Err(_) => PreviewAttach::Failed,
        };

        if let MountState::Loading { pending } = self.state {
            let pending = pending.saturating_sub(1);
            self.state = if pending == 0 {
                tracing::info!(
                    session = self.scene.token().id(),
                    previews = self.scene.preview_count(),
                    "All previews settled"
                );
                MountState::Ready
            } else {
                MountState::Loading { pending }
            };
        }
        attach
    }

    /// Resolve a click at a client-space pointer position.
    ///
    /// The callback receives the caller's edge for a hit and `None` for a
    /// miss. Returns the selected edge's ID.
    pub fn click(&mut self, pointer: Vec2) -> Option<EdgeId> {
        if !self.is_mounted() {
            return None;
        }

        let hit = resolve_click(
            pointer,
            &self.rect,
            &self.camera,
            self.scene.edges(),
            self.scene_settings.line_threshold,
        );
        let edge = hit.and_then(|h| self.input.edge(h.edge_id));

        if let Some(callback) = self.on_edge_selected.as_mut() {
            callback(edge);
        }
        edge.map(|e| e.id)
    }

    /// Track a new surface size. Registries are left alone.
    pub fn resize(&mut self, width: f32, height: f32) -> Result<(), SceneError> {
        if width <= 0.0 || height <= 0.0 {
            return Err(SceneError::EmptySurface { width, height });
        }
        self.rect.width = width;
        self.rect.height = height;
        self.camera.aspect = width / height;
        tracing::debug!(width, height, "Resized viewport");
        Ok(())
    }

    /// Advance one frame: damped camera motion, then label placement.
    ///
    /// Returns whether the camera moved.
    pub fn frame(&mut self, dt: f32) -> bool {
        if !self.is_mounted() {
            return false;
        }

        let moved = self.orbit.advance(dt);
        if moved {
            self.camera = self.orbit.view_camera(self.camera.aspect);
        }
        self.scene.tick();
        moved
    }

    /// Show `text` on one edge's label without rebuilding anything else.
    pub fn update_edge_label(&mut self, edge_id: EdgeId, text: &str) -> Result<(), SceneError> {
        if !self.scene.is_live() {
            return Err(SceneError::SessionClosed);
        }
        let visual_id = self
            .scene
            .edge_by_graph_id(edge_id)
            .map(|e| e.visual_id)
            .ok_or(SceneError::UnknownEdge(edge_id))?;

        self.scene.update_edge_label(visual_id, text)?;
        Ok(())
    }

    /// Detach the callback and dispose the scene. Safe to call repeatedly.
    pub fn unmount(&mut self) -> Option<NodeMaterial> {
        self.on_edge_selected = None;
        self.state = MountState::Initializing;
        self.scene.dispose()
    }

    /// Whether a live scene is mounted.
    pub fn is_mounted(&self) -> bool {
        self.scene.is_live()
    }

    pub fn state(&self) -> MountState {
        self.state
    }

    pub fn scene(&self) -> &SceneHandle {
        &self.scene
    }

    /// Token of the current session.
    pub fn token(&self) -> &SessionToken {
        self.scene.token()
    }

    pub fn input(&self) -> &GraphInput {
        &self.input
    }

    pub fn orbit(&self) -> &OrbitControls {
        &self.orbit
    }

    /// Orbit controls, for queuing camera input.
    pub fn orbit_mut(&mut self) -> &mut OrbitControls {
        &mut self.orbit
    }

    /// Camera used for picking, at the pose of the last frame.
    pub fn camera(&self) -> &ViewCamera {
        &self.camera
    }

    pub fn rect(&self) -> &ViewportRect {
        &self.rect
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GraphData;
    use crate::visualization::picking::ndc_to_client;
    use crate::visualization::textures::{load_all, tests::FakeSource, TextureError};
    use std::sync::{Arc, Mutex};

    type Selections = Arc<Mutex<Vec<Option<GraphEdge>>>>;

    const RECT: ViewportRect = ViewportRect {
        left: 0.0,
        top: 0.0,
        width: 800.0,
        height: 600.0,
    };

    fn recorder() -> (Selections, EdgeSelectedCallback) {
        let seen: Selections = Arc::default();
        let sink = seen.clone();
        let callback: EdgeSelectedCallback = Box::new(move |edge: Option<&GraphEdge>| {
            sink.lock().unwrap().push(edge.cloned());
        });
        (seen, callback)
    }

    fn mount_sample() -> (ViewportController, Vec<TextureRequest>, Selections) {
        let (seen, callback) = recorder();
        let (controller, requests) = ViewportController::mount(
            CameraSettings::default(),
            SceneSettings::default(),
            RECT,
            GraphData::sample().into(),
            callback,
        )
        .unwrap();
        (controller, requests, seen)
    }

    fn client_midpoint(controller: &ViewportController, edge_id: EdgeId) -> Vec2 {
        let edge = controller.scene().edge_by_graph_id(edge_id).unwrap();
        let ndc = controller.camera().project(edge.line.midpoint()).unwrap();
        ndc_to_client(ndc, controller.rect())
    }

    #[test]
    fn test_click_selects_then_deselects() {
        let (mut controller, _, seen) = mount_sample();
        assert_eq!(controller.scene().edges().len(), 3);

        let pointer = client_midpoint(&controller, 1);
        assert_eq!(controller.click(pointer), Some(1));
        assert_eq!(controller.click(Vec2::new(5.0, 5.0)), None);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(
            seen[0],
            Some(GraphEdge {
                id: 1,
                source: 1,
                target: 2,
                value: "related".to_string(),
            })
        );
        assert_eq!(seen[1], None);
    }

    #[test]
    fn test_zero_size_surface_is_rejected() {
        let (_, callback) = recorder();
        let err = ViewportController::mount(
            CameraSettings::default(),
            SceneSettings::default(),
            ViewportRect::sized(0.0, 600.0),
            GraphData::sample().into(),
            callback,
        )
        .unwrap_err();
        assert_eq!(
            err,
            SceneError::EmptySurface {
                width: 0.0,
                height: 600.0
            }
        );

        let (mut controller, _, _) = mount_sample();
        assert!(controller.resize(800.0, 0.0).is_err());
        assert_eq!(controller.rect().height, 600.0);
    }

    #[tokio::test]
    async fn test_partial_failure_reaches_ready() {
        let mut graph = GraphData::sample();
        graph.nodes[2].document_path = "/path/to/broken.pdf".to_string();
        let (_, callback) = recorder();
        let (mut controller, requests) = ViewportController::mount(
            CameraSettings::default(),
            SceneSettings::default(),
            RECT,
            graph.into(),
            callback,
        )
        .unwrap();
        assert_eq!(controller.state(), MountState::Loading { pending: 3 });

        let outcomes = load_all(&FakeSource::default(), requests, 1.5).await;
        let attaches: Vec<_> = outcomes
            .into_iter()
            .map(|o| controller.complete_texture(o))
            .collect();

        assert_eq!(controller.state(), MountState::Ready);
        assert_eq!(controller.scene().preview_count(), 2);
        assert_eq!(
            attaches,
            vec![
                PreviewAttach::Attached,
                PreviewAttach::Attached,
                PreviewAttach::Failed
            ]
        );
    }

    #[tokio::test]
    async fn test_remount_drops_stale_outcomes() {
        let (mut controller, first_requests, _) = mount_sample();
        let first_token = controller.token().clone();

        let next = controller.input().with_edge_value(2, "refutes");
        let second_requests = controller.set_input(next);

        assert!(!first_token.is_live());
        assert_ne!(controller.token(), &first_token);
        assert_eq!(second_requests.len(), 3);
        assert_eq!(
            controller.scene().edge_by_graph_id(2).unwrap().text,
            "refutes"
        );

        // A load from the first session that raced past its liveness checks
        let late = TextureOutcome {
            token: first_token,
            node_id: 1,
            result: Ok(Arc::new(crate::documents::PageBitmap::solid(2, 2, [0; 4]))),
        };
        assert_eq!(controller.complete_texture(late), PreviewAttach::Stale);
        assert_eq!(controller.state(), MountState::Loading { pending: 3 });

        let closed = load_all(&FakeSource::default(), first_requests, 1.5).await;
        assert!(closed
            .iter()
            .all(|o| matches!(o.result, Err(TextureError::SessionClosed))));
        for outcome in closed {
            assert_eq!(controller.complete_texture(outcome), PreviewAttach::Stale);
        }
        assert_eq!(controller.scene().preview_count(), 0);
    }

    #[test]
    fn test_same_input_is_noop() {
        let (mut controller, _, _) = mount_sample();
        let token = controller.token().clone();

        let requests = controller.set_input(controller.input().clone());

        assert!(requests.is_empty());
        assert_eq!(controller.token(), &token);
        assert!(token.is_live());
    }

    #[test]
    fn test_update_edge_label_by_graph_id() {
        let (mut controller, _, _) = mount_sample();
        let line = controller.scene().edge_by_graph_id(3).unwrap().line.clone();

        controller.update_edge_label(3, "foo").unwrap();

        let edge = controller.scene().edge_by_graph_id(3).unwrap();
        assert_eq!(edge.label.text, "foo");
        assert_eq!(edge.line, line);
        assert_eq!(
            controller.update_edge_label(99, "x"),
            Err(SceneError::UnknownEdge(99))
        );
    }

    #[test]
    fn test_frame_reports_camera_change() {
        let (mut controller, _, _) = mount_sample();
        assert!(!controller.frame(1.0 / 60.0));

        controller.orbit_mut().rotate(Vec2::new(30.0, 0.0));
        let before = controller.camera().position;

        assert!(controller.frame(1.0 / 60.0));
        assert_ne!(controller.camera().position, before);
    }

    #[test]
    fn test_resize_keeps_registries() {
        let (mut controller, _, _) = mount_sample();
        let token = controller.token().clone();

        controller.resize(400.0, 400.0).unwrap();

        assert_eq!(controller.camera().aspect, 1.0);
        assert_eq!(controller.token(), &token);
        assert_eq!(controller.scene().edges().len(), 3);
    }

    #[test]
    fn test_unmount_is_idempotent() {
        let (mut controller, _, seen) = mount_sample();

        assert!(controller.unmount().is_some());
        assert!(controller.unmount().is_none());

        assert_eq!(controller.state(), MountState::Initializing);
        assert!(!controller.is_mounted());
        assert_eq!(controller.click(Vec2::new(400.0, 300.0)), None);
        assert!(seen.lock().unwrap().is_empty());
        assert!(!controller.frame(1.0 / 60.0));
        assert_eq!(
            controller.update_edge_label(1, "x"),
            Err(SceneError::SessionClosed)
        );
    }
}
