//! Viewer plugin for Bevy.

use bevy::prelude::*;
use std::sync::Mutex;

use super::controller::ViewportController;
use super::resources::{
    ClickTracker, EdgeSelected, LabelEditor, SceneEntities, SelectedEdge, SelectionInbox,
    TextureLoader, ViewerController,
};
use super::setup::setup_scene;
use super::systems;
use super::textures::TextureRequest;

/// Plugin that mounts one viewport and mirrors it into the world.
///
/// The controller and loader use `Mutex<Option<...>>` to allow moving
/// ownership into resources during `build()` (which takes `&self`).
pub struct ViewerPlugin {
    /// Mounted controller (taken during build).
    pub controller: Mutex<Option<ViewportController>>,
    /// Preview loader (taken during build).
    pub loader: Mutex<Option<TextureLoader>>,
    /// Loads for the initial mount (taken during build).
    pub requests: Mutex<Vec<TextureRequest>>,
    /// Inbox the controller's callback writes into.
    pub inbox: SelectionInbox,
}

impl ViewerPlugin {
    /// Create a plugin around an already mounted controller.
    pub fn new(
        controller: ViewportController,
        loader: TextureLoader,
        requests: Vec<TextureRequest>,
        inbox: SelectionInbox,
    ) -> Self {
        Self {
            controller: Mutex::new(Some(controller)),
            loader: Mutex::new(Some(loader)),
            requests: Mutex::new(requests),
            inbox,
        }
    }
}

impl Plugin for ViewerPlugin {
    fn build(&self, app: &mut App) {
        let (Some(controller), Some(mut loader)) = (
            self.controller.lock().ok().and_then(|mut c| c.take()),
            self.loader.lock().ok().and_then(|mut l| l.take()),
        ) else {
            tracing::error!("Viewer plugin built twice; skipping");
            return;
        };
        let requests = self
            .requests
            .lock()
            .map(|mut r| std::mem::take(&mut *r))
            .unwrap_or_default();
        loader.spawn(requests);

        app.insert_resource(ViewerController(controller))
            .insert_resource(loader)
            .insert_resource(self.inbox.clone())
            .init_resource::<SelectedEdge>()
            .init_resource::<LabelEditor>()
            .init_resource::<ClickTracker>()
            .init_resource::<SceneEntities>()
            .add_event::<EdgeSelected>()
            .add_systems(Startup, setup_scene)
            .add_systems(
                Update,
                (
                    systems::resize_system,
                    systems::camera_input_system,
                    systems::click_system,
                    systems::selection_system,
                    systems::label_editor_system,
                    systems::sync_scene_system,
                    systems::poll_textures_system,
                    systems::camera_frame_system,
                    systems::sync_edge_labels_system,
                    systems::update_labels_system,
                    systems::update_edge_highlight_system,
                    systems::update_info_panel_system,
                    systems::update_status_system,
                    systems::log_selection_system,
                )
                    .chain(),
            )
            .add_systems(Last, systems::teardown_system);
    }
}
