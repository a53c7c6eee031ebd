//! 3D Document Graph Viewport
//!
//! Maps document nodes and relationship edges to 3D visuals, keeps their
//! labels placed every frame, resolves clicks to edges, and textures each node
//! with its document's first page.
//!
//! ## Module Structure
//!
//! - `factory` - Visual records and the entity factory
//! - `registry` - Per-session registries, label placement, teardown
//! - `textures` - Asynchronous first-page preview pipeline
//! - `picking` - Pointer-to-edge raycasting
//! - `camera` - Damped orbit controls
//! - `controller` - Mountable viewport (lifecycle, clicks, loading state)
//! - `components` - ECS components mirroring the registries
//! - `resources` - ECS resources for viewer state
//! - `systems` - ECS systems (camera, interaction, scene, textures, UI)
//! - `setup` - Scene initialization
//! - `plugin` - Bevy plugin definition
//! - `constants` - Colors, sizes, and other constants

pub mod camera;
mod components;
pub mod constants;
pub mod controller;
pub mod factory;
pub mod picking;
mod plugin;
pub mod registry;
mod resources;
mod setup;
mod systems;
pub mod textures;

pub use camera::OrbitControls;
pub use controller::{EdgeSelectedCallback, MountState, ViewportController};
pub use factory::{
    EntityFactory, LineGeometry, PreviewPlane, VisualEdge, VisualId, VisualLabel, VisualNode,
};
pub use picking::{resolve_click, EdgeHit, ViewCamera, ViewportRect};
pub use plugin::ViewerPlugin;
pub use registry::{
    compute_label_positions, PreviewAttach, SceneError, SceneHandle, SessionToken,
};
pub use resources::EdgeSelected;
pub use textures::{load_all, TextureError, TextureOutcome, TextureRequest};

use std::sync::Arc;

use bevy::log::LogPlugin;
use bevy::prelude::*;
use tokio::runtime::Handle as RuntimeHandle;

use crate::config::Config;
use crate::documents::DocumentSource;
use crate::models::GraphInput;
use constants::COLOR_BACKGROUND;
use resources::{SelectionInbox, TextureLoader};

/// Run the viewer for `input`.
///
/// This spawns a Bevy window with the 3D graph and blocks until the window
/// is closed. Preview loads run on `runtime`.
pub fn run_viewer(
    config: Config,
    input: GraphInput,
    source: Arc<dyn DocumentSource>,
    runtime: RuntimeHandle,
) -> Result<(), SceneError> {
    let viewport = &config.viewport;
    let inbox = SelectionInbox::default();

    let (controller, requests) = ViewportController::mount(
        config.camera.clone(),
        config.scene.clone(),
        ViewportRect::sized(viewport.width, viewport.height),
        input,
        inbox.callback(),
    )?;
    let loader = TextureLoader::new(runtime, source, config.documents.scale);

    let exit = App::new()
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: viewport.title.clone(),
                        resolution: (viewport.width, viewport.height).into(),
                        ..default()
                    }),
                    ..default()
                })
                .disable::<LogPlugin>(),
        )
        .insert_resource(ClearColor(COLOR_BACKGROUND))
        .add_plugins(ViewerPlugin::new(controller, loader, requests, inbox))
        .run();

    if let AppExit::Error(code) = exit {
        tracing::warn!(code = code.get(), "Viewer exited with an error");
    }
    Ok(())
}
