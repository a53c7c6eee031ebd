//! ECS systems for the viewer.
//!
//! Systems are functions that operate on components and resources each frame.

pub mod camera;
pub mod interaction;
pub mod scene;
pub mod textures;
pub mod ui;

pub use camera::{camera_frame_system, camera_input_system, resize_system};
pub use interaction::{click_system, log_selection_system, selection_system};
pub use scene::{sync_edge_labels_system, sync_scene_system, teardown_system};
pub use textures::poll_textures_system;
pub use ui::{
    label_editor_system, update_edge_highlight_system, update_info_panel_system,
    update_labels_system, update_status_system,
};
