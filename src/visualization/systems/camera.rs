//! Camera orbit, pan, and zoom systems.

use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::prelude::*;
use bevy::window::WindowResized;

use crate::visualization::resources::{LabelEditor, ViewerController};

/// Pixels per scroll line on touchpads that report pixel deltas.
const PIXELS_PER_LINE: f32 = 40.0;

/// Queue camera input onto the orbit controls.
///
/// Controls:
/// - Left-click drag: Orbit around target
/// - Right or middle-click drag (or Alt+left-click): Pan
/// - Scroll wheel: Zoom
/// - R: Reset view (ignored while editing a label)
pub fn camera_input_system(
    mut controller: ResMut<ViewerController>,
    editor: Res<LabelEditor>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    keyboard: Res<ButtonInput<KeyCode>>,
    mut mouse_motion: EventReader<MouseMotion>,
    mut scroll: EventReader<MouseWheel>,
) {
    let orbit = controller.0.orbit_mut();

    let drag: Vec2 = mouse_motion.read().map(|ev| ev.delta).sum();
    let alt_held = keyboard.pressed(KeyCode::AltLeft) || keyboard.pressed(KeyCode::AltRight);
    let is_panning = mouse_button.pressed(MouseButton::Right)
        || mouse_button.pressed(MouseButton::Middle)
        || (mouse_button.pressed(MouseButton::Left) && alt_held);

    if drag != Vec2::ZERO {
        if is_panning {
            orbit.pan(drag);
        } else if mouse_button.pressed(MouseButton::Left) {
            orbit.rotate(drag);
        }
    }

    for ev in scroll.read() {
        let lines = match ev.unit {
            MouseScrollUnit::Line => ev.y,
            MouseScrollUnit::Pixel => ev.y / PIXELS_PER_LINE,
        };
        orbit.zoom(lines);
    }

    if !editor.is_active() && keyboard.just_pressed(KeyCode::KeyR) {
        orbit.reset();
    }
}

/// Advance the controller one frame and move the camera if the orbit changed.
pub fn camera_frame_system(
    time: Res<Time>,
    mut controller: ResMut<ViewerController>,
    mut camera_query: Query<&mut Transform, With<Camera3d>>,
) {
    if !controller.0.frame(time.delta_secs()) {
        return;
    }
    if let Ok(mut transform) = camera_query.get_single_mut() {
        *transform = controller.0.orbit().transform();
    }
}

/// Track the window size; a minimized window keeps the last usable size.
pub fn resize_system(
    mut resized: EventReader<WindowResized>,
    mut controller: ResMut<ViewerController>,
) {
    for ev in resized.read() {
        if let Err(e) = controller.0.resize(ev.width, ev.height) {
            tracing::debug!(error = %e, "Ignoring resize");
        }
    }
}
