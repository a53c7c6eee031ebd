//! Edge selection by clicking.

use bevy::input::mouse::MouseMotion;
use bevy::prelude::*;

use crate::visualization::constants::CLICK_DRAG_TOLERANCE;
use crate::visualization::resources::{
    ClickTracker, EdgeSelected, LabelEditor, SelectedEdge, SelectionInbox, ViewerController,
};

/// Resolve a left click (press and release without dragging) to an edge.
pub fn click_system(
    mut tracker: ResMut<ClickTracker>,
    mut controller: ResMut<ViewerController>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window>,
    mut mouse_motion: EventReader<MouseMotion>,
) {
    let travel: f32 = mouse_motion.read().map(|ev| ev.delta.length()).sum();

    if mouse_button.just_pressed(MouseButton::Left) {
        tracker.pressed = true;
        tracker.travel = 0.0;
        return;
    }
    if tracker.pressed && mouse_button.pressed(MouseButton::Left) {
        tracker.travel += travel;
    }

    if !mouse_button.just_released(MouseButton::Left) || !tracker.pressed {
        return;
    }
    tracker.pressed = false;
    if tracker.travel >= CLICK_DRAG_TOLERANCE {
        return;
    }

    let Ok(window) = windows.get_single() else {
        return;
    };
    if let Some(cursor) = window.cursor_position() {
        controller.0.click(cursor);
    }
}

/// Turn selections reported by the controller into state and events.
///
/// Selecting another edge, or nothing, drops an uncommitted label edit.
pub fn selection_system(
    inbox: Res<SelectionInbox>,
    mut controller: ResMut<ViewerController>,
    mut selected: ResMut<SelectedEdge>,
    mut editor: ResMut<LabelEditor>,
    mut events: EventWriter<EdgeSelected>,
) {
    for selection in inbox.drain() {
        if let Some(edge_id) = editor.edge_id {
            if editor.is_dirty() && selection.as_ref().map(|e| e.id) != Some(edge_id) {
                if let Err(e) = controller.0.update_edge_label(edge_id, &editor.original) {
                    tracing::warn!(edge = edge_id, error = %e, "Failed to revert label");
                }
            }
        }

        match &selection {
            Some(edge) if editor.edge_id != Some(edge.id) => editor.open(edge),
            Some(_) => {}
            None => editor.close(),
        }

        selected.edge = selection.clone();
        events.send(EdgeSelected(selection));
    }
}

/// Log every selection event.
pub fn log_selection_system(mut events: EventReader<EdgeSelected>) {
    for EdgeSelected(edge) in events.read() {
        match edge {
            Some(edge) => tracing::info!(
                edge = edge.id,
                source = edge.source,
                target = edge.target,
                value = %edge.value,
                "Edge selected"
            ),
            None => tracing::info!("Selection cleared"),
        }
    }
}
