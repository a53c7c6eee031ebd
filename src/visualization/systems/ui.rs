//! UI systems for labels, the info panel, the label editor, and highlights.

use bevy::input::keyboard::{Key, KeyboardInput};
use bevy::input::ButtonState;
use bevy::prelude::*;
use bevy::ui::Node as UiNode;

use crate::visualization::components::{
    EdgeLabel, EdgeLine, InfoPanelText, NodeLabel, StatusText,
};
use crate::visualization::constants::{CAMERA_DISTANCE, LABEL_PIXELS_PER_UNIT, MIN_LABEL_FONT_SIZE};
use crate::visualization::controller::MountState;
use crate::visualization::factory::LabelStyle;
use crate::visualization::resources::{
    LabelEditor, SceneAssets, SelectedEdge, TextureLoader, ViewerController,
};

/// Screen font size of a label at `depth` in front of the camera.
pub fn label_font_size(style: &LabelStyle, depth: f32) -> f32 {
    let size = style.scale.y * LABEL_PIXELS_PER_UNIT * CAMERA_DISTANCE / depth.max(f32::EPSILON);
    size.clamp(MIN_LABEL_FONT_SIZE, style.font_size)
}

#[allow(clippy::too_many_arguments)]
fn place_label(
    camera: &Camera,
    camera_transform: &GlobalTransform,
    world_pos: Vec3,
    style: &LabelStyle,
    text: &str,
    node_ui: &mut UiNode,
    visibility: &mut Visibility,
    font: &mut TextFont,
) {
    let depth = (world_pos - camera_transform.translation()).dot(*camera_transform.forward());
    let Ok(viewport_pos) = camera.world_to_viewport(camera_transform, world_pos) else {
        *visibility = Visibility::Hidden;
        return;
    };
    if depth <= 0.0 {
        *visibility = Visibility::Hidden;
        return;
    }

    let font_size = label_font_size(style, depth);
    if font.font_size != font_size {
        font.font_size = font_size;
    }
    // Center text roughly
    let half_width = text.chars().count() as f32 * font_size * 0.25;
    *visibility = Visibility::Visible;
    node_ui.left = Val::Px(viewport_pos.x - half_width);
    node_ui.top = Val::Px(viewport_pos.y - font_size / 2.0);
}

/// Update label positions by projecting registry label positions to screen space.
#[allow(clippy::type_complexity)]
pub fn update_labels_system(
    controller: Res<ViewerController>,
    camera_query: Query<(&Camera, &GlobalTransform), With<Camera3d>>,
    mut node_labels: Query<
        (&NodeLabel, &mut UiNode, &mut Visibility, &mut TextFont),
        Without<EdgeLabel>,
    >,
    mut edge_labels: Query<
        (&EdgeLabel, &mut UiNode, &mut Visibility, &mut TextFont),
        Without<NodeLabel>,
    >,
) {
    let Ok((camera, camera_transform)) = camera_query.get_single() else {
        return;
    };
    let scene = controller.0.scene();

    for (label, mut node_ui, mut visibility, mut font) in node_labels.iter_mut() {
        if let Some(visual) = scene.labels().get(label.index) {
            place_label(
                camera,
                camera_transform,
                visual.position,
                &visual.style,
                &visual.text,
                &mut node_ui,
                &mut visibility,
                &mut font,
            );
        }
    }

    for (label, mut node_ui, mut visibility, mut font) in edge_labels.iter_mut() {
        if let Some(edge) = scene.edge_by_graph_id(label.edge_id) {
            place_label(
                camera,
                camera_transform,
                edge.label.position,
                &edge.label.style,
                &edge.label.text,
                &mut node_ui,
                &mut visibility,
                &mut font,
            );
        }
    }
}

/// Type into the selected edge's label.
///
/// Every keystroke updates the label in place; Enter commits the value into
/// the input (a rebuild), Escape restores the committed value.
pub fn label_editor_system(
    mut keys: EventReader<KeyboardInput>,
    mut editor: ResMut<LabelEditor>,
    mut controller: ResMut<ViewerController>,
    mut selected: ResMut<SelectedEdge>,
    mut loader: ResMut<TextureLoader>,
) {
    let Some(edge_id) = editor.edge_id else {
        keys.clear();
        return;
    };

    let mut edited = false;
    for ev in keys.read() {
        if ev.state != ButtonState::Pressed {
            continue;
        }
        match &ev.logical_key {
            Key::Character(chars) => {
                editor
                    .buffer
                    .extend(chars.chars().filter(|c| !c.is_control()));
                edited = true;
            }
            Key::Space => {
                editor.buffer.push(' ');
                edited = true;
            }
            Key::Backspace => {
                edited |= editor.buffer.pop().is_some();
            }
            Key::Escape => {
                editor.buffer = editor.original.clone();
                edited = true;
            }
            Key::Enter => {
                let input = controller.0.input().with_edge_value(edge_id, &editor.buffer);
                let requests = controller.0.set_input(input);
                loader.replace(requests);
                editor.original = editor.buffer.clone();
                selected.edge = controller.0.input().edge(edge_id).cloned();
                edited = false;
                tracing::info!(edge = edge_id, value = %editor.buffer, "Committed edge label");
            }
            _ => {}
        }
    }

    if edited {
        if let Err(e) = controller.0.update_edge_label(edge_id, &editor.buffer) {
            tracing::warn!(edge = edge_id, error = %e, "Failed to update label");
        }
    }
}

/// Update the info panel when the selection or the editor changes.
pub fn update_info_panel_system(
    selected: Res<SelectedEdge>,
    editor: Res<LabelEditor>,
    controller: Res<ViewerController>,
    mut text_query: Query<&mut Text, With<InfoPanelText>>,
) {
    if !selected.is_changed() && !editor.is_changed() {
        return;
    }
    let Ok(mut text) = text_query.get_single_mut() else {
        return;
    };

    let Some(edge) = &selected.edge else {
        **text = "Click an edge to select it".to_string();
        return;
    };

    let input = controller.0.input();
    let name = |id| {
        input
            .nodes
            .iter()
            .find(|n| n.id == id)
            .map(|n| n.name.as_str())
            .unwrap_or("?")
    };
    let unsaved = if editor.is_dirty() { " (unsaved)" } else { "" };

    **text = format!(
        "\nEdge {}\nFrom: {}\nTo: {}\n\nLabel: {}|{}\n\nType to edit, Enter to save, Esc to revert",
        edge.id,
        name(edge.source),
        name(edge.target),
        editor.buffer,
        unsaved
    );
}

/// Show the mount state.
pub fn update_status_system(
    controller: Res<ViewerController>,
    mut text_query: Query<&mut Text, With<StatusText>>,
) {
    let Ok(mut text) = text_query.get_single_mut() else {
        return;
    };

    let scene = controller.0.scene();
    let status = match controller.0.state() {
        MountState::Initializing => "Not mounted".to_string(),
        MountState::Loading { pending } => format!("Loading previews: {pending} remaining"),
        MountState::Ready => format!(
            "{} documents, {} previews, {} relationships",
            scene.nodes().len(),
            scene.preview_count(),
            scene.edges().len()
        ),
    };
    if text.0 != status {
        text.0 = status;
    }
}

/// Swap the selected edge's material.
pub fn update_edge_highlight_system(
    selected: Res<SelectedEdge>,
    assets: Res<SceneAssets>,
    mut edge_query: Query<(&EdgeLine, &mut MeshMaterial3d<StandardMaterial>)>,
) {
    let selected_id = selected.id();
    for (edge, mut material) in edge_query.iter_mut() {
        let wanted = if Some(edge.edge_id) == selected_id {
            &assets.edge_selected
        } else {
            &assets.edge_normal
        };
        if material.0 != *wanted {
            *material = MeshMaterial3d(wanted.clone());
        }
    }
}
