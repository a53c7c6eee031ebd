//! Mirror the mounted registries into entities.

use bevy::prelude::*;
use bevy::ui::PositionType;

use crate::visualization::components::{EdgeLabel, EdgeLine, NodeLabel, NodeSphere};
use crate::visualization::factory::{LineGeometry, VisualLabel};
use crate::visualization::resources::{
    SceneAssets, SceneEntities, TextureLoader, ViewerController,
};

/// Transform placing a unit-height cylinder along `line`.
pub fn edge_transform(line: &LineGeometry) -> Option<Transform> {
    let [from, to] = line.positions;
    let length = line.length();
    if length <= 0.01 {
        return None;
    }
    Some(
        Transform::from_translation(line.midpoint())
            .with_rotation(Quat::from_rotation_arc(Vec3::Y, (to - from) / length))
            .with_scale(Vec3::new(1.0, length, 1.0)),
    )
}

fn label_bundle(label: &VisualLabel) -> impl Bundle {
    (
        Text::new(label.text.clone()),
        TextFont {
            font_size: label.style.font_size,
            ..default()
        },
        TextColor(label.style.color),
        bevy::ui::Node {
            position_type: PositionType::Absolute,
            ..default()
        },
        Visibility::Hidden,
    )
}

/// Respawn the mirror whenever the mounted session changes.
///
/// Runs after remounts (input commits) and after unmount, which leaves the
/// mirror empty.
pub fn sync_scene_system(
    mut commands: Commands,
    mut materials: ResMut<Assets<StandardMaterial>>,
    controller: Res<ViewerController>,
    assets: Res<SceneAssets>,
    mut entities: ResMut<SceneEntities>,
) {
    let controller = &controller.0;
    let session = controller.token().id();
    let mounted = controller.is_mounted();

    if mounted && entities.session == Some(session) {
        return;
    }
    if !mounted && entities.session.is_none() {
        return;
    }

    entities.clear(&mut commands, &mut materials);
    if !mounted {
        return;
    }

    let scene = controller.scene();
    let Some(material) = scene.material() else {
        return;
    };
    let node_material = materials.add(StandardMaterial {
        base_color: material.color,
        ..default()
    });

    for (index, (node, label)) in scene.nodes().iter().zip(scene.labels()).enumerate() {
        let sphere = commands
            .spawn((
                Mesh3d(assets.sphere.clone()),
                MeshMaterial3d(node_material.clone()),
                Transform::from_translation(node.position).with_scale(Vec3::splat(node.radius)),
                NodeSphere,
            ))
            .id();
        let text = commands
            .spawn((label_bundle(label), NodeLabel { index }))
            .id();
        entities.spawned.extend([sphere, text]);
    }

    for edge in scene.edges() {
        if let Some(transform) = edge_transform(&edge.line) {
            let line = commands
                .spawn((
                    Mesh3d(assets.edge.clone()),
                    MeshMaterial3d(assets.edge_normal.clone()),
                    transform,
                    EdgeLine {
                        edge_id: edge.edge_id,
                    },
                ))
                .id();
            entities.spawned.push(line);
        }
        let text = commands
            .spawn((
                label_bundle(&edge.label),
                EdgeLabel {
                    edge_id: edge.edge_id,
                },
            ))
            .id();
        entities.spawned.push(text);
    }

    entities.node_material = Some(node_material);
    entities.session = Some(session);
    tracing::debug!(
        session,
        entities = entities.spawned.len(),
        "Spawned scene entities"
    );
}

/// Copy edited edge label text onto its UI text.
pub fn sync_edge_labels_system(
    controller: Res<ViewerController>,
    mut label_query: Query<(&EdgeLabel, &mut Text)>,
) {
    let scene = controller.0.scene();
    for (label, mut text) in label_query.iter_mut() {
        if let Some(edge) = scene.edge_by_graph_id(label.edge_id) {
            if text.0 != edge.label.text {
                text.0 = edge.label.text.clone();
            }
        }
    }
}

/// Unmount and stop outstanding loads when the app exits.
pub fn teardown_system(
    mut exit: EventReader<AppExit>,
    mut commands: Commands,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut controller: ResMut<ViewerController>,
    mut loader: ResMut<TextureLoader>,
    mut entities: ResMut<SceneEntities>,
) {
    if exit.read().next().is_none() {
        return;
    }
    loader.abort_all();
    controller.0.unmount();
    entities.clear(&mut commands, &mut materials);
}
