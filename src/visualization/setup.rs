//! Scene setup: camera, lighting, shared assets, and UI panels.

use bevy::prelude::*;
use bevy::ui::PositionType;

use crate::visualization::components::{InfoPanel, InfoPanelText, StatusText};
use crate::visualization::constants::{
    COLOR_EDGE, COLOR_EDGE_SELECTED, EDGE_RADIUS, NODE_SEGMENTS,
};
use crate::visualization::resources::{SceneAssets, ViewerController};

/// Setup the camera, lights, shared meshes and materials, and UI panels.
///
/// Graph entities are spawned by the scene sync system once a session is
/// mounted.
pub fn setup_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    controller: Res<ViewerController>,
) {
    let orbit = controller.0.orbit();
    let camera = orbit.settings();

    // Camera, matching the picking camera's projection
    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: camera.fov_degrees.to_radians(),
            near: camera.near,
            far: camera.far,
            ..default()
        }),
        orbit.transform(),
    ));

    // Key light
    commands.spawn((
        DirectionalLight {
            illuminance: 10000.0,
            shadows_enabled: false,
            ..default()
        },
        Transform::from_xyz(5.0, 10.0, 7.5).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    // Ambient light
    commands.insert_resource(AmbientLight {
        color: Color::WHITE,
        brightness: 400.0,
    });

    let edge_normal = materials.add(StandardMaterial {
        base_color: COLOR_EDGE,
        unlit: true,
        ..default()
    });
    let edge_selected = materials.add(StandardMaterial {
        base_color: COLOR_EDGE_SELECTED,
        unlit: true,
        emissive: COLOR_EDGE_SELECTED.to_linear() * 2.0,
        ..default()
    });

    commands.insert_resource(SceneAssets {
        sphere: meshes.add(Sphere::new(1.0).mesh().uv(NODE_SEGMENTS, NODE_SEGMENTS)),
        edge: meshes.add(Cylinder::new(EDGE_RADIUS, 1.0)),
        edge_normal,
        edge_selected,
    });

    // Info panel on the left
    commands
        .spawn((
            bevy::ui::Node {
                position_type: PositionType::Absolute,
                left: Val::Px(10.0),
                top: Val::Px(10.0),
                width: Val::Px(300.0),
                min_height: Val::Px(90.0),
                padding: UiRect::all(Val::Px(12.0)),
                flex_direction: FlexDirection::Column,
                ..default()
            },
            BackgroundColor(Color::srgba(0.1, 0.1, 0.15, 0.9)),
            BorderRadius::all(Val::Px(8.0)),
            InfoPanel,
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new("Relationship"),
                TextFont {
                    font_size: 16.0,
                    ..default()
                },
                TextColor(Color::srgb(0.9, 0.9, 0.9)),
            ));
            parent.spawn((
                Text::new("Click an edge to select it"),
                TextFont {
                    font_size: 13.0,
                    ..default()
                },
                TextColor(Color::srgb(0.7, 0.7, 0.7)),
                InfoPanelText,
            ));
        });

    // Loading status at the bottom
    commands.spawn((
        Text::new(""),
        TextFont {
            font_size: 12.0,
            ..default()
        },
        TextColor(Color::srgb(0.6, 0.6, 0.6)),
        bevy::ui::Node {
            position_type: PositionType::Absolute,
            left: Val::Px(10.0),
            bottom: Val::Px(10.0),
            ..default()
        },
        StatusText,
    ));
}
