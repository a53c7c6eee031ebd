//! Apply settled preview loads to the mounted scene.

use bevy::prelude::*;
use bevy::render::render_asset::RenderAssetUsages;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};

use crate::documents::PageBitmap;
use crate::visualization::components::NodePreview;
use crate::visualization::factory::PreviewPlane;
use crate::visualization::registry::PreviewAttach;
use crate::visualization::resources::{SceneEntities, TextureLoader, ViewerController};

/// GPU image of a rendered page.
pub fn page_image(bitmap: &PageBitmap) -> Image {
    Image::new(
        Extent3d {
            width: bitmap.width,
            height: bitmap.height,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        bitmap.rgba.clone(),
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::default(),
    )
}

/// Drain finished loads, attach them to the registry, and spawn planes.
pub fn poll_textures_system(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut images: ResMut<Assets<Image>>,
    loader: Res<TextureLoader>,
    mut controller: ResMut<ViewerController>,
    mut entities: ResMut<SceneEntities>,
) {
    for outcome in loader.drain() {
        let node_id = outcome.node_id;
        if controller.0.complete_texture(outcome) != PreviewAttach::Attached {
            continue;
        }
        let Some(plane) = controller
            .0
            .scene()
            .node(node_id)
            .and_then(|n| n.preview.as_ref())
        else {
            continue;
        };

        let entity = spawn_preview(
            &mut commands,
            &mut meshes,
            &mut materials,
            &mut images,
            plane,
        );
        if let Some(previous) = entities.previews.insert(node_id, entity) {
            commands.entity(previous).despawn_recursive();
        }
    }
}

fn spawn_preview(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    images: &mut Assets<Image>,
    plane: &PreviewPlane,
) -> Entity {
    let image = images.add(page_image(&plane.bitmap));
    let material = materials.add(StandardMaterial {
        base_color_texture: Some(image),
        unlit: true,
        double_sided: true,
        cull_mode: None,
        ..default()
    });

    commands
        .spawn((
            Mesh3d(meshes.add(Rectangle::new(plane.size.x, plane.size.y))),
            MeshMaterial3d(material),
            Transform::from_translation(plane.center),
            NodePreview,
        ))
        .id()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_image_matches_bitmap() {
        let bitmap = PageBitmap::solid(3, 5, [10, 20, 30, 255]);
        let image = page_image(&bitmap);

        assert_eq!(image.width(), 3);
        assert_eq!(image.height(), 5);
        assert_eq!(image.data.len(), 3 * 5 * 4);
        assert_eq!(image.texture_descriptor.format, TextureFormat::Rgba8UnormSrgb);
    }
}
