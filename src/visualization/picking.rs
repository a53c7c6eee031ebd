//! Pointer-to-edge picking.
//!
//! A click is normalized against the viewport rectangle, turned into a ray
//! from the camera, and tested against edge segments only. Nodes and labels
//! are never pickable.

use bevy::math::{Dir3, Ray3d};
use bevy::prelude::*;

use crate::models::EdgeId;
use crate::visualization::factory::{VisualEdge, VisualId};

/// Client-space rectangle of the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl ViewportRect {
    /// Rectangle at the client origin.
    pub fn sized(width: f32, height: f32) -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            width,
            height,
        }
    }

    /// Whether the rectangle has a usable area.
    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    /// Width over height, if the rectangle has an area.
    pub fn aspect(&self) -> Option<f32> {
        self.has_area().then(|| self.width / self.height)
    }
}

/// Map a client-space pointer position to normalized device coordinates.
///
/// The result spans `[-1, 1]` on both axes across the rectangle, with +y up.
/// Returns `None` for a rectangle without area.
pub fn normalize_pointer(pointer: Vec2, rect: &ViewportRect) -> Option<Vec2> {
    if !rect.has_area() {
        return None;
    }
    Some(Vec2::new(
        ((pointer.x - rect.left) / rect.width) * 2.0 - 1.0,
        -((pointer.y - rect.top) / rect.height) * 2.0 + 1.0,
    ))
}

/// Perspective camera used for picking and projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewCamera {
    pub position: Vec3,
    /// Orientation; the camera looks down its local -Z with +Y up.
    pub rotation: Quat,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Width over height.
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl ViewCamera {
    /// Camera at `position` looking at `target` with +Y up.
    pub fn looking_at(position: Vec3, target: Vec3, fov_degrees: f32, aspect: f32) -> Self {
        let rotation = Transform::from_translation(position)
            .looking_at(target, Vec3::Y)
            .rotation;
        Self {
            position,
            rotation,
            fov_y: fov_degrees.to_radians(),
            aspect,
            near: crate::visualization::constants::CAMERA_NEAR,
            far: crate::visualization::constants::CAMERA_FAR,
        }
    }

    /// Use specific clipping planes.
    pub fn with_clip(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }

    fn half_extents(&self) -> Vec2 {
        let half_height = (self.fov_y / 2.0).tan();
        Vec2::new(half_height * self.aspect, half_height)
    }

    /// Ray from the camera through a point in normalized device coordinates.
    pub fn ray_through(&self, ndc: Vec2) -> Ray3d {
        let extents = self.half_extents();
        let local = Vec3::new(ndc.x * extents.x, ndc.y * extents.y, -1.0);
        let direction = Dir3::new(self.rotation * local).unwrap_or(Dir3::NEG_Z);
        Ray3d::new(self.position, direction)
    }

    /// Normalized device coordinates of a world point in front of the camera.
    pub fn project(&self, world: Vec3) -> Option<Vec2> {
        let local = self.rotation.inverse() * (world - self.position);
        let depth = -local.z;
        if depth <= 0.0 {
            return None;
        }
        let extents = self.half_extents();
        Some(Vec2::new(
            local.x / (depth * extents.x),
            local.y / (depth * extents.y),
        ))
    }
}

/// Client-space position of a point given in normalized device coordinates.
pub fn ndc_to_client(ndc: Vec2, rect: &ViewportRect) -> Vec2 {
    Vec2::new(
        rect.left + (ndc.x + 1.0) / 2.0 * rect.width,
        rect.top + (1.0 - ndc.y) / 2.0 * rect.height,
    )
}

/// A ray passing close enough to an edge segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeHit {
    /// Visual of the hit edge.
    pub visual_id: VisualId,
    /// Graph edge of the hit edge.
    pub edge_id: EdgeId,
    /// Distance from the ray origin to the closest approach.
    pub distance: f32,
    /// Gap between ray and segment at the closest approach.
    pub offset: f32,
}

/// Closest approach between a ray and the segment `a`-`b`.
///
/// Returns the ray parameter (distance along the ray, since the direction is
/// unit length) and the gap between the two closest points.
fn ray_segment_closest(ray: &Ray3d, a: Vec3, b: Vec3) -> (f32, f32) {
    let d1 = *ray.direction;
    let d2 = b - a;
    let r = ray.origin - a;
    let e = d2.length_squared();
    let c = d1.dot(r);

    let (t, s) = if e <= f32::EPSILON {
        ((-c).max(0.0), 0.0)
    } else {
        let f = d2.dot(r);
        let bb = d1.dot(d2);
        let denom = e - bb * bb;
        let t = if denom > f32::EPSILON {
            ((bb * f - c * e) / denom).max(0.0)
        } else {
            0.0
        };
        let s = (bb * t + f) / e;
        if s < 0.0 {
            ((-c).max(0.0), 0.0)
        } else if s > 1.0 {
            ((bb - c).max(0.0), 1.0)
        } else {
            (t, s)
        }
    };

    let on_ray = ray.get_point(t);
    let on_segment = a + d2 * s;
    (t, on_ray.distance(on_segment))
}

/// Every edge within `threshold` of the ray, nearest first.
///
/// Hits outside `[near, far]` along the ray are ignored. Equal distances keep
/// registry order.
pub fn intersect_edges(
    ray: &Ray3d,
    edges: &[VisualEdge],
    threshold: f32,
    near: f32,
    far: f32,
) -> Vec<EdgeHit> {
    let mut hits: Vec<EdgeHit> = edges
        .iter()
        .filter_map(|edge| {
            let [a, b] = edge.line.positions;
            let (distance, offset) = ray_segment_closest(ray, a, b);
            (offset <= threshold && distance >= near && distance <= far).then_some(EdgeHit {
                visual_id: edge.visual_id,
                edge_id: edge.edge_id,
                distance,
                offset,
            })
        })
        .collect();

    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    hits
}

/// Resolve a click to the nearest edge under the pointer.
pub fn resolve_click(
    pointer: Vec2,
    rect: &ViewportRect,
    camera: &ViewCamera,
    edges: &[VisualEdge],
    threshold: f32,
) -> Option<EdgeHit> {
    let ndc = normalize_pointer(pointer, rect)?;
    let ray = camera.ray_through(ndc);
    let hit = intersect_edges(&ray, edges, threshold, camera.near, camera.far)
        .into_iter()
        .next();

    tracing::debug!(
        x = pointer.x,
        y = pointer.y,
        edge = ?hit.map(|h| h.edge_id),
        "Resolved click"
    );
    hit
}
