//! Visual and interaction constants for the graph viewport.

use bevy::prelude::*;

// =============================================================================
// Colors
// =============================================================================

/// Shared node material color (Red).
pub const COLOR_NODE: Color = Color::srgb(1.0, 0.0, 0.0);
/// Edge line color (Blue).
pub const COLOR_EDGE: Color = Color::srgb(0.0, 0.0, 1.0);
/// Selected edge color (Gold).
pub const COLOR_EDGE_SELECTED: Color = Color::srgb(1.0, 0.84, 0.0);
/// Billboard label text color (White).
pub const COLOR_LABEL: Color = Color::WHITE;
/// Viewport background.
pub const COLOR_BACKGROUND: Color = Color::srgb(0.0, 0.0, 0.0);

// =============================================================================
// Geometry
// =============================================================================

/// Radius of every node sphere.
pub const NODE_RADIUS: f32 = 0.2;
/// Sphere tessellation (sectors and stacks).
pub const NODE_SEGMENTS: u32 = 32;
/// Visual thickness of edge cylinders (picking uses its own tolerance).
pub const EDGE_RADIUS: f32 = 0.015;
/// Height of a node name label above its node.
pub const NODE_LABEL_OFFSET: f32 = 0.3;

// =============================================================================
// Labels
// =============================================================================

/// Font size used to draw label text.
pub const LABEL_FONT_SIZE: f32 = 48.0;
/// World-space size of a label billboard (width, height).
pub const LABEL_SCALE: Vec2 = Vec2::new(0.5, 0.25);
/// Pixels per world unit for label text at the reference camera distance.
pub const LABEL_PIXELS_PER_UNIT: f32 = 64.0;
/// Smallest on-screen label font size.
pub const MIN_LABEL_FONT_SIZE: f32 = 6.0;

// =============================================================================
// Previews
// =============================================================================

/// Page render scale (1.0 = 72 DPI).
pub const PREVIEW_SCALE: f32 = 1.5;
/// World-space width of a preview plane; height follows the page aspect.
pub const PREVIEW_WIDTH: f32 = 0.6;
/// Gap between the back of a node sphere and its preview plane.
pub const PREVIEW_GAP: f32 = 0.05;

// =============================================================================
// Camera & Picking
// =============================================================================

/// Vertical field of view.
pub const CAMERA_FOV_DEGREES: f32 = 75.0;
/// Near clipping plane.
pub const CAMERA_NEAR: f32 = 0.1;
/// Far clipping plane.
pub const CAMERA_FAR: f32 = 1000.0;
/// Initial distance from the orbit target.
pub const CAMERA_DISTANCE: f32 = 6.0;
/// Fraction of pending orbit motion applied per frame.
pub const ORBIT_DAMPING: f32 = 0.05;
/// Minimum and maximum orbit distance.
pub const ORBIT_DISTANCE_RANGE: (f32, f32) = (1.0, 100.0);
/// Pitch limit, just short of the poles.
pub const ORBIT_PITCH_LIMIT: f32 = 1.5;
/// Maximum distance between a pick ray and an edge segment that still hits.
pub const LINE_PICK_THRESHOLD: f32 = 0.1;
/// Cursor travel (pixels) below which a press-release counts as a click.
pub const CLICK_DRAG_TOLERANCE: f32 = 5.0;
