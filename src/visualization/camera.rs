//! Damped orbit camera controller.
//!
//! Input handlers queue motion with [`OrbitControls::rotate`],
//! [`OrbitControls::pan`] and [`OrbitControls::zoom`]; each frame
//! [`OrbitControls::update`] applies a `damping` fraction of what is still
//! pending, so motion eases out over several frames after input stops.
//! [`OrbitControls::advance`] does the same for an arbitrary frame time.

use bevy::prelude::*;

use crate::config::CameraSettings;
use crate::visualization::constants::{ORBIT_DISTANCE_RANGE, ORBIT_PITCH_LIMIT};
use crate::visualization::picking::ViewCamera;

/// Pending motion below this is dropped.
const SETTLE_EPSILON: f32 = 1e-5;
/// Frame time `damping` is expressed against.
const REFERENCE_FRAME: f32 = 1.0 / 60.0;

/// Orbit state around a target point.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    /// Horizontal rotation angle (radians).
    pub yaw: f32,
    /// Vertical rotation angle (radians).
    pub pitch: f32,
    /// Distance from target.
    pub distance: f32,
    /// Point the camera orbits around.
    pub target: Vec3,
    settings: CameraSettings,
    pending_yaw: f32,
    pending_pitch: f32,
    pending_pan: Vec3,
    pending_zoom: f32,
    jumped: bool,
}

/// Camera position for an orbit pose.
pub fn orbit_position(target: Vec3, yaw: f32, pitch: f32, distance: f32) -> Vec3 {
    let x = distance * pitch.cos() * yaw.sin();
    let y = distance * pitch.sin();
    let z = distance * pitch.cos() * yaw.cos();
    target + Vec3::new(x, y, z)
}

impl OrbitControls {
    /// Controls at the home pose: on +Z, `settings.distance` from the origin.
    pub fn new(settings: CameraSettings) -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            distance: settings.distance,
            target: Vec3::ZERO,
            settings,
            pending_yaw: 0.0,
            pending_pitch: 0.0,
            pending_pan: Vec3::ZERO,
            pending_zoom: 0.0,
            jumped: false,
        }
    }

    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    /// Queue an orbit from a pointer drag, in pixels.
    pub fn rotate(&mut self, drag: Vec2) {
        self.pending_yaw -= drag.x * self.settings.rotate_speed;
        self.pending_pitch += drag.y * self.settings.rotate_speed;
    }

    /// Queue a pan from a pointer drag, in pixels. Scaled by distance so the
    /// target tracks the cursor at any zoom level.
    pub fn pan(&mut self, drag: Vec2) {
        let right = Vec3::new(self.yaw.cos(), 0.0, -self.yaw.sin());
        let scale = self.settings.pan_speed * self.distance;
        self.pending_pan += (-right * drag.x + Vec3::Y * drag.y) * scale;
    }

    /// Queue a zoom in scroll lines; positive moves closer.
    pub fn zoom(&mut self, lines: f32) {
        self.pending_zoom += lines;
    }

    /// Jump back to the home pose and drop pending motion.
    pub fn reset(&mut self) {
        *self = Self {
            jumped: true,
            ..Self::new(self.settings.clone())
        };
    }

    /// Whether any queued motion is still being applied.
    pub fn is_settling(&self) -> bool {
        self.pending_yaw != 0.0
            || self.pending_pitch != 0.0
            || self.pending_pan != Vec3::ZERO
            || self.pending_zoom != 0.0
    }

    /// Apply one reference frame of damped motion. Returns whether the pose changed.
    pub fn update(&mut self) -> bool {
        self.advance(REFERENCE_FRAME)
    }

    /// Apply `dt` seconds of damped motion. Returns whether the pose changed.
    pub fn advance(&mut self, dt: f32) -> bool {
        let mut changed = std::mem::take(&mut self.jumped);
        if !self.is_settling() || dt <= 0.0 {
            return changed;
        }

        let damping = self.settings.damping;
        let factor = if damping > 0.0 && damping < 1.0 {
            1.0 - (1.0 - damping).powf(dt / REFERENCE_FRAME)
        } else {
            1.0
        };

        let before = (self.yaw, self.pitch, self.distance, self.target);

        let yaw = take_fraction(&mut self.pending_yaw, factor);
        let pitch = take_fraction(&mut self.pending_pitch, factor);
        let zoom = take_fraction(&mut self.pending_zoom, factor);
        let pan = self.pending_pan * factor;
        self.pending_pan -= pan;
        if self.pending_pan.length_squared() < SETTLE_EPSILON * SETTLE_EPSILON {
            self.pending_pan = Vec3::ZERO;
        }

        let (min_distance, max_distance) = ORBIT_DISTANCE_RANGE;
        self.yaw += yaw;
        self.pitch = (self.pitch + pitch).clamp(-ORBIT_PITCH_LIMIT, ORBIT_PITCH_LIMIT);
        self.distance = (self.distance * self.settings.zoom_speed.powf(zoom))
            .clamp(min_distance, max_distance);
        self.target += pan;

        changed |= before != (self.yaw, self.pitch, self.distance, self.target);
        changed
    }

    /// Current camera position.
    pub fn position(&self) -> Vec3 {
        orbit_position(self.target, self.yaw, self.pitch, self.distance)
    }

    /// Transform of a camera at the current pose, looking at the target.
    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.position()).looking_at(self.target, Vec3::Y)
    }

    /// Picking camera at the current pose.
    pub fn view_camera(&self, aspect: f32) -> ViewCamera {
        ViewCamera::looking_at(self.position(), self.target, self.settings.fov_degrees, aspect)
            .with_clip(self.settings.near, self.settings.far)
    }
}

fn take_fraction(pending: &mut f32, factor: f32) -> f32 {
    let step = *pending * factor;
    *pending -= step;
    if pending.abs() < SETTLE_EPSILON {
        *pending = 0.0;
    }
    step
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controls(damping: f32) -> OrbitControls {
        OrbitControls::new(CameraSettings {
            damping,
            ..CameraSettings::default()
        })
    }

    #[test]
    fn test_home_pose_on_positive_z() {
        let orbit = controls(0.05);
        assert!(orbit.position().abs_diff_eq(Vec3::new(0.0, 0.0, 6.0), 1e-6));
    }

    #[test]
    fn test_idle_update_reports_no_change() {
        let mut orbit = controls(0.05);
        assert!(!orbit.update());
        assert!(!orbit.is_settling());
    }

    #[test]
    fn test_damped_rotation_converges() {
        let mut orbit = controls(0.25);
        orbit.rotate(Vec2::new(-100.0, 0.0));

        assert!(orbit.update());
        assert!((orbit.yaw - 0.25).abs() < 1e-6);

        let mut frames = 1;
        while orbit.update() {
            frames += 1;
            assert!(frames < 1000);
        }
        assert!(frames > 1);
        assert!((orbit.yaw - 1.0).abs() < 1e-3);
        assert!(!orbit.is_settling());
    }

    #[test]
    fn test_undamped_motion_applies_at_once() {
        let mut orbit = controls(1.0);
        orbit.rotate(Vec2::new(0.0, 50.0));

        assert!(orbit.update());
        assert!((orbit.pitch - 0.5).abs() < 1e-6);
        assert!(!orbit.update());
    }

    #[test]
    fn test_long_frame_applies_more_motion() {
        let mut short = controls(0.25);
        let mut long = controls(0.25);
        short.rotate(Vec2::new(-100.0, 0.0));
        long.rotate(Vec2::new(-100.0, 0.0));

        short.update();
        long.advance(REFERENCE_FRAME * 2.0);

        assert!((long.yaw - (1.0 - 0.75 * 0.75)).abs() < 1e-5);
        assert!(long.yaw > short.yaw);
        assert!(!long.advance(0.0));
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut orbit = controls(1.0);
        orbit.rotate(Vec2::new(0.0, 10_000.0));
        orbit.update();
        assert_eq!(orbit.pitch, ORBIT_PITCH_LIMIT);
    }

    #[test]
    fn test_zoom_moves_closer_and_clamps() {
        let mut orbit = controls(1.0);
        orbit.zoom(1.0);
        orbit.update();
        assert!((orbit.distance - 6.0 * 0.95).abs() < 1e-5);

        orbit.zoom(10_000.0);
        orbit.update();
        assert_eq!(orbit.distance, ORBIT_DISTANCE_RANGE.0);
    }

    #[test]
    fn test_pan_moves_target_sideways() {
        let mut orbit = controls(1.0);
        orbit.pan(Vec2::new(-10.0, 0.0));
        orbit.update();

        assert!(orbit.target.x > 0.0);
        assert_eq!(orbit.target.y, 0.0);
        assert_eq!(orbit.target.z, 0.0);
    }

    #[test]
    fn test_reset_reports_change_once() {
        let mut orbit = controls(0.05);
        orbit.rotate(Vec2::new(40.0, 20.0));
        orbit.update();

        orbit.reset();

        assert!(!orbit.is_settling());
        assert!(orbit.update());
        assert!(!orbit.update());
        assert_eq!(orbit.yaw, 0.0);
        assert_eq!(orbit.distance, 6.0);
    }

    #[test]
    fn test_view_camera_matches_pose() {
        let orbit = controls(0.05);
        let camera = orbit.view_camera(2.0);

        assert_eq!(camera.position, orbit.position());
        assert_eq!(camera.aspect, 2.0);
        assert_eq!(camera.near, 0.1);
        assert!((camera.fov_y - 75f32.to_radians()).abs() < 1e-6);
    }
}
