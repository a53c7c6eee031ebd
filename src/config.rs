//! Configuration with layered resolution using figment.
//!
//! Resolution order (highest priority last):
//! 1. Built-in defaults
//! 2. User config: `~/.config/docgraph/config.toml` (XDG) or platform config dir
//! 3. Project config: `.docgraph.toml`
//! 4. Environment variables: `DOCGRAPH_*`, nested keys separated by `__`
//!
//! # Example
//!
//! ```toml
//! [documents]
//! root = "/home/me/papers"
//! scale = 2.0
//!
//! [camera]
//! damping = 0.1
//!
//! [scene]
//! line_threshold = 0.2
//! ```
//!
//! Environment override: `DOCGRAPH_SCENE__LINE_THRESHOLD=0.2`.

use std::ops::Deref;
use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::visualization::constants::{
    CAMERA_DISTANCE, CAMERA_FAR, CAMERA_FOV_DEGREES, CAMERA_NEAR, LABEL_FONT_SIZE, LABEL_SCALE,
    LINE_PICK_THRESHOLD, NODE_LABEL_OFFSET, NODE_RADIUS, ORBIT_DAMPING, PREVIEW_GAP,
    PREVIEW_SCALE, PREVIEW_WIDTH,
};

/// Boxed wrapper for figment::Error to reduce Result size on the stack.
#[derive(Debug)]
pub struct ConfigError(Box<figment::Error>);

impl Deref for ConfigError {
    type Target = figment::Error;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self(Box::new(err))
    }
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub viewport: ViewportConfig,
    pub camera: CameraSettings,
    pub scene: SceneSettings,
    pub documents: DocumentsConfig,
}

/// Window used as the drawing surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Window title.
    pub title: String,
    /// Initial client width in logical pixels.
    pub width: f32,
    /// Initial client height in logical pixels.
    pub height: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            title: "docgraph".to_string(),
            width: 1280.0,
            height: 800.0,
        }
    }
}

/// Perspective camera and orbit controller tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    /// Near clipping plane.
    pub near: f32,
    /// Far clipping plane.
    pub far: f32,
    /// Initial orbit distance.
    pub distance: f32,
    /// Fraction of pending motion applied per frame (1.0 disables damping).
    pub damping: f32,
    /// Radians per pixel of drag.
    pub rotate_speed: f32,
    /// World units per pixel of drag, scaled by distance.
    pub pan_speed: f32,
    /// Zoom factor per scroll line.
    pub zoom_speed: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov_degrees: CAMERA_FOV_DEGREES,
            near: CAMERA_NEAR,
            far: CAMERA_FAR,
            distance: CAMERA_DISTANCE,
            damping: ORBIT_DAMPING,
            rotate_speed: 0.01,
            pan_speed: 0.002,
            zoom_speed: 0.95,
        }
    }
}

/// Sizes and tolerances of the scene entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSettings {
    /// Node sphere radius.
    pub node_radius: f32,
    /// Height of node name labels above their node.
    pub label_offset: f32,
    /// Label font size.
    pub label_font_size: f32,
    /// World-space label size (width, height).
    pub label_scale: [f32; 2],
    /// Pick tolerance around edge segments.
    pub line_threshold: f32,
    /// World-space preview plane width.
    pub preview_width: f32,
    /// Gap between a node sphere and its preview plane.
    pub preview_gap: f32,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            node_radius: NODE_RADIUS,
            label_offset: NODE_LABEL_OFFSET,
            label_font_size: LABEL_FONT_SIZE,
            label_scale: LABEL_SCALE.to_array(),
            line_threshold: LINE_PICK_THRESHOLD,
            preview_width: PREVIEW_WIDTH,
            preview_gap: PREVIEW_GAP,
        }
    }
}

/// Where documents come from and how their first page is rendered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentsConfig {
    /// Directory relative document paths are resolved against.
    pub root: Option<PathBuf>,
    /// `pdftoppm` binary (poppler-utils).
    pub pdftoppm: PathBuf,
    /// Page render scale (1.0 = 72 DPI).
    pub scale: f32,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            root: None,
            pdftoppm: PathBuf::from("pdftoppm"),
            scale: PREVIEW_SCALE,
        }
    }
}

impl Config {
    /// Load config with layered resolution (defaults → user → project → env).
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment().extract().map_err(ConfigError::from)
    }

    /// The layered figment behind [`Config::load`].
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            // Layer 1: User config
            .merge(Toml::file(Self::user_config_path()))
            // Layer 2: Project config
            .merge(Toml::file(".docgraph.toml"))
            // Layer 3: Environment variables (highest priority)
            .merge(Env::prefixed("DOCGRAPH_").split("__"))
    }

    /// User config path: ~/.config/docgraph/config.toml (XDG) or platform config dir.
    fn user_config_path() -> PathBuf {
        // Prefer XDG config location (~/.config) on all platforms
        if let Some(home) = dirs::home_dir() {
            let xdg_path = home.join(".config").join("docgraph").join("config.toml");
            if xdg_path.exists() {
                return xdg_path;
            }
        }
        dirs::config_dir()
            .map(|p| p.join("docgraph").join("config.toml"))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_defaults_match_constants() {
        let config = Config::default();
        assert_eq!(config.scene.node_radius, NODE_RADIUS);
        assert_eq!(config.scene.label_scale, [0.5, 0.25]);
        assert_eq!(config.camera.fov_degrees, 75.0);
        assert_eq!(config.documents.scale, PREVIEW_SCALE);
    }

    #[test]
    fn test_toml_layer_overrides_single_fields() {
        let config: Config = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::string(
                r#"
                [documents]
                root = "/srv/papers"

                [scene]
                line_threshold = 0.25
                "#,
            ))
            .extract()
            .unwrap();

        assert_eq!(config.documents.root, Some(PathBuf::from("/srv/papers")));
        assert_eq!(config.scene.line_threshold, 0.25);
        assert_eq!(config.scene.node_radius, NODE_RADIUS);
    }

    #[test]
    #[serial]
    fn test_env_override() {
        std::env::set_var("DOCGRAPH_CAMERA__DAMPING", "0.5");
        let config = Config::load();
        std::env::remove_var("DOCGRAPH_CAMERA__DAMPING");

        assert_eq!(config.unwrap().camera.damping, 0.5);
    }

    #[test]
    #[serial]
    fn test_invalid_env_value_is_config_error() {
        std::env::set_var("DOCGRAPH_VIEWPORT__WIDTH", "wide");
        let result = Config::load();
        std::env::remove_var("DOCGRAPH_VIEWPORT__WIDTH");

        assert!(result.is_err());
    }
}
