//! Application error types.

use std::path::PathBuf;

use thiserror::Error;

/// Application-level errors for docgraph.
#[derive(Error, Debug)]
pub enum AppError {
    // Input errors
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid graph JSON: {0}")]
    GraphFormat(#[from] serde_json::Error),

    // Viewport errors
    #[error("Scene error: {0}")]
    Scene(#[from] crate::visualization::SceneError),

    #[error("Preview error: {0}")]
    Texture(#[from] crate::visualization::TextureError),

    #[error("Document error: {0}")]
    Document(#[from] crate::documents::DocumentError),

    #[error("Failed to write image: {0}")]
    Image(#[from] image::ImageError),

    // Config errors
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

/// Result type alias using AppError.
pub type Result<T> = std::result::Result<T, AppError>;
