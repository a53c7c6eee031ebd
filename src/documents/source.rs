//! Document source abstraction and page bitmaps.

use async_trait::async_trait;
use thiserror::Error;

/// Errors produced while turning a document's first page into a bitmap.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Page renderer '{renderer}' is not available: {source}")]
    RendererUnavailable {
        renderer: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Rendering {path} failed: {stderr}")]
    RenderFailed { path: String, stderr: String },

    #[error("Renderer produced no page for {0}")]
    NoPageRendered(String),

    #[error("Could not decode page image for {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Unsupported document type: {0}")]
    Unsupported(String),

    #[error("Document {0} has an empty first page")]
    EmptyPage(String),
}

/// A rendered page as tightly packed 8-bit RGBA pixels.
#[derive(Clone, PartialEq, Eq)]
pub struct PageBitmap {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major RGBA bytes, `width * height * 4` long.
    pub rgba: Vec<u8>,
}

impl PageBitmap {
    /// Create a bitmap from raw RGBA bytes.
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Self {
        Self {
            width,
            height,
            rgba,
        }
    }

    /// A bitmap filled with a single color.
    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> Self {
        let rgba = color
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self::new(width, height, rgba)
    }

    /// Height divided by width; 1.0 for degenerate bitmaps.
    pub fn aspect(&self) -> f32 {
        if self.width == 0 {
            1.0
        } else {
            self.height as f32 / self.width as f32
        }
    }

    /// Whether dimensions are non-zero and the buffer matches them.
    pub fn is_well_formed(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.rgba.len() == self.width as usize * self.height as usize * 4
    }
}

impl std::fmt::Debug for PageBitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageBitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.rgba.len())
            .finish()
    }
}

/// Renders the first page of a document.
///
/// Implementations must be safe to call concurrently; every call produces an
/// independent bitmap.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Render only the first page of `path` at `scale` (1.0 = 72 DPI).
    async fn render_first_page(&self, path: &str, scale: f32) -> Result<PageBitmap, DocumentError>;
}
