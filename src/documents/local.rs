//! Local filesystem document source.
//!
//! PDFs are rasterized with poppler's `pdftoppm`, one page into a temporary
//! directory. Raster images are decoded directly.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;

use super::source::{DocumentError, DocumentSource, PageBitmap};

/// Extensions decoded directly as images.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

/// Renders documents found on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalDocumentSource {
    root: Option<PathBuf>,
    pdftoppm: PathBuf,
}

impl LocalDocumentSource {
    /// Create a source resolving relative paths against `root`.
    pub fn new(root: Option<PathBuf>) -> Self {
        Self {
            root,
            pdftoppm: PathBuf::from("pdftoppm"),
        }
    }

    /// Use a specific `pdftoppm` binary.
    pub fn with_renderer(mut self, pdftoppm: impl Into<PathBuf>) -> Self {
        self.pdftoppm = pdftoppm.into();
        self
    }

    /// Resolve a document path against the configured root.
    pub fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path.strip_prefix("file://").unwrap_or(path));
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }

    async fn render_pdf(&self, path: &Path, scale: f32) -> Result<PageBitmap, DocumentError> {
        let display = path.display().to_string();
        let temp_dir = tempfile::Builder::new()
            .prefix("docgraph_")
            .tempdir()
            .map_err(|source| DocumentError::Io {
                path: display.clone(),
                source,
            })?;
        let prefix = temp_dir.path().join("page");
        let dpi = (72.0 * scale).round().max(1.0) as u32;

        tracing::debug!(path = %path.display(), dpi, "Rendering first page with pdftoppm");

        let output = Command::new(&self.pdftoppm)
            .arg("-png")
            .arg("-singlefile")
            .arg("-f")
            .arg("1")
            .arg("-l")
            .arg("1")
            .arg("-r")
            .arg(dpi.to_string())
            .arg(path)
            .arg(&prefix)
            .output()
            .await
            .map_err(|source| match source.kind() {
                ErrorKind::NotFound => DocumentError::RendererUnavailable {
                    renderer: self.pdftoppm.display().to_string(),
                    source,
                },
                _ => DocumentError::Io {
                    path: display.clone(),
                    source,
                },
            })?;

        if !output.status.success() {
            return Err(DocumentError::RenderFailed {
                path: display,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        // -singlefile writes <prefix>.png without a page suffix
        let bytes = match tokio::fs::read(prefix.with_extension("png")).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(DocumentError::NoPageRendered(display));
            }
            Err(source) => {
                return Err(DocumentError::Io {
                    path: display,
                    source,
                })
            }
        };

        decode_bitmap(&display, &bytes)
    }

    async fn render_image(&self, path: &Path) -> Result<PageBitmap, DocumentError> {
        let display = path.display().to_string();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| DocumentError::Io {
                path: display.clone(),
                source,
            })?;
        decode_bitmap(&display, &bytes)
    }
}

impl Default for LocalDocumentSource {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl DocumentSource for LocalDocumentSource {
    async fn render_first_page(&self, path: &str, scale: f32) -> Result<PageBitmap, DocumentError> {
        let resolved = self.resolve(path);
        let extension = resolved
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        if extension == "pdf" {
            self.render_pdf(&resolved, scale).await
        } else if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
            self.render_image(&resolved).await
        } else {
            Err(DocumentError::Unsupported(path.to_string()))
        }
    }
}

/// Decode encoded image bytes into an RGBA bitmap.
fn decode_bitmap(path: &str, bytes: &[u8]) -> Result<PageBitmap, DocumentError> {
    let image = image::load_from_memory(bytes)
        .map_err(|source| DocumentError::Decode {
            path: path.to_string(),
            source,
        })?
        .to_rgba8();

    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(DocumentError::EmptyPage(path.to_string()));
    }
    Ok(PageBitmap::new(width, height, image.into_raw()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();
        path
    }

    #[tokio::test]
    async fn test_decodes_png_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "cover.png", 3, 2);
        let source = LocalDocumentSource::default();

        let bitmap = source
            .render_first_page(path.to_str().unwrap(), 1.5)
            .await
            .unwrap();

        assert_eq!((bitmap.width, bitmap.height), (3, 2));
        assert!(bitmap.is_well_formed());
        assert_eq!(&bitmap.rgba[0..4], &[10, 20, 30, 255]);
    }

    #[tokio::test]
    async fn test_relative_paths_resolve_against_root() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "page.png", 1, 1);
        let source = LocalDocumentSource::new(Some(dir.path().to_path_buf()));

        assert_eq!(source.resolve("page.png"), dir.path().join("page.png"));
        assert!(source.render_first_page("page.png", 1.0).await.is_ok());
    }

    #[test]
    fn test_absolute_paths_ignore_root() {
        let source = LocalDocumentSource::new(Some(PathBuf::from("/srv/docs")));
        assert_eq!(source.resolve("/tmp/a.pdf"), PathBuf::from("/tmp/a.pdf"));
        assert_eq!(source.resolve("file:///tmp/a.pdf"), PathBuf::from("/tmp/a.pdf"));
    }

    #[tokio::test]
    async fn test_unsupported_extension() {
        let source = LocalDocumentSource::default();
        let result = source.render_first_page("notes.docx", 1.0).await;
        assert!(matches!(result, Err(DocumentError::Unsupported(_))));
    }

    #[tokio::test]
    async fn test_missing_image_is_io_error() {
        let source = LocalDocumentSource::default();
        let result = source
            .render_first_page("/nonexistent/docgraph/missing.png", 1.0)
            .await;
        assert!(matches!(result, Err(DocumentError::Io { .. })));
    }

    #[tokio::test]
    async fn test_garbage_image_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not a png").unwrap();

        let result = LocalDocumentSource::default()
            .render_first_page(path.to_str().unwrap(), 1.0)
            .await;
        assert!(matches!(result, Err(DocumentError::Decode { .. })));
    }

    #[tokio::test]
    async fn test_missing_renderer_is_reported() {
        let source =
            LocalDocumentSource::default().with_renderer("/nonexistent/docgraph/pdftoppm");
        let result = source.render_first_page("/tmp/whatever.pdf", 1.0).await;
        assert!(matches!(
            result,
            Err(DocumentError::RendererUnavailable { .. })
        ));
    }
}
