//! Preview subcommand - render a document's first page.

use std::path::{Path, PathBuf};

use clap::Parser;
use image::RgbaImage;

use super::document_source;
use crate::config::Config;
use crate::documents::{DocumentSource, PageBitmap};
use crate::error::{AppError, Result};
use crate::visualization::TextureError;

/// Render the first page of one document, as the viewer would texture it.
#[derive(Parser)]
pub struct PreviewCommand {
    /// Document path (relative paths use `--root` or `[documents] root`).
    pub document: String,

    /// Output PNG file.
    #[arg(short, long, default_value = "preview.png")]
    pub out: PathBuf,

    /// Render scale (1.0 = 72 DPI); defaults to `[documents] scale`.
    #[arg(long)]
    pub scale: Option<f32>,
}

impl PreviewCommand {
    /// Run the preview command.
    pub async fn run(self, config: Config) -> color_eyre::Result<()> {
        let scale = self.scale.unwrap_or(config.documents.scale);
        let bitmap = document_source(&config)
            .render_first_page(&self.document, scale)
            .await
            .map_err(AppError::from)?;

        save_png(&self.document, bitmap, &self.out)?;
        println!("Wrote {}", self.out.display());
        Ok(())
    }
}

fn save_png(document: &str, bitmap: PageBitmap, out: &Path) -> Result<()> {
    let (width, height, bytes) = (bitmap.width, bitmap.height, bitmap.rgba.len());
    let image = RgbaImage::from_raw(width, height, bitmap.rgba).ok_or_else(|| {
        TextureError::InvalidBitmap {
            path: document.to_string(),
            width,
            height,
            bytes,
        }
    })?;
    image.save(out)?;
    tracing::info!(width, height, out = %out.display(), "Saved preview");
    Ok(())
}
