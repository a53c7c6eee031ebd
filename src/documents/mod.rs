//! Document sources for node preview textures.
//!
//! A [`DocumentSource`] turns a document path into a bitmap of its first
//! page. [`LocalDocumentSource`] handles PDFs (via `pdftoppm`) and raster
//! images on the local filesystem.

mod local;
mod source;

pub use local::LocalDocumentSource;
pub use source::{DocumentError, DocumentSource, PageBitmap};
