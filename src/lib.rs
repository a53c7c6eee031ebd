//! docgraph - Document Relationship Graph
//!
//! An interactive 3D viewport for documents and the labeled relationships
//! between them, with first-page previews on every node.

pub mod cli;
pub mod config;
pub mod documents;
pub mod error;
pub mod models;
pub mod visualization;
