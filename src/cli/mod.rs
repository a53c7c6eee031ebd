//! CLI module for docgraph.
//!
//! Subcommands:
//! - `view`: Open the 3D viewer
//! - `inspect`: Mount a graph headlessly and print its scene
//! - `preview`: Render one document's first page to a PNG

mod inspect;
mod preview;
mod view;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

pub use inspect::InspectCommand;
pub use preview::PreviewCommand;
pub use view::ViewCommand;

use crate::config::Config;
use crate::documents::LocalDocumentSource;
use crate::error::{AppError, Result};
use crate::models::GraphData;

/// docgraph - Document Relationship Graph
#[derive(Parser)]
#[command(name = "docgraph")]
#[command(about = "Interactive 3D viewer for documents and their relationships")]
#[command(version)]
pub struct App {
    /// Run in verbose mode
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory relative document paths are resolved against
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Open the 3D viewer (sample graph when no file is given)
    View(ViewCommand),

    /// Mount a graph without a window and print its visuals
    Inspect(InspectCommand),

    /// Render the first page of one document to a PNG file
    Preview(PreviewCommand),
}

impl App {
    /// Run the CLI application.
    pub async fn run(self) -> color_eyre::Result<()> {
        let mut config = Config::load().map_err(AppError::from)?;
        if let Some(root) = self.root {
            config.documents.root = Some(root);
        }
        tracing::debug!(?config, "Loaded configuration");

        match self.command {
            Command::View(cmd) => cmd.run(config),
            Command::Inspect(cmd) => cmd.run(config).await,
            Command::Preview(cmd) => cmd.run(config).await,
        }
    }
}

/// Read a graph from a JSON file, or the sample graph without one.
pub fn load_graph(path: Option<&Path>) -> Result<GraphData> {
    let Some(path) = path else {
        tracing::info!("No graph file given; using the sample graph");
        return Ok(GraphData::sample());
    };

    let content = std::fs::read_to_string(path).map_err(|source| AppError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let graph = GraphData::from_json_str(&content)?;
    tracing::info!(
        path = %path.display(),
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        "Loaded graph"
    );
    Ok(graph)
}

/// Document source configured from `[documents]`.
pub fn document_source(config: &Config) -> LocalDocumentSource {
    LocalDocumentSource::new(config.documents.root.clone())
        .with_renderer(config.documents.pdftoppm.clone())
}
