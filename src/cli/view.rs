//! View subcommand - open the 3D viewer.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use super::{document_source, load_graph};
use crate::config::Config;
use crate::error::AppError;
use crate::visualization::run_viewer;

/// Open a graph in the 3D viewer.
#[derive(Parser)]
pub struct ViewCommand {
    /// Path to a JSON file with `nodes` and `edges` (sample graph when omitted).
    pub input: Option<PathBuf>,
}

impl ViewCommand {
    /// Run the view command. Blocks until the window is closed.
    pub fn run(self, config: Config) -> color_eyre::Result<()> {
        let graph = load_graph(self.input.as_deref())?;
        let source = Arc::new(document_source(&config));
        let runtime = tokio::runtime::Handle::current();

        tracing::info!(
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "Opening viewer"
        );
        run_viewer(config, graph.into(), source, runtime).map_err(AppError::from)?;
        Ok(())
    }
}
