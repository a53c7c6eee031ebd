//! Inspect subcommand - mount a graph without a window.

use std::path::PathBuf;

use bevy::math::Vec2;
use clap::Parser;

use super::{document_source, load_graph};
use crate::config::Config;
use crate::error::AppError;
use crate::models::GraphEdge;
use crate::visualization::{
    load_all, MountState, PreviewAttach, ViewportController, ViewportRect,
};

/// Mount a graph headlessly and print its visuals.
#[derive(Parser)]
pub struct InspectCommand {
    /// Path to a JSON file with `nodes` and `edges` (sample graph when omitted).
    pub input: Option<PathBuf>,

    /// Load every node's first-page preview and report the results.
    #[arg(long)]
    pub previews: bool,

    /// Simulate a click at viewport coordinates X Y.
    #[arg(long, num_args = 2, value_names = ["X", "Y"], allow_negative_numbers = true)]
    pub click: Option<Vec<f32>>,
}

impl InspectCommand {
    /// Run the inspect command.
    pub async fn run(self, config: Config) -> color_eyre::Result<()> {
        let graph = load_graph(self.input.as_deref())?;
        let rect = ViewportRect::sized(config.viewport.width, config.viewport.height);

        let (mut controller, requests) = ViewportController::mount(
            config.camera.clone(),
            config.scene.clone(),
            rect,
            graph.into(),
            Box::new(|edge: Option<&GraphEdge>| match edge {
                Some(edge) => println!(
                    "Selected edge {} ({} -> {}) \"{}\"",
                    edge.id, edge.source, edge.target, edge.value
                ),
                None => println!("Selection cleared"),
            }),
        )
        .map_err(AppError::from)?;

        print_scene(&controller);

        if self.previews {
            let source = document_source(&config);
            let outcomes = load_all(&source, requests, config.documents.scale).await;

            println!("\nPreviews:");
            for outcome in outcomes {
                let node_id = outcome.node_id;
                let detail = match &outcome.result {
                    Ok(bitmap) => format!("{}x{}", bitmap.width, bitmap.height),
                    Err(e) => e.to_string(),
                };
                let attach = controller.complete_texture(outcome);
                println!("  node {node_id}: {} {detail}", attach_name(attach));
            }
            println!("State: {}", state_name(controller.state()));
        }

        if let Some(point) = self.click {
            let pointer = Vec2::new(point[0], point[1]);
            println!("\nClick at ({}, {}):", pointer.x, pointer.y);
            if controller.click(pointer).is_none() {
                println!("  no edge under the pointer");
            }
        }

        controller.unmount();
        Ok(())
    }
}

fn print_scene(controller: &ViewportController) {
    let scene = controller.scene();

    println!("Nodes ({}):", scene.nodes().len());
    for (node, label) in scene.nodes().iter().zip(scene.labels()) {
        println!(
            "  {} {:<24} at {:>6.2} {:>6.2} {:>6.2}   label at {:>6.2} {:>6.2} {:>6.2}",
            node.node_id,
            node.name,
            node.position.x,
            node.position.y,
            node.position.z,
            label.position.x,
            label.position.y,
            label.position.z,
        );
    }

    println!("Edges ({}):", scene.edges().len());
    for edge in scene.edges() {
        let [start, end] = edge.line.positions;
        println!(
            "  {} \"{}\" from {:.2},{:.2},{:.2} to {:.2},{:.2},{:.2}",
            edge.edge_id, edge.text, start.x, start.y, start.z, end.x, end.y, end.z,
        );
    }

    if !scene.skipped_edges().is_empty() {
        println!("Skipped edges with missing endpoints: {:?}", scene.skipped_edges());
    }
    println!("State: {}", state_name(controller.state()));
}

fn attach_name(attach: PreviewAttach) -> &'static str {
    match attach {
        PreviewAttach::Attached => "attached",
        PreviewAttach::Stale => "stale",
        PreviewAttach::UnknownNode => "unknown node",
        PreviewAttach::Failed => "failed:",
    }
}

fn state_name(state: MountState) -> String {
    match state {
        MountState::Initializing => "initializing".to_string(),
        MountState::Loading { pending } => format!("loading ({pending} pending)"),
        MountState::Ready => "ready".to_string(),
    }
}
