//! End-to-end viewport scenario through the public API.
//!
//! Mounts the three-document graph, loads previews from an in-memory source,
//! clicks an edge, edits its label, and remounts.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bevy::math::Vec2;
use docgraph::config::{CameraSettings, SceneSettings};
use docgraph::documents::{DocumentError, DocumentSource, PageBitmap};
use docgraph::models::{EdgeId, GraphData, GraphEdge, GraphInput};
use docgraph::visualization::picking::ndc_to_client;
use docgraph::visualization::{
    load_all, MountState, PreviewAttach, TextureRequest, ViewportController, ViewportRect,
};

type Selections = Arc<Mutex<Vec<Option<GraphEdge>>>>;

/// Letter-sized pages for every document except `File3.pdf`.
struct PageSource;

#[async_trait]
impl DocumentSource for PageSource {
    async fn render_first_page(
        &self,
        path: &str,
        _scale: f32,
    ) -> Result<PageBitmap, DocumentError> {
        if path.ends_with("File3.pdf") {
            return Err(DocumentError::NoPageRendered(path.to_string()));
        }
        Ok(PageBitmap::solid(17, 22, [255, 255, 255, 255]))
    }
}

fn mount(input: GraphInput) -> (ViewportController, Vec<TextureRequest>, Selections) {
    let seen: Selections = Arc::default();
    let sink = seen.clone();
    let (controller, requests) = ViewportController::mount(
        CameraSettings::default(),
        SceneSettings::default(),
        ViewportRect::sized(1024.0, 768.0),
        input,
        Box::new(move |edge: Option<&GraphEdge>| sink.lock().unwrap().push(edge.cloned())),
    )
    .unwrap();
    (controller, requests, seen)
}

fn edge_midpoint_on_screen(controller: &ViewportController, edge_id: EdgeId) -> Vec2 {
    let edge = controller.scene().edge_by_graph_id(edge_id).unwrap();
    let ndc = controller.camera().project(edge.line.midpoint()).unwrap();
    ndc_to_client(ndc, controller.rect())
}

#[tokio::test]
async fn test_sample_graph_scenario() {
    let (mut controller, requests, seen) = mount(GraphData::sample().into());

    assert_eq!(controller.scene().nodes().len(), 3);
    assert_eq!(controller.scene().edges().len(), 3);
    assert_eq!(controller.state(), MountState::Loading { pending: 3 });

    let outcomes = load_all(&PageSource, requests, 1.0).await;
    let attached: Vec<_> = outcomes
        .into_iter()
        .map(|outcome| controller.complete_texture(outcome))
        .collect();
    assert_eq!(
        attached,
        vec![
            PreviewAttach::Attached,
            PreviewAttach::Attached,
            PreviewAttach::Failed
        ]
    );
    assert_eq!(controller.state(), MountState::Ready);
    assert_eq!(controller.scene().preview_count(), 2);

    let pointer = edge_midpoint_on_screen(&controller, 1);
    assert_eq!(controller.click(pointer), Some(1));
    assert_eq!(controller.click(Vec2::new(3.0, 3.0)), None);

    {
        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                Some(GraphEdge {
                    id: 1,
                    source: 1,
                    target: 2,
                    value: "related".to_string(),
                }),
                None,
            ]
        );
    }

    controller.update_edge_label(1, "supersedes").unwrap();
    let edge = controller.scene().edge_by_graph_id(1).unwrap();
    assert_eq!(edge.label.text, "supersedes");

    let committed = controller.input().with_edge_value(1, "supersedes");
    let requests = controller.set_input(committed);
    assert_eq!(requests.len(), 3);
    assert_eq!(controller.scene().preview_count(), 0);
    assert_eq!(controller.input().edge(1).unwrap().value, "supersedes");

    assert!(controller.unmount().is_some());
    assert!(controller.unmount().is_none());
}

#[test]
fn test_zero_size_viewport_is_rejected() {
    let result = ViewportController::mount(
        CameraSettings::default(),
        SceneSettings::default(),
        ViewportRect::sized(0.0, 600.0),
        GraphData::sample().into(),
        Box::new(|_: Option<&GraphEdge>| {}),
    );

    assert!(result.is_err());
}
