//! End-to-end tests: the full edit-render-run-save cycle and the wire
//! shape of the persistence payload.
mod common;
use common::*;
use keiro::persist::{self, WorkflowSnapshot};
use keiro::prelude::*;

#[test]
fn snapshot_carries_the_editor_wire_shape() {
    let mut doc = linear_document(1);
    doc.pan(Point::new(12.0, -8.0));
    doc.zoom_by(5.0); // 1.5

    let mut repeat = Node::new("loop", NodeType::Loop, "Repeat", Point::new(0.0, 0.0));
    repeat.loop_count = Some(2);
    repeat.current_iteration = Some(0);
    doc.store_mut().upsert_node(repeat);

    let snapshot = doc.snapshot();
    let value = serde_json::to_value(&snapshot).expect("serializable");

    // Top-level keys match the original save payload.
    assert!(value.get("nodes").is_some());
    assert!(value.get("edges").is_some());
    assert_eq!(value["viewportOffset"]["x"], 12.0);
    assert_eq!(value["viewportOffset"]["y"], -8.0);
    assert_eq!(value["zoomLevel"], 1.5);

    let nodes = value["nodes"].as_array().expect("array");
    let start = nodes
        .iter()
        .find(|n| n["id"] == "start")
        .expect("start serialized");
    assert_eq!(start["type"], "start");
    assert_eq!(start["status"], "pending");
    assert_eq!(start["width"], 120.0);
    // Type-specific fields are omitted when absent...
    assert!(start.get("loopCount").is_none());
    assert!(start.get("condition").is_none());

    // ...and camelCased when present.
    let repeat = nodes
        .iter()
        .find(|n| n["id"] == "loop")
        .expect("loop serialized");
    assert_eq!(repeat["loopCount"], 2);
    assert_eq!(repeat["currentIteration"], 0);
}

#[test]
fn snapshot_round_trips_through_load() {
    let mut doc = linear_document(2);
    doc.insert_node("task_1", InsertDirection::Below)
        .expect("routed target");
    let snapshot = doc.snapshot();

    let json = serde_json::to_string(&snapshot).expect("serializable");
    let parsed: WorkflowSnapshot = serde_json::from_str(&json).expect("parseable");
    let mut reloaded = Document::load(parsed.nodes, parsed.edges);

    assert_eq!(reloaded.store().node_count(), doc.store().node_count());
    assert_eq!(reloaded.store().edge_count(), doc.store().edge_count());
    let end_level = reloaded.topology().level("end");
    assert_eq!(end_level, Some(4));
}

#[test]
fn edge_geometry_is_exposed_at_the_render_boundary() {
    let mut doc = linear_document(1);

    let path = doc.edge_path("e1").expect("both endpoints exist");
    let anchor = doc.edge_label_anchor("e1").expect("midpoint exists");
    assert_eq!(anchor.x, (path.from.x + path.to.x) / 2.0);
    assert_eq!(anchor.y, (path.from.y + path.to.y) / 2.0);

    // Vertical chain: the path leaves the source's bottom edge and enters
    // the target's top edge.
    assert!(path.from.y < path.to.y);

    assert!(doc.edge_path("ghost").is_none());
    doc.store_mut()
        .upsert_edge(Edge::new("e_dangling", "start", "ghost"));
    assert!(doc.edge_path("e_dangling").is_none());
}

#[tokio::test]
async fn edit_then_run_then_snapshot() {
    let (nodes, edges) = linear_workflow(2);
    let mut doc = Document::load(nodes, edges);

    // Edit: splice a task below task_1 and nudge it sideways.
    let new_id = doc
        .insert_node("task_1", InsertDirection::Below)
        .expect("routed target");
    doc.start_drag(&new_id, 200.0, 200.0);
    doc.drag_to(260.0, 200.0);
    doc.end_drag();

    // Render: the fresh node is part of the visible set.
    assert!(doc.visible().nodes.iter().any(|id| id == &new_id));

    // Reload the edited diagram the way a host would and run it; the
    // rebuilt topology orders the inserted node between its neighbors.
    let edited = doc.snapshot();
    let document = Document::load(edited.nodes, edited.edges).into_shared();
    let mut engine = fast_engine(document.clone());
    engine.start().expect("idle engine starts");
    engine.wait().await;
    assert_eq!(engine.status(), RunStatus::Completed);
    assert_eq!(node_status(&document, &new_id), NodeStatus::Completed);

    let order: Vec<String> = engine
        .history()
        .iter()
        .filter(|e| e.to == NodeStatus::Running)
        .map(|e| e.node_id.clone())
        .collect();
    let target_at = order.iter().position(|id| id == "task_1").expect("ran");
    let new_at = order.iter().position(|id| id == &new_id).expect("ran");
    let successor_at = order.iter().position(|id| id == "task_2").expect("ran");
    assert!(target_at < new_at && new_at < successor_at);

    // Save payload reflects the run's terminal statuses.
    let snapshot = document.lock().snapshot();
    let value = serde_json::to_value(&snapshot).expect("serializable");
    let nodes = value["nodes"].as_array().expect("array");
    assert!(nodes.iter().all(|n| n["status"] == "completed"));
}

#[test]
fn save_to_unreachable_endpoint_is_a_transport_error() {
    let doc = linear_document(1);
    let snapshot = doc.snapshot();

    // Nothing listens on this port; the POST fails at the transport layer.
    let result = tokio_test::block_on(persist::save(
        &snapshot,
        "http://127.0.0.1:9/api/workflow/save",
    ));
    match result {
        Err(SaveError::Transport { message }) => assert!(!message.is_empty()),
        other => panic!("expected a transport error, got {other:?}"),
    }
}

#[test]
fn fifty_task_chain_stays_consistent_under_edits() {
    let mut doc = linear_document(50);

    // Insert below every tenth task, then splice two of them out again.
    for index in [10usize, 20, 30, 40] {
        doc.insert_node(&format!("task_{index}"), InsertDirection::Below)
            .expect("routed target");
    }
    doc.splice_out_node("task_15").expect("exists");
    doc.splice_out_node("task_35").expect("exists");

    // Force a rebuild and verify the whole chain is still one path.
    doc.store_mut().upsert_edge(Edge::new("e_probe", "end", "end"));
    let ids: Vec<String> = doc.store().nodes().map(|n| n.id.clone()).collect();
    let topology = doc.topology();
    for id in &ids {
        assert!(topology.level(id).is_some(), "{id} became unreachable");
    }
}
