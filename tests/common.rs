//! Common test utilities for building workflow documents and engines.
use keiro::engine::{Engine, EngineConfig};
use keiro::prelude::*;
use keiro::{NODE_HEIGHT, NODE_SPACING};

/// Vertical distance between consecutive chain rows.
#[allow(dead_code)]
pub const ROW: f32 = NODE_HEIGHT + NODE_SPACING;

/// Builds `start -> task_1 .. task_n -> end` as a vertical chain, one row
/// per level, the same shape the editor seeds itself with.
#[allow(dead_code)]
pub fn linear_workflow(tasks: usize) -> (Vec<Node>, Vec<Edge>) {
    let mut nodes = Vec::new();
    let mut edges = Vec::new();
    let mut y = 50.0;

    nodes.push(Node::new("start", NodeType::Start, "Start", Point::new(450.0, y)));
    let mut previous = "start".to_string();

    for index in 1..=tasks {
        y += ROW;
        let id = format!("task_{index}");
        nodes.push(Node::task(id.clone(), format!("Task {index}"), Point::new(450.0, y)));
        edges.push(Edge::new(format!("e{index}"), previous.clone(), id.clone()));
        previous = id;
    }

    y += ROW;
    nodes.push(Node::new("end", NodeType::End, "End", Point::new(450.0, y)));
    edges.push(Edge::new(format!("e{}", tasks + 1), previous, "end"));

    (nodes, edges)
}

#[allow(dead_code)]
pub fn linear_document(tasks: usize) -> Document {
    let (nodes, edges) = linear_workflow(tasks);
    Document::load(nodes, edges)
}

/// A diamond: start fans out to `left` and `right`, both joining at
/// `merge`, which leads to `end`.
#[allow(dead_code)]
pub fn diamond_workflow() -> (Vec<Node>, Vec<Edge>) {
    let nodes = vec![
        Node::new("start", NodeType::Start, "Start", Point::new(450.0, 50.0)),
        Node::task("left", "Left", Point::new(300.0, 50.0 + ROW)),
        Node::task("right", "Right", Point::new(600.0, 50.0 + ROW)),
        Node::new("merge", NodeType::Merge, "Join", Point::new(450.0, 50.0 + 2.0 * ROW)),
        Node::new("end", NodeType::End, "End", Point::new(450.0, 50.0 + 3.0 * ROW)),
    ];
    let edges = vec![
        Edge::new("e1", "start", "left"),
        Edge::new("e2", "start", "right"),
        Edge::new("e3", "left", "merge"),
        Edge::new("e4", "right", "merge"),
        Edge::new("e5", "merge", "end"),
    ];
    (nodes, edges)
}

/// `start -> branch` forking to `yes`/`no` tasks; edge ids order the yes
/// edge first so a true decision takes it under strict routing.
#[allow(dead_code)]
pub fn branch_workflow() -> (Vec<Node>, Vec<Edge>) {
    let branch = Node::new("branch", NodeType::Branch, "Check", Point::new(450.0, 50.0 + ROW))
        .with_type_defaults();
    let nodes = vec![
        Node::new("start", NodeType::Start, "Start", Point::new(450.0, 50.0)),
        branch,
        Node::task("yes", "Yes path", Point::new(300.0, 50.0 + 2.0 * ROW)),
        Node::task("no", "No path", Point::new(600.0, 50.0 + 2.0 * ROW)),
    ];
    let edges = vec![
        Edge::new("e1", "start", "branch"),
        Edge::new("e2_yes", "branch", "yes"),
        Edge::new("e3_no", "branch", "no"),
    ];
    (nodes, edges)
}

/// `start -> loop -> end` with the given iteration budget and a self-loop
/// edge on the loop node, the way the editor draws repeating steps.
#[allow(dead_code)]
pub fn loop_workflow(loop_count: u32) -> (Vec<Node>, Vec<Edge>) {
    let mut repeat = Node::new("loop", NodeType::Loop, "Repeat", Point::new(450.0, 50.0 + ROW));
    repeat.loop_count = Some(loop_count);
    repeat.current_iteration = Some(0);
    let nodes = vec![
        Node::new("start", NodeType::Start, "Start", Point::new(450.0, 50.0)),
        repeat,
        Node::new("end", NodeType::End, "End", Point::new(450.0, 50.0 + 2.0 * ROW)),
    ];
    let edges = vec![
        Edge::new("e1", "start", "loop"),
        Edge::new("e2", "loop", "loop"),
        Edge::new("e3", "loop", "end"),
    ];
    (nodes, edges)
}

/// `start -> timer -> end` with the given timer delay.
#[allow(dead_code)]
pub fn timer_workflow(delay_ms: u64) -> (Vec<Node>, Vec<Edge>) {
    let mut timer = Node::new("timer", NodeType::Timer, "Wait", Point::new(450.0, 50.0 + ROW));
    timer.delay_ms = Some(delay_ms);
    let nodes = vec![
        Node::new("start", NodeType::Start, "Start", Point::new(450.0, 50.0)),
        timer,
        Node::new("end", NodeType::End, "End", Point::new(450.0, 50.0 + 2.0 * ROW)),
    ];
    let edges = vec![
        Edge::new("e1", "start", "timer"),
        Edge::new("e2", "timer", "end"),
    ];
    (nodes, edges)
}

/// An engine with millisecond timings and failures disabled, wrapped
/// around the given document.
#[allow(dead_code)]
pub fn fast_engine(document: SharedDocument) -> Engine {
    Engine::builder(document).config(EngineConfig::fast()).build()
}

/// Counts history entries that moved `node_id` into `to`.
#[allow(dead_code)]
pub fn transitions_into(engine: &Engine, node_id: &str, to: NodeStatus) -> usize {
    engine
        .history()
        .iter()
        .filter(|entry| entry.node_id == node_id && entry.to == to)
        .count()
}

/// Status of a node in a shared document.
#[allow(dead_code)]
pub fn node_status(document: &SharedDocument, id: &str) -> NodeStatus {
    document
        .lock()
        .store()
        .node(id)
        .map(|n| n.status)
        .expect("node should exist")
}
