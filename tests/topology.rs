//! Level computation: BFS hop distances, buckets, adjacency, cycles, and
//! cache invalidation.
mod common;
use common::*;
use keiro::prelude::*;
use keiro::topology::TopologyIndex;

#[test]
fn start_has_level_zero_and_chain_counts_up() {
    let mut doc = linear_document(3);
    let topology = doc.topology();

    assert_eq!(topology.level("start"), Some(0));
    assert_eq!(topology.level("task_1"), Some(1));
    assert_eq!(topology.level("task_2"), Some(2));
    assert_eq!(topology.level("task_3"), Some(3));
    assert_eq!(topology.level("end"), Some(4));
}

#[test]
fn unreachable_nodes_have_no_level() {
    let (mut nodes, edges) = linear_workflow(1);
    nodes.push(Node::task("island", "Unconnected", Point::new(0.0, 0.0)));
    let mut doc = Document::load(nodes, edges);

    assert_eq!(doc.topology().level("island"), None);
    assert_eq!(doc.topology().level("task_1"), Some(1));
}

#[test]
fn diamond_assigns_minimum_hop_count() {
    let (nodes, edges) = diamond_workflow();
    let mut doc = Document::load(nodes, edges);
    let topology = doc.topology();

    assert_eq!(topology.level("left"), Some(1));
    assert_eq!(topology.level("right"), Some(1));
    assert_eq!(topology.level("merge"), Some(2));
    assert_eq!(topology.level("end"), Some(3));

    let mut level_one: Vec<_> = topology.nodes_at(1).to_vec();
    level_one.sort();
    assert_eq!(level_one, vec!["left".to_string(), "right".to_string()]);
}

#[test]
fn shortcut_edge_wins_over_longer_path() {
    // start -> a -> b -> c plus a direct start -> c shortcut: c sits at
    // hop 1, not 3.
    let nodes = vec![
        Node::new("start", NodeType::Start, "Start", Point::new(0.0, 0.0)),
        Node::task("a", "A", Point::new(0.0, 100.0)),
        Node::task("b", "B", Point::new(0.0, 200.0)),
        Node::task("c", "C", Point::new(0.0, 300.0)),
    ];
    let edges = vec![
        Edge::new("e1", "start", "a"),
        Edge::new("e2", "a", "b"),
        Edge::new("e3", "b", "c"),
        Edge::new("e4", "start", "c"),
    ];
    let mut doc = Document::load(nodes, edges);
    assert_eq!(doc.topology().level("c"), Some(1));
}

#[test]
fn self_loops_and_back_edges_terminate() {
    let (mut nodes, mut edges) = linear_workflow(2);
    nodes.push(Node::new("loop", NodeType::Loop, "Repeat", Point::new(0.0, 0.0)));
    edges.push(Edge::new("e_self", "loop", "loop"));
    edges.push(Edge::new("e_in", "task_1", "loop"));
    edges.push(Edge::new("e_back", "task_2", "task_1"));
    let mut doc = Document::load(nodes, edges);

    let topology = doc.topology();
    assert_eq!(topology.level("loop"), Some(2));
    assert_eq!(topology.level("task_1"), Some(1));
    assert_eq!(topology.level("task_2"), Some(2));
}

#[test]
fn adjacency_indexes_incident_edges() {
    let (nodes, edges) = diamond_workflow();
    let store = GraphStore::load(nodes, edges);
    let topology = TopologyIndex::from_root(&store, "start");

    assert_eq!(topology.outgoing_edges("start").len(), 2);
    assert_eq!(topology.incoming_edges("merge").len(), 2);
    assert_eq!(topology.incoming_edges("start").len(), 0);
    assert_eq!(topology.outgoing_edges("end").len(), 0);
}

#[test]
fn dangling_edge_targets_are_ignored() {
    let (nodes, mut edges) = linear_workflow(1);
    edges.push(Edge::new("e_dangling", "task_1", "ghost"));
    let mut doc = Document::load(nodes, edges);

    assert_eq!(doc.topology().level("ghost"), None);
    assert_eq!(doc.topology().level("end"), Some(2));
}

#[test]
fn topology_rebuilds_after_structural_change() {
    let mut doc = linear_document(1);
    assert_eq!(doc.topology().level("end"), Some(2));

    // A shortcut edge shortens end's level once the cache rebuilds.
    doc.store_mut().upsert_edge(Edge::new("e_short", "start", "end"));
    assert_eq!(doc.topology().level("end"), Some(1));
}

#[test]
fn missing_start_yields_empty_topology() {
    let nodes = vec![Node::task("a", "A", Point::new(0.0, 0.0))];
    let mut doc = Document::load(nodes, Vec::new());
    assert!(doc.topology().is_empty());
    assert_eq!(doc.topology().level("a"), None);
}
