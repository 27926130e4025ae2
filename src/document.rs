//! The editor facade: one object owning the graph store, the viewport and
//! drag state, and the derived topology/culling caches, exposing the
//! structural mutations and the read-only render boundary.

use crate::culling::{CullCache, VisibleSet};
use crate::error::GraphError;
use crate::geometry::{edge_anchor_points, midpoint};
use crate::graph::{Edge, GraphStore, Node, NodeStatus, NodeType, Point};
use crate::persist::WorkflowSnapshot;
use crate::topology::{TopologyCache, TopologyIndex};
use crate::viewport::{Viewport, ViewportController};
use crate::{NODE_HEIGHT, NODE_SPACING};
use itertools::Itertools;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

/// A document behind a lock, shareable with the execution engine.
pub type SharedDocument = Arc<Mutex<Document>>;

/// Where to splice a new node relative to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertDirection {
    Above,
    Below,
}

/// The two-point polyline of a rendered edge, in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgePath {
    pub from: Point,
    pub to: Point,
}

/// A workflow diagram being edited: canonical graph state plus view state
/// plus lazily maintained derived indexes.
#[derive(Debug, Default)]
pub struct Document {
    store: GraphStore,
    viewport: ViewportController,
    topology: TopologyCache,
    cull: CullCache,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a document from initial nodes and edges.
    pub fn load(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self {
            store: GraphStore::load(nodes, edges),
            viewport: ViewportController::default(),
            topology: TopologyCache::new(),
            cull: CullCache::new(),
        }
    }

    pub fn with_viewport(mut self, view: Viewport) -> Self {
        self.viewport = ViewportController::new(view);
        self
    }

    pub fn into_shared(self) -> SharedDocument {
        Arc::new(Mutex::new(self))
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut GraphStore {
        &mut self.store
    }

    pub fn view(&self) -> &Viewport {
        self.viewport.view()
    }

    /// The level topology for the current structure, rebuilt when stale.
    pub fn topology(&mut self) -> &TopologyIndex {
        self.topology.get(&self.store)
    }

    // -- Viewport interaction -------------------------------------------

    pub fn pan(&mut self, offset: Point) {
        self.viewport.pan(offset);
    }

    pub fn zoom_by(&mut self, delta: f32) {
        self.viewport.zoom_by(delta);
    }

    pub fn resize_viewport(&mut self, width: f32, height: f32) {
        self.viewport.resize(width, height);
    }

    pub fn start_drag(&mut self, node_id: impl Into<String>, screen_x: f32, screen_y: f32) {
        self.viewport.start_drag(node_id, screen_x, screen_y);
    }

    /// Applies the pointer movement to the dragged node. No-op without an
    /// active session or when the session's node no longer exists.
    pub fn drag_to(&mut self, screen_x: f32, screen_y: f32) {
        if let Some((node_id, delta)) = self.viewport.drag_to(screen_x, screen_y) {
            let _ = self.store.translate_node(&node_id, delta.x, delta.y);
        }
    }

    pub fn end_drag(&mut self) {
        self.viewport.end_drag();
    }

    pub fn is_dragging(&self) -> bool {
        self.viewport.is_dragging()
    }

    // -- Render boundary (read-only) ------------------------------------

    /// The memoized visible node/edge id sets for the current transform.
    pub fn visible(&mut self) -> &VisibleSet {
        self.cull.get(&self.store, self.viewport.view())
    }

    pub fn visible_nodes(&mut self) -> Vec<&Node> {
        let set = self.cull.get(&self.store, self.viewport.view());
        set.nodes
            .iter()
            .filter_map(|id| self.store.node(id))
            .collect()
    }

    pub fn visible_edges(&mut self) -> Vec<&Edge> {
        let set = self.cull.get(&self.store, self.viewport.view());
        set.edges
            .iter()
            .filter_map(|id| self.store.edge(id))
            .collect()
    }

    /// Screen-space polyline for an edge, clipped to both node boundaries.
    /// `None` for unknown edges, dangling endpoints, or coincident centers.
    pub fn edge_path(&self, edge_id: &str) -> Option<EdgePath> {
        let edge = self.store.edge(edge_id)?;
        let source = self.store.node(&edge.source)?;
        let target = self.store.node(&edge.target)?;
        let (from, to) = edge_anchor_points(source, target, self.viewport.view())?;
        Some(EdgePath { from, to })
    }

    /// Midpoint of the edge polyline, where the label is anchored.
    pub fn edge_label_anchor(&self, edge_id: &str) -> Option<Point> {
        let path = self.edge_path(edge_id)?;
        Some(midpoint(path.from, path.to))
    }

    // -- Scheduling support ---------------------------------------------

    /// The Pending node with the lowest `(level, id)`; nodes without a
    /// level order last.
    pub fn next_pending(&mut self) -> Option<String> {
        let topology = self.topology.get(&self.store);
        self.store
            .nodes()
            .filter(|n| n.status == NodeStatus::Pending)
            .map(|n| (topology.level(&n.id).unwrap_or(u32::MAX), &n.id))
            .min()
            .map(|(_, id)| id.clone())
    }

    // -- Structural mutation --------------------------------------------

    /// Creates a node of the given kind with its type-specific defaults at
    /// the given position, returning the allocated id.
    pub fn create_node(&mut self, kind: NodeType, label: impl Into<String>, position: Point) -> String {
        let id = self.store.allocate_id(kind.as_str());
        let node = Node::new(id.clone(), kind, label, position).with_type_defaults();
        self.store.upsert_node(node);
        id
    }

    /// Removes a node, cascading to its incident edges.
    pub fn delete_node(&mut self, id: &str) -> Result<Node, GraphError> {
        self.store.delete_node(id)
    }

    pub fn delete_edge(&mut self, id: &str) -> Result<Edge, GraphError> {
        self.store.delete_edge(id)
    }

    /// Splices a new Task node immediately above or below `target_id` in
    /// level order: shifts every node at or beyond the affected level
    /// boundary down by one row, places the new node in the vacated slot,
    /// and relinks the target's edges through it so the path stays
    /// connected. The topology index is extended in place rather than
    /// recomputed.
    pub fn insert_node(
        &mut self,
        target_id: &str,
        direction: InsertDirection,
    ) -> Result<String, GraphError> {
        if self.store.node(target_id).is_none() {
            return Err(GraphError::NodeNotFound(target_id.to_string()));
        }
        let target_level = self
            .topology
            .get(&self.store)
            .level(target_id)
            .ok_or_else(|| GraphError::NodeUnrouted(target_id.to_string()))?;

        let shift = NODE_HEIGHT + NODE_SPACING;
        let boundary_level = match direction {
            InsertDirection::Below => target_level + 1,
            InsertDirection::Above => target_level,
        };

        // Shift via the level buckets instead of a full-graph scan.
        let affected: Vec<String> = self
            .topology
            .get(&self.store)
            .nodes_at_or_beyond(boundary_level)
            .cloned()
            .collect();
        self.store.shift_nodes_y(affected.iter(), shift);

        // Target position is re-read after the shift: inserting above
        // moves the target too, and the new node takes its old slot.
        let target = self
            .store
            .node(target_id)
            .cloned()
            .ok_or_else(|| GraphError::NodeNotFound(target_id.to_string()))?;
        let new_y = match direction {
            InsertDirection::Below => target.position.y + target.height + NODE_SPACING,
            InsertDirection::Above => target.position.y - (NODE_HEIGHT + NODE_SPACING),
        };

        let new_id = self.store.allocate_id("task");
        let new_node = Node::task(new_id.clone(), "New task", Point::new(target.position.x, new_y));
        self.store.upsert_node(new_node);

        let mut removed_edges: Vec<Edge> = Vec::new();
        let mut added_edges: Vec<Edge> = Vec::new();

        match direction {
            InsertDirection::Below => {
                // Outgoing edges of the target now originate from the new
                // node; a fresh target -> new edge closes the splice.
                let outgoing: Vec<Edge> = self
                    .store
                    .edges()
                    .filter(|e| e.source == target_id)
                    .cloned()
                    .collect();
                for edge in outgoing {
                    self.store.delete_edge(&edge.id)?;
                    let mut replacement =
                        Edge::new(self.store.allocate_id("e"), new_id.clone(), edge.target.clone());
                    replacement.label = edge.label.clone();
                    self.store.upsert_edge(replacement.clone());
                    removed_edges.push(edge);
                    added_edges.push(replacement);
                }
                let connecting = Edge::new(self.store.allocate_id("e"), target_id, new_id.clone());
                self.store.upsert_edge(connecting.clone());
                added_edges.push(connecting);
            }
            InsertDirection::Above => {
                let incoming: Vec<Edge> = self
                    .store
                    .edges()
                    .filter(|e| e.target == target_id)
                    .cloned()
                    .collect();
                for edge in incoming {
                    self.store.delete_edge(&edge.id)?;
                    let mut replacement =
                        Edge::new(self.store.allocate_id("e"), edge.source.clone(), new_id.clone());
                    replacement.label = edge.label.clone();
                    self.store.upsert_edge(replacement.clone());
                    removed_edges.push(edge);
                    added_edges.push(replacement);
                }
                let connecting = Edge::new(self.store.allocate_id("e"), new_id.clone(), target_id);
                self.store.upsert_edge(connecting.clone());
                added_edges.push(connecting);
            }
        }

        // Extend the cached topology in place with the new node and the
        // relinked adjacency; downstream levels keep their old values
        // until the next full rebuild.
        let index = self.topology.index_mut();
        for edge in &removed_edges {
            index.remove_edge(edge);
        }
        for edge in &added_edges {
            index.add_edge(edge);
        }
        index.insert_node_level(&new_id, boundary_level);
        self.topology.mark_synced(&self.store);

        debug!(node = target_id, inserted = %new_id, ?direction, "node inserted");
        Ok(new_id)
    }

    /// Delete-with-relink: bridges every predecessor of `id` to every
    /// successor, then removes the node and its incident edges, so a chain
    /// stays connected when an interior node goes away.
    pub fn splice_out_node(&mut self, id: &str) -> Result<Node, GraphError> {
        if self.store.node(id).is_none() {
            return Err(GraphError::NodeNotFound(id.to_string()));
        }
        let predecessors: Vec<String> = self
            .store
            .edges()
            .filter(|e| e.target == id && e.source != id)
            .map(|e| e.source.clone())
            .sorted()
            .dedup()
            .collect();
        let successors: Vec<String> = self
            .store
            .edges()
            .filter(|e| e.source == id && e.target != id)
            .map(|e| e.target.clone())
            .sorted()
            .dedup()
            .collect();

        for predecessor in &predecessors {
            for successor in &successors {
                let already_linked = self
                    .store
                    .edges()
                    .any(|e| &e.source == predecessor && &e.target == successor);
                if !already_linked {
                    let bridge =
                        Edge::new(self.store.allocate_id("e"), predecessor.clone(), successor.clone());
                    self.store.upsert_edge(bridge);
                }
            }
        }

        let removed = self.store.delete_node(id)?;
        debug!(node = id, "node spliced out");
        Ok(removed)
    }

    // -- Persistence boundary -------------------------------------------

    /// The save payload: all nodes and edges (id-sorted for stable output)
    /// plus the viewport transform.
    pub fn snapshot(&self) -> WorkflowSnapshot {
        let view = self.viewport.view();
        WorkflowSnapshot {
            nodes: self
                .store
                .nodes()
                .cloned()
                .sorted_by(|a, b| a.id.cmp(&b.id))
                .collect(),
            edges: self
                .store
                .edges()
                .cloned()
                .sorted_by(|a, b| a.id.cmp(&b.id))
                .collect(),
            viewport_offset: view.offset,
            zoom_level: view.zoom,
        }
    }
}
