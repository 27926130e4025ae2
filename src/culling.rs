//! Viewport culling: which nodes and edges intersect the visible window.
//!
//! Edges use a conservative quick-reject on their transformed endpoint
//! centers (both outside the same viewport side), not exact line-rectangle
//! intersection; false negatives near corners are acceptable. The final
//! node set is the union of self-visible nodes and every endpoint of a
//! surviving edge, so a partially crossing edge still renders its anchors.

use crate::geometry::{node_screen_center, node_screen_rect};
use crate::graph::GraphStore;
use crate::viewport::Viewport;
use itertools::Itertools;

/// Id sets of the elements that intersect the viewport.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisibleSet {
    pub nodes: Vec<String>,
    pub edges: Vec<String>,
}

/// Half-open overlap test between a node's screen box and `[0,w] x [0,h]`.
fn node_visible(rect: &crate::geometry::ScreenRect, view: &Viewport) -> bool {
    rect.right() > 0.0 && rect.left() < view.width && rect.bottom() > 0.0 && rect.top() < view.height
}

fn quick_reject(ax: f32, ay: f32, bx: f32, by: f32, view: &Viewport) -> bool {
    if (ax < 0.0 && bx < 0.0) || (ax > view.width && bx > view.width) {
        return true;
    }
    if (ay < 0.0 && by < 0.0) || (ay > view.height && by > view.height) {
        return true;
    }
    false
}

/// Computes the visible node/edge sets for the current transform. Output
/// ids are sorted for deterministic comparison.
pub fn compute_visible(store: &GraphStore, view: &Viewport) -> VisibleSet {
    let mut edges = Vec::new();
    let mut endpoint_ids = Vec::new();
    for edge in store.edges() {
        let (Some(source), Some(target)) = (store.node(&edge.source), store.node(&edge.target))
        else {
            continue;
        };
        let a = node_screen_center(source, view);
        let b = node_screen_center(target, view);
        if quick_reject(a.x, a.y, b.x, b.y, view) {
            continue;
        }
        edges.push(edge.id.clone());
        endpoint_ids.push(edge.source.clone());
        endpoint_ids.push(edge.target.clone());
    }

    let self_visible = store
        .nodes()
        .filter(|node| node_visible(&node_screen_rect(node, view), view))
        .map(|node| node.id.clone());

    let nodes = self_visible
        .chain(endpoint_ids)
        .sorted()
        .dedup()
        .collect();
    edges.sort();

    VisibleSet { nodes, edges }
}

/// Memo key: version counters plus the viewport's exact bit pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CullKey {
    structure: u64,
    geometry: u64,
    offset: (u32, u32),
    zoom: u32,
    size: (u32, u32),
}

impl CullKey {
    fn of(store: &GraphStore, view: &Viewport) -> Self {
        Self {
            structure: store.structure_version(),
            geometry: store.geometry_version(),
            offset: (view.offset.x.to_bits(), view.offset.y.to_bits()),
            zoom: view.zoom.to_bits(),
            size: (view.width.to_bits(), view.height.to_bits()),
        }
    }
}

/// Pull-based memo around [`compute_visible`]: the O(N) scan re-runs only
/// when the structure, geometry, or viewport actually changed.
#[derive(Debug, Default)]
pub struct CullCache {
    key: Option<CullKey>,
    set: VisibleSet,
}

impl CullCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, store: &GraphStore, view: &Viewport) -> &VisibleSet {
        let key = CullKey::of(store, view);
        if self.key != Some(key) {
            self.set = compute_visible(store, view);
            self.key = Some(key);
        }
        &self.set
    }
}
