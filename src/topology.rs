//! Level topology derived from the graph: BFS hop-distance from the start
//! node, level buckets for layout shifting, and edge adjacency for
//! mutation and scheduling.

use crate::graph::{Edge, GraphStore};
use ahash::AHashMap;
use itertools::Itertools;
use std::collections::{BTreeMap, VecDeque};

/// Derived indexes over the graph structure, valid for a single
/// `structure_version` of the store.
#[derive(Debug, Default, Clone)]
pub struct TopologyIndex {
    levels: AHashMap<String, u32>,
    level_nodes: BTreeMap<u32, Vec<String>>,
    outgoing: AHashMap<String, Vec<String>>,
    incoming: AHashMap<String, Vec<String>>,
}

impl TopologyIndex {
    /// Builds the index rooted at the store's start node; empty when the
    /// graph has none.
    pub fn compute(store: &GraphStore) -> Self {
        match store.start_node() {
            Some(start) => Self::from_root(store, &start.id.clone()),
            None => Self::default(),
        }
    }

    /// Breadth-first traversal over outgoing edges from `root`, assigning
    /// each reachable node the minimum hop count at which it is reached.
    ///
    /// A node is re-queued only on a strictly improving discovery, so
    /// self-loops and back-edges terminate. Unreachable nodes receive no
    /// level entry.
    pub fn from_root(store: &GraphStore, root: &str) -> Self {
        let mut outgoing: AHashMap<String, Vec<String>> = AHashMap::new();
        let mut incoming: AHashMap<String, Vec<String>> = AHashMap::new();
        for edge in store.edges().sorted_by(|a, b| a.id.cmp(&b.id)) {
            outgoing
                .entry(edge.source.clone())
                .or_default()
                .push(edge.id.clone());
            incoming
                .entry(edge.target.clone())
                .or_default()
                .push(edge.id.clone());
        }

        let mut levels: AHashMap<String, u32> = AHashMap::new();
        let mut queue: VecDeque<String> = VecDeque::new();
        if store.node(root).is_some() {
            levels.insert(root.to_string(), 0);
            queue.push_back(root.to_string());
        }

        while let Some(id) = queue.pop_front() {
            let Some(&level) = levels.get(&id) else {
                continue;
            };
            let Some(edge_ids) = outgoing.get(&id) else {
                continue;
            };
            for edge_id in edge_ids {
                let Some(edge) = store.edge(edge_id) else {
                    continue;
                };
                if store.node(&edge.target).is_none() {
                    continue;
                }
                let candidate = level + 1;
                let improves = match levels.get(&edge.target) {
                    None => true,
                    Some(&existing) => candidate < existing,
                };
                if improves {
                    levels.insert(edge.target.clone(), candidate);
                    queue.push_back(edge.target.clone());
                }
            }
        }

        let mut level_nodes: BTreeMap<u32, Vec<String>> = BTreeMap::new();
        for (id, &level) in levels.iter().sorted_by(|a, b| a.0.cmp(b.0)) {
            level_nodes.entry(level).or_default().push(id.clone());
        }

        Self {
            levels,
            level_nodes,
            outgoing,
            incoming,
        }
    }

    pub fn level(&self, id: &str) -> Option<u32> {
        self.levels.get(id).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Node ids at exactly `level`, id-sorted.
    pub fn nodes_at(&self, level: u32) -> &[String] {
        self.level_nodes
            .get(&level)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Node ids at `level` or deeper, the set shifted by an insertion.
    pub fn nodes_at_or_beyond(&self, level: u32) -> impl Iterator<Item = &String> {
        self.level_nodes
            .range(level..)
            .flat_map(|(_, ids)| ids.iter())
    }

    pub fn outgoing_edges(&self, id: &str) -> &[String] {
        self.outgoing.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn incoming_edges(&self, id: &str) -> &[String] {
        self.incoming.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    // -- Incremental patching used by insert-with-shift. Downstream levels
    // are intentionally not recomputed here; the next structural change
    // triggers a full rebuild through the cache's version check.

    pub fn insert_node_level(&mut self, id: &str, level: u32) {
        if self.levels.contains_key(id) {
            return;
        }
        self.levels.insert(id.to_string(), level);
        let bucket = self.level_nodes.entry(level).or_default();
        bucket.push(id.to_string());
        bucket.sort();
    }

    pub fn add_edge(&mut self, edge: &Edge) {
        self.outgoing
            .entry(edge.source.clone())
            .or_default()
            .push(edge.id.clone());
        self.incoming
            .entry(edge.target.clone())
            .or_default()
            .push(edge.id.clone());
    }

    pub fn remove_edge(&mut self, edge: &Edge) {
        if let Some(ids) = self.outgoing.get_mut(&edge.source) {
            ids.retain(|id| id != &edge.id);
        }
        if let Some(ids) = self.incoming.get_mut(&edge.target) {
            ids.retain(|id| id != &edge.id);
        }
    }
}

/// Lazily rebuilt cache wrapping [`TopologyIndex`], keyed on the store's
/// structure version.
#[derive(Debug, Default)]
pub struct TopologyCache {
    version: Option<u64>,
    index: TopologyIndex,
}

impl TopologyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the index for the store's current structure, rebuilding it
    /// when stale.
    pub fn get(&mut self, store: &GraphStore) -> &TopologyIndex {
        if self.version != Some(store.structure_version()) {
            self.index = TopologyIndex::compute(store);
            self.version = Some(store.structure_version());
        }
        &self.index
    }

    /// Mutable access for incremental patches; the caller must re-sync the
    /// version afterwards with [`TopologyCache::mark_synced`].
    pub fn index_mut(&mut self) -> &mut TopologyIndex {
        &mut self.index
    }

    /// Declares the cached index valid for the store's current structure
    /// version after an incremental patch.
    pub fn mark_synced(&mut self, store: &GraphStore) {
        self.version = Some(store.structure_version());
    }

    pub fn invalidate(&mut self) {
        self.version = None;
    }
}
