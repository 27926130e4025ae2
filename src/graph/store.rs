use crate::error::GraphError;
use crate::graph::{Edge, Node, NodeStatus, NodeType};
use ahash::AHashMap;

/// Owns the canonical `id -> Node` and `id -> Edge` maps.
///
/// Two monotonic counters make cache invalidation explicit: the structure
/// version moves when the node/edge sets or edge endpoints change, the
/// geometry version moves when positions change. Derived state (topology,
/// culling) is rebuilt against these instead of tracking mutations ad hoc.
#[derive(Debug, Default)]
pub struct GraphStore {
    nodes: AHashMap<String, Node>,
    edges: AHashMap<String, Edge>,
    structure_version: u64,
    geometry_version: u64,
    next_id: u64,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a store from initial data, replacing ids that collide.
    pub fn load(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        let mut store = Self::new();
        for node in nodes {
            store.nodes.insert(node.id.clone(), node);
        }
        for edge in edges {
            store.edges.insert(edge.id.clone(), edge);
        }
        store.structure_version = 1;
        store.geometry_version = 1;
        store
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// The unique traversal and execution root.
    pub fn start_node(&self) -> Option<&Node> {
        self.nodes.values().find(|n| n.kind == NodeType::Start)
    }

    pub fn structure_version(&self) -> u64 {
        self.structure_version
    }

    pub fn geometry_version(&self) -> u64 {
        self.geometry_version
    }

    /// Inserts or replaces a node.
    pub fn upsert_node(&mut self, node: Node) {
        self.nodes.insert(node.id.clone(), node);
        self.structure_version += 1;
        self.geometry_version += 1;
    }

    /// Inserts or replaces an edge. Dangling endpoints are tolerated here
    /// and filtered by readers.
    pub fn upsert_edge(&mut self, edge: Edge) {
        self.edges.insert(edge.id.clone(), edge);
        self.structure_version += 1;
    }

    /// Removes a node and every edge whose source or target references it.
    /// Missing ids are a no-op failure signal, not a fault.
    pub fn delete_node(&mut self, id: &str) -> Result<Node, GraphError> {
        let node = self
            .nodes
            .remove(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))?;
        self.edges
            .retain(|_, edge| edge.source != id && edge.target != id);
        self.structure_version += 1;
        self.geometry_version += 1;
        Ok(node)
    }

    pub fn delete_edge(&mut self, id: &str) -> Result<Edge, GraphError> {
        let edge = self
            .edges
            .remove(id)
            .ok_or_else(|| GraphError::EdgeNotFound(id.to_string()))?;
        self.structure_version += 1;
        Ok(edge)
    }

    /// Moves a node by a logical-space delta. Bumps only the geometry
    /// version: positions do not affect topology.
    pub fn translate_node(&mut self, id: &str, dx: f32, dy: f32) -> Result<(), GraphError> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))?;
        node.position.x += dx;
        node.position.y += dy;
        self.geometry_version += 1;
        Ok(())
    }

    /// Shifts a batch of nodes vertically in one geometry bump.
    pub fn shift_nodes_y<'a>(
        &mut self,
        ids: impl IntoIterator<Item = &'a String>,
        dy: f32,
    ) {
        let mut moved = false;
        for id in ids {
            if let Some(node) = self.nodes.get_mut(id.as_str()) {
                node.position.y += dy;
                moved = true;
            }
        }
        if moved {
            self.geometry_version += 1;
        }
    }

    /// Replaces a node's run status, returning the previous one. Statuses
    /// influence neither structure nor geometry, so no version moves.
    pub fn set_status(&mut self, id: &str, status: NodeStatus) -> Result<NodeStatus, GraphError> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))?;
        Ok(std::mem::replace(&mut node.status, status))
    }

    pub fn set_current_iteration(&mut self, id: &str, iteration: u32) -> Result<(), GraphError> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))?;
        node.current_iteration = Some(iteration);
        Ok(())
    }

    /// Resets every node to `Pending` ahead of a fresh run.
    pub fn reset_statuses(&mut self) {
        for node in self.nodes.values_mut() {
            node.status = NodeStatus::Pending;
            if node.kind == NodeType::Loop {
                node.current_iteration = Some(0);
            }
        }
    }

    /// Allocates a fresh node or edge id with the given prefix. Monotonic
    /// within the store, so generated ids are deterministic per session;
    /// ids already taken by seeded data are skipped over.
    pub fn allocate_id(&mut self, prefix: &str) -> String {
        loop {
            self.next_id += 1;
            let id = format!("{}_{}", prefix, self.next_id);
            if !self.nodes.contains_key(&id) && !self.edges.contains_key(&id) {
                return id;
            }
        }
    }
}
