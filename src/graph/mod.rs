//! The canonical workflow graph model: nodes, directed edges, and the
//! run-status/type enums carried on them.
//!
//! Wire names are camelCase and lowercase to match the editor's save
//! payload, so a snapshot round-trips unchanged through `serde_json`.

use crate::{NODE_HEIGHT, NODE_WIDTH};
use serde::{Deserialize, Serialize};

mod store;

pub use store::GraphStore;

/// A point in logical (world) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// The behavioral variant of a workflow node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Start,
    End,
    Task,
    Branch,
    Loop,
    Parallel,
    Merge,
    Timer,
    Condition,
    Subprocess,
}

impl NodeType {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Start => "start",
            NodeType::End => "end",
            NodeType::Task => "task",
            NodeType::Branch => "branch",
            NodeType::Loop => "loop",
            NodeType::Parallel => "parallel",
            NodeType::Merge => "merge",
            NodeType::Timer => "timer",
            NodeType::Condition => "condition",
            NodeType::Subprocess => "subprocess",
        }
    }

    /// Whether this type evaluates a condition expression when executed.
    pub fn is_conditional(self) -> bool {
        matches!(self, NodeType::Branch | NodeType::Condition)
    }
}

/// Per-node run status, advanced by the execution engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
    Skipped,
}

impl NodeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeStatus::Pending => "pending",
            NodeStatus::Running => "running",
            NodeStatus::Completed => "completed",
            NodeStatus::Failed => "failed",
            NodeStatus::Skipped => "skipped",
        }
    }
}

/// A workflow step: identity, display label, logical placement, run status,
/// and the optional type-specific fields (loop bookkeeping, timer delay,
/// condition expression, subprocess reference).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeType,
    pub label: String,
    pub position: Point,
    #[serde(default = "default_node_width")]
    pub width: f32,
    #[serde(default = "default_node_height")]
    pub height: f32,
    #[serde(default)]
    pub status: NodeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loop_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_iteration: Option<u32>,
    /// Timer suspension in milliseconds.
    #[serde(rename = "delay", skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subprocess_id: Option<String>,
}

fn default_node_width() -> f32 {
    NODE_WIDTH
}

fn default_node_height() -> f32 {
    NODE_HEIGHT
}

impl Node {
    pub fn new(
        id: impl Into<String>,
        kind: NodeType,
        label: impl Into<String>,
        position: Point,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            label: label.into(),
            position,
            width: NODE_WIDTH,
            height: NODE_HEIGHT,
            status: NodeStatus::Pending,
            loop_count: None,
            current_iteration: None,
            delay_ms: None,
            condition: None,
            subprocess_id: None,
        }
    }

    /// Shorthand for the most common node kind.
    pub fn task(id: impl Into<String>, label: impl Into<String>, position: Point) -> Self {
        Self::new(id, NodeType::Task, label, position)
    }

    /// Seeds the type-specific defaults a freshly created node of this kind
    /// carries in the editor.
    pub fn with_type_defaults(mut self) -> Self {
        match self.kind {
            NodeType::Branch | NodeType::Condition => {
                self.condition = Some("random() > 0.5".to_string());
            }
            NodeType::Loop => {
                self.loop_count = Some(5);
                self.current_iteration = Some(0);
            }
            NodeType::Timer => {
                self.delay_ms = Some(3000);
            }
            NodeType::Subprocess => {
                self.subprocess_id = Some("default".to_string());
            }
            _ => {}
        }
        self
    }
}

/// A directed connection between two node ids. Endpoints are not required
/// to resolve at storage time; dangling references are filtered at read
/// time. Self-loops (`source == target`) are allowed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Edge {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}
