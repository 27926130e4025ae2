//! # Keiro - Workflow Graph State Engine
//!
//! **Keiro** is the state engine behind an interactive node-link workflow
//! diagram editor. It owns the canonical graph of nodes and directed edges,
//! derives BFS hop-levels from the start node for layout and scheduling,
//! culls the render set against a pan/zoom viewport so graphs with thousands
//! of elements stay cheap to draw, splices new nodes into the diagram with
//! topology-aware shifting, and walks the graph with a cooperative,
//! pausable execution engine that simulates per-node work.
//!
//! The rendering layer is deliberately absent: a host UI consumes the
//! read-only render boundary (`visible_nodes`, `visible_edges`, `edge_path`,
//! `edge_label_anchor`) and feeds pointer events back in through the
//! viewport and drag operations.
//!
//! ## Core Workflow
//!
//! 1.  **Load**: build a [`document::Document`] from seed nodes and edges
//!     (or start empty and use `create_node`/`upsert_edge`).
//! 2.  **Edit**: pan/zoom the viewport, drag nodes, insert nodes above or
//!     below an existing one, splice nodes out.
//! 3.  **Render**: pull the visible node/edge sets and edge geometry; both
//!     are memoized against structure, geometry, and viewport versions.
//! 4.  **Run**: hand the shared document to an [`engine::Engine`] and drive
//!     the workflow with `start`/`pause`/`resume`/`stop`/`reset`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use keiro::prelude::*;
//! use keiro::engine::{EngineConfig, FixedCondition};
//! use std::sync::Arc;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let nodes = vec![
//!         Node::new("start", NodeType::Start, "Start", Point::new(450.0, 50.0)),
//!         Node::new("task_1", NodeType::Task, "Prepare data", Point::new(450.0, 170.0)),
//!         Node::new("end", NodeType::End, "End", Point::new(450.0, 290.0)),
//!     ];
//!     let edges = vec![
//!         Edge::new("e1", "start", "task_1"),
//!         Edge::new("e2", "task_1", "end"),
//!     ];
//!
//!     let document = Document::load(nodes, edges).into_shared();
//!
//!     let mut engine = Engine::builder(document.clone())
//!         .config(EngineConfig::fast())
//!         .evaluator(Arc::new(FixedCondition(true)))
//!         .build();
//!
//!     engine.start()?;
//!     engine.wait().await;
//!
//!     assert_eq!(engine.status(), RunStatus::Completed);
//!     for entry in engine.history() {
//!         println!("{} {:?} -> {:?}", entry.node_id, entry.from, entry.to);
//!     }
//!     Ok(())
//! }
//! ```

pub mod culling;
pub mod document;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod persist;
pub mod prelude;
pub mod topology;
pub mod viewport;

/// Logical width of a node, used when a node does not carry its own.
pub const NODE_WIDTH: f32 = 120.0;
/// Logical height of a node, used when a node does not carry its own.
pub const NODE_HEIGHT: f32 = 60.0;
/// Vertical gap between consecutive node rows; insertion shifts by
/// `NODE_HEIGHT + NODE_SPACING`.
pub const NODE_SPACING: f32 = 60.0;
/// Default viewport width in screen pixels.
pub const VIEWPORT_WIDTH: f32 = 1000.0;
/// Default viewport height in screen pixels.
pub const VIEWPORT_HEIGHT: f32 = 600.0;
/// Lower zoom clamp (50%).
pub const MIN_ZOOM: f32 = 0.5;
/// Upper zoom clamp (200%).
pub const MAX_ZOOM: f32 = 2.0;
/// Zoom change applied per wheel/step unit.
pub const ZOOM_STEP: f32 = 0.1;
