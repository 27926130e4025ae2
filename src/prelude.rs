//! Prelude module for convenient imports
//!
//! Re-exports the types most hosts need: the document facade, the graph
//! model, the execution engine, and the error families.
//!
//! # Example
//!
//! ```rust,no_run
//! use keiro::prelude::*;
//!
//! let document = Document::load(Vec::new(), Vec::new());
//! assert!(document.store().start_node().is_none());
//! ```

// Document facade and structural mutation
pub use crate::document::{Document, EdgePath, InsertDirection, SharedDocument};

// Graph model
pub use crate::graph::{Edge, GraphStore, Node, NodeStatus, NodeType, Point};

// Topology and culling
pub use crate::culling::VisibleSet;
pub use crate::topology::TopologyIndex;
pub use crate::viewport::Viewport;

// Execution engine
pub use crate::engine::{Engine, HistoryEntry, RunStatus};

// Persistence boundary
pub use crate::persist::WorkflowSnapshot;

// Error types
pub use crate::error::{GraphError, SaveError, StepError, TransitionError};
