use crate::engine::RunStatus;
use thiserror::Error;

/// Errors raised by graph store lookups and structural mutation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Node '{0}' does not exist in the graph")]
    NodeNotFound(String),

    #[error("Edge '{0}' does not exist in the graph")]
    EdgeNotFound(String),

    #[error("Node '{0}' is not reachable from the start node and has no topology level")]
    NodeUnrouted(String),

    #[error("The graph has no start node")]
    MissingStart,
}

/// Errors raised when a workflow control action is invoked from a state
/// that does not allow it. The action is rejected and state is unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Workflow can only be started while idle or paused, but it is {0}")]
    StartUnavailable(RunStatus),

    #[error("Workflow can only be paused while running, but it is {0}")]
    PauseUnavailable(RunStatus),

    #[error("Workflow can only be resumed while paused, but it is {0}")]
    ResumeUnavailable(RunStatus),

    #[error("Workflow can only be stopped while running or paused, but it is {0}")]
    StopUnavailable(RunStatus),

    #[error("Workflow is already idle, nothing to reset")]
    ResetUnavailable,
}

/// Failure of a single node's simulated unit of work. Surfaces to callers
/// through the engine's `Failed` status and the history trail.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StepError {
    #[error("Simulated work for node '{node_id}' failed")]
    WorkFailed { node_id: String },
}

/// Errors raised when submitting a workflow snapshot to the save endpoint.
#[derive(Error, Debug, Clone)]
pub enum SaveError {
    #[error("Save request failed: {message}")]
    Transport { message: String },

    #[error("Save rejected with HTTP status {code}: {message}")]
    Status { code: u16, message: String },

    #[error("Failed to decode save response: {message}")]
    Decode { message: String },
}
