//! The persistence boundary: the save payload shape and its submission to
//! a configurable HTTP endpoint.
//!
//! There is no inbound load operation here; seeding goes through
//! [`Document::load`](crate::document::Document::load) with static or
//! generated initial data.

use crate::error::SaveError;
use crate::graph::{Edge, Node, Point};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// The wire form of a saved workflow:
/// `{nodes, edges, viewportOffset, zoomLevel}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSnapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub viewport_offset: Point,
    pub zoom_level: f32,
}

/// Submits a snapshot to the save endpoint as a JSON POST. Returns the
/// decoded response body on success; the caller owns any retry policy.
pub async fn save(
    snapshot: &WorkflowSnapshot,
    endpoint: &str,
) -> Result<serde_json::Value, SaveError> {
    debug!(
        endpoint,
        nodes = snapshot.nodes.len(),
        edges = snapshot.edges.len(),
        "saving workflow"
    );

    let response = reqwest::Client::new()
        .post(endpoint)
        .json(snapshot)
        .send()
        .await
        .map_err(|err| SaveError::Transport {
            message: err.to_string(),
        })?;

    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_else(|_| "<no body>".to_string());
        return Err(SaveError::Status {
            code: status.as_u16(),
            message,
        });
    }

    let body = response
        .json::<serde_json::Value>()
        .await
        .map_err(|err| SaveError::Decode {
            message: err.to_string(),
        })?;
    info!(endpoint, "workflow saved");
    Ok(body)
}
