//! The cooperative execution engine.
//!
//! A single driver task advances one "current node" token through the
//! graph: it selects the Pending node with the lowest topology level,
//! dispatches type-specific behavior, records every status change in an
//! append-only history trail, and sleeps between steps so transitions stay
//! externally observable. `pause`/`stop`/`reset` are checked between
//! scheduled continuations, never by aborting a step already in flight.

use crate::document::{Document, SharedDocument};
use crate::error::{StepError, TransitionError};
use crate::graph::{NodeStatus, NodeType};
use parking_lot::Mutex;
use rand::Rng;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

mod condition;

pub use condition::{ConditionEvaluator, FixedCondition, RandomCondition};

/// Interval at which a paused driver re-checks for resumption.
const PAUSE_POLL: Duration = Duration::from_millis(25);

/// Overall state of a workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Idle,
    Running,
    Paused,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Idle => "idle",
            RunStatus::Running => "running",
            RunStatus::Paused => "paused",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }

    pub fn can_start(self) -> bool {
        matches!(self, RunStatus::Idle | RunStatus::Paused)
    }

    pub fn can_pause(self) -> bool {
        self == RunStatus::Running
    }

    pub fn can_resume(self) -> bool {
        self == RunStatus::Paused
    }

    pub fn can_stop(self) -> bool {
        matches!(self, RunStatus::Running | RunStatus::Paused)
    }

    pub fn can_reset(self) -> bool {
        self != RunStatus::Idle
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded node status change.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub node_id: String,
    pub from: NodeStatus,
    pub to: NodeStatus,
    pub at: Instant,
}

/// Per-run state shared between the engine handle and its driver task.
#[derive(Debug, Clone)]
pub struct RunState {
    pub status: RunStatus,
    pub current_node_id: Option<String>,
    pub history: Vec<HistoryEntry>,
    pub started_at: Option<Instant>,
    pub finished_at: Option<Instant>,
    /// Bumped on every `start()`; drivers from superseded runs exit at
    /// their next checkpoint.
    run_id: u64,
}

impl Default for RunState {
    fn default() -> Self {
        Self {
            status: RunStatus::Idle,
            current_node_id: None,
            history: Vec::new(),
            started_at: None,
            finished_at: None,
            run_id: 0,
        }
    }
}

/// Whether branch decisions restrict traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoutingPolicy {
    /// Evaluate and log the decision, but leave scheduling untouched (the
    /// original editor's behavior).
    #[default]
    Decorative,
    /// Mark the targets of the untaken outgoing edges as Skipped. Edge
    /// order is id order: a true decision takes the first edge, false the
    /// second.
    Strict,
}

/// Tunable simulation parameters.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Bounds of the uniformly random simulated work duration.
    pub work_min: Duration,
    pub work_max: Duration,
    /// Chance in `[0.0, 1.0]` that a simulated unit of work fails.
    pub failure_probability: f64,
    /// Delay inserted after each completed step.
    pub step_delay: Duration,
    pub routing: RoutingPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            work_min: Duration::from_millis(1000),
            work_max: Duration::from_millis(3000),
            failure_probability: 0.1,
            step_delay: Duration::from_millis(500),
            routing: RoutingPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Millisecond-scale timings with failures disabled; for tests and
    /// demos where wall-clock time matters.
    pub fn fast() -> Self {
        Self {
            work_min: Duration::from_millis(1),
            work_max: Duration::from_millis(2),
            failure_probability: 0.0,
            step_delay: Duration::from_millis(1),
            routing: RoutingPolicy::default(),
        }
    }
}

/// Builds an [`Engine`] with optional config and evaluator overrides.
pub struct EngineBuilder {
    document: SharedDocument,
    config: EngineConfig,
    evaluator: Arc<dyn ConditionEvaluator>,
}

impl EngineBuilder {
    pub fn new(document: SharedDocument) -> Self {
        Self {
            document,
            config: EngineConfig::default(),
            evaluator: Arc::new(RandomCondition::default()),
        }
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn evaluator(mut self, evaluator: Arc<dyn ConditionEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn build(self) -> Engine {
        Engine {
            document: self.document,
            run: Arc::new(Mutex::new(RunState::default())),
            config: self.config,
            evaluator: self.evaluator,
            driver: None,
        }
    }
}

/// Drives a workflow run over a shared document.
pub struct Engine {
    document: SharedDocument,
    run: Arc<Mutex<RunState>>,
    config: EngineConfig,
    evaluator: Arc<dyn ConditionEvaluator>,
    driver: Option<JoinHandle<()>>,
}

impl Engine {
    pub fn builder(document: SharedDocument) -> EngineBuilder {
        EngineBuilder::new(document)
    }

    pub fn new(document: SharedDocument) -> Self {
        EngineBuilder::new(document).build()
    }

    pub fn status(&self) -> RunStatus {
        self.run.lock().status
    }

    pub fn current_node(&self) -> Option<String> {
        self.run.lock().current_node_id.clone()
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.run.lock().history.clone()
    }

    pub fn run_state(&self) -> RunState {
        self.run.lock().clone()
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.run.lock().started_at
    }

    pub fn finished_at(&self) -> Option<Instant> {
        self.run.lock().finished_at
    }

    /// Wall-clock time of the run so far, or of the whole run once
    /// finished.
    pub fn elapsed(&self) -> Option<Duration> {
        let run = self.run.lock();
        let started = run.started_at?;
        Some(match run.finished_at {
            Some(finished) => finished.duration_since(started),
            None => started.elapsed(),
        })
    }

    /// Percentage of task and end nodes that have completed.
    pub fn progress(&self) -> f32 {
        let doc = self.document.lock();
        let mut total = 0usize;
        let mut completed = 0usize;
        for node in doc.store().nodes() {
            if matches!(node.kind, NodeType::Task | NodeType::End) {
                total += 1;
                if node.status == NodeStatus::Completed {
                    completed += 1;
                }
            }
        }
        if total == 0 {
            0.0
        } else {
            completed as f32 / total as f32 * 100.0
        }
    }

    /// Begins a fresh run: every node back to Pending, history cleared,
    /// start time stamped, driver task spawned. Legal from Idle or Paused.
    pub fn start(&mut self) -> Result<(), TransitionError> {
        let run_id = {
            let mut doc = self.document.lock();
            let mut run = self.run.lock();
            if !run.status.can_start() {
                warn!(status = run.status.as_str(), "workflow cannot start");
                return Err(TransitionError::StartUnavailable(run.status));
            }
            doc.store_mut().reset_statuses();
            run.history.clear();
            run.current_node_id = None;
            run.started_at = Some(Instant::now());
            run.finished_at = None;
            run.status = RunStatus::Running;
            run.run_id += 1;
            info!("workflow started");
            run.run_id
        };
        self.spawn_driver(run_id);
        Ok(())
    }

    /// Halts scheduling of new steps. A step already in flight completes
    /// normally; the driver then parks until resume/stop/reset.
    pub fn pause(&mut self) -> Result<(), TransitionError> {
        let mut run = self.run.lock();
        if !run.status.can_pause() {
            warn!(status = run.status.as_str(), "workflow cannot pause");
            return Err(TransitionError::PauseUnavailable(run.status));
        }
        run.status = RunStatus::Paused;
        info!("workflow paused");
        Ok(())
    }

    /// Re-enters the step loop from a paused state.
    pub fn resume(&mut self) -> Result<(), TransitionError> {
        let run_id = {
            let mut run = self.run.lock();
            if !run.status.can_resume() {
                warn!(status = run.status.as_str(), "workflow cannot resume");
                return Err(TransitionError::ResumeUnavailable(run.status));
            }
            run.status = RunStatus::Running;
            info!("workflow resumed");
            run.run_id
        };
        // A parked driver picks the change up by itself; a finished one
        // (the no-progress stall case) needs a fresh task.
        if self.driver.as_ref().is_none_or(|h| h.is_finished()) {
            self.spawn_driver(run_id);
        }
        Ok(())
    }

    /// Abandons the run: the in-flight node (if any) is marked Failed, the
    /// end time is stamped, and the engine returns to Idle.
    pub fn stop(&mut self) -> Result<(), TransitionError> {
        let mut doc = self.document.lock();
        let mut run = self.run.lock();
        if !run.status.can_stop() {
            warn!(status = run.status.as_str(), "workflow cannot stop");
            return Err(TransitionError::StopUnavailable(run.status));
        }
        if let Some(id) = run.current_node_id.take() {
            record(&mut doc, &mut run, &id, NodeStatus::Failed);
        }
        run.status = RunStatus::Idle;
        run.finished_at = Some(Instant::now());
        info!("workflow stopped");
        Ok(())
    }

    /// Clears all run state and node statuses. Rejected when already Idle.
    pub fn reset(&mut self) -> Result<(), TransitionError> {
        let mut doc = self.document.lock();
        let mut run = self.run.lock();
        if !run.status.can_reset() {
            warn!("workflow is already idle");
            return Err(TransitionError::ResetUnavailable);
        }
        doc.store_mut().reset_statuses();
        run.status = RunStatus::Idle;
        run.current_node_id = None;
        run.history.clear();
        run.started_at = None;
        run.finished_at = None;
        info!("workflow reset");
        Ok(())
    }

    /// Waits for the driver task to exit (completion, failure, stop, or
    /// reset). Does not return while the driver is parked on pause.
    pub async fn wait(&mut self) {
        if let Some(handle) = self.driver.take() {
            let _ = handle.await;
        }
    }

    fn spawn_driver(&mut self, run_id: u64) {
        let document = self.document.clone();
        let run = self.run.clone();
        let config = self.config.clone();
        let evaluator = self.evaluator.clone();
        self.driver = Some(tokio::spawn(drive(document, run, config, evaluator, run_id)));
    }
}

/// Everything a step needs outside the locks, captured at selection time.
struct WorkPlan {
    kind: NodeType,
    label: String,
    condition: Option<String>,
    timer_delay: Option<Duration>,
    incident_edges: usize,
    subprocess_id: Option<String>,
    loop_state: Option<(u32, u32)>,
}

enum Tick {
    Exit,
    Park,
    Step(String, WorkPlan),
}

async fn drive(
    document: SharedDocument,
    run: Arc<Mutex<RunState>>,
    config: EngineConfig,
    evaluator: Arc<dyn ConditionEvaluator>,
    my_run: u64,
) {
    loop {
        let tick = checkpoint(&document, &run, my_run);
        match tick {
            Tick::Exit => break,
            Tick::Park => sleep(PAUSE_POLL).await,
            Tick::Step(node_id, plan) => {
                let outcome = perform(&node_id, &plan, &config, evaluator.as_ref()).await;
                let terminal = {
                    let mut doc = document.lock();
                    let mut rs = run.lock();
                    apply_outcome(&mut doc, &mut rs, &node_id, &plan, outcome, &config, my_run)
                };
                if terminal {
                    break;
                }
                sleep(config.step_delay).await;
            }
        }
    }
}

/// Selects the next step under the locks, or decides to park or exit.
fn checkpoint(document: &SharedDocument, run: &Arc<Mutex<RunState>>, my_run: u64) -> Tick {
    let mut doc = document.lock();
    let mut rs = run.lock();
    if rs.run_id != my_run {
        return Tick::Exit;
    }
    match rs.status {
        RunStatus::Paused => Tick::Park,
        RunStatus::Running => match doc.next_pending() {
            None => {
                finish_if_complete(&mut doc, &mut rs);
                Tick::Exit
            }
            Some(node_id) => {
                let Some(node) = doc.store().node(&node_id) else {
                    return Tick::Exit;
                };
                let plan = WorkPlan {
                    kind: node.kind,
                    label: node.label.clone(),
                    condition: node.kind.is_conditional().then(|| {
                        node.condition
                            .clone()
                            .unwrap_or_else(|| "random() > 0.5".to_string())
                    }),
                    timer_delay: (node.kind == NodeType::Timer)
                        .then(|| Duration::from_millis(node.delay_ms.unwrap_or(3000))),
                    incident_edges: match node.kind {
                        NodeType::Merge => doc
                            .store()
                            .edges()
                            .filter(|e| e.target == node_id)
                            .count(),
                        NodeType::Parallel => doc
                            .store()
                            .edges()
                            .filter(|e| e.source == node_id)
                            .count(),
                        _ => 0,
                    },
                    subprocess_id: (node.kind == NodeType::Subprocess).then(|| {
                        node.subprocess_id
                            .clone()
                            .unwrap_or_else(|| "default".to_string())
                    }),
                    loop_state: (node.kind == NodeType::Loop).then(|| {
                        (
                            node.current_iteration.unwrap_or(0),
                            node.loop_count.unwrap_or(5),
                        )
                    }),
                };
                info!(node = %node_id, label = %plan.label, kind = plan.kind.as_str(), "executing node");
                record(&mut doc, &mut rs, &node_id, NodeStatus::Running);
                rs.current_node_id = Some(node_id.clone());
                Tick::Step(node_id, plan)
            }
        },
        _ => Tick::Exit,
    }
}

/// Runs the simulated unit of work for one node, outside the locks.
/// Returns the branch decision (if the node is conditional) on success.
async fn perform(
    node_id: &str,
    plan: &WorkPlan,
    config: &EngineConfig,
    evaluator: &dyn ConditionEvaluator,
) -> Result<Option<bool>, StepError> {
    let mut decision = None;
    if let Some(expression) = &plan.condition {
        let taken = evaluator.evaluate(expression);
        info!(node = node_id, expression = %expression, result = taken, "condition evaluated");
        decision = Some(taken);
    }

    match plan.kind {
        NodeType::Timer => {
            // Timers just wait out their configured delay; no failure roll.
            let delay = plan.timer_delay.unwrap_or_default();
            debug!(node = node_id, delay_ms = delay.as_millis() as u64, "timer waiting");
            sleep(delay).await;
            Ok(decision)
        }
        kind => {
            match kind {
                NodeType::Merge => {
                    debug!(node = node_id, inputs = plan.incident_edges, "merging inputs")
                }
                NodeType::Parallel => {
                    debug!(node = node_id, branches = plan.incident_edges, "fanning out branches")
                }
                NodeType::Subprocess => {
                    if let Some(subprocess) = &plan.subprocess_id {
                        debug!(node = node_id, subprocess = %subprocess, "invoking subprocess");
                    }
                }
                _ => {}
            }
            let (duration, fails) = {
                let mut rng = rand::rng();
                let min = config.work_min.as_millis() as u64;
                let max = config.work_max.as_millis() as u64;
                let duration = Duration::from_millis(rng.random_range(min..=max.max(min)));
                (duration, rng.random_bool(config.failure_probability))
            };
            sleep(duration).await;
            if fails {
                Err(StepError::WorkFailed {
                    node_id: node_id.to_string(),
                })
            } else {
                Ok(decision)
            }
        }
    }
}

/// Applies a finished step under the locks. Returns `true` when the driver
/// should exit.
fn apply_outcome(
    doc: &mut Document,
    rs: &mut RunState,
    node_id: &str,
    plan: &WorkPlan,
    outcome: Result<Option<bool>, StepError>,
    config: &EngineConfig,
    my_run: u64,
) -> bool {
    // Stop or a newer run already disposed of this step.
    if rs.run_id != my_run || rs.current_node_id.as_deref() != Some(node_id) {
        return true;
    }

    match outcome {
        Err(err) => {
            error!(node = node_id, %err, "node execution failed");
            record(doc, rs, node_id, NodeStatus::Failed);
            rs.current_node_id = None;
            rs.status = RunStatus::Failed;
            rs.finished_at = Some(Instant::now());
            true
        }
        Ok(decision) => {
            if let Some((current, count)) = plan.loop_state {
                let iteration = current + 1;
                let _ = doc.store_mut().set_current_iteration(node_id, iteration);
                if iteration < count {
                    debug!(node = node_id, iteration, count, "loop re-entering");
                    record(doc, rs, node_id, NodeStatus::Pending);
                    rs.current_node_id = None;
                    return false;
                }
                debug!(node = node_id, count, "loop finished");
            }

            record(doc, rs, node_id, NodeStatus::Completed);
            rs.current_node_id = None;

            if config.routing == RoutingPolicy::Strict && plan.kind.is_conditional() {
                if let Some(taken) = decision {
                    skip_untaken(doc, rs, node_id, taken);
                }
            }

            if plan.kind == NodeType::End {
                rs.status = RunStatus::Completed;
                rs.finished_at = Some(Instant::now());
                info!("workflow completed");
                return true;
            }
            false
        }
    }
}

/// Strict routing: marks the still-Pending targets of the untaken outgoing
/// edges as Skipped.
fn skip_untaken(doc: &mut Document, rs: &mut RunState, node_id: &str, taken: bool) {
    let mut outgoing: Vec<(String, String)> = doc
        .store()
        .edges()
        .filter(|e| e.source == node_id)
        .map(|e| (e.id.clone(), e.target.clone()))
        .collect();
    outgoing.sort();
    if outgoing.len() < 2 {
        return;
    }
    let chosen = if taken { 0 } else { 1 };
    let to_skip: Vec<String> = outgoing
        .iter()
        .enumerate()
        .filter(|(index, _)| *index != chosen)
        .map(|(_, (_, target))| target.clone())
        .collect();
    for target in to_skip {
        let pending = doc
            .store()
            .node(&target)
            .is_some_and(|n| n.status == NodeStatus::Pending);
        if pending {
            info!(node = %target, branch = node_id, "skipping untaken branch target");
            record(doc, rs, &target, NodeStatus::Skipped);
        }
    }
}

/// With nothing left to schedule, completes the run if every task node is
/// done; otherwise leaves it running for the caller to resolve.
fn finish_if_complete(doc: &mut Document, rs: &mut RunState) {
    let all_tasks_done = doc
        .store()
        .nodes()
        .filter(|n| n.kind == NodeType::Task)
        .all(|n| matches!(n.status, NodeStatus::Completed | NodeStatus::Skipped));
    if !all_tasks_done {
        warn!("no pending nodes remain but tasks are incomplete");
        return;
    }
    let end_ids: Vec<String> = doc
        .store()
        .nodes()
        .filter(|n| n.kind == NodeType::End && n.status != NodeStatus::Completed)
        .map(|n| n.id.clone())
        .collect();
    for id in end_ids {
        record(doc, rs, &id, NodeStatus::Completed);
    }
    rs.status = RunStatus::Completed;
    rs.finished_at = Some(Instant::now());
    info!("workflow completed");
}

/// Writes a status change to the store and the history trail.
fn record(doc: &mut Document, rs: &mut RunState, node_id: &str, to: NodeStatus) {
    if let Ok(from) = doc.store_mut().set_status(node_id, to) {
        debug!(node = node_id, from = from.as_str(), to = to.as_str(), "node status changed");
        rs.history.push(HistoryEntry {
            node_id: node_id.to_string(),
            from,
            to,
            at: Instant::now(),
        });
    }
}
