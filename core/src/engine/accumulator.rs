//! Conflict-resolving task accumulator for one evaluation round.
//!
//! Collects every open/close request produced during a round, resolves
//! per-extension conflicts, and issues the minimal set of host calls.
//!
//! The collecting → executing → done lifecycle is encoded in ownership:
//! [`TaskAccumulator::execute`] consumes the accumulator, so no task can
//! be appended once execution starts, and a new round always constructs
//! a fresh instance. Rounds therefore never share mutable state.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::host::{ExtensionHost, HostError};

use super::resolver::Priority;

/// Direction of a state-change request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Enable the targets
    Open,
    /// Disable the targets
    Close,
}

/// A pending enable/disable request produced by one rule during one
/// round. Tasks do not persist past the round.
#[derive(Debug, Clone)]
pub struct ExecuteTask {
    pub kind: TaskKind,
    pub targets: BTreeSet<String>,
    pub reload: bool,
    pub priority: Priority,
    /// Append order within the round; the last write wins full ties.
    pub seq: u64,
}

/// One resolved state change, before diffing against host state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedChange {
    pub extension_id: String,
    pub kind: TaskKind,
    pub reload: bool,
}

/// Summary of one executed round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundOutcome {
    /// Extensions whose state was changed, with the direction applied
    pub applied: Vec<(String, TaskKind)>,
    /// Extensions whose host call failed
    pub failed: Vec<String>,
    /// Whether the active document was reloaded
    pub reloaded: bool,
}

/// Accumulates task requests for one round and executes them once.
#[derive(Debug)]
pub struct TaskAccumulator {
    controller_id: String,
    tasks: Vec<ExecuteTask>,
    next_seq: u64,
}

impl TaskAccumulator {
    pub fn new(controller_id: impl Into<String>) -> Self {
        Self {
            controller_id: controller_id.into(),
            tasks: Vec::new(),
            next_seq: 0,
        }
    }

    /// Append an open (enable) request.
    pub fn open(&mut self, targets: BTreeSet<String>, reload: bool, priority: Priority) {
        self.push(TaskKind::Open, targets, reload, priority);
    }

    /// Append a close (disable) request.
    pub fn close(&mut self, targets: BTreeSet<String>, reload: bool, priority: Priority) {
        self.push(TaskKind::Close, targets, reload, priority);
    }

    /// Append a request. The controller id is stripped from the targets;
    /// a request left with no targets is dropped.
    pub fn push(
        &mut self,
        kind: TaskKind,
        mut targets: BTreeSet<String>,
        reload: bool,
        priority: Priority,
    ) {
        targets.remove(&self.controller_id);
        if targets.is_empty() {
            return;
        }

        self.tasks.push(ExecuteTask {
            kind,
            targets,
            reload,
            priority,
            seq: self.next_seq,
        });
        self.next_seq += 1;
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Resolve conflicts into one winning change per extension id.
    ///
    /// The task with the highest `(level, !is_fallback)` key wins; on a
    /// full tie the task appended last prevails. Because rules feed the
    /// accumulator in ascending-priority order, among equal-priority
    /// rules the one evaluated later decides the outcome — a documented
    /// policy, not an accident.
    pub fn resolve(&self) -> Vec<PlannedChange> {
        let mut winners: HashMap<&str, &ExecuteTask> = HashMap::new();

        for task in &self.tasks {
            for id in &task.targets {
                // Iteration is in seq order, so >= implements
                // last-write-wins on equal strength.
                let replace = match winners.get(id.as_str()) {
                    Some(current) => task.priority.strength() >= current.priority.strength(),
                    None => true,
                };
                if replace {
                    winners.insert(id.as_str(), task);
                }
            }
        }

        let mut plan: Vec<PlannedChange> = winners
            .into_iter()
            .map(|(id, task)| PlannedChange {
                extension_id: id.to_string(),
                kind: task.kind,
                reload: task.reload,
            })
            .collect();
        // Deterministic host-call order
        plan.sort_by(|a, b| a.extension_id.cmp(&b.extension_id));
        plan
    }

    /// Execute the resolved plan against the host, consuming the round.
    ///
    /// Issues at most one state change per extension id, skipping ids
    /// already in the desired state and ids the host does not report as
    /// installed. A failed call is logged and does not block the rest
    /// of the batch. At most one document reload is requested, and only
    /// when an applied winning task asked for it.
    pub async fn execute<H: ExtensionHost>(self, host: &H) -> Result<RoundOutcome, HostError> {
        let plan = self.resolve();
        let mut outcome = RoundOutcome::default();
        if plan.is_empty() {
            return Ok(outcome);
        }

        let installed = host.list_extensions().await?;
        let enabled_by_id: HashMap<&str, bool> = installed
            .iter()
            .map(|ext| (ext.id.as_str(), ext.enabled))
            .collect();

        let mut want_reload = false;
        for change in plan {
            let desired = matches!(change.kind, TaskKind::Open);
            match enabled_by_id.get(change.extension_id.as_str()) {
                None => {
                    debug!(extension_id = %change.extension_id, "target not installed, skipping");
                    continue;
                }
                Some(current) if *current == desired => continue,
                Some(_) => {}
            }

            match host.set_enabled(&change.extension_id, desired).await {
                Ok(()) => {
                    if change.reload {
                        want_reload = true;
                    }
                    outcome.applied.push((change.extension_id, change.kind));
                }
                Err(e) => {
                    warn!(extension_id = %change.extension_id, error = %e, "state change failed");
                    outcome.failed.push(change.extension_id);
                }
            }
        }

        if want_reload {
            match host.reload_active_document().await {
                Ok(()) => outcome.reloaded = true,
                Err(e) => warn!(error = %e, "document reload failed"),
            }
        }

        Ok(outcome)
    }
}
