//! Data model shared by the registry, queue, dispatcher, and facade.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::util::{ResourceId, TaskId, WorkerId};

/// Default number of workers created by `initialize_pool` when no size is given.
pub const DEFAULT_POOL_SIZE: usize = 4;
/// Hard cap on live workers.
pub const MAX_POOL_SIZE: usize = 16;
/// Hard cap on pending tasks held in the queue.
pub const MAX_QUEUE_DEPTH: usize = 100;
/// Maximum number of assignment attempts (across failovers) for a task.
pub const MAX_ATTEMPTS: u32 = 3;

/// Closed set of task types the pool accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Discovery/catalog lookup against the external discovery service.
    Discovery,
    /// Migration work against the external discovery/migration service.
    Migration,
    /// Liveness/keepalive probe.
    Heartbeat,
    /// Document/data ingestion.
    Ingest,
    /// Research/analysis task.
    Research,
    /// Anything not covered by the above.
    General,
}

impl TaskType {
    /// Parse a task type from its wire name, rejecting anything outside the
    /// closed set (`InvalidTaskType`, see `core::error::SchedulerError`).
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "discovery" => Some(Self::Discovery),
            "migration" => Some(Self::Migration),
            "heartbeat" => Some(Self::Heartbeat),
            "ingest" => Some(Self::Ingest),
            "research" => Some(Self::Research),
            "general" => Some(Self::General),
            _ => None,
        }
    }

    /// A gated task type's admission depends on the discovery dependency's
    /// health; all other types are admitted regardless.
    #[must_use]
    pub fn is_gated(self) -> bool {
        matches!(self, Self::Discovery | Self::Migration)
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Discovery => "discovery",
            Self::Migration => "migration",
            Self::Heartbeat => "heartbeat",
            Self::Ingest => "ingest",
            Self::Research => "research",
            Self::General => "general",
        };
        write!(f, "{s}")
    }
}

/// Lifecycle state of a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    /// No task assigned; eligible for dispatch.
    Idle,
    /// Holding a task that is being analyzed (pre-execution) by the runtime.
    Analyzing,
    /// Holding a task that is actively executing.
    Executing,
    /// Retired from dispatch after repeated faults; not destroyed, just excluded.
    Degraded,
}

/// Running mean of completed task duration for one task type, used by the
/// dispatcher's affinity policy.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TaskTypeHistory {
    /// Cumulative simple mean of completion durations, in milliseconds.
    pub mean_duration_ms: f64,
    /// Number of completions this mean is based on.
    pub completions: u64,
}

impl TaskTypeHistory {
    /// Fold in one more completed duration using a simple cumulative mean:
    /// `mean' = (mean * n + x) / (n + 1)`. Deterministic given the same
    /// input sequence.
    pub fn record_completion(&mut self, duration: Duration) {
        let x = duration.as_secs_f64() * 1000.0;
        let n = self.completions as f64;
        self.mean_duration_ms = (self.mean_duration_ms * n + x) / (n + 1.0);
        self.completions += 1;
    }
}

/// A long-lived executor with its own isolation fingerprint.
#[derive(Debug, Clone)]
pub struct Worker {
    /// Unique opaque identifier.
    pub id: WorkerId,
    /// Current lifecycle state.
    pub state: WorkerState,
    /// First of the isolation fingerprint's three identifiers.
    pub context_id: ResourceId,
    /// Second of the isolation fingerprint's three identifiers.
    pub tool_session_id: ResourceId,
    /// Third of the isolation fingerprint's three identifiers.
    pub memory_handle_id: ResourceId,
    /// Task currently held, if any. Empty iff `state` is `Idle` or `Degraded`.
    pub current_task_id: Option<TaskId>,
    /// Per-task-type running history, used for affinity routing.
    pub history: HashMap<TaskType, TaskTypeHistory>,
    /// Cumulative active (busy) time across all task types this worker has
    /// completed, in milliseconds. Used only as the affinity policy's
    /// tie-break between two workers with an equal mean duration.
    pub total_active_ms: u64,
    /// When this worker was spawned.
    pub created_at: Instant,
    /// When `state` last changed.
    pub last_state_change_at: Instant,
}

impl Worker {
    pub(crate) fn new(
        id: WorkerId,
        context_id: ResourceId,
        tool_session_id: ResourceId,
        memory_handle_id: ResourceId,
        now: Instant,
    ) -> Self {
        Self {
            id,
            state: WorkerState::Idle,
            context_id,
            tool_session_id,
            memory_handle_id,
            current_task_id: None,
            history: HashMap::new(),
            total_active_ms: 0,
            created_at: now,
            last_state_change_at: now,
        }
    }

    /// True if this worker is eligible to receive a new task.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.state == WorkerState::Idle && self.current_task_id.is_none()
    }

    /// Fold a just-completed task's duration into this worker's cumulative
    /// active time.
    pub(crate) fn record_active_time(&mut self, duration: Duration) {
        self.total_active_ms = self.total_active_ms.saturating_add(duration.as_millis() as u64);
    }
}

/// Terminal/non-terminal status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Admitted but not yet assigned to a worker.
    Pending,
    /// Assigned to a worker and (from the caller's perspective) executing.
    InProgress,
    /// Terminated successfully.
    Completed,
    /// Terminated by exhausting `MAX_ATTEMPTS` or being dropped at admission.
    Failed,
    /// Cancelled by `shutdown_pool`.
    Cancelled,
}

impl TaskStatus {
    /// True for any status a task cannot leave once reached.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// A unit of work admitted into the pool.
#[derive(Debug, Clone)]
pub struct Task {
    /// Unique opaque identifier.
    pub id: TaskId,
    /// Closed-set task type, used for gating and affinity.
    pub task_type: TaskType,
    /// Opaque payload handed to the worker runtime; the core never inspects it.
    pub payload: serde_json::Value,
    /// Optional dispatch hint naming a specific worker.
    pub preferred_worker_id: Option<WorkerId>,
    /// Current lifecycle status.
    pub status: TaskStatus,
    /// Worker holding (or that last held) this task.
    pub assigned_worker_id: Option<WorkerId>,
    /// Count of assignment attempts made so far.
    pub attempts: u32,
    /// Workers this task has already failed on; strictly growing.
    pub excluded_workers: HashSet<WorkerId>,
    /// Set for gated types while the discovery dependency is unavailable.
    pub admission_gated: bool,
    /// When this task was admitted.
    pub submitted_at: Instant,
    /// When this task was first successfully assigned, if ever.
    pub assigned_at: Option<Instant>,
    /// When this task reached a terminal state, if ever.
    pub completed_at: Option<Instant>,
    /// Duration from `submitted_at` to `assigned_at` for the first
    /// successful assignment only.
    pub assignment_latency: Option<Duration>,
}

impl Task {
    pub(crate) fn new(
        id: TaskId,
        task_type: TaskType,
        payload: serde_json::Value,
        preferred_worker_id: Option<WorkerId>,
        submitted_at: Instant,
        admission_gated: bool,
    ) -> Self {
        Self {
            id,
            task_type,
            payload,
            preferred_worker_id,
            status: TaskStatus::Pending,
            assigned_worker_id: None,
            attempts: 0,
            excluded_workers: HashSet::new(),
            admission_gated,
            submitted_at,
            assigned_at: None,
            completed_at: None,
            assignment_latency: None,
        }
    }

    /// Record a successful assignment to `worker_id` at time `now`.
    pub(crate) fn mark_assigned(&mut self, worker_id: WorkerId, now: Instant) {
        self.status = TaskStatus::InProgress;
        self.assigned_worker_id = Some(worker_id);
        self.attempts += 1;
        self.admission_gated = false;
        if self.assigned_at.is_none() {
            self.assigned_at = Some(now);
            self.assignment_latency = Some(now.saturating_duration_since(self.submitted_at));
        }
    }
}

/// Tracks availability of the external discovery/migration dependency.
#[derive(Debug, Clone, Copy)]
pub struct HealthState {
    /// Whether the discovery dependency is currently reachable/healthy.
    pub discovery_available: bool,
    /// When this flag was last refreshed.
    pub last_checked_at: Instant,
}
