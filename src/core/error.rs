//! Error types for coordination pool operations.

use thiserror::Error;

use crate::util::{TaskId, WorkerId};

/// Errors produced by the coordination pool's public surface. Admission,
/// reference, and capacity errors are reported to the caller with no state
/// change; runtime faults (worker crash) never surface here — they are
/// handled internally by the failure handler and observed only through task
/// status and emitted events.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// The task queue is at `MAX_QUEUE_DEPTH`.
    #[error("queue full: {0} pending tasks")]
    QueueFull(usize),
    /// The worker pool is at `MAX_POOL_SIZE`.
    #[error("pool full: {0} workers")]
    PoolFull(usize),
    /// A submitted task named a type outside the closed set.
    #[error("invalid task type: {0}")]
    InvalidTaskType(String),
    /// A gated task type was submitted in strict mode while the discovery
    /// dependency is unavailable.
    #[error("discovery dependency unavailable, rejecting gated task type {0}")]
    Degraded(String),
    /// An operation referenced a task id that does not exist.
    #[error("unknown task: {0}")]
    UnknownTask(TaskId),
    /// An operation referenced a worker id that does not exist.
    #[error("unknown worker: {0}")]
    UnknownWorker(WorkerId),
}

/// Application-facing result for integration boundaries (config loading)
/// that aggregate several fallible steps. The facade's public methods never
/// return this; they return `Result<_, SchedulerError>` directly.
pub type AppResult<T> = anyhow::Result<T>;
