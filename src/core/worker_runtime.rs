//! Hand-off seam to the out-of-scope agent runtime that actually executes
//! task payloads (LLM calls, tool invocations, memory reads).

use crate::core::types::Task;
use crate::util::WorkerId;

/// External collaborator representing the agent runtime. The core uses this
/// only to deliver a task payload once a worker is assigned; it never awaits
/// a result from it. Completion/failure arrive later through the facade's
/// own `complete_task`/`fail_worker` calls, reported by whatever owns the
/// real runtime. The core assumes no ordering of these reports beyond
/// per-worker sequentiality.
pub trait WorkerRuntime: Send + Sync {
    /// Deliver `task` to `worker_id` for execution. Must not block and must
    /// not itself await task completion.
    fn deliver(&self, worker_id: WorkerId, task: &Task);
}

/// No-op runtime for tests and for deployments that only want to observe
/// placement decisions without actually wiring up a runtime yet.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullWorkerRuntime;

impl WorkerRuntime for NullWorkerRuntime {
    fn deliver(&self, _worker_id: WorkerId, _task: &Task) {}
}
