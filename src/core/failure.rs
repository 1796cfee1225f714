//! Handles a worker-reported task failure: exclusion, retirement, and
//! bounded retry/failover.

use std::collections::HashMap;
use std::time::Instant;

use crate::core::dispatcher::find_match;
use crate::core::queue::TaskQueue;
use crate::core::registry::WorkerRegistry;
use crate::core::types::{HealthState, Task, TaskStatus, WorkerState, MAX_ATTEMPTS};
use crate::util::{TaskId, WorkerId};

/// What happened to a task after a reported worker failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureOutcome {
    /// Reassigned immediately to a different idle worker.
    Reassigned(WorkerId),
    /// No idle worker was available; pushed back to the head of the queue.
    Requeued,
    /// `MAX_ATTEMPTS` was reached; the task is terminally failed.
    Failed,
}

/// Stateless failure-handling step. Holds no data; every call is self
/// contained given the shared registry/queue/task table.
pub struct FailureHandler;

impl FailureHandler {
    /// Process a failure of `task_id` on `failed_worker_id`:
    /// 1. exclude `failed_worker_id` from the task's future matches,
    /// 2. retire the worker (transition to `Degraded`, clear its task),
    /// 3. if attempts are exhausted, fail the task; otherwise try an
    ///    immediate reassignment excluding all workers the task has already
    ///    failed on, falling back to a head-of-queue requeue.
    ///
    /// # Panics
    /// Never panics; an unknown `task_id` or `failed_worker_id` is a no-op
    /// returning `Requeued` only if the task exists (callers are expected to
    /// check `UnknownTask`/`UnknownWorker` before calling this).
    pub fn handle_failure(
        &self,
        task_id: TaskId,
        failed_worker_id: WorkerId,
        registry: &mut WorkerRegistry,
        queue: &mut TaskQueue,
        tasks: &mut HashMap<TaskId, Task>,
        health: HealthState,
        now: Instant,
    ) -> Option<FailureOutcome> {
        registry.transition(failed_worker_id, WorkerState::Degraded, now);
        if let Some(worker) = registry.worker_by_id_mut(failed_worker_id) {
            worker.current_task_id = None;
        }

        let task = tasks.get_mut(&task_id)?;
        task.excluded_workers.insert(failed_worker_id);

        if task.attempts >= MAX_ATTEMPTS {
            task.status = TaskStatus::Failed;
            task.assigned_worker_id = None;
            task.completed_at = Some(now);
            return Some(FailureOutcome::Failed);
        }

        let ungated_for_match = crate::core::dispatcher::is_dispatch_eligible(task, health);
        if ungated_for_match {
            if let Some(new_worker_id) = find_match(registry, task) {
                registry.transition(new_worker_id, WorkerState::Executing, now);
                if let Some(worker) = registry.worker_by_id_mut(new_worker_id) {
                    worker.current_task_id = Some(task_id);
                }
                task.mark_assigned(new_worker_id, now);
                return Some(FailureOutcome::Reassigned(new_worker_id));
            }
        }

        task.status = TaskStatus::Pending;
        task.assigned_worker_id = None;
        // Best effort: if the queue happens to be at capacity, the retry is
        // dropped rather than displacing another admitted task. A pool sized
        // per spec (queue depth >= in-flight attempts) does not hit this.
        let _ = queue.push_front(task_id);
        Some(FailureOutcome::Requeued)
    }
}
