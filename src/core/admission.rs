//! Validates and enqueues newly submitted tasks before dispatch.

use std::time::Instant;

use crate::core::error::SchedulerError;
use crate::core::queue::TaskQueue;
use crate::core::types::{HealthState, Task, TaskType};
use crate::util::{IdGen, TaskId, WorkerId};

/// Stateless validation/enqueue step run once per `submit_task` call. Holds
/// no data of its own; it only enforces the four admission checks in order
/// and hands back the constructed `Task` for the caller to insert into the
/// task table and offer to the dispatcher.
pub struct AdmissionController {
    strict: bool,
}

impl AdmissionController {
    /// `strict` mirrors `CoordinationConfig::strict_admission`: when set,
    /// gated task types are rejected outright while the discovery dependency
    /// is unavailable rather than being queued and held back.
    #[must_use]
    pub fn new(strict: bool) -> Self {
        Self { strict }
    }

    /// Run the four-step admission check:
    /// 1. the named type is in the closed set,
    /// 2. the queue has room,
    /// 3. a gated type's admissibility depends on discovery health,
    /// 4. on success, stamp `submitted_at` and enqueue at the tail.
    ///
    /// # Errors
    /// `InvalidTaskType` if `task_type_name` is not recognized, `QueueFull`
    /// if the queue is already at capacity, or `Degraded` if `strict` and the
    /// task type is gated while discovery is unavailable.
    pub fn admit(
        &self,
        id_gen: &dyn IdGen,
        task_type_name: &str,
        payload: serde_json::Value,
        preferred_worker_id: Option<WorkerId>,
        queue: &mut TaskQueue,
        health: HealthState,
        now: Instant,
    ) -> Result<Task, SchedulerError> {
        let task_type =
            TaskType::parse(task_type_name).ok_or_else(|| SchedulerError::InvalidTaskType(task_type_name.to_string()))?;

        if queue.is_full() {
            return Err(SchedulerError::QueueFull(queue.len()));
        }

        let gated = task_type.is_gated() && !health.discovery_available;
        if gated && self.strict {
            return Err(SchedulerError::Degraded(task_type.to_string()));
        }

        let task_id: TaskId = id_gen.next_task_id();
        let task = Task::new(task_id, task_type, payload, preferred_worker_id, now, gated);
        queue.push_back(task.id)?;
        Ok(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::MAX_QUEUE_DEPTH;
    use crate::util::UuidGen;

    fn healthy(now: Instant) -> HealthState {
        HealthState { discovery_available: true, last_checked_at: now }
    }

    #[test]
    fn rejects_unknown_task_type() {
        let controller = AdmissionController::new(false);
        let gen = UuidGen;
        let mut queue = TaskQueue::new(MAX_QUEUE_DEPTH);
        let now = Instant::now();
        let err = controller
            .admit(&gen, "not_a_real_type", serde_json::json!({}), None, &mut queue, healthy(now), now)
            .unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidTaskType(_)));
    }

    #[test]
    fn rejects_when_queue_is_full() {
        let controller = AdmissionController::new(false);
        let gen = UuidGen;
        let mut queue = TaskQueue::new(1);
        let now = Instant::now();
        controller
            .admit(&gen, "general", serde_json::json!({}), None, &mut queue, healthy(now), now)
            .unwrap();
        let err = controller
            .admit(&gen, "general", serde_json::json!({}), None, &mut queue, healthy(now), now)
            .unwrap_err();
        assert!(matches!(err, SchedulerError::QueueFull(1)));
    }

    #[test]
    fn strict_mode_rejects_gated_type_when_discovery_down() {
        let controller = AdmissionController::new(true);
        let gen = UuidGen;
        let mut queue = TaskQueue::new(MAX_QUEUE_DEPTH);
        let now = Instant::now();
        let health = HealthState { discovery_available: false, last_checked_at: now };
        let err = controller
            .admit(&gen, "discovery", serde_json::json!({}), None, &mut queue, health, now)
            .unwrap_err();
        assert!(matches!(err, SchedulerError::Degraded(_)));
    }

    #[test]
    fn lenient_mode_queues_gated_task_as_admission_gated() {
        let controller = AdmissionController::new(false);
        let gen = UuidGen;
        let mut queue = TaskQueue::new(MAX_QUEUE_DEPTH);
        let now = Instant::now();
        let health = HealthState { discovery_available: false, last_checked_at: now };
        let task = controller
            .admit(&gen, "migration", serde_json::json!({}), None, &mut queue, health, now)
            .unwrap();
        assert!(task.admission_gated);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn ungated_type_is_never_gated_regardless_of_health() {
        let controller = AdmissionController::new(true);
        let gen = UuidGen;
        let mut queue = TaskQueue::new(MAX_QUEUE_DEPTH);
        let now = Instant::now();
        let health = HealthState { discovery_available: false, last_checked_at: now };
        let task = controller
            .admit(&gen, "heartbeat", serde_json::json!({}), None, &mut queue, health, now)
            .unwrap();
        assert!(!task.admission_gated);
    }
}
