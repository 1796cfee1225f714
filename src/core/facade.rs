//! Public surface of the coordination pool: the single entry point through
//! which callers submit work, report outcomes, and observe pool health.
//!
//! Every mutating method takes the same `Arc<tokio::sync::Mutex<FacadeState>>`
//! for the duration of one logical step, mirroring `ResourcePool`'s
//! lock-around-the-critical-section design: admission, dispatch, failover,
//! and metrics bookkeeping all happen while holding the lock, so two
//! concurrent callers can never race on the same worker or queue slot. The
//! lock is released before any external call (the worker runtime's
//! `deliver`, which is fire-and-forget and does not need the lock at all).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::core::admission::AdmissionController;
use crate::core::audit::{build_audit_event, AuditSink};
use crate::core::dispatcher::{self, poll_probe};
use crate::core::error::SchedulerError;
use crate::core::failure::{FailureHandler, FailureOutcome};
use crate::core::health::{DiscoveryProbe, HealthProbe};
use crate::core::isolation::{self, IsolationReport};
use crate::core::metrics::{MetricsAggregator, MetricsSnapshot};
use crate::core::queue::TaskQueue;
use crate::core::registry::WorkerRegistry;
use crate::core::types::{Task, TaskStatus, WorkerState};
use crate::core::worker_runtime::WorkerRuntime;
use crate::util::{Clock, IdGen, TaskId, WorkerId};

struct FacadeState {
    registry: WorkerRegistry,
    queue: TaskQueue,
    tasks: HashMap<TaskId, Task>,
    health: HealthProbe,
    metrics: MetricsAggregator,
    admission: AdmissionController,
    audit: Option<Box<dyn AuditSink>>,
}

/// The coordination pool's public surface (C11 in spec terms). Cheaply
/// cloneable: all mutable state lives behind the inner `Arc<Mutex<_>>`.
#[derive(Clone)]
pub struct CoordinationFacade {
    state: Arc<Mutex<FacadeState>>,
    clock: Arc<dyn Clock>,
    id_gen: Arc<dyn IdGen>,
    worker_runtime: Arc<dyn WorkerRuntime>,
    discovery_probe: Arc<dyn DiscoveryProbe>,
}

impl CoordinationFacade {
    /// Build a pool and spawn `pool_size` workers up front.
    ///
    /// # Errors
    /// Returns `PoolFull` if `pool_size` exceeds `max_pool_size`.
    pub fn initialize_pool(
        pool_size: usize,
        max_pool_size: usize,
        max_queue_depth: usize,
        strict_admission: bool,
        clock: Arc<dyn Clock>,
        id_gen: Arc<dyn IdGen>,
        worker_runtime: Arc<dyn WorkerRuntime>,
        discovery_probe: Arc<dyn DiscoveryProbe>,
        audit: Option<Box<dyn AuditSink>>,
    ) -> Result<Self, SchedulerError> {
        let now = clock.now();
        let mut registry = WorkerRegistry::new(max_pool_size);
        for _ in 0..pool_size {
            registry.spawn(id_gen.as_ref(), now)?;
        }
        info!(pool_size, max_pool_size, max_queue_depth, "pool initialized");

        let state = FacadeState {
            registry,
            queue: TaskQueue::new(max_queue_depth),
            tasks: HashMap::new(),
            health: HealthProbe::new(clock.as_ref()),
            metrics: MetricsAggregator::new(),
            admission: AdmissionController::new(strict_admission),
            audit,
        };

        Ok(Self {
            state: Arc::new(Mutex::new(state)),
            clock,
            id_gen,
            worker_runtime,
            discovery_probe,
        })
    }

    /// Spawn one additional worker at runtime.
    ///
    /// # Errors
    /// Returns `PoolFull` if the registry is already at its configured cap.
    pub async fn spawn_worker(&self) -> Result<WorkerId, SchedulerError> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;
        let worker_id = state.registry.spawn(self.id_gen.as_ref(), now)?;
        info!(worker_id = %worker_id, "worker_spawned");
        if let Some(audit) = state.audit.as_mut() {
            audit.record(build_audit_event(worker_id.to_string(), worker_id.to_string(), "worker_spawned"));
        }
        drop(state);
        self.drain(now).await;
        Ok(worker_id)
    }

    /// Submit a new task for dispatch.
    ///
    /// # Errors
    /// `InvalidTaskType`, `QueueFull`, or (in strict admission mode)
    /// `Degraded` if the task type is gated and discovery is unavailable.
    pub async fn submit_task(
        &self,
        task_type: &str,
        payload: serde_json::Value,
        preferred_worker_id: Option<WorkerId>,
    ) -> Result<TaskId, SchedulerError> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;
        let health = state.health.state();

        let admitted = state.admission.admit(
            self.id_gen.as_ref(),
            task_type,
            payload,
            preferred_worker_id,
            &mut state.queue,
            health,
            now,
        );

        let task = match admitted {
            Ok(task) => task,
            Err(err) => {
                if matches!(err, SchedulerError::QueueFull(_)) {
                    state.metrics.record_queue_rejection();
                }
                warn!(error = %err, task_type, "task_rejected");
                return Err(err);
            }
        };

        let task_id = task.id;
        state.metrics.record_submitted();
        info!(task_id = %task_id, task_type, admission_gated = task.admission_gated, "task_submitted");
        if let Some(audit) = state.audit.as_mut() {
            audit.record(build_audit_event(task_id.to_string(), task_id.to_string(), "task_submitted"));
        }
        state.tasks.insert(task_id, task);
        debug!(task_id = %task_id, queue_len = state.queue.len(), "task_queued");

        drop(state);
        self.drain(now).await;
        Ok(task_id)
    }

    /// Terminate `task_id`: `success = true` completes it normally and
    /// releases its worker; `success = false` routes it through the same
    /// bounded retry/failover path as [`Self::fail_worker`].
    ///
    /// # Errors
    /// `UnknownTask` if `task_id` is not recognized. Idempotent: a second
    /// call on an already-terminal task is a no-op.
    pub async fn complete_task(&self, task_id: TaskId, success: bool) -> Result<(), SchedulerError> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;

        let task = state.tasks.get(&task_id).ok_or(SchedulerError::UnknownTask(task_id))?;
        if task.status.is_terminal() {
            return Ok(());
        }
        let worker_id = task.assigned_worker_id.ok_or(SchedulerError::UnknownTask(task_id))?;

        if !success {
            let (outcome, redelivery) = self.run_failure(&mut state, task_id, worker_id, now);
            drop(state);
            if let Some((new_worker, task)) = redelivery {
                self.worker_runtime.deliver(new_worker, &task);
            }
            let _ = outcome;
            return Ok(());
        }

        let duration = {
            let task = state.tasks.get_mut(&task_id).expect("checked above");
            task.status = TaskStatus::Completed;
            task.completed_at = Some(now);
            now.saturating_duration_since(task.assigned_at.unwrap_or(now))
        };
        let task_type = state.tasks[&task_id].task_type;

        state.registry.transition(worker_id, WorkerState::Idle, now);
        if let Some(worker) = state.registry.worker_by_id_mut(worker_id) {
            worker.current_task_id = None;
            worker.history.entry(task_type).or_default().record_completion(duration);
            worker.record_active_time(duration);
        }
        state.metrics.record_completed(duration);
        if let Some(latency) = state.tasks[&task_id].assignment_latency {
            state.metrics.record_assignment_latency(latency);
        }

        info!(task_id = %task_id, worker_id = %worker_id, duration_ms = duration.as_millis() as u64, "task_completed");
        if let Some(audit) = state.audit.as_mut() {
            audit.record(build_audit_event(task_id.to_string(), worker_id.to_string(), "task_completed"));
        }

        drop(state);
        self.drain(now).await;
        Ok(())
    }

    /// Report that `worker_id` crashed. If it was holding a task, the task
    /// runs the bounded retry/failover policy; otherwise the worker is
    /// simply retired. Returns the failure outcome for the held task, if
    /// any.
    ///
    /// # Errors
    /// `UnknownWorker` if `worker_id` is not recognized.
    pub async fn fail_worker(&self, worker_id: WorkerId) -> Result<Option<FailureOutcome>, SchedulerError> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;

        let worker = state.registry.worker_by_id(worker_id).ok_or(SchedulerError::UnknownWorker(worker_id))?;
        let Some(task_id) = worker.current_task_id else {
            state.registry.transition(worker_id, WorkerState::Degraded, now);
            info!(worker_id = %worker_id, "worker_retired");
            return Ok(None);
        };

        let (outcome, redelivery) = self.run_failure(&mut state, task_id, worker_id, now);
        drop(state);
        if let Some((new_worker, task)) = redelivery {
            self.worker_runtime.deliver(new_worker, &task);
        }
        Ok(Some(outcome))
    }

    /// Shared failure-handling step used by both `complete_task(.., false)`
    /// and `fail_worker`. Caller holds the lock and drops it before
    /// delivering any reassignment.
    fn run_failure(
        &self,
        state: &mut FacadeState,
        task_id: TaskId,
        worker_id: WorkerId,
        now: Instant,
    ) -> (FailureOutcome, Option<(WorkerId, Task)>) {
        let health = state.health.state();
        let FacadeState { registry, queue, tasks, metrics, audit, .. } = state;
        let outcome = FailureHandler
            .handle_failure(task_id, worker_id, registry, queue, tasks, health, now)
            .expect("task_id resolved from a live assignment");

        let mut redelivery = None;
        match &outcome {
            FailureOutcome::Reassigned(new_worker) => {
                info!(task_id = %task_id, failed_worker = %worker_id, new_worker = %new_worker, "task_reassigned");
                if let Some(audit) = audit.as_mut() {
                    audit.record(build_audit_event(task_id.to_string(), worker_id.to_string(), "worker_failed"));
                }
                redelivery = Some((*new_worker, tasks[&task_id].clone()));
            }
            FailureOutcome::Requeued => {
                warn!(task_id = %task_id, failed_worker = %worker_id, "task_requeued");
                if let Some(audit) = audit.as_mut() {
                    audit.record(build_audit_event(task_id.to_string(), worker_id.to_string(), "worker_failed"));
                }
            }
            FailureOutcome::Failed => {
                metrics.record_failed();
                warn!(task_id = %task_id, failed_worker = %worker_id, "task_failed");
                if let Some(audit) = audit.as_mut() {
                    audit.record(build_audit_event(task_id.to_string(), worker_id.to_string(), "task_failed"));
                }
            }
        }
        info!(worker_id = %worker_id, "worker_retired");
        (outcome, redelivery)
    }

    /// Tear down the pool: cancel every pending and in-progress task and
    /// retire every worker. Returns the ids of tasks that were cancelled.
    pub async fn shutdown_pool(&self) -> Vec<TaskId> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;
        let pending = state.queue.drain_all();
        let mut cancelled = Vec::new();
        for task in state.tasks.values_mut() {
            if matches!(task.status, TaskStatus::Pending | TaskStatus::InProgress) {
                task.status = TaskStatus::Cancelled;
                task.completed_at = Some(now);
                cancelled.push(task.id);
                state.metrics.record_cancelled();
            }
        }
        debug_assert!(pending.iter().all(|id| cancelled.contains(id)));
        state.registry.retire_all();
        info!(cancelled = cancelled.len(), "pool_shutdown");
        cancelled
    }

    /// Poll the discovery dependency and, on a recovery transition, ungate
    /// held-back tasks and run a drain pass to pick them up.
    pub async fn refresh_discovery(&self) -> bool {
        let mut state = self.state.lock().await;
        let recovered = poll_probe(self.discovery_probe.as_ref(), &mut state.health, self.clock.as_ref()).await;
        if recovered {
            info!("degradation_changed: discovery recovered");
            dispatcher::ungate_tasks(&mut state.tasks);
            drop(state);
            self.drain(self.clock.now()).await;
        }
        recovered
    }

    /// Point-in-time metrics snapshot.
    pub async fn metrics(&self) -> MetricsSnapshot {
        let state = self.state.lock().await;
        let tasks_pending = state.tasks.values().filter(|t| t.status == TaskStatus::Pending).count() as u64;
        let tasks_in_progress = state.tasks.values().filter(|t| t.status == TaskStatus::InProgress).count() as u64;
        state.metrics.snapshot(
            state.registry.len() as u64,
            tasks_pending,
            tasks_in_progress,
            state.queue.len() as u64,
        )
    }

    /// Pairwise isolation scan across all live workers. Any collision is a
    /// defect: both colliding workers are immediately transitioned to
    /// `Degraded` (never dispatched to again) until one is retired.
    pub async fn isolation_report(&self) -> IsolationReport {
        let now = self.clock.now();
        let mut state = self.state.lock().await;
        let report = isolation::check_isolation(&state.registry, self.clock.now_ms());
        if !report.isolated {
            error!(collisions = report.collisions.len(), "isolation_violated");
            let mut quarantined = Vec::new();
            for (a, b) in &report.collisions {
                quarantined.push(*a);
                quarantined.push(*b);
            }
            quarantined.sort_unstable();
            quarantined.dedup();
            for worker_id in quarantined {
                // A colliding worker may be mid-task; detach it back to the
                // queue (not a failure-path retry, so attempts/exclusions
                // are untouched) before degrading it out of dispatch.
                if let Some(held_task) = state.registry.worker_by_id(worker_id).and_then(|w| w.current_task_id) {
                    if let Some(task) = state.tasks.get_mut(&held_task) {
                        task.status = TaskStatus::Pending;
                        task.assigned_worker_id = None;
                    }
                    let _ = state.queue.push_front(held_task);
                }
                state.registry.transition(worker_id, WorkerState::Degraded, now);
                if let Some(worker) = state.registry.worker_by_id_mut(worker_id) {
                    worker.current_task_id = None;
                }
            }
            if let Some(audit) = state.audit.as_mut() {
                for (a, b) in &report.collisions {
                    audit.record(build_audit_event(a.to_string(), b.to_string(), "isolation_violated"));
                }
            }
        }
        report
    }

    /// Fetch a full task record.
    ///
    /// # Errors
    /// Returns `UnknownTask` if `task_id` is not recognized.
    pub async fn get_task(&self, task_id: TaskId) -> Result<Task, SchedulerError> {
        self.state
            .lock()
            .await
            .tasks
            .get(&task_id)
            .cloned()
            .ok_or(SchedulerError::UnknownTask(task_id))
    }

    /// Current status of a task, if it exists.
    pub async fn task_status(&self, task_id: TaskId) -> Option<TaskStatus> {
        self.state.lock().await.tasks.get(&task_id).map(|t| t.status)
    }

    /// Worker currently (or most recently) holding a task, if any. Callers
    /// report outcomes through `complete_task`/`fail_worker`, both of which
    /// need this id; a deployment that owns the worker runtime already knows
    /// it, but test harnesses and simple callers can look it up here.
    pub async fn assigned_worker(&self, task_id: TaskId) -> Option<WorkerId> {
        self.state.lock().await.tasks.get(&task_id).and_then(|t| t.assigned_worker_id)
    }

    /// Number of attempts recorded so far for a task, if it exists.
    pub async fn task_attempts(&self, task_id: TaskId) -> Option<u32> {
        self.state.lock().await.tasks.get(&task_id).map(|t| t.attempts)
    }

    /// Excluded-worker set recorded so far for a task, if it exists.
    pub async fn task_excluded_workers(&self, task_id: TaskId) -> Option<std::collections::HashSet<WorkerId>> {
        self.state.lock().await.tasks.get(&task_id).map(|t| t.excluded_workers.clone())
    }

    /// Whether a task is currently held back pending discovery recovery.
    pub async fn task_admission_gated(&self, task_id: TaskId) -> Option<bool> {
        self.state.lock().await.tasks.get(&task_id).map(|t| t.admission_gated)
    }

    /// Run one drain pass and deliver every new assignment to the worker
    /// runtime. Acquires the lock itself; callers must not hold it.
    async fn drain(&self, now: Instant) {
        let mut state = self.state.lock().await;
        let health = state.health.state();
        let FacadeState { queue, registry, tasks, audit, .. } = &mut *state;
        let assignments = dispatcher::drain(queue, registry, tasks, health, now);
        for (task_id, worker_id) in &assignments {
            info!(task_id = %task_id, worker_id = %worker_id, "task_assigned");
            if let Some(audit) = audit.as_mut() {
                audit.record(build_audit_event(task_id.to_string(), worker_id.to_string(), "task_assigned"));
            }
        }
        let deliveries: Vec<(WorkerId, Task)> = assignments
            .iter()
            .map(|(task_id, worker_id)| (*worker_id, tasks[task_id].clone()))
            .collect();
        drop(state);
        for (worker_id, task) in deliveries {
            self.worker_runtime.deliver(worker_id, &task);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::health::AlwaysAvailableProbe;
    use crate::core::worker_runtime::NullWorkerRuntime;
    use crate::util::{IdGen, SystemClock, UuidGen};

    fn facade(pool_size: usize, max_queue_depth: usize) -> CoordinationFacade {
        CoordinationFacade::initialize_pool(
            pool_size,
            16,
            max_queue_depth,
            false,
            Arc::new(SystemClock),
            Arc::new(UuidGen),
            Arc::new(NullWorkerRuntime),
            Arc::new(AlwaysAvailableProbe),
            None,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn submit_and_drain_assigns_immediately_when_a_worker_is_idle() {
        let pool = facade(1, 10);
        let task_id = pool.submit_task("general", serde_json::json!({}), None).await.unwrap();
        assert_eq!(pool.task_status(task_id).await, Some(TaskStatus::InProgress));
    }

    #[tokio::test]
    async fn second_task_queues_when_the_only_worker_is_busy() {
        let pool = facade(1, 10);
        let first = pool.submit_task("general", serde_json::json!({}), None).await.unwrap();
        let second = pool.submit_task("general", serde_json::json!({}), None).await.unwrap();
        assert_eq!(pool.task_status(first).await, Some(TaskStatus::InProgress));
        assert_eq!(pool.task_status(second).await, Some(TaskStatus::Pending));
    }

    #[tokio::test]
    async fn completing_a_task_drains_the_next_queued_one() {
        let pool = facade(1, 10);
        let first = pool.submit_task("general", serde_json::json!({}), None).await.unwrap();
        let second = pool.submit_task("general", serde_json::json!({}), None).await.unwrap();
        pool.complete_task(first, true).await.unwrap();
        assert_eq!(pool.task_status(second).await, Some(TaskStatus::InProgress));
    }

    #[tokio::test]
    async fn completing_an_already_terminal_task_is_a_no_op() {
        let pool = facade(1, 10);
        let task_id = pool.submit_task("general", serde_json::json!({}), None).await.unwrap();
        pool.complete_task(task_id, true).await.unwrap();
        pool.complete_task(task_id, true).await.unwrap();
        assert_eq!(pool.task_status(task_id).await, Some(TaskStatus::Completed));
    }

    #[tokio::test]
    async fn get_task_returns_unknown_task_for_a_bogus_id() {
        let pool = facade(1, 10);
        let bogus = UuidGen.next_task_id();
        let err = pool.get_task(bogus).await.unwrap_err();
        assert!(matches!(err, SchedulerError::UnknownTask(_)));
    }

    #[tokio::test]
    async fn get_task_returns_the_full_record() {
        let pool = facade(1, 10);
        let task_id = pool.submit_task("research", serde_json::json!({"q": 1}), None).await.unwrap();
        let task = pool.get_task(task_id).await.unwrap();
        assert_eq!(task.id, task_id);
        assert_eq!(task.status, TaskStatus::InProgress);
    }

    #[tokio::test]
    async fn queue_full_is_rejected() {
        let pool = facade(1, 1);
        pool.submit_task("general", serde_json::json!({}), None).await.unwrap();
        let err = pool.submit_task("general", serde_json::json!({}), None).await.unwrap_err();
        assert!(matches!(err, SchedulerError::QueueFull(_)));
    }

    #[tokio::test]
    async fn shutdown_cancels_pending_and_in_progress_tasks() {
        let pool = facade(1, 10);
        let first = pool.submit_task("general", serde_json::json!({}), None).await.unwrap();
        let second = pool.submit_task("general", serde_json::json!({}), None).await.unwrap();
        let cancelled = pool.shutdown_pool().await;
        assert!(cancelled.contains(&first));
        assert!(cancelled.contains(&second));
    }

    #[tokio::test]
    async fn isolation_collision_quarantines_both_workers_from_dispatch() {
        let pool = facade(2, 10);
        let ids: Vec<WorkerId> = {
            let state = pool.state.lock().await;
            state.registry.all_workers().map(|w| w.id).collect()
        };
        let (a, b) = (ids[0], ids[1]);
        {
            let mut state = pool.state.lock().await;
            let shared = state.registry.worker_by_id(a).unwrap().context_id;
            state.registry.worker_by_id_mut(b).unwrap().context_id = shared;
        }

        let report = pool.isolation_report().await;
        assert!(!report.isolated);

        // Both colliding workers are now Degraded; a new submission cannot
        // land on either of them, so it is held in the queue.
        let task_id = pool.submit_task("general", serde_json::json!({}), None).await.unwrap();
        assert_eq!(pool.task_status(task_id).await, Some(TaskStatus::Pending));
    }
}
