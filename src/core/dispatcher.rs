//! Matches pending tasks to idle workers and drains the queue on release.

use std::collections::HashMap;
use std::time::Instant;

use crate::core::health::DiscoveryProbe;
use crate::core::queue::TaskQueue;
use crate::core::registry::WorkerRegistry;
use crate::core::types::{HealthState, Task, TaskTypeHistory};
use crate::util::WorkerId;

/// Find the single best idle worker for `task`, per the three-tier policy:
/// preferred worker, then history-based affinity, then any idle fallback.
/// Returns `None` if no eligible idle worker exists.
#[must_use]
pub fn find_match(registry: &WorkerRegistry, task: &Task) -> Option<WorkerId> {
    if let Some(preferred) = task.preferred_worker_id {
        if !task.excluded_workers.contains(&preferred) {
            if let Some(worker) = registry.worker_by_id(preferred) {
                if worker.is_idle() {
                    return Some(preferred);
                }
            }
        }
    }

    let mut best: Option<(WorkerId, f64, u64)> = None;
    for worker in registry.idle_workers() {
        if task.excluded_workers.contains(&worker.id) {
            continue;
        }
        if let Some(hist) = worker.history.get(&task.task_type) {
            let better = match &best {
                None => true,
                Some((best_id, best_mean, best_active)) => {
                    (hist.mean_duration_ms, worker.total_active_ms, worker.id)
                        < (*best_mean, *best_active, *best_id)
                }
            };
            if better {
                best = Some((worker.id, hist.mean_duration_ms, worker.total_active_ms));
            }
        }
    }
    if let Some((id, _, _)) = best {
        return Some(id);
    }

    // Fallback: any idle, non-excluded worker, spawn order for determinism.
    registry
        .idle_workers()
        .find(|w| !task.excluded_workers.contains(&w.id))
        .map(|w| w.id)
}

/// A task is eligible for dispatch attention right now if it is not held
/// back by the `admission_gated` marker.
#[must_use]
pub fn is_dispatch_eligible(task: &Task, health: HealthState) -> bool {
    if task.task_type.is_gated() && !health.discovery_available {
        return false;
    }
    !task.admission_gated
}

/// Scan the queue head-to-tail once per iteration, matching the first
/// dispatchable task to an idle worker and repeating until either the queue
/// is empty or a full pass finds no further match. Mutates `registry` (the
/// matched worker is transitioned to `Executing`) and `tasks` (status,
/// `assigned_worker_id`, `attempts`, `assignment_latency`). Returns the list
/// of `(task_id, worker_id)` assignments made, in the order they happened,
/// for the caller to emit events/audit records from.
pub fn drain(
    queue: &mut TaskQueue,
    registry: &mut WorkerRegistry,
    tasks: &mut HashMap<crate::util::TaskId, Task>,
    health: HealthState,
    now: Instant,
) -> Vec<(crate::util::TaskId, WorkerId)> {
    let mut assignments = Vec::new();

    loop {
        let pending_ids: Vec<_> = queue.iter().copied().collect();
        let mut matched = None;

        for task_id in pending_ids {
            let Some(task) = tasks.get(&task_id) else {
                continue;
            };
            if !is_dispatch_eligible(task, health) {
                continue;
            }
            if let Some(worker_id) = find_match(registry, task) {
                matched = Some((task_id, worker_id));
                break;
            }
        }

        let Some((task_id, worker_id)) = matched else {
            break;
        };

        queue.remove(task_id);
        registry.transition(worker_id, crate::core::types::WorkerState::Executing, now);
        if let Some(worker) = registry.worker_by_id_mut(worker_id) {
            worker.current_task_id = Some(task_id);
        }
        if let Some(task) = tasks.get_mut(&task_id) {
            task.mark_assigned(worker_id, now);
        }
        assignments.push((task_id, worker_id));
    }

    assignments
}

/// Clear every gated task's `admission_gated` marker after a recovery, so
/// the next drain pass considers them. Does not dispatch by itself.
pub fn ungate_tasks(tasks: &mut HashMap<crate::util::TaskId, Task>) {
    for task in tasks.values_mut() {
        if task.task_type.is_gated() {
            task.admission_gated = false;
        }
    }
}

/// Refresh the discovery probe and return `true` if it just recovered
/// (unavailable -> available), in which case the caller should run a
/// [`drain`] pass after clearing gated markers with [`ungate_tasks`].
pub async fn poll_probe(
    probe: &dyn DiscoveryProbe,
    health: &mut crate::core::health::HealthProbe,
    clock: &dyn crate::util::Clock,
) -> bool {
    let available = probe.check().await;
    health.refresh(available, clock)
}
