//! Owns worker records and enforces pool-size bounds.

use std::time::Instant;

use crate::core::error::SchedulerError;
use crate::core::types::{Worker, WorkerState, MAX_POOL_SIZE};
use crate::util::{IdGen, WorkerId};

/// Ordered mapping from `worker_id` to worker record. Mutations are confined
/// to `spawn`, `transition`, and `retire`, each a single in-place update —
/// the registry itself holds no lock; callers (the facade) serialize access
/// by holding the facade's single critical section for the duration.
pub struct WorkerRegistry {
    order: Vec<WorkerId>,
    workers: std::collections::HashMap<WorkerId, Worker>,
    max_pool_size: usize,
}

impl WorkerRegistry {
    /// Create an empty registry bounded by `max_pool_size`.
    #[must_use]
    pub fn new(max_pool_size: usize) -> Self {
        Self {
            order: Vec::new(),
            workers: std::collections::HashMap::new(),
            max_pool_size: max_pool_size.min(MAX_POOL_SIZE).max(1),
        }
    }

    /// Spawn one worker, generating a fresh isolation fingerprint.
    ///
    /// # Errors
    /// Returns `PoolFull` if the registry is already at its configured cap.
    pub fn spawn(&mut self, id_gen: &dyn IdGen, now: Instant) -> Result<WorkerId, SchedulerError> {
        if self.workers.len() >= self.max_pool_size {
            return Err(SchedulerError::PoolFull(self.workers.len()));
        }
        let id = id_gen.next_worker_id();
        let worker = Worker::new(
            id,
            id_gen.next_resource_id(),
            id_gen.next_resource_id(),
            id_gen.next_resource_id(),
            now,
        );
        self.order.push(id);
        self.workers.insert(id, worker);
        Ok(id)
    }

    /// Look up a worker by id.
    #[must_use]
    pub fn worker_by_id(&self, id: WorkerId) -> Option<&Worker> {
        self.workers.get(&id)
    }

    /// Mutable lookup, for state transitions.
    pub fn worker_by_id_mut(&mut self, id: WorkerId) -> Option<&mut Worker> {
        self.workers.get_mut(&id)
    }

    /// All idle, non-degraded workers, in spawn order.
    pub fn idle_workers(&self) -> impl Iterator<Item = &Worker> {
        self.order
            .iter()
            .filter_map(|id| self.workers.get(id))
            .filter(|w| w.is_idle())
    }

    /// All live workers, in spawn order.
    pub fn all_workers(&self) -> impl Iterator<Item = &Worker> {
        self.order.iter().filter_map(|id| self.workers.get(id))
    }

    /// Number of live workers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    /// True if no workers are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Transition a worker's state, stamping `last_state_change_at`.
    pub fn transition(&mut self, id: WorkerId, state: WorkerState, now: Instant) {
        if let Some(worker) = self.workers.get_mut(&id) {
            worker.state = state;
            worker.last_state_change_at = now;
        }
    }

    /// Remove a worker entirely (used by `shutdown_pool`).
    pub fn retire(&mut self, id: WorkerId) -> Option<Worker> {
        self.order.retain(|w| *w != id);
        self.workers.remove(&id)
    }

    /// Remove all workers, returning them in spawn order.
    pub fn retire_all(&mut self) -> Vec<Worker> {
        let ids = std::mem::take(&mut self.order);
        ids.into_iter()
            .filter_map(|id| self.workers.remove(&id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::UuidGen;

    #[test]
    fn spawn_respects_cap() {
        let mut reg = WorkerRegistry::new(2);
        let gen = UuidGen;
        let now = Instant::now();
        reg.spawn(&gen, now).unwrap();
        reg.spawn(&gen, now).unwrap();
        let err = reg.spawn(&gen, now).unwrap_err();
        assert!(matches!(err, SchedulerError::PoolFull(2)));
    }

    #[test]
    fn spawned_worker_is_idle_with_unique_fingerprint() {
        let mut reg = WorkerRegistry::new(4);
        let gen = UuidGen;
        let now = Instant::now();
        let a = reg.spawn(&gen, now).unwrap();
        let b = reg.spawn(&gen, now).unwrap();
        let wa = reg.worker_by_id(a).unwrap();
        let wb = reg.worker_by_id(b).unwrap();
        assert!(wa.is_idle());
        assert_ne!(wa.context_id, wb.context_id);
        assert_ne!(wa.tool_session_id, wb.tool_session_id);
        assert_ne!(wa.memory_handle_id, wb.memory_handle_id);
    }

    #[test]
    fn retire_removes_worker() {
        let mut reg = WorkerRegistry::new(4);
        let gen = UuidGen;
        let now = Instant::now();
        let a = reg.spawn(&gen, now).unwrap();
        assert_eq!(reg.len(), 1);
        reg.retire(a);
        assert_eq!(reg.len(), 0);
        assert!(reg.worker_by_id(a).is_none());
    }
}
