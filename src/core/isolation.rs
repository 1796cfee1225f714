//! Detects and reports any cross-worker sharing of resource identifiers.

use serde::Serialize;

use crate::core::registry::WorkerRegistry;
use crate::util::WorkerId;

/// Result of a pairwise isolation scan across all live workers.
#[derive(Debug, Clone, Serialize)]
pub struct IsolationReport {
    /// `true` iff every pair of live workers has disjoint context/tool-session/memory-handle sets.
    pub isolated: bool,
    /// Pairs of worker ids with at least one shared identifier.
    pub collisions: Vec<(WorkerId, WorkerId)>,
    /// Milliseconds-since-epoch this report was produced, so callers can
    /// tell successive reports apart.
    pub checked_at_ms: u128,
}

/// Confirms, for every pair of live workers, that their `context_id`,
/// `tool_session_id`, and `memory_handle_id` are disjoint. A collision is a
/// defect: the primary guarantee the pool offers is that concurrent tasks
/// never share mutable context.
pub fn check_isolation(registry: &WorkerRegistry, now_ms: u128) -> IsolationReport {
    let workers: Vec<_> = registry.all_workers().collect();
    let mut collisions = Vec::new();

    for i in 0..workers.len() {
        for j in (i + 1)..workers.len() {
            let a = workers[i];
            let b = workers[j];
            let shares = a.context_id == b.context_id
                || a.tool_session_id == b.tool_session_id
                || a.memory_handle_id == b.memory_handle_id;
            if shares {
                collisions.push((a.id, b.id));
            }
        }
    }

    IsolationReport {
        isolated: collisions.is_empty(),
        collisions,
        checked_at_ms: now_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::UuidGen;
    use std::time::Instant;

    #[test]
    fn fresh_workers_are_isolated() {
        let mut reg = WorkerRegistry::new(4);
        let gen = UuidGen;
        let now = Instant::now();
        reg.spawn(&gen, now).unwrap();
        reg.spawn(&gen, now).unwrap();
        reg.spawn(&gen, now).unwrap();
        reg.spawn(&gen, now).unwrap();
        let report = check_isolation(&reg, 0);
        assert!(report.isolated);
        assert!(report.collisions.is_empty());
    }

    #[test]
    fn injected_duplicate_is_reported() {
        let mut reg = WorkerRegistry::new(4);
        let gen = UuidGen;
        let now = Instant::now();
        let a = reg.spawn(&gen, now).unwrap();
        let b = reg.spawn(&gen, now).unwrap();
        let shared = reg.worker_by_id(a).unwrap().context_id;
        reg.worker_by_id_mut(b).unwrap().context_id = shared;

        let report = check_isolation(&reg, 0);
        assert!(!report.isolated);
        assert_eq!(report.collisions.len(), 1);
        let (x, y) = report.collisions[0];
        assert!((x == a && y == b) || (x == b && y == a));
    }
}
