//! Running counters, averages, and derived utilization.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

/// Point-in-time copy of the pool's counters. Readers never observe a torn
/// read because the facade only ever produces a snapshot from inside its
/// single critical section.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct MetricsSnapshot {
    /// Live worker count.
    pub workers: u64,
    /// Total tasks ever submitted.
    pub tasks_total: u64,
    /// Tasks currently `pending`.
    pub tasks_pending: u64,
    /// Tasks currently `in_progress`.
    pub tasks_in_progress: u64,
    /// Tasks that reached `completed`.
    pub tasks_completed: u64,
    /// Tasks that reached `failed`.
    pub tasks_failed: u64,
    /// Tasks that reached `cancelled`.
    pub tasks_cancelled: u64,
    /// Current queue length.
    pub queue_length: u64,
    /// Submissions rejected with `QueueFull`.
    pub queue_rejections: u64,
    /// Simple cumulative mean of completed task duration, in milliseconds.
    pub avg_task_duration_ms: f64,
    /// Simple cumulative mean of first-assignment latency, in milliseconds.
    pub avg_assignment_latency_ms: f64,
    /// `tasks_in_progress / max(workers, 1)`.
    pub utilization: f64,
}

/// Lock-free counters backing `MetricsAggregator`, mirroring the atomics
/// pattern used by the worker pool's `PoolCounters`.
#[derive(Debug, Default)]
pub struct MetricsAggregator {
    tasks_total: AtomicU64,
    tasks_completed: AtomicU64,
    tasks_failed: AtomicU64,
    tasks_cancelled: AtomicU64,
    queue_rejections: AtomicU64,
    // Running means are stored as (count, mean_ms_bits) pairs protected by
    // the facade's single critical section — they are only ever mutated
    // from there, so plain fields (not atomics) suffice.
    duration_count: u64,
    duration_mean_ms: f64,
    latency_count: u64,
    latency_mean_ms: f64,
}

impl MetricsAggregator {
    /// Create a fresh, zeroed aggregator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one task admission.
    pub fn record_submitted(&self) {
        self.tasks_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one queue-full rejection.
    pub fn record_queue_rejection(&self) {
        self.queue_rejections.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one task completion, folding its duration into the running mean.
    pub fn record_completed(&mut self, duration: Duration) {
        self.tasks_completed.fetch_add(1, Ordering::Relaxed);
        let x = duration.as_secs_f64() * 1000.0;
        let n = self.duration_count as f64;
        self.duration_mean_ms = (self.duration_mean_ms * n + x) / (n + 1.0);
        self.duration_count += 1;
    }

    /// Record one terminal failure (retry exhausted).
    pub fn record_failed(&self) {
        self.tasks_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one cancellation (shutdown).
    pub fn record_cancelled(&self) {
        self.tasks_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one first-assignment latency, folding it into the running mean.
    pub fn record_assignment_latency(&mut self, latency: Duration) {
        let x = latency.as_secs_f64() * 1000.0;
        let n = self.latency_count as f64;
        self.latency_mean_ms = (self.latency_mean_ms * n + x) / (n + 1.0);
        self.latency_count += 1;
    }

    /// Produce a point-in-time snapshot given the live counts the facade
    /// tracks directly (workers, pending, in-progress).
    #[must_use]
    pub fn snapshot(&self, workers: u64, tasks_pending: u64, tasks_in_progress: u64, queue_length: u64) -> MetricsSnapshot {
        let tasks_completed = self.tasks_completed.load(Ordering::Relaxed);
        let tasks_failed = self.tasks_failed.load(Ordering::Relaxed);
        let tasks_cancelled = self.tasks_cancelled.load(Ordering::Relaxed);
        MetricsSnapshot {
            workers,
            tasks_total: self.tasks_total.load(Ordering::Relaxed),
            tasks_pending,
            tasks_in_progress,
            tasks_completed,
            tasks_failed,
            tasks_cancelled,
            queue_length,
            queue_rejections: self.queue_rejections.load(Ordering::Relaxed),
            avg_task_duration_ms: self.duration_mean_ms,
            avg_assignment_latency_ms: self.latency_mean_ms,
            utilization: tasks_in_progress as f64 / workers.max(1) as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_mean_is_deterministic() {
        let mut agg = MetricsAggregator::new();
        agg.record_completed(Duration::from_millis(100));
        agg.record_completed(Duration::from_millis(200));
        let snap = agg.snapshot(1, 0, 0, 0);
        assert!((snap.avg_task_duration_ms - 150.0).abs() < 1e-6);
    }

    #[test]
    fn utilization_is_derived() {
        let agg = MetricsAggregator::new();
        let snap = agg.snapshot(2, 0, 1, 0);
        assert!((snap.utilization - 0.5).abs() < 1e-6);
    }

    #[test]
    fn utilization_with_zero_workers_does_not_divide_by_zero() {
        let agg = MetricsAggregator::new();
        let snap = agg.snapshot(0, 0, 0, 0);
        assert_eq!(snap.utilization, 0.0);
    }
}
