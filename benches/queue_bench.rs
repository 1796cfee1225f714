//! Benchmarks for queue throughput, dispatch matching, and end-to-end
//! submit/complete cycles on the coordination pool.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tokio::runtime::Runtime;

use coordination_pool::core::health::AlwaysAvailableProbe;
use coordination_pool::core::queue::TaskQueue;
use coordination_pool::core::worker_runtime::NullWorkerRuntime;
use coordination_pool::core::CoordinationFacade;
use coordination_pool::util::{IdGen, SystemClock, UuidGen};

fn bench_queue_push_and_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_push_and_drain");
    for size in [10usize, 50, 100] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let gen = UuidGen;
            b.iter(|| {
                let mut q = TaskQueue::new(size);
                for _ in 0..size {
                    q.push_back(gen.next_task_id()).unwrap();
                }
                while let Some(id) = q.iter().next().copied() {
                    q.remove(id);
                }
                black_box(&q);
            });
        });
    }
    group.finish();
}

fn new_pool(pool_size: usize, max_queue_depth: usize) -> CoordinationFacade {
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

fn bench_pool_submit_immediate(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool_submit_immediate");

    for pool_size in [4usize, 8, 16] {
        group.throughput(Throughput::Elements(pool_size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(pool_size), &pool_size, |b, &pool_size| {
            b.to_async(Runtime::new().unwrap()).iter(|| async move {
                let pool = new_pool(pool_size, 100);
                for _ in 0..pool_size {
                    let id = pool.submit_task("general", serde_json::json!({}), None).await.unwrap();
                    black_box(id);
                }
            });
        });
    }
    group.finish();
}

fn bench_pool_submit_with_queueing(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool_submit_with_queueing");

    for task_count in [50u64, 100, 200] {
        group.throughput(Throughput::Elements(task_count));
        group.bench_with_input(BenchmarkId::from_parameter(task_count), &task_count, |b, &task_count| {
            b.to_async(Runtime::new().unwrap()).iter(|| async move {
                let pool = new_pool(4, 200);
                for _ in 0..task_count {
                    match pool.submit_task("general", serde_json::json!({}), None).await {
                        Ok(id) => black_box(id),
                        Err(_) => break,
                    };
                }
            });
        });
    }
    group.finish();
}

fn bench_isolation_report(c: &mut Criterion) {
    let mut group = c.benchmark_group("isolation_report");

    for pool_size in [4usize, 8, 16] {
        group.throughput(Throughput::Elements((pool_size * pool_size) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(pool_size), &pool_size, |b, &pool_size| {
            b.to_async(Runtime::new().unwrap()).iter(|| async move {
                let pool = new_pool(pool_size, 100);
                let report = pool.isolation_report().await;
                black_box(report);
            });
        });
    }
    group.finish();
}

criterion_group!(queue_benches, bench_queue_push_and_drain);
criterion_group!(pool_benches, bench_pool_submit_immediate, bench_pool_submit_with_queueing);
criterion_group!(report_benches, bench_isolation_report);

criterion_main!(queue_benches, pool_benches, report_benches);
