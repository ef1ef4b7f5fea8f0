//! Benchmarks for the priority queue and the task scheduler.
//!
//! Benchmarks cover:
//! - Queue operations (push/pop with mixed priorities)
//! - Dispatch-order inspection
//! - Batch execution under different concurrency limits
//! - Sync-to-async offload through a shared worker pool

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::sync::Arc;

use asyncx::bridge::{sync_to_async, Callable, SyncToAsyncOptions};
use asyncx::config::WorkerPoolConfig;
use asyncx::core::{Task, TaskScheduler, WorkerPool};
use asyncx::infra::PriorityQueue;

use tokio::runtime::Runtime;

// ============================================================================
// Helper Functions
// ============================================================================

fn build_task(id: u64) -> Task<u64> {
    let priority = match id % 4 {
        0 => 10,
        1 => 5,
        2 => 0,
        _ => -5,
    };
    Task::new(format!("task-{id}"), move || async move { Ok(id * 2) }).with_priority(priority)
}

// ============================================================================
// Queue Benchmarks
// ============================================================================

fn bench_queue_push_pop(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_push_pop");

    for size in [100, 1_000, 10_000] {
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let mut q = PriorityQueue::new();
                for i in 0..size {
                    q.push(build_task(i));
                }
                while let Some(task) = q.pop() {
                    black_box(task);
                }
            });
        });
    }
    group.finish();
}

fn bench_queue_order(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_order");

    for size in [100, 1_000, 5_000] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let mut q = PriorityQueue::new();
            for i in 0..size {
                q.push(build_task(i));
            }
            b.iter(|| black_box(q.order()));
        });
    }
    group.finish();
}

// ============================================================================
// Scheduler Benchmarks (Async)
// ============================================================================

fn bench_scheduler_run_tasks(c: &mut Criterion) {
    let mut group = c.benchmark_group("scheduler_run_tasks");

    for capacity in [1, 10, 100] {
        group.throughput(Throughput::Elements(200));
        group.bench_with_input(
            BenchmarkId::from_parameter(capacity),
            &capacity,
            |b, &capacity| {
                b.to_async(Runtime::new().unwrap()).iter(|| async move {
                    let scheduler = TaskScheduler::new(capacity);
                    let tasks = (0..200).map(build_task).collect();
                    let results = scheduler.run_tasks(Some(tasks)).await;
                    black_box(results);
                });
            },
        );
    }
    group.finish();
}

fn bench_sync_to_async_shared_pool(c: &mut Criterion) {
    let mut group = c.benchmark_group("sync_to_async");
    let pool = Arc::new(WorkerPool::new(WorkerPoolConfig::new().with_worker_count(4)).unwrap());
    let add = sync_to_async(
        Callable::<(u64, u64), u64, anyhow::Error>::blocking(|(x, y)| Ok(x + y)),
        SyncToAsyncOptions::default().with_executor(Arc::clone(&pool)),
    );

    group.bench_function("shared_pool_call", |b| {
        b.to_async(Runtime::new().unwrap()).iter(|| {
            let add = Arc::clone(&add);
            async move { black_box(add((1, 2)).await.unwrap()) }
        });
    });
    group.finish();
    pool.shutdown();
}

// ============================================================================
// Benchmark Groups
// ============================================================================

criterion_group!(queue_benches, bench_queue_push_pop, bench_queue_order);

criterion_group!(
    scheduler_benches,
    bench_scheduler_run_tasks,
    bench_sync_to_async_shared_pool
);

criterion_main!(queue_benches, scheduler_benches);
