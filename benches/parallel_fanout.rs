use std::sync::Arc;
use std::time::Duration;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use flowcraft::prelude::*;

fn build_fanout(width: usize) -> ParallelWorkflow {
    let strategy: Arc<dyn ExecutionStrategy> = Arc::new(ThreadPoolExecutionStrategy::new(width));
    let children: Vec<Arc<dyn Workflow>> = (0..width)
        .map(|i| {
            Arc::new(TaskWorkflow::new(Arc::new(FnTask::new(
                format!("leaf-{i}"),
                |_ctx| async { Ok(()) },
            )))) as Arc<dyn Workflow>
        })
        .collect();
    ParallelWorkflow::new("fanout", children, strategy)
}

fn bench_parallel_fanout(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("parallel_fanout");

    for width in [8usize, 32, 128] {
        group.bench_function(format!("width_{width}"), |b| {
            b.iter_batched(
                || build_fanout(width),
                |workflow| {
                    rt.block_on(async {
                        let ctx = WorkflowContext::new();
                        workflow.execute(&ctx).await
                    })
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_timeout_overhead(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("timeout_workflow_overhead", |b| {
        b.iter_batched(
            || {
                let strategy: Arc<dyn ExecutionStrategy> = Arc::new(ThreadPoolExecutionStrategy::new(4));
                let inner: Arc<dyn Workflow> = Arc::new(TaskWorkflow::new(Arc::new(FnTask::new(
                    "quick",
                    |_ctx| async { Ok(()) },
                ))));
                TimeoutWorkflow::new("bounded", inner, Duration::from_secs(1), strategy)
            },
            |workflow| {
                rt.block_on(async {
                    let ctx = WorkflowContext::new();
                    workflow.execute(&ctx).await
                })
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_parallel_fanout, bench_timeout_overhead);
criterion_main!(benches);
