//! 负载测试
//!
//! 模拟多线程共享同一组规则、各自持有上下文时的规则引擎性能。

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rule_engine::{Context, LogicalGroup, Proposition, Rule, RuleSet, Variable};
use serde_json::json;
use std::hint::black_box;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// 并发评估测试配置
struct ConcurrencyConfig {
    thread_count: usize,
    iterations_per_thread: usize,
    rule_count: usize,
}

/// 并发测试结果
#[derive(Debug)]
#[allow(dead_code)]
struct ConcurrencyResult {
    total_evaluations: usize,
    total_duration: Duration,
    throughput_per_sec: f64,
    avg_latency_us: f64,
    p99_latency_us: u64,
}

/// 创建测试规则集：event.type == PURCHASE AND order.amount >= 100 + i AND user.is_active
fn create_rule_set(count: usize) -> RuleSet {
    let event = Variable::named("event");
    let order = Variable::named("order");
    let user = Variable::named("user");

    let rules = (0..count)
        .map(|i| {
            let conditions: Vec<Arc<dyn Proposition>> = vec![
                Arc::new(event.property("type").equal_to("PURCHASE")),
                Arc::new(order.property("amount").greater_than_or_equal_to(100 + i as i64)),
                Arc::new(user.property("is_active").same_as(true)),
            ];
            Rule::new(LogicalGroup::and(conditions)).with_name(format!("rule_{}", i))
        })
        .collect();

    RuleSet::new(rules)
}

/// 创建测试上下文
fn create_test_context(variant: usize) -> Context {
    let mut context = Context::new();
    context.set(
        "event",
        json!({"type": if variant % 2 == 0 { "PURCHASE" } else { "VIEW" }}),
    );
    context.set("order", json!({"amount": 500 + (variant % 1000)}));
    context.set(
        "user",
        json!({"id": format!("user-{}", variant), "is_active": variant % 3 != 0}),
    );
    context
}

/// 运行并发评估测试
fn run_concurrent_evaluation(config: ConcurrencyConfig) -> ConcurrencyResult {
    let rule_set = Arc::new(create_rule_set(config.rule_count));

    let mut handles = Vec::with_capacity(config.thread_count);
    let start = Instant::now();

    for thread_id in 0..config.thread_count {
        let rule_set = Arc::clone(&rule_set);
        let iterations = config.iterations_per_thread;

        let handle = thread::spawn(move || {
            let mut latencies = Vec::with_capacity(iterations);

            for i in 0..iterations {
                let mut context = create_test_context(thread_id * 1000 + i);
                let iter_start = Instant::now();
                let result = rule_set.execute(&mut context);
                latencies.push(iter_start.elapsed().as_micros() as u64);
                let _ = black_box(result);
            }

            latencies
        });

        handles.push(handle);
    }

    let mut all_latencies: Vec<u64> = Vec::new();
    for handle in handles {
        all_latencies.extend(handle.join().unwrap());
    }

    let total_duration = start.elapsed();
    let total_evaluations = all_latencies.len();

    all_latencies.sort_unstable();
    let sum: u64 = all_latencies.iter().sum();
    let p99_index = (total_evaluations as f64 * 0.99) as usize;

    ConcurrencyResult {
        total_evaluations,
        total_duration,
        throughput_per_sec: total_evaluations as f64 / total_duration.as_secs_f64(),
        avg_latency_us: sum as f64 / total_evaluations.max(1) as f64,
        p99_latency_us: all_latencies.get(p99_index).copied().unwrap_or(0),
    }
}

/// 默认值读取与改写交错：读线程解析变量，写线程不断替换默认值
fn run_default_contention(thread_count: usize, operations_per_thread: usize) -> Duration {
    let limit = Variable::with_default("limit", 10);
    let start = Instant::now();

    let handles: Vec<_> = (0..thread_count)
        .map(|thread_id| {
            let limit = limit.clone();
            thread::spawn(move || {
                let context = Context::new();
                for i in 0..operations_per_thread {
                    if thread_id == 0 && i % 4 == 0 {
                        limit.set_default(i as i64);
                    } else {
                        let _ = black_box(limit.prepare_value(&context));
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    start.elapsed()
}

// ============================================================================
// Criterion 基准测试
// ============================================================================

/// 并发评估基准测试
fn bench_concurrent_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_evaluation");

    for threads in [1, 2, 4, 8].iter() {
        group.throughput(Throughput::Elements((threads * 50) as u64));
        group.bench_with_input(BenchmarkId::new("threads", threads), threads, |b, threads| {
            b.iter(|| {
                let result = run_concurrent_evaluation(ConcurrencyConfig {
                    thread_count: *threads,
                    iterations_per_thread: 50,
                    rule_count: 5,
                });
                black_box(result)
            })
        });
    }

    group.finish();
}

/// 共享变量默认值并发访问基准测试
fn bench_default_contention(c: &mut Criterion) {
    let mut group = c.benchmark_group("default_contention");

    for threads in [1, 2, 4, 8].iter() {
        group.bench_with_input(BenchmarkId::new("threads", threads), threads, |b, threads| {
            b.iter(|| black_box(run_default_contention(*threads, 100)))
        });
    }

    group.finish();
}

/// 高负载场景测试
fn bench_high_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("high_load");
    group.sample_size(10);

    for rule_count in [100, 500, 1000].iter() {
        let rule_set = create_rule_set(*rule_count);

        group.throughput(Throughput::Elements(*rule_count as u64));
        group.bench_with_input(
            BenchmarkId::new("rule_count", rule_count),
            rule_count,
            |b, _| {
                b.iter(|| {
                    let mut context = create_test_context(0);
                    black_box(rule_set.execute(black_box(&mut context)))
                })
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_concurrent_evaluation,
    bench_default_contention,
    bench_high_load,
);

criterion_main!(benches);
