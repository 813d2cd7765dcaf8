use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use schedsim_core::{Burst, PolicyConfig, Process, Scheduler, SchedulerConfig};

/// Deterministic mixed workload of `count` processes.
fn workload(count: usize) -> Vec<Process> {
    (0..count)
        .map(|i| {
            let seed = i as u32;
            let bursts = vec![
                Burst::cpu(1 + seed % 7),
                Burst::io(if i % 2 == 0 { "disk" } else { "network" }, 2 + seed % 5),
                Burst::cpu(1 + (seed * 3) % 5),
            ];
            Process::new(format!("P{i}"), bursts, seed % 4, (i / 3) as u64)
        })
        .collect()
}

fn bench_policies(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_run");
    let policies = [
        PolicyConfig::Fcfs,
        PolicyConfig::round_robin(4),
        PolicyConfig::ShortestJobFirst,
        PolicyConfig::ShortestRemainingTimeFirst,
        PolicyConfig::priority_with_aging(5, 1),
    ];

    for policy in policies {
        group.bench_with_input(
            BenchmarkId::from_parameter(policy.short_name()),
            &policy,
            |b, policy| {
                b.iter(|| {
                    let config = SchedulerConfig::with_devices(2, 2, *policy);
                    let mut scheduler = Scheduler::new(config).unwrap();
                    scheduler.submit_all(workload(200)).unwrap();
                    scheduler.run().unwrap()
                });
            },
        );
    }
    group.finish();
}

fn bench_invariant_overhead(c: &mut Criterion) {
    let mut group = c.benchmark_group("invariant_checks");
    for check_invariants in [true, false] {
        group.bench_with_input(
            BenchmarkId::from_parameter(check_invariants),
            &check_invariants,
            |b, &check_invariants| {
                b.iter(|| {
                    let config = SchedulerConfig {
                        check_invariants,
                        ..SchedulerConfig::with_policy(PolicyConfig::round_robin(2))
                    };
                    let mut scheduler = Scheduler::new(config).unwrap();
                    scheduler.submit_all(workload(100)).unwrap();
                    scheduler.run().unwrap()
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_policies, bench_invariant_overhead);
criterion_main!(benches);
