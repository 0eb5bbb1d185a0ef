use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ioc_ref::{Handle, RegisterOptions, Registry};

// ===== Micro Benchmarks =====

fn bench_global_hit(c: &mut Criterion) {
    let value = Handle::new(|_| Ok(42u64));
    let registry = Registry::new();

    // Prime the global store
    registry.with_root_scope(|scope| scope.resolve(&value)).unwrap();

    c.bench_function("global_hit_u64", |b| {
        b.iter(|| {
            let v = registry.with_root_scope(|scope| scope.resolve(&value)).unwrap();
            black_box(v);
        })
    });
}

fn bench_global_cold(c: &mut Criterion) {
    struct ExpensiveToCreate {
        data: Vec<u64>,
    }

    let expensive = Handle::new(|_| Ok(ExpensiveToCreate { data: (0..1000).collect() }));

    c.bench_function("global_cold_expensive", |b| {
        b.iter_batched(
            Registry::new,
            |registry| {
                let v = registry.with_root_scope(|scope| scope.resolve(&expensive)).unwrap();
                black_box(v.data.len());
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

fn bench_standalone_in_scope(c: &mut Criterion) {
    #[derive(Clone)]
    struct Service {
        data: [u8; 64],
    }

    let service = Handle::with_options(|_| Ok(Service { data: [0; 64] }), RegisterOptions::new().standalone());
    let registry = Registry::new();

    let mut group = c.benchmark_group("standalone");

    group.bench_function("fresh_scope", |b| {
        b.iter(|| {
            let v = registry.with_root_scope(|scope| scope.resolve(&service)).unwrap();
            black_box(v.data[0]);
        })
    });

    group.bench_function("cached_in_scope", |b| {
        registry.with_root_scope(|scope| {
            scope.resolve(&service).unwrap();
            b.iter(|| {
                let v = scope.resolve(&service).unwrap();
                black_box(v.data[0]);
            })
        })
    });

    group.finish();
}

// ===== Graph Benchmarks =====

fn chain(depth: usize, standalone: bool) -> Handle<usize> {
    let options = || {
        if standalone {
            RegisterOptions::new().standalone()
        } else {
            RegisterOptions::new()
        }
    };

    let mut handle = Handle::with_options(|_| Ok(0usize), options());
    for _ in 1..depth {
        let next = handle.clone();
        handle = Handle::with_options(move |scope| Ok(*scope.resolve(&next)? + 1), options());
    }
    handle
}

fn bench_chain_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("standalone_chain");

    for depth in [1usize, 8, 32, 128] {
        let top = chain(depth, true);
        let registry = Registry::new();

        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            b.iter(|| {
                let v = registry.with_root_scope(|scope| scope.resolve(&top)).unwrap();
                black_box(*v);
            })
        });
    }

    group.finish();
}

fn bench_override_scope(c: &mut Criterion) {
    let config = Handle::new(|_| Ok("prod".to_string()));
    let test_config = Handle::with_options(|_| Ok("test".to_string()), RegisterOptions::new().overrides(&config));
    let client = {
        let config = config.clone();
        Handle::with_options(
            move |scope| Ok(scope.resolve(&config)?.len()),
            RegisterOptions::new().with_override(&test_config).standalone(),
        )
    };
    let registry = Registry::new();

    c.bench_function("child_scope_with_override", |b| {
        b.iter(|| {
            let v = registry.with_root_scope(|scope| scope.resolve(&client)).unwrap();
            black_box(*v);
        })
    });
}

fn bench_global_chain_after_reset(c: &mut Criterion) {
    let top = chain(16, false);
    let registry = Registry::new();

    c.bench_function("global_chain_rebuild", |b| {
        b.iter(|| {
            registry.reset();
            let v = registry.with_root_scope(|scope| scope.resolve(&top)).unwrap();
            black_box(*v);
        })
    });
}

criterion_group!(
    benches,
    bench_global_hit,
    bench_global_cold,
    bench_standalone_in_scope,
    bench_chain_depth,
    bench_override_scope,
    bench_global_chain_after_reset
);
criterion_main!(benches);
