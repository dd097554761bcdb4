//! # Community Benchmarks
//!
//! Performance benchmarks for symbiota-core grounding and solving with the
//! embedded solver.
//!
//! Run with: `cargo bench -p symbiota-core`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use symbiota_core::formats::render_instance;
use symbiota_core::{
    EncodingId, Fact, FactModel, NativeSolver, OptimumBound, SolveConfig, Solver, SolverDriver,
};

/// Host with a linear pathway of `length` steps that lacks `x`; each of
/// `symbionts` symbionts makes `x` from the seed.
fn create_community(length: usize, symbionts: usize) -> FactModel {
    let mut model = FactModel::new();
    model.insert(Fact::draft("host"));
    model.insert(Fact::seed("m0"));
    model.insert(Fact::target("t"));

    for i in 0..length {
        let id = format!("H{i}");
        model.insert(Fact::reaction(&id, "host"));
        model.insert(Fact::reactant(&format!("m{i}"), &id, "host"));
        model.insert(Fact::product(&format!("m{}", i + 1), &id, "host"));
    }
    let last = format!("m{length}");
    model.insert(Fact::reaction("HT", "host"));
    model.insert(Fact::reactant(&last, "HT", "host"));
    model.insert(Fact::reactant("x", "HT", "host"));
    model.insert(Fact::product("t", "HT", "host"));

    for s in 0..symbionts {
        let org = format!("s{s}");
        model.insert(Fact::bacteria(&org));
        model.insert(Fact::reaction("SX", &org));
        model.insert(Fact::reactant("m0", "SX", &org));
        model.insert(Fact::product("x", "SX", &org));
    }

    model
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_render_instance(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_instance");

    for length in [100, 1000, 5000].iter() {
        let model = create_community(*length, 10);
        group.bench_with_input(BenchmarkId::from_parameter(length), length, |b, _| {
            b.iter(|| black_box(render_instance(&model)));
        });
    }

    group.finish();
}

fn bench_scopes(c: &mut Criterion) {
    let mut group = c.benchmark_group("scopes");
    let solver = NativeSolver::new();

    for length in [100, 500, 1000].iter() {
        let model = create_community(*length, 10);
        group.bench_with_input(BenchmarkId::from_parameter(length), length, |b, _| {
            b.iter(|| {
                let mut program = SolverDriver::new(&solver)
                    .ground(model.clone(), EncodingId::Scopes)
                    .expect("ground");
                black_box(program.solve_plain().expect("solve"))
            });
        });
    }

    group.finish();
}

fn bench_soup_optimum(c: &mut Criterion) {
    let mut group = c.benchmark_group("soup_optimum");
    let solver = NativeSolver::new();

    for symbionts in [4, 8, 16].iter() {
        let model = create_community(50, *symbionts);
        let program = solver
            .ground(&model, EncodingId::CommunitySoup)
            .expect("ground");
        group.bench_with_input(
            BenchmarkId::from_parameter(symbionts),
            symbionts,
            |b, _| {
                b.iter(|| {
                    let first = solver
                        .solve(&program, &SolveConfig::single())
                        .expect("solve")
                        .next();
                    black_box(first)
                });
            },
        );
    }

    group.finish();
}

fn bench_soup_enumeration(c: &mut Criterion) {
    let mut group = c.benchmark_group("soup_enumeration");
    let solver = NativeSolver::new();

    for symbionts in [4, 8, 16].iter() {
        let model = create_community(50, *symbionts);
        group.bench_with_input(
            BenchmarkId::from_parameter(symbionts),
            symbionts,
            |b, _| {
                b.iter(|| {
                    let mut program = SolverDriver::new(&solver)
                        .ground(model.clone(), EncodingId::CommunitySoup)
                        .expect("ground");
                    let optimum = program.solve_one().expect("single").optimum;
                    let count = program
                        .solve_all(OptimumBound::Exact(optimum), 0)
                        .expect("enumerate")
                        .found()
                        .map_or(0, Iterator::count);
                    black_box(count)
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_render_instance,
    bench_scopes,
    bench_soup_optimum,
    bench_soup_enumeration,
);
criterion_main!(benches);
