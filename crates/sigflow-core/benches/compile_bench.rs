//! Criterion benchmarks for graph compilation (`sigflow-core::graph`).
//!
//! Measures scheduling, allocation, and emission together on trivial
//! fragments, so the cost is the compiler's own. Two shapes:
//!
//! - **Linear** — a chain forwarded entirely through registers
//! - **Modulated** — a chain whose every stage has a parameter modulator
//!
//! Run with: `cargo bench -p sigflow-core -- compile/`
#![allow(missing_docs)]

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sigflow_core::{Catalog, Graph, ModuleDefinition};

const CHAIN_LENGTHS: &[usize] = &[5, 20, 100];

fn catalog() -> Arc<Catalog> {
    let mut catalog = Catalog::with_sink();
    catalog
        .register_all([
            ModuleDefinition::new("Osc", 0, 1)
                .with_param("freq", 0.01)
                .with_workspace(1)
                .with_code("l=v[i+1]=(v[i+1]+v[i])%1;i+=2;"),
            ModuleDefinition::new("Gain", 1, 1)
                .with_param("gain", 0.9)
                .with_code("l*=v[i++];"),
            ModuleDefinition::new("Pan", 1, 2).with_code("r=l;"),
        ])
        .expect("valid definitions");
    Arc::new(catalog)
}

// ---------------------------------------------------------------------------
// Graph constructors
// ---------------------------------------------------------------------------

fn make_linear(catalog: &Arc<Catalog>, n: usize, modulated: bool) -> Graph {
    let mut graph = Graph::new(Arc::clone(catalog)).unwrap();
    let osc = graph.add_module("Osc").unwrap();
    let mut prev = osc;
    for _ in 0..n {
        let gain = graph.add_module("Gain").unwrap();
        graph.connect(prev, gain).unwrap();
        if modulated {
            let lfo = graph.add_module("Osc").unwrap();
            graph.connect_param(lfo, gain, "gain").unwrap();
        }
        prev = gain;
    }
    let pan = graph.add_module("Pan").unwrap();
    graph.connect(prev, pan).unwrap();
    graph.connect(pan, graph.sink()).unwrap();
    graph
}

// ---------------------------------------------------------------------------
// Compile benchmarks
// ---------------------------------------------------------------------------

fn bench_compile(c: &mut Criterion) {
    let catalog = catalog();
    let mut group = c.benchmark_group("compile");

    for &n in CHAIN_LENGTHS {
        let linear = make_linear(&catalog, n, false);
        group.bench_with_input(BenchmarkId::new("linear", n), &linear, |b, graph| {
            b.iter(|| black_box(graph.compile().unwrap()));
        });

        let modulated = make_linear(&catalog, n, true);
        group.bench_with_input(BenchmarkId::new("modulated", n), &modulated, |b, graph| {
            b.iter(|| black_box(graph.compile().unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_compile);
criterion_main!(benches);
