//! Property-based tests for graph compilation.
//!
//! Generates random acyclic patches (a processing chain plus modulators wired
//! into parameters) and checks scheduling, buffering, and layout invariants
//! using proptest.

use std::sync::Arc;

use proptest::prelude::*;
use sigflow_core::{Catalog, Graph, ModuleDefinition, ModuleId};

fn catalog() -> Arc<Catalog> {
    let mut catalog = Catalog::with_sink();
    catalog
        .register_all([
            ModuleDefinition::new("Lfo", 0, 1)
                .with_param("freq", 0.2)
                .with_workspace(1)
                .with_code("l=v[i+1]=(v[i+1]+v[i])%1;i+=2;"),
            ModuleDefinition::new("Env", 1, 1)
                .with_param("rate", 0.001)
                .with_workspace(1)
                .with_code("l*=v[i+1]*=1-v[i];i+=2;"),
            ModuleDefinition::new("Pan", 1, 2)
                .with_param("pos", 0.5)
                .with_code("p=v[i++];r=l*p;l*=1-p;"),
        ])
        .unwrap();
    Arc::new(catalog)
}

/// Builds a patch from generated parameters.
///
/// Modules are ranked `[lfo.., osc, env..]`; a modulation edge `(a, b)` is
/// only added from a lower to a higher rank, which keeps the graph acyclic.
fn build(chain_len: usize, lfo_count: usize, edges: &[(usize, usize)]) -> Graph {
    let mut graph = Graph::new(catalog()).unwrap();
    let mut ranked: Vec<(ModuleId, &str)> = Vec::new();
    for _ in 0..lfo_count {
        ranked.push((graph.add_module("Lfo").unwrap(), "freq"));
    }
    let osc = graph.add_module("Lfo").unwrap();
    ranked.push((osc, "freq"));
    let mut prev = osc;
    for _ in 0..chain_len {
        let env = graph.add_module("Env").unwrap();
        graph.connect(prev, env).unwrap();
        ranked.push((env, "rate"));
        prev = env;
    }
    let pan = graph.add_module("Pan").unwrap();
    graph.connect(prev, pan).unwrap();
    graph.connect(pan, graph.sink()).unwrap();

    for &(a, b) in edges {
        let (a, b) = (a % ranked.len(), b % ranked.len());
        if a < b {
            // Occupied slots are simply skipped.
            let _ = graph.connect_param(ranked[a].0, ranked[b].0, ranked[b].1);
        }
    }
    graph
}

fn patch_strategy() -> impl Strategy<Value = (usize, usize, Vec<(usize, usize)>)> {
    (
        0usize..8,
        0usize..5,
        prop::collection::vec((0usize..16, 0usize..16), 0..12),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// Compiling an unmodified graph twice yields identical texts.
    #[test]
    fn compilation_is_deterministic((chain, lfos, edges) in patch_strategy()) {
        let graph = build(chain, lfos, &edges);
        prop_assert_eq!(graph.generate_code().unwrap(), graph.generate_code().unwrap());
    }

    /// Every module is scheduled once, after all of its producers.
    #[test]
    fn producers_precede_consumers((chain, lfos, edges) in patch_strategy()) {
        let graph = build(chain, lfos, &edges);
        let patch = graph.compile().unwrap();
        let schedule = patch.schedule();

        for (k, &id) in schedule.order().iter().enumerate() {
            prop_assert_eq!(schedule.order().iter().filter(|&&m| m == id).count(), 1);
            for producer in graph.module(id).unwrap().producers() {
                let p = schedule.position(producer);
                prop_assert!(p.is_some_and(|p| p < k), "{} not before {}", producer, id);
            }
        }
        prop_assert_eq!(schedule.order().last(), Some(&graph.sink()));
    }

    /// A node is buffered iff one of its consumers does not immediately follow it.
    #[test]
    fn buffering_matches_consumer_adjacency((chain, lfos, edges) in patch_strategy()) {
        let graph = build(chain, lfos, &edges);
        let patch = graph.compile().unwrap();
        let order = patch.schedule().order();

        for (k, node) in patch.layout().nodes().iter().enumerate() {
            let far_consumer = order.iter().enumerate().any(|(c, &m)| {
                c != k + 1 && graph.module(m).unwrap().is_fed_by(node.module)
            });
            prop_assert_eq!(node.out_buffer, far_consumer, "node {}", node.module);
        }
    }

    /// Address ranges tile the state array without gaps, and the values
    /// literal has one entry per cell.
    #[test]
    fn layout_is_a_prefix_sum((chain, lfos, edges) in patch_strategy()) {
        let graph = build(chain, lfos, &edges);
        let patch = graph.compile().unwrap();
        let nodes = patch.layout().nodes();

        prop_assert_eq!(nodes[0].pos, 0);
        for pair in nodes.windows(2) {
            prop_assert_eq!(pair[1].pos, pair[0].end());
        }
        prop_assert_eq!(nodes[nodes.len() - 1].end(), patch.state_len());

        let values = patch.values();
        prop_assert!(values.starts_with('[') && values.ends_with(']'));
        let inner = &values[1..values.len() - 1];
        prop_assert_eq!(inner.split(',').count(), patch.state_len());
    }

    /// Only the chain and the modulators that feed it are scheduled.
    #[test]
    fn unreferenced_modulators_are_dropped((chain, lfos, edges) in patch_strategy()) {
        let graph = build(chain, lfos, &edges);
        let patch = graph.compile().unwrap();

        for module in graph.modules() {
            let referenced = graph.modules().any(|m| m.is_fed_by(module.id()));
            if !referenced && module.id() != graph.sink() {
                prop_assert!(!patch.schedule().contains(module.id()));
            }
        }
    }
}
