//! Property-based tests for clique mining.
//!
//! These tests verify invariants that should hold for any co-occurrence graph:
//! - Enumerated cliques are complete and maximal
//! - Enumeration matches brute force on small graphs
//! - Graph construction is order-independent
//! - Almost-clique expansion only ever adds qualifying vertices

use coterie_core::algo::almost::expand_with_threshold;
use coterie_core::algo::cliques::{enumerate_by_component, maximal_cliques};
use coterie_core::config::EnumerationBudget;
use coterie_core::{CoOccurrenceGraph, FrozenGraph};
use proptest::prelude::*;

/// Zero-padded so label order matches index order.
fn label(i: usize) -> String {
    format!("v{:02}", i)
}

/// A graph on `n` vertices with edges chosen by `mask` over all pairs.
fn arb_graph(max_vertices: usize) -> impl Strategy<Value = (usize, Vec<bool>)> {
    (1..=max_vertices).prop_flat_map(|n| {
        let pairs = n * (n - 1) / 2;
        (Just(n), proptest::collection::vec(any::<bool>(), pairs))
    })
}

fn build(n: usize, mask: &[bool]) -> FrozenGraph {
    let mut g = CoOccurrenceGraph::new();
    for i in 0..n {
        g.add_vertex(label(i));
    }
    let mut k = 0;
    for i in 0..n {
        for j in i + 1..n {
            if mask[k] {
                g.add_co_occurrence([label(i), label(j)]);
            }
            k += 1;
        }
    }
    g.freeze(1)
}

fn is_complete(g: &FrozenGraph, clique: &[usize]) -> bool {
    clique
        .iter()
        .enumerate()
        .all(|(i, &a)| clique[i + 1..].iter().all(|&b| g.is_adjacent(a, b)))
}

fn is_maximal(g: &FrozenGraph, clique: &[usize]) -> bool {
    (0..g.vertex_count())
        .filter(|v| !clique.contains(v))
        .all(|v| !clique.iter().all(|&m| g.is_adjacent(v, m)))
}

fn brute_force(g: &FrozenGraph) -> Vec<Vec<usize>> {
    let n = g.vertex_count();
    let mut out = Vec::new();
    for mask in 1u32..(1 << n) {
        let subset: Vec<usize> = (0..n).filter(|&v| mask & (1 << v) != 0).collect();
        if is_complete(g, &subset) && is_maximal(g, &subset) {
            out.push(subset);
        }
    }
    out.sort();
    out
}

fn sorted(mut cliques: Vec<Vec<usize>>) -> Vec<Vec<usize>> {
    cliques.sort();
    cliques
}

mod enumeration_props {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn matches_brute_force((n, mask) in arb_graph(10)) {
            let g = build(n, &mask);
            prop_assert_eq!(sorted(maximal_cliques(&g)), brute_force(&g));
        }

        #[test]
        fn every_clique_complete_and_maximal((n, mask) in arb_graph(16)) {
            let g = build(n, &mask);
            for clique in maximal_cliques(&g) {
                prop_assert!(is_complete(&g, &clique), "not complete: {:?}", clique);
                prop_assert!(is_maximal(&g, &clique), "not maximal: {:?}", clique);
            }
        }

        #[test]
        fn no_clique_reported_twice((n, mask) in arb_graph(16)) {
            let g = build(n, &mask);
            let cliques = sorted(maximal_cliques(&g));
            let mut deduped = cliques.clone();
            deduped.dedup();
            prop_assert_eq!(cliques, deduped);
        }

        #[test]
        fn enumeration_idempotent((n, mask) in arb_graph(12)) {
            let g = build(n, &mask);
            prop_assert_eq!(sorted(maximal_cliques(&g)), sorted(maximal_cliques(&g)));
        }

        #[test]
        fn per_component_matches_whole_graph((n, mask) in arb_graph(12)) {
            let g = build(n, &mask);
            let by_component = enumerate_by_component(&g, &EnumerationBudget::unbounded());
            prop_assert!(by_component.skipped.is_empty());
            prop_assert_eq!(sorted(by_component.cliques), sorted(maximal_cliques(&g)));
        }
    }
}

mod graph_props {
    use super::*;

    fn arb_observations() -> impl Strategy<Value = Vec<Vec<usize>>> {
        proptest::collection::vec(proptest::collection::vec(0usize..8, 0..5), 0..12)
    }

    fn from_observations(observations: &[Vec<usize>]) -> FrozenGraph {
        let mut g = CoOccurrenceGraph::new();
        for set in observations {
            g.add_co_occurrence(set.iter().map(|&i| label(i)));
        }
        g.freeze(1)
    }

    fn snapshot(g: &FrozenGraph) -> (Vec<String>, Vec<(usize, usize, Option<u32>)>) {
        let labels = g.identities().iter().map(|p| p.id.to_string()).collect();
        let edges = g
            .edges()
            .into_iter()
            .map(|(a, b)| (a, b, g.weight(a, b)))
            .collect();
        (labels, edges)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn construction_is_order_independent(
            (observations, shuffled) in arb_observations()
                .prop_flat_map(|obs| (Just(obs.clone()), Just(obs).prop_shuffle()))
        ) {
            let a = from_observations(&observations);
            let b = from_observations(&shuffled);
            prop_assert_eq!(snapshot(&a), snapshot(&b));
        }

        #[test]
        fn no_self_loops(observations in arb_observations()) {
            let g = from_observations(&observations);
            for (a, b) in g.edges() {
                prop_assert!(a < b);
            }
        }
    }
}

mod expansion_props {
    use super::*;

    fn links_into(g: &FrozenGraph, v: usize, clique: &[usize]) -> usize {
        clique.iter().filter(|&&m| g.is_adjacent(v, m)).count()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn expansion_is_monotone_and_exact((n, mask) in arb_graph(12)) {
            let g = build(n, &mask);
            // Singletons are left out: with a threshold of zero every
            // non-neighbour would count, but only neighbours are examined.
            for clique in maximal_cliques(&g).into_iter().filter(|c| c.len() > 1) {
                let threshold = clique.len() - 1;
                let result = expand_with_threshold(&clique, &g, threshold);

                for m in &clique {
                    prop_assert!(result.members.contains(m));
                }
                for v in 0..g.vertex_count() {
                    if clique.contains(&v) {
                        continue;
                    }
                    let qualifies = links_into(&g, v, &clique) == threshold;
                    prop_assert_eq!(result.added.contains(&v), qualifies);
                }
                if result.added.is_empty() {
                    prop_assert_eq!(&result.members, &clique);
                }
            }
        }
    }
}
