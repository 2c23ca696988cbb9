//! Almost-clique expansion.
//!
//! A vertex outside a maximal clique `C` that is adjacent to exactly
//! `|C| - 1` members is "one edge short" of joining it. Expansion adds every
//! such vertex in a single pass.
//!
//! Neighbour counts are taken against the original members only. A vertex
//! that would qualify against the grown set but not the original one is not
//! added, and the pass is not repeated. The result is deterministic but is
//! not a fixed point. There is no cap on how many vertices join; dense regions
//! can grow a clique considerably.

use crate::FrozenGraph;
use std::collections::BTreeMap;

/// Outcome of expanding one clique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    /// Original members plus absorbed vertices, sorted.
    pub members: Vec<usize>,
    /// Absorbed vertices, sorted.
    pub added: Vec<usize>,
}

impl Expansion {
    fn unchanged(clique: &[usize]) -> Self {
        let mut members = clique.to_vec();
        members.sort_unstable();
        Self {
            members,
            added: Vec::new(),
        }
    }

    /// Whether any vertex was absorbed.
    pub fn is_modified(&self) -> bool {
        !self.added.is_empty()
    }
}

/// Running totals across a job. Observability only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpansionStats {
    /// Cliques that absorbed at least one vertex.
    pub cliques_modified: usize,
    /// Total absorbed vertices.
    pub vertices_added: usize,
}

impl ExpansionStats {
    /// Account for one expansion.
    pub fn record(&mut self, expansion: &Expansion) {
        if expansion.is_modified() {
            self.cliques_modified += 1;
            self.vertices_added += expansion.added.len();
        }
    }
}

/// Expands cliques that meet the size thresholds.
#[derive(Debug, Clone, Copy)]
pub struct AlmostCliqueExpander {
    /// Cliques below this size are never reported, so never expanded.
    pub min_clique_size: usize,
    /// Cliques below this size are reported unexpanded.
    pub min_original_size: usize,
}

impl AlmostCliqueExpander {
    /// Create an expander.
    pub fn new(min_clique_size: usize, min_original_size: usize) -> Self {
        Self {
            min_clique_size,
            min_original_size,
        }
    }

    /// Whether `clique` is large enough to be expanded.
    pub fn qualifies(&self, clique: &[usize]) -> bool {
        clique.len() >= self.min_clique_size && clique.len() >= self.min_original_size
    }

    /// Expand `clique` if it qualifies; otherwise return it unchanged.
    pub fn expand(&self, clique: &[usize], graph: &FrozenGraph) -> Expansion {
        if !self.qualifies(clique) {
            return Expansion::unchanged(clique);
        }
        expand_with_threshold(clique, graph, clique.len() - 1)
    }
}

/// Absorb every outside vertex adjacent to exactly `threshold` original members.
///
/// Runs in O(|clique| × average degree). The result always contains the
/// original clique.
pub fn expand_with_threshold(clique: &[usize], graph: &FrozenGraph, threshold: usize) -> Expansion {
    let mut members = clique.to_vec();
    members.sort_unstable();
    members.dedup();

    let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
    for &m in &members {
        for &n in graph.neighbors(m) {
            if members.binary_search(&n).is_err() {
                *counts.entry(n).or_insert(0) += 1;
            }
        }
    }

    let added: Vec<usize> = counts
        .into_iter()
        .filter(|&(_, c)| c == threshold)
        .map(|(v, _)| v)
        .collect();

    if !added.is_empty() {
        log::debug!(
            "Clique {:?} absorbed {:?}",
            members.iter().map(|&v| graph.label(v).as_str()).collect::<Vec<_>>(),
            added.iter().map(|&v| graph.label(v).as_str()).collect::<Vec<_>>()
        );
    }

    let mut expanded = members;
    expanded.extend_from_slice(&added);
    expanded.sort_unstable();
    Expansion {
        members: expanded,
        added,
    }
}
