//! Connected components of the co-occurrence graph.
//!
//! A clique never spans two components, so each component can be searched on
//! its own, in parallel, and with its own budget.

use crate::FrozenGraph;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

// Union-Find helper functions (at module level per clippy)
fn uf_find(parent: &mut [usize], i: usize) -> usize {
    let mut root = i;
    while parent[root] != root {
        root = parent[root];
    }
    // Path compression
    let mut cur = i;
    while parent[cur] != root {
        let next = parent[cur];
        parent[cur] = root;
        cur = next;
    }
    root
}

fn uf_union(parent: &mut [usize], rank: &mut [usize], x: usize, y: usize) {
    let px = uf_find(parent, x);
    let py = uf_find(parent, y);
    if px == py {
        return;
    }
    // Union by rank
    match rank[px].cmp(&rank[py]) {
        Ordering::Less => parent[px] = py,
        Ordering::Greater => parent[py] = px,
        Ordering::Equal => {
            parent[py] = px;
            rank[px] += 1;
        }
    }
}

/// Compute connected components as sorted vertex lists.
///
/// Components are ordered by their smallest vertex, so the output is the same
/// on every run. Isolated vertices form singleton components.
#[must_use]
pub fn connected_components(graph: &FrozenGraph) -> Vec<Vec<usize>> {
    let n = graph.vertex_count();
    if n == 0 {
        return vec![];
    }

    let mut parent: Vec<usize> = (0..n).collect();
    let mut rank: Vec<usize> = vec![0; n];

    for (a, b) in graph.edges() {
        uf_union(&mut parent, &mut rank, a, b);
    }

    // Vertices are visited in order, so each list comes out sorted.
    let mut by_root: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for v in 0..n {
        let root = uf_find(&mut parent, v);
        by_root.entry(root).or_default().push(v);
    }

    let mut components: Vec<Vec<usize>> = by_root.into_values().collect();
    components.sort_by_key(|c| c[0]);
    components
}

/// Statistics about connected components.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ComponentStats {
    /// Number of components.
    pub num_components: usize,
    /// Components with a single vertex.
    pub num_singletons: usize,
    /// Size of the largest component.
    pub max_component_size: usize,
    /// Average component size.
    pub avg_component_size: f64,
    /// Fraction of vertices in the largest component.
    pub largest_component_fraction: f64,
}

/// Compute statistics from components.
///
/// Returns zeroed stats if components is empty.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn component_stats(components: &[Vec<usize>]) -> ComponentStats {
    if components.is_empty() {
        return ComponentStats::default();
    }

    let sizes: Vec<usize> = components.iter().map(Vec::len).collect();
    let total: usize = sizes.iter().sum();
    let max_size = sizes.iter().copied().max().unwrap_or(0);

    ComponentStats {
        num_components: components.len(),
        num_singletons: sizes.iter().filter(|&&s| s == 1).count(),
        max_component_size: max_size,
        avg_component_size: total as f64 / components.len() as f64,
        largest_component_fraction: if total > 0 {
            max_size as f64 / total as f64
        } else {
            0.0
        },
    }
}
