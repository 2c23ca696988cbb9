//! Maximal clique enumeration.
//!
//! Bron–Kerbosch with pivoting (Tomita et al.). Every maximal clique of the
//! searched vertex set is reported exactly once, as a sorted vertex list. The
//! order of cliques in the output is not part of the contract.
//!
//! # Algorithm
//!
//! Each search frame holds the clique built so far `R`, the candidates `P`
//! that could still extend it, and the excluded set `X` of vertices whose
//! branches were already explored. A frame with `P` and `X` both empty
//! reports `R`. Otherwise a pivot `u` from `P ∪ X` with the most neighbours in
//! `P` is chosen, and only candidates outside `N(u)` are branched on: any
//! maximal clique through a neighbour of `u` is found from one of those
//! branches anyway. After a branch on `v`, `v` moves from `P` to `X`.
//!
//! Frames live on an explicit stack instead of the call stack, so a deep
//! search on a dense component cannot overflow the thread stack.
//!
//! # Complexity
//!
//! Output can be exponential in the component size (3^(n/3) maximal cliques
//! in the worst case). Co-occurrence graphs are sparse, but pathological
//! components exist; [`EnumerationBudget`] bounds the work per component.

use super::components::{component_stats, connected_components, ComponentStats};
use crate::config::EnumerationBudget;
use crate::{Error, FrozenGraph, Result};
use rayon::prelude::*;
use std::time::Instant;

/// How often (in frames) the wall clock is consulted.
const CLOCK_CHECK_INTERVAL: u64 = 1024;

/// One level of the search.
struct Frame {
    /// Clique built so far.
    clique: Vec<usize>,
    /// Candidates, sorted.
    candidates: Vec<usize>,
    /// Excluded, sorted.
    excluded: Vec<usize>,
    /// Candidates outside the pivot's neighbourhood, still to branch on.
    branches: Vec<usize>,
    /// Next index into `branches`.
    next: usize,
}

impl Frame {
    fn new(clique: Vec<usize>, candidates: Vec<usize>, excluded: Vec<usize>) -> Self {
        Self {
            clique,
            candidates,
            excluded,
            branches: Vec::new(),
            next: 0,
        }
    }
}

/// Work counter shared by one component's search.
struct Meter<'b> {
    budget: &'b EnumerationBudget,
    vertices: usize,
    frames: u64,
    started: Instant,
}

impl<'b> Meter<'b> {
    fn new(budget: &'b EnumerationBudget, vertices: usize) -> Self {
        Self {
            budget,
            vertices,
            frames: 0,
            started: Instant::now(),
        }
    }

    fn tick(&mut self) -> Result<()> {
        self.frames += 1;
        if let Some(max) = self.budget.max_frames {
            if self.frames > max {
                return Err(Error::BudgetExceeded {
                    vertices: self.vertices,
                    reason: format!("more than {max} search frames"),
                });
            }
        }
        if let Some(limit) = self.budget.max_duration {
            if self.frames % CLOCK_CHECK_INTERVAL == 0 && self.started.elapsed() > limit {
                return Err(Error::BudgetExceeded {
                    vertices: self.vertices,
                    reason: format!("exceeded {limit:?}"),
                });
            }
        }
        Ok(())
    }
}

/// All maximal cliques of the whole graph, without limits.
///
/// Isolated vertices come back as singleton cliques; size filtering is left
/// to the caller.
///
/// # Example
///
/// ```rust
/// use coterie_core::algo::cliques::maximal_cliques;
/// use coterie_core::FrozenGraph;
///
/// let g = FrozenGraph::from_edges(&[], &[("A", "B"), ("B", "C"), ("A", "C"), ("C", "D")]);
/// let mut cliques = maximal_cliques(&g);
/// cliques.sort();
/// // A=0, B=1, C=2, D=3
/// assert_eq!(cliques, vec![vec![0, 1, 2], vec![2, 3]]);
/// ```
#[must_use]
pub fn maximal_cliques(graph: &FrozenGraph) -> Vec<Vec<usize>> {
    let all: Vec<usize> = (0..graph.vertex_count()).collect();
    let unbounded = EnumerationBudget::unbounded();
    // Without a budget the search cannot fail.
    maximal_cliques_in(graph, &all, &unbounded).unwrap_or_default()
}

/// Maximal cliques of the subgraph induced by `vertices`.
///
/// `vertices` need not be sorted. Fails with [`Error::BudgetExceeded`] when the
/// budget trips; partial results are discarded.
pub fn maximal_cliques_in(
    graph: &FrozenGraph,
    vertices: &[usize],
    budget: &EnumerationBudget,
) -> Result<Vec<Vec<usize>>> {
    if let Some(max) = budget.max_component_size {
        if vertices.len() > max {
            return Err(Error::BudgetExceeded {
                vertices: vertices.len(),
                reason: format!("component larger than {max} vertices"),
            });
        }
    }

    let mut candidates = vertices.to_vec();
    candidates.sort_unstable();
    candidates.dedup();

    let mut meter = Meter::new(budget, candidates.len());
    let mut found = Vec::new();
    let mut stack = vec![Frame::new(Vec::new(), candidates, Vec::new())];

    while let Some(frame) = stack.last_mut() {
        if frame.next == 0 && frame.branches.is_empty() {
            // First visit of this frame.
            if frame.candidates.is_empty() {
                if frame.excluded.is_empty() && !frame.clique.is_empty() {
                    let mut clique = std::mem::take(&mut frame.clique);
                    clique.sort_unstable();
                    found.push(clique);
                }
                stack.pop();
                continue;
            }
            let pivot = choose_pivot(graph, &frame.candidates, &frame.excluded);
            frame.branches = difference(&frame.candidates, graph.neighbors(pivot));
        }

        if frame.next >= frame.branches.len() {
            stack.pop();
            continue;
        }

        let v = frame.branches[frame.next];
        frame.next += 1;

        let neighbors = graph.neighbors(v);
        let mut clique = frame.clique.clone();
        clique.push(v);
        let child = Frame::new(
            clique,
            intersection(&frame.candidates, neighbors),
            intersection(&frame.excluded, neighbors),
        );

        remove_sorted(&mut frame.candidates, v);
        insert_sorted(&mut frame.excluded, v);

        meter.tick()?;
        stack.push(child);
    }

    log::trace!(
        "Enumerated {} cliques over {} vertices in {} frames",
        found.len(),
        meter.vertices,
        meter.frames
    );
    Ok(found)
}

/// A component whose search was abandoned.
#[derive(Debug, Clone)]
pub struct SkippedComponent {
    /// Vertices of the component.
    pub vertices: Vec<usize>,
    /// Why it was skipped.
    pub reason: String,
}

/// Result of a component-parallel search.
#[derive(Debug, Clone, Default)]
pub struct Enumeration {
    /// Maximal cliques from every component that finished.
    pub cliques: Vec<Vec<usize>>,
    /// Components abandoned because of the budget.
    pub skipped: Vec<SkippedComponent>,
    /// Number of components searched (including skipped ones).
    pub components: usize,
    /// Size distribution of the components.
    pub component_stats: ComponentStats,
}

/// Enumerate maximal cliques component by component, in parallel.
///
/// Each component gets its own budget. A component that exceeds it is
/// reported in [`Enumeration::skipped`] and logged; the others are unaffected.
/// Cliques come back grouped by component in component order.
#[must_use]
pub fn enumerate_by_component(graph: &FrozenGraph, budget: &EnumerationBudget) -> Enumeration {
    let components = connected_components(graph);
    let stats = component_stats(&components);

    let outcomes: Vec<(Vec<usize>, Result<Vec<Vec<usize>>>)> = components
        .into_par_iter()
        .map(|component| {
            let result = if component.len() == 1 {
                // Nothing to search; skip the frame machinery.
                Ok(vec![component.clone()])
            } else {
                maximal_cliques_in(graph, &component, budget)
            };
            (component, result)
        })
        .collect();

    let mut enumeration = Enumeration {
        components: outcomes.len(),
        component_stats: stats,
        ..Enumeration::default()
    };
    for (component, result) in outcomes {
        match result {
            Ok(cliques) => enumeration.cliques.extend(cliques),
            Err(e) => {
                log::warn!("Component skipped ({} vertices): {}", component.len(), e);
                enumeration.skipped.push(SkippedComponent {
                    vertices: component,
                    reason: e.to_string(),
                });
            }
        }
    }
    enumeration
}

/// Vertex of `candidates ∪ excluded` with the most neighbours in `candidates`.
///
/// Ties go to the first vertex seen (candidates first, ascending).
fn choose_pivot(graph: &FrozenGraph, candidates: &[usize], excluded: &[usize]) -> usize {
    let mut best = candidates[0];
    let mut best_overlap = 0;
    let mut first = true;
    for &u in candidates.iter().chain(excluded) {
        let overlap = intersection_len(candidates, graph.neighbors(u));
        if first || overlap > best_overlap {
            best = u;
            best_overlap = overlap;
            first = false;
            if best_overlap == candidates.len() {
                break;
            }
        }
    }
    best
}

fn intersection(a: &[usize], b: &[usize]) -> Vec<usize> {
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}

fn intersection_len(a: &[usize], b: &[usize]) -> usize {
    let (mut i, mut j, mut n) = (0, 0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                n += 1;
                i += 1;
                j += 1;
            }
        }
    }
    n
}

fn difference(a: &[usize], b: &[usize]) -> Vec<usize> {
    a.iter()
        .copied()
        .filter(|x| b.binary_search(x).is_err())
        .collect()
}

fn remove_sorted(list: &mut Vec<usize>, v: usize) {
    if let Ok(pos) = list.binary_search(&v) {
        list.remove(pos);
    }
}

fn insert_sorted(list: &mut Vec<usize>, v: usize) {
    if let Err(pos) = list.binary_search(&v) {
        list.insert(pos, v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn sorted(mut cliques: Vec<Vec<usize>>) -> Vec<Vec<usize>> {
        cliques.sort();
        cliques
    }

    #[test]
    fn test_triangle_with_pendant() {
        // A=0, B=1, C=2, D=3, E=4
        let g = FrozenGraph::from_edges(
            &["E"],
            &[("A", "B"), ("B", "C"), ("A", "C"), ("A", "D"), ("B", "D")],
        );
        let cliques = sorted(maximal_cliques(&g));
        assert_eq!(cliques, vec![vec![0, 1, 2], vec![0, 1, 3], vec![4]]);
    }

    #[test]
    fn test_complete_graph_single_clique() {
        let names = ["A", "B", "C", "D", "E", "F"];
        let mut edges = Vec::new();
        for (i, a) in names.iter().enumerate() {
            for b in &names[i + 1..] {
                edges.push((*a, *b));
            }
        }
        let g = FrozenGraph::from_edges(&[], &edges);
        assert_eq!(maximal_cliques(&g), vec![vec![0, 1, 2, 3, 4, 5]]);
    }

    #[test]
    fn test_cycle_of_four() {
        // A-B-C-D-A: four maximal edges, no triangles.
        let g = FrozenGraph::from_edges(&[], &[("A", "B"), ("B", "C"), ("C", "D"), ("D", "A")]);
        let cliques = sorted(maximal_cliques(&g));
        assert_eq!(cliques, vec![vec![0, 1], vec![0, 3], vec![1, 2], vec![2, 3]]);
    }

    #[test]
    fn test_empty_graph() {
        let g = FrozenGraph::default();
        assert!(maximal_cliques(&g).is_empty());
    }

    #[test]
    fn test_idempotent() {
        let g = FrozenGraph::from_edges(
            &[],
            &[("A", "B"), ("B", "C"), ("A", "C"), ("C", "D"), ("D", "E"), ("C", "E")],
        );
        assert_eq!(sorted(maximal_cliques(&g)), sorted(maximal_cliques(&g)));
    }

    #[test]
    fn test_subset_search() {
        let g = FrozenGraph::from_edges(&[], &[("A", "B"), ("B", "C"), ("A", "C")]);
        let budget = EnumerationBudget::unbounded();
        // Only A and C: the induced subgraph is a single edge.
        let cliques = maximal_cliques_in(&g, &[2, 0], &budget).unwrap();
        assert_eq!(cliques, vec![vec![0, 2]]);
    }

    #[test]
    fn test_component_size_budget() {
        let g = FrozenGraph::from_edges(
            &["Z"],
            &[("A", "B"), ("B", "C"), ("A", "C"), ("X", "Y")],
        );
        let budget = EnumerationBudget {
            max_component_size: Some(2),
            ..EnumerationBudget::default()
        };
        let result = enumerate_by_component(&g, &budget);

        assert_eq!(result.components, 3);
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.skipped[0].vertices, vec![0, 1, 2]);
        // X=3, Y=4, Z=5
        assert_eq!(sorted(result.cliques), vec![vec![3, 4], vec![5]]);
    }

    #[test]
    fn test_frame_budget() {
        let g = FrozenGraph::from_edges(&[], &[("A", "B"), ("B", "C"), ("A", "C")]);
        let budget = EnumerationBudget {
            max_frames: Some(1),
            ..EnumerationBudget::default()
        };
        let err = maximal_cliques_in(&g, &[0, 1, 2], &budget).unwrap_err();
        assert!(matches!(err, Error::BudgetExceeded { vertices: 3, .. }));
    }

    #[test]
    fn test_duration_budget_skips_component() {
        // Cocktail-party graph on 24 vertices: complete minus a perfect
        // matching, so 2^12 maximal cliques and well over 1024 frames.
        let names: Vec<String> = (0..24).map(|i| format!("p{:02}", i)).collect();
        let mut edges = Vec::new();
        for i in 0..names.len() {
            for j in i + 1..names.len() {
                if !(i % 2 == 0 && j == i + 1) {
                    edges.push((names[i].as_str(), names[j].as_str()));
                }
            }
        }
        let g = FrozenGraph::from_edges(&[], &edges);
        let budget = EnumerationBudget {
            max_duration: Some(Duration::from_nanos(1)),
            ..EnumerationBudget::default()
        };

        let result = enumerate_by_component(&g, &budget);
        assert_eq!(result.components, 1);
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.skipped[0].vertices.len(), 24);
        assert!(result.cliques.is_empty());
    }

    #[test]
    fn test_generous_budget_matches_unbounded() {
        let g = FrozenGraph::from_edges(
            &["Q"],
            &[("A", "B"), ("B", "C"), ("A", "C"), ("C", "D")],
        );
        let budget = EnumerationBudget {
            max_component_size: Some(100),
            max_frames: Some(10_000),
            max_duration: Some(Duration::from_secs(60)),
        };
        let by_component = enumerate_by_component(&g, &budget);
        assert!(by_component.skipped.is_empty());
        assert_eq!(sorted(by_component.cliques), sorted(maximal_cliques(&g)));
    }

    #[test]
    fn test_set_helpers() {
        assert_eq!(intersection(&[1, 3, 5, 7], &[2, 3, 7, 9]), vec![3, 7]);
        assert_eq!(intersection_len(&[1, 3, 5, 7], &[2, 3, 7, 9]), 2);
        assert_eq!(difference(&[1, 3, 5, 7], &[3, 7]), vec![1, 5]);

        let mut v = vec![1, 5];
        insert_sorted(&mut v, 3);
        insert_sorted(&mut v, 3);
        assert_eq!(v, vec![1, 3, 5]);
        remove_sorted(&mut v, 1);
        assert_eq!(v, vec![3, 5]);
    }
}
