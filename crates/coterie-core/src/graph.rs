use crate::links::LinkTable;
use crate::{IdentityId, PersonIdentity};
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use std::collections::{BTreeSet, HashMap};

/// Co-occurrence graph under construction.
///
/// Vertices are canonical identities; an edge joins two identities that were
/// observed together, weighted by how many observations contained the pair.
/// Vertices and edges are only ever added. Writes must be serialised by the
/// caller; once ingestion is over, [`CoOccurrenceGraph::freeze`] produces the
/// read-only [`FrozenGraph`] that clique search runs on.
///
/// # Example
///
/// ```rust
/// use coterie_core::CoOccurrenceGraph;
///
/// let mut graph = CoOccurrenceGraph::new();
/// graph.add_co_occurrence(["Moro", "Andreotti", "Berlinguer"]);
/// graph.add_co_occurrence(["Moro", "Andreotti"]);
///
/// assert_eq!(graph.vertex_count(), 3);
/// assert_eq!(graph.edge_count(), 3);
/// assert_eq!(graph.weight("Moro", "Andreotti"), Some(2));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CoOccurrenceGraph {
    graph: UnGraph<PersonIdentity, u32>,
    index: HashMap<IdentityId, NodeIndex>,
}

impl CoOccurrenceGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one observation: every identity becomes a vertex and every
    /// unordered pair an edge.
    ///
    /// Duplicates inside `identities` collapse, so no self-loops arise. Empty
    /// and singleton sets only add vertices.
    pub fn add_co_occurrence<I, S>(&mut self, identities: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<IdentityId>,
    {
        let members: BTreeSet<IdentityId> = identities.into_iter().map(Into::into).collect();
        let nodes: Vec<NodeIndex> = members
            .into_iter()
            .map(|id| self.get_or_create(id))
            .collect();

        for (i, &a) in nodes.iter().enumerate() {
            for &b in &nodes[i + 1..] {
                self.bump_edge(a, b, 1);
            }
        }
    }

    /// Add a pair with an explicit weight, as read from a pair export.
    ///
    /// Weights of repeated pairs add up. A pair of equal labels only adds the
    /// vertex.
    pub fn add_weighted_pair(
        &mut self,
        a: impl Into<IdentityId>,
        b: impl Into<IdentityId>,
        weight: u32,
    ) {
        let a = self.get_or_create(a.into());
        let b = self.get_or_create(b.into());
        if a != b && weight > 0 {
            self.bump_edge(a, b, weight);
        }
    }

    /// Insert a vertex if absent.
    pub fn add_vertex(&mut self, id: impl Into<IdentityId>) {
        self.get_or_create(id.into());
    }

    /// Remember that `raw` was resolved to `id`.
    pub fn note_mention(&mut self, id: impl Into<IdentityId>, raw: impl Into<String>) {
        let idx = self.get_or_create(id.into());
        self.graph[idx].add_mention(raw);
    }

    fn get_or_create(&mut self, id: IdentityId) -> NodeIndex {
        if let Some(&idx) = self.index.get(&id) {
            return idx;
        }
        let idx = self.graph.add_node(PersonIdentity::new(id.clone()));
        self.index.insert(id, idx);
        idx
    }

    fn bump_edge(&mut self, a: NodeIndex, b: NodeIndex, by: u32) {
        match self.graph.find_edge(a, b) {
            Some(e) => self.graph[e] = self.graph[e].saturating_add(by),
            None => {
                self.graph.add_edge(a, b, by);
            }
        }
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of distinct edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether `id` has been observed.
    pub fn contains(&self, id: impl Into<IdentityId>) -> bool {
        self.index.contains_key(&id.into())
    }

    /// Co-occurrence count of a pair, if they are connected.
    pub fn weight(&self, a: impl Into<IdentityId>, b: impl Into<IdentityId>) -> Option<u32> {
        let a = self.index.get(&a.into())?;
        let b = self.index.get(&b.into())?;
        self.graph.find_edge(*a, *b).map(|e| self.graph[e])
    }

    /// Identity record for a label.
    pub fn identity(&self, id: impl Into<IdentityId>) -> Option<&PersonIdentity> {
        self.index.get(&id.into()).map(|&idx| &self.graph[idx])
    }

    /// Every edge as `(a, b, weight)` with `a < b`, heaviest first, then by label.
    pub fn weighted_pairs(&self) -> Vec<(IdentityId, IdentityId, u32)> {
        let mut pairs: Vec<_> = self
            .graph
            .edge_references()
            .map(|e| {
                let x = &self.graph[e.source()].id;
                let y = &self.graph[e.target()].id;
                let (a, b) = if x <= y { (x, y) } else { (y, x) };
                (a.clone(), b.clone(), *e.weight())
            })
            .collect();
        pairs.sort_by(|p, q| q.2.cmp(&p.2).then_with(|| (&p.0, &p.1).cmp(&(&q.0, &q.1))));
        pairs
    }

    /// Stop ingesting and produce the read-only graph.
    ///
    /// Edges lighter than `min_edge_weight` are dropped; vertices never are.
    /// Vertex numbering in the result follows label order, so the frozen graph
    /// does not depend on the order observations arrived in.
    pub fn freeze(self, min_edge_weight: u32) -> FrozenGraph {
        let mut identities: Vec<PersonIdentity> = Vec::with_capacity(self.graph.node_count());
        let mut old_to_new = vec![0usize; self.graph.node_count()];

        let mut order: Vec<NodeIndex> = self.graph.node_indices().collect();
        order.sort_by(|a, b| self.graph[*a].id.cmp(&self.graph[*b].id));
        for (new, old) in order.iter().enumerate() {
            old_to_new[old.index()] = new;
            identities.push(self.graph[*old].clone());
        }

        let mut neighbors: Vec<Vec<usize>> = vec![Vec::new(); identities.len()];
        let mut weights = HashMap::new();
        let mut dropped = 0usize;
        for edge in self.graph.edge_references() {
            if *edge.weight() < min_edge_weight {
                dropped += 1;
                continue;
            }
            let a = old_to_new[edge.source().index()];
            let b = old_to_new[edge.target().index()];
            neighbors[a].push(b);
            neighbors[b].push(a);
            weights.insert((a.min(b), a.max(b)), *edge.weight());
        }
        for list in &mut neighbors {
            list.sort_unstable();
        }
        if dropped > 0 {
            log::info!(
                "Dropped {} edges below weight {}",
                dropped,
                min_edge_weight
            );
        }

        let index = identities
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id.clone(), i))
            .collect();

        FrozenGraph {
            identities,
            index,
            neighbors,
            weights,
        }
    }
}

/// Read-only co-occurrence graph.
///
/// Vertices are numbered `0..vertex_count()` in label order; adjacency lists
/// are sorted. Safe to share across threads.
#[derive(Debug, Clone, Default)]
pub struct FrozenGraph {
    identities: Vec<PersonIdentity>,
    index: HashMap<IdentityId, usize>,
    neighbors: Vec<Vec<usize>>,
    weights: HashMap<(usize, usize), u32>,
}

/// Summary numbers for a frozen graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphStats {
    /// Number of vertices.
    pub vertex_count: usize,
    /// Number of edges.
    pub edge_count: usize,
    /// Vertices with no edge.
    pub isolated_count: usize,
    /// Mean degree.
    pub avg_degree: f64,
    /// Largest degree.
    pub max_degree: usize,
}

impl FrozenGraph {
    /// Build directly from an edge list; handy for tests and small tools.
    pub fn from_edges<'a>(vertices: &[&'a str], edges: &[(&'a str, &'a str)]) -> Self {
        let mut g = CoOccurrenceGraph::new();
        for v in vertices {
            g.add_vertex(*v);
        }
        for (a, b) in edges {
            g.add_co_occurrence([*a, *b]);
        }
        g.freeze(1)
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.identities.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.weights.len()
    }

    /// Vertex number of a label.
    pub fn vertex(&self, id: &IdentityId) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Label of a vertex.
    pub fn label(&self, v: usize) -> &IdentityId {
        &self.identities[v].id
    }

    /// Full identity record of a vertex.
    pub fn identity(&self, v: usize) -> &PersonIdentity {
        &self.identities[v]
    }

    /// All identities in vertex order.
    pub fn identities(&self) -> &[PersonIdentity] {
        &self.identities
    }

    /// Sorted neighbours of `v`.
    pub fn neighbors(&self, v: usize) -> &[usize] {
        &self.neighbors[v]
    }

    /// Degree of `v`.
    pub fn degree(&self, v: usize) -> usize {
        self.neighbors[v].len()
    }

    /// Whether `a` and `b` share an edge.
    pub fn is_adjacent(&self, a: usize, b: usize) -> bool {
        a != b && self.neighbors[a].binary_search(&b).is_ok()
    }

    /// Edge weight between two vertices.
    pub fn weight(&self, a: usize, b: usize) -> Option<u32> {
        self.weights.get(&(a.min(b), a.max(b))).copied()
    }

    /// Sorted `(a, b)` pairs with `a < b`.
    pub fn edges(&self) -> Vec<(usize, usize)> {
        let mut edges: Vec<_> = self.weights.keys().copied().collect();
        edges.sort_unstable();
        edges
    }

    /// Attach each identity's best external reference.
    pub fn attach_references(&mut self, links: &LinkTable) {
        for person in &mut self.identities {
            person.reference = links.best(&person.id);
        }
    }

    /// Degree and size summary.
    #[allow(clippy::cast_precision_loss)]
    pub fn stats(&self) -> GraphStats {
        let n = self.vertex_count();
        let degrees = self.neighbors.iter().map(Vec::len);
        GraphStats {
            vertex_count: n,
            edge_count: self.edge_count(),
            isolated_count: self.neighbors.iter().filter(|l| l.is_empty()).count(),
            avg_degree: if n > 0 {
                2.0 * self.edge_count() as f64 / n as f64
            } else {
                0.0
            },
            max_degree: degrees.max().unwrap_or(0),
        }
    }
}
