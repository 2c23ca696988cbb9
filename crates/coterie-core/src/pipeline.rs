//! The clique-mining job: ingest, freeze, enumerate and expand.
//!
//! ```text
//! documents ──(parallel)──> Collected ──(single writer)──> CoOccurrenceGraph
//!                                                              │ freeze
//!                                                              v
//!            cliques <── expand <── enumerate per component ── FrozenGraph
//! ```
//!
//! Lookup tables are passed in as [`Snapshots`]; nothing here keeps global
//! state.

use crate::algo::almost::{AlmostCliqueExpander, ExpansionStats};
use crate::algo::cliques::enumerate_by_component;
use crate::collect::{Blacklist, CoOccurrenceCollector, CollectStats, Collected, Document};
use crate::config::{GraphConfig, PipelineConfig};
use crate::links::LinkTable;
use crate::resolve::{BirthYearLookup, IdentityResolver};
use crate::{CoOccurrenceGraph, FrozenGraph, IdentityId, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Immutable lookup tables shared by every pipeline stage.
#[derive(Clone, Copy)]
pub struct Snapshots<'a> {
    /// Mention -> canonical identity.
    pub resolver: &'a dyn IdentityResolver,
    /// Reference -> birth year.
    pub birth_years: &'a dyn BirthYearLookup,
    /// Identities kept out of the graph.
    pub blacklist: &'a Blacklist,
}

/// Collect observations from many documents in parallel.
pub fn collect_documents(documents: &[Document], collector: &CoOccurrenceCollector<'_>) -> Collected {
    documents
        .par_iter()
        .map(|doc| collector.collect(doc))
        .reduce(Collected::default, |mut acc, batch| {
            acc.merge(batch);
            acc
        })
}

/// Ingestion counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    /// Collector counters.
    pub collect: CollectStats,
    /// Identity sets added to the graph.
    pub observations: usize,
    /// Weighted pairs added to the graph.
    pub pairs: usize,
    /// Input records skipped as malformed.
    pub malformed: usize,
}

/// Single-writer ingestion phase.
///
/// Everything that mutates the graph goes through here, one call at a time.
#[derive(Debug, Default)]
pub struct Ingest {
    graph: CoOccurrenceGraph,
    links: LinkTable,
    mentions: Vec<(IdentityId, String)>,
    stats: IngestStats,
}

/// Output of [`Ingest::freeze`].
#[derive(Debug)]
pub struct Ingested {
    /// Frozen graph with best references attached.
    pub graph: FrozenGraph,
    /// Every identity's references.
    pub links: LinkTable,
    /// Counters.
    pub stats: IngestStats,
}

impl Ingest {
    /// Start an empty ingestion.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a batch produced by the collector.
    pub fn add_collected(&mut self, collected: Collected) {
        for set in collected.observations {
            self.add_observation(set);
        }
        self.mentions.extend(collected.mentions);
        self.links.merge(collected.links);
        self.stats.collect.merge(&collected.stats);
    }

    /// Add one identity set.
    pub fn add_observation(&mut self, identities: BTreeSet<IdentityId>) {
        self.graph.add_co_occurrence(identities);
        self.stats.observations += 1;
    }

    /// Add one weighted pair.
    pub fn add_pair(&mut self, a: IdentityId, b: IdentityId, weight: u32) {
        self.graph.add_weighted_pair(a, b, weight);
        self.stats.pairs += 1;
    }

    /// Count records an upstream reader had to skip.
    pub fn note_malformed(&mut self, count: usize) {
        self.stats.malformed += count;
    }

    /// Graph built so far.
    pub fn graph(&self) -> &CoOccurrenceGraph {
        &self.graph
    }

    /// Counters so far.
    pub fn stats(&self) -> &IngestStats {
        &self.stats
    }

    /// End ingestion.
    ///
    /// Mentions are attached only to identities that made it into the graph,
    /// then the graph is frozen and every vertex gets its best reference.
    pub fn freeze(mut self, config: &GraphConfig) -> Ingested {
        for (id, raw) in std::mem::take(&mut self.mentions) {
            if self.graph.contains(id.clone()) {
                self.graph.note_mention(id, raw);
            }
        }
        let ambiguous = self.links.ambiguous_count();
        if ambiguous > 0 {
            log::warn!(
                "{} identities have more than one surviving reference; keeping the top-ranked one",
                ambiguous
            );
        }
        let mut graph = self.graph.freeze(config.min_edge_weight);
        graph.attach_references(&self.links);
        Ingested {
            graph,
            links: self.links,
            stats: self.stats,
        }
    }
}

/// Clique-phase counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CliqueStats {
    /// Maximal cliques found, before size filtering.
    pub maximal_cliques: usize,
    /// Cliques written.
    pub cliques: usize,
    /// Maximal cliques below the minimum size.
    pub below_min_size: usize,
    /// Cliques that absorbed at least one vertex.
    pub cliques_modified: usize,
    /// Vertices absorbed in total.
    pub vertices_added: usize,
    /// Expanded cliques identical to an earlier one and written once.
    pub duplicates_merged: usize,
    /// Connected components searched.
    pub components: usize,
    /// Components skipped because of the budget.
    pub components_skipped: usize,
    /// Vertices in skipped components.
    pub vertices_skipped: usize,
    /// Vertices in the largest component.
    pub largest_component: usize,
    /// Components with a single vertex.
    pub singleton_components: usize,
    /// Size -> count, before expansion.
    pub size_histogram: BTreeMap<usize, usize>,
    /// Size -> count, after expansion.
    pub expanded_size_histogram: BTreeMap<usize, usize>,
    /// Mean size of written cliques.
    pub avg_size: f64,
}

/// Cliques ready to be written.
#[derive(Debug, Clone, Default)]
pub struct CliqueReport {
    /// Each clique's members in label order; cliques in lexicographic order.
    pub cliques: Vec<Vec<IdentityId>>,
    /// Counters.
    pub stats: CliqueStats,
}

/// Enumerate, filter and optionally expand the cliques of a frozen graph.
#[allow(clippy::cast_precision_loss)]
pub fn mine_cliques(graph: &FrozenGraph, config: &PipelineConfig) -> CliqueReport {
    let c = &config.cliques;
    let enumeration = enumerate_by_component(graph, &config.budget);
    let expander = AlmostCliqueExpander::new(c.min_clique_size, c.min_almost_clique_size);

    let mut stats = CliqueStats {
        maximal_cliques: enumeration.cliques.len(),
        components: enumeration.components,
        components_skipped: enumeration.skipped.len(),
        vertices_skipped: enumeration.skipped.iter().map(|s| s.vertices.len()).sum(),
        largest_component: enumeration.component_stats.max_component_size,
        singleton_components: enumeration.component_stats.num_singletons,
        ..CliqueStats::default()
    };
    let mut expansion = ExpansionStats::default();
    let mut seen: HashSet<Vec<usize>> = HashSet::new();
    let mut kept: Vec<Vec<usize>> = Vec::new();

    for clique in enumeration.cliques {
        if clique.len() < c.min_clique_size {
            stats.below_min_size += 1;
            continue;
        }
        *stats.size_histogram.entry(clique.len()).or_insert(0) += 1;

        let members = if c.use_almost {
            let expanded = expander.expand(&clique, graph);
            expansion.record(&expanded);
            expanded.members
        } else {
            clique
        };
        *stats.expanded_size_histogram.entry(members.len()).or_insert(0) += 1;

        if seen.contains(&members) {
            stats.duplicates_merged += 1;
            continue;
        }
        seen.insert(members.clone());
        kept.push(members);
    }

    // Vertex numbers follow label order, so this sorts by labels too.
    kept.sort();

    stats.cliques = kept.len();
    stats.cliques_modified = expansion.cliques_modified;
    stats.vertices_added = expansion.vertices_added;
    let total: usize = kept.iter().map(Vec::len).sum();
    stats.avg_size = if kept.is_empty() {
        0.0
    } else {
        total as f64 / kept.len() as f64
    };

    let cliques = kept
        .into_iter()
        .map(|members| members.into_iter().map(|v| graph.label(v).clone()).collect())
        .collect();

    CliqueReport { cliques, stats }
}

/// Statistics of a whole run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunStats {
    /// Vertices in the frozen graph.
    pub vertices: usize,
    /// Edges in the frozen graph.
    pub edges: usize,
    /// Vertices without any edge.
    pub isolated: usize,
    /// Largest vertex degree.
    pub max_degree: usize,
    /// Identities with more than one surviving reference.
    pub ambiguous_links: usize,
    /// Ingestion counters.
    pub ingest: IngestStats,
    /// Clique counters.
    pub cliques: CliqueStats,
}

impl RunStats {
    /// Assemble from the phase outputs.
    pub fn new(ingested: &Ingested, report: &CliqueReport) -> Self {
        let graph = ingested.graph.stats();
        Self {
            vertices: graph.vertex_count,
            edges: graph.edge_count,
            isolated: graph.isolated_count,
            max_degree: graph.max_degree,
            ambiguous_links: ingested.links.ambiguous_count(),
            ingest: ingested.stats,
            cliques: report.stats.clone(),
        }
    }

    /// Log the summary at info level.
    pub fn log_summary(&self) {
        log::info!(
            "Graph: {} vertices ({} isolated), {} edges, max degree {}",
            self.vertices,
            self.isolated,
            self.edges,
            self.max_degree
        );
        log::info!(
            "Components: {} (largest {} vertices)",
            self.cliques.components,
            self.cliques.largest_component
        );
        log::info!(
            "Documents: {}, sentences: {}, observations: {}, malformed records: {}",
            self.ingest.collect.documents,
            self.ingest.collect.sentences,
            self.ingest.observations,
            self.ingest.malformed
        );
        log::info!(
            "Skipped for birth year: {}",
            self.ingest.collect.skipped_birth_year
        );
        log::info!("Cliques: {}", self.cliques.cliques);
        log::info!("Clique stats: {:?}", self.cliques.size_histogram);
        log::info!("Clique stats (expanded): {:?}", self.cliques.expanded_size_histogram);
        log::info!("Modified cliques: {}", self.cliques.cliques_modified);
        log::info!("Added persons to cliques: {}", self.cliques.vertices_added);
        if self.cliques.components_skipped > 0 {
            log::warn!(
                "Skipped {} components ({} vertices) over budget",
                self.cliques.components_skipped,
                self.cliques.vertices_skipped
            );
        }
    }
}

/// Everything a run produces.
#[derive(Debug)]
pub struct RunOutput {
    /// Frozen graph.
    pub graph: FrozenGraph,
    /// Link table.
    pub links: LinkTable,
    /// Cliques.
    pub report: CliqueReport,
    /// Statistics.
    pub stats: RunStats,
}

/// Run the whole job over in-memory documents.
///
/// Fails only on invalid configuration.
///
/// # Example
///
/// ```rust
/// use coterie_core::collect::{Blacklist, Document, Mention, Sentence};
/// use coterie_core::pipeline::{run_documents, Snapshots};
/// use coterie_core::resolve::{BirthYears, RawMentions};
/// use coterie_core::PipelineConfig;
///
/// let doc = Document {
///     id: "d".into(),
///     sentences: vec![Sentence {
///         mentions: vec![Mention::person("A"), Mention::person("B"), Mention::person("C")],
///     }],
/// };
/// let years = BirthYears::new();
/// let blacklist = Blacklist::new();
/// let snapshots = Snapshots { resolver: &RawMentions, birth_years: &years, blacklist: &blacklist };
///
/// let out = run_documents(&[doc], &PipelineConfig::default(), snapshots).unwrap();
/// assert_eq!(out.report.cliques.len(), 1);
/// ```
pub fn run_documents(
    documents: &[Document],
    config: &PipelineConfig,
    snapshots: Snapshots<'_>,
) -> Result<RunOutput> {
    config.validate()?;
    let collector = CoOccurrenceCollector::new(
        config.collector,
        snapshots.resolver,
        snapshots.birth_years,
        snapshots.blacklist,
    );
    let mut ingest = Ingest::new();
    ingest.add_collected(collect_documents(documents, &collector));
    Ok(finish(ingest, config))
}

/// Freeze an ingestion and mine it.
pub fn finish(ingest: Ingest, config: &PipelineConfig) -> RunOutput {
    let ingested = ingest.freeze(&config.graph);
    log::info!("Finding cliques");
    let report = mine_cliques(&ingested.graph, config);
    let stats = RunStats::new(&ingested, &report);
    stats.log_summary();
    RunOutput {
        graph: ingested.graph,
        links: ingested.links,
        report,
        stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::{LinkCandidate, Mention, Sentence};
    use crate::resolve::{BirthYears, RawMentions};
    use crate::Error;

    fn labels(report: &CliqueReport) -> Vec<Vec<&str>> {
        report
            .cliques
            .iter()
            .map(|c| c.iter().map(IdentityId::as_str).collect())
            .collect()
    }

    fn pendant_graph() -> FrozenGraph {
        FrozenGraph::from_edges(
            &["E"],
            &[("A", "B"), ("B", "C"), ("A", "C"), ("A", "D"), ("B", "D")],
        )
    }

    #[test]
    fn test_min_size_filter_without_expansion() {
        let config = PipelineConfig::default();
        let report = mine_cliques(&pendant_graph(), &config);

        // {A,B,D} is a triangle too; E is a singleton and filtered.
        assert_eq!(labels(&report), vec![vec!["A", "B", "C"], vec!["A", "B", "D"]]);
        assert_eq!(report.stats.maximal_cliques, 3);
        assert_eq!(report.stats.below_min_size, 1);
        assert_eq!(report.stats.cliques_modified, 0);
        assert_eq!(report.stats.components, 2);
        assert_eq!(report.stats.largest_component, 4);
        assert_eq!(report.stats.singleton_components, 1);
    }

    #[test]
    fn test_expansion_absorbs_and_merges() {
        let mut config = PipelineConfig::default();
        config.cliques.use_almost = true;
        config.cliques.min_almost_clique_size = 3;
        let report = mine_cliques(&pendant_graph(), &config);

        // Both triangles grow to {A,B,C,D}; it is written once.
        assert_eq!(labels(&report), vec![vec!["A", "B", "C", "D"]]);
        assert_eq!(report.stats.cliques_modified, 2);
        assert_eq!(report.stats.vertices_added, 2);
        assert_eq!(report.stats.duplicates_merged, 1);
        assert_eq!(report.stats.expanded_size_histogram.get(&4), Some(&2));
    }

    #[test]
    fn test_expansion_respects_min_original_size() {
        let mut config = PipelineConfig::default();
        config.cliques.use_almost = true;
        let report = mine_cliques(&pendant_graph(), &config);
        assert_eq!(report.stats.cliques_modified, 0);
        assert_eq!(report.cliques.len(), 2);
    }

    #[test]
    fn test_run_documents_end_to_end() {
        let docs = vec![
            Document {
                id: "1".into(),
                sentences: vec![Sentence {
                    mentions: vec![
                        Mention::person("A").with_link(LinkCandidate::new("refA", 0.7)),
                        Mention::person("B"),
                        Mention::person("C"),
                    ],
                }],
            },
            Document {
                id: "2".into(),
                sentences: vec![Sentence {
                    mentions: vec![
                        Mention::person("A").with_link(LinkCandidate::new("refA2", 0.9)),
                        Mention::person("D"),
                    ],
                }],
            },
        ];
        let years = BirthYears::new();
        let blacklist = Blacklist::new();
        let snapshots = Snapshots {
            resolver: &RawMentions,
            birth_years: &years,
            blacklist: &blacklist,
        };

        let out = run_documents(&docs, &PipelineConfig::default(), snapshots).unwrap();
        assert_eq!(labels(&out.report), vec![vec!["A", "B", "C"]]);
        assert_eq!(out.stats.vertices, 4);
        assert_eq!(out.stats.edges, 4);
        assert_eq!(out.stats.ingest.collect.documents, 2);
        assert_eq!(out.stats.ambiguous_links, 1);

        let a = out.graph.vertex(&"A".into()).unwrap();
        assert_eq!(
            out.graph.identity(a).reference.as_ref().unwrap().reference,
            "refA2"
        );
    }

    #[test]
    fn test_run_rejects_bad_config() {
        let mut config = PipelineConfig::default();
        config.cliques.min_clique_size = 0;
        let years = BirthYears::new();
        let blacklist = Blacklist::new();
        let snapshots = Snapshots {
            resolver: &RawMentions,
            birth_years: &years,
            blacklist: &blacklist,
        };
        let err = run_documents(&[], &config, snapshots).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_mentions_only_attached_to_graph_vertices() {
        let mut ingest = Ingest::new();
        let mut collected = Collected::default();
        collected
            .observations
            .push(["A", "B"].into_iter().map(IdentityId::from).collect());
        collected.mentions.push(("A".into(), "a".into()));
        collected.mentions.push(("Z".into(), "z".into()));
        ingest.add_collected(collected);

        let ingested = ingest.freeze(&GraphConfig::default());
        assert_eq!(ingested.graph.vertex_count(), 2);
        let a = ingested.graph.vertex(&"A".into()).unwrap();
        assert!(ingested.graph.identity(a).mentions.contains("a"));
    }
}
