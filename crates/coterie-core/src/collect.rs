//! Per-sentence identity collection.
//!
//! Turns annotated documents into co-occurrence observations: for every
//! sentence, the set of canonical identities mentioned in it. Annotation
//! itself (NER, coreference, entity linking) happens upstream; this module
//! only consumes its output through [`Document`].

use crate::config::CollectorConfig;
use crate::links::LinkTable;
use crate::resolve::{BirthYearLookup, IdentityResolver};
use crate::{IdentityId, ScoredReference};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};

/// An annotated document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Document identifier, used in log lines only.
    #[serde(default)]
    pub id: String,
    /// Sentences in reading order.
    #[serde(default)]
    pub sentences: Vec<Sentence>,
}

/// One sentence of a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sentence {
    /// Mention heads found in the sentence.
    #[serde(default)]
    pub mentions: Vec<Mention>,
}

/// What the upstream tagger said about a mention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MentionKind {
    /// Tagged as a person.
    Person,
    /// Not tagged as a person but part of a coreference chain (pronouns,
    /// nominals). May inherit identities from its chain.
    Coreferent,
    /// Any other entity type. Never contributes.
    Other,
}

/// A mention head with its linking candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mention {
    /// Surface form.
    pub text: String,
    /// Tagger verdict.
    pub kind: MentionKind,
    /// Coreference chain within the document, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain: Option<u32>,
    /// Entity-linking candidates.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<LinkCandidate>,
}

impl Mention {
    /// A person mention with no links and no chain.
    pub fn person(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: MentionKind::Person,
            chain: None,
            links: Vec::new(),
        }
    }

    /// Put the mention on a coreference chain.
    pub fn with_chain(mut self, chain: u32) -> Self {
        self.chain = Some(chain);
        self
    }

    /// Add a linking candidate.
    pub fn with_link(mut self, candidate: LinkCandidate) -> Self {
        self.links.push(candidate);
        self
    }
}

/// One entity-linking candidate for a mention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkCandidate {
    /// External reference.
    pub reference: String,
    /// Linker confidence.
    pub confidence: f64,
    /// Whether the linker confidently spotted this entity.
    #[serde(default)]
    pub spotted: bool,
}

impl LinkCandidate {
    /// Create a non-spotted candidate.
    pub fn new(reference: impl Into<String>, confidence: f64) -> Self {
        Self {
            reference: reference.into(),
            confidence,
            spotted: false,
        }
    }

    /// Mark the candidate as spotted.
    pub fn spotted(mut self) -> Self {
        self.spotted = true;
        self
    }
}

/// Identities that must never enter the graph.
pub type Blacklist = HashSet<IdentityId>;

/// Counters kept while collecting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CollectStats {
    /// Documents processed.
    pub documents: usize,
    /// Sentences processed.
    pub sentences: usize,
    /// Observations emitted (sentences with at least two identities).
    pub observations: usize,
    /// Link candidates rejected by the birth-year filter.
    pub skipped_birth_year: usize,
    /// Identities added to a sentence through a coreference chain.
    pub inherited_via_coref: usize,
    /// Identities dropped because they are blacklisted.
    pub blacklisted: usize,
}

impl CollectStats {
    /// Add another set of counters.
    pub fn merge(&mut self, other: &CollectStats) {
        self.documents += other.documents;
        self.sentences += other.sentences;
        self.observations += other.observations;
        self.skipped_birth_year += other.skipped_birth_year;
        self.inherited_via_coref += other.inherited_via_coref;
        self.blacklisted += other.blacklisted;
    }
}

/// Everything collected from one or more documents.
#[derive(Debug, Clone, Default)]
pub struct Collected {
    /// One identity set per contributing sentence; every set has two or more
    /// members.
    pub observations: Vec<BTreeSet<IdentityId>>,
    /// `(identity, raw mention)` pairs seen along the way.
    pub mentions: Vec<(IdentityId, String)>,
    /// Selected references per identity.
    pub links: LinkTable,
    /// Counters.
    pub stats: CollectStats,
}

impl Collected {
    /// Append another batch.
    pub fn merge(&mut self, other: Collected) {
        self.observations.extend(other.observations);
        self.mentions.extend(other.mentions);
        self.links.merge(other.links);
        self.stats.merge(&other.stats);
    }
}

/// Turns annotated documents into co-occurrence observations.
///
/// Holds only shared references to immutable snapshots, so one collector can
/// serve many threads.
pub struct CoOccurrenceCollector<'a> {
    config: CollectorConfig,
    resolver: &'a dyn IdentityResolver,
    birth_years: &'a dyn BirthYearLookup,
    blacklist: &'a Blacklist,
}

/// A person mention with its resolved identity and chosen reference.
struct Resolved {
    identity: IdentityId,
    raw: String,
    reference: Option<ScoredReference>,
}

impl<'a> CoOccurrenceCollector<'a> {
    /// Create a collector over the given snapshots.
    pub fn new(
        config: CollectorConfig,
        resolver: &'a dyn IdentityResolver,
        birth_years: &'a dyn BirthYearLookup,
        blacklist: &'a Blacklist,
    ) -> Self {
        Self {
            config,
            resolver,
            birth_years,
            blacklist,
        }
    }

    /// Collect observations from one document.
    pub fn collect(&self, doc: &Document) -> Collected {
        let mut out = Collected::default();
        out.stats.documents = 1;

        // Person mentions per coreference chain, for inheritance.
        let mut chains: HashMap<u32, Vec<(usize, usize)>> = HashMap::new();
        if self.config.use_coref {
            for (s, sentence) in doc.sentences.iter().enumerate() {
                for (m, mention) in sentence.mentions.iter().enumerate() {
                    if let (MentionKind::Person, Some(chain)) = (mention.kind, mention.chain) {
                        chains.entry(chain).or_default().push((s, m));
                    }
                }
            }
        }

        for sentence in &doc.sentences {
            out.stats.sentences += 1;
            let mut identities: BTreeSet<IdentityId> = BTreeSet::new();

            for mention in &sentence.mentions {
                match mention.kind {
                    MentionKind::Person => {
                        if let Some(r) = self.resolve_person(mention, &mut out.stats) {
                            self.accept(r, &mut identities, &mut out);
                        }
                    }
                    MentionKind::Coreferent => {
                        let Some(partners) = mention.chain.and_then(|c| chains.get(&c)) else {
                            continue;
                        };
                        for &(s, m) in partners {
                            let partner = &doc.sentences[s].mentions[m];
                            if let Some(r) = self.resolve_person(partner, &mut out.stats) {
                                out.stats.inherited_via_coref += 1;
                                self.accept(r, &mut identities, &mut out);
                            }
                        }
                    }
                    MentionKind::Other => {}
                }
            }

            if identities.len() > 1 {
                out.stats.observations += 1;
                out.observations.push(identities);
            }
        }

        log::debug!(
            "Document {:?}: {} sentences, {} observations",
            doc.id,
            out.stats.sentences,
            out.stats.observations
        );
        out
    }

    fn resolve_person(&self, mention: &Mention, stats: &mut CollectStats) -> Option<Resolved> {
        let raw = normalize_mention(&mention.text);
        if raw.is_empty() {
            return None;
        }
        let identity = IdentityId::new(self.resolver.resolve(&raw));
        if self.blacklist.contains(&identity) {
            stats.blacklisted += 1;
            return None;
        }
        let reference = select_reference(
            &mention.links,
            &self.config,
            self.birth_years,
            &mut stats.skipped_birth_year,
        );
        Some(Resolved {
            identity,
            raw,
            reference,
        })
    }

    fn accept(&self, r: Resolved, identities: &mut BTreeSet<IdentityId>, out: &mut Collected) {
        if let Some(scored) = r.reference {
            out.links
                .record_link(r.identity.clone(), scored.reference, scored.confidence);
        }
        out.mentions.push((r.identity.clone(), r.raw));
        identities.insert(r.identity);
    }
}

/// Choose the most confident plausible reference among `candidates`.
///
/// Candidates are tried by descending confidence (ties by reference). With
/// the birth-year filter on, a candidate whose known birth year is after the
/// cutoff is skipped and counted in `skipped`; unknown years pass. With
/// `spotted_only`, unspotted candidates are ignored. Returns `None` when
/// nothing survives.
pub fn select_reference(
    candidates: &[LinkCandidate],
    config: &CollectorConfig,
    birth_years: &dyn BirthYearLookup,
    skipped: &mut usize,
) -> Option<ScoredReference> {
    let mut ranked: Vec<&LinkCandidate> = candidates
        .iter()
        .filter(|c| c.confidence.is_finite())
        .filter(|c| !config.spotted_only || c.spotted)
        .collect();
    ranked.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.reference.cmp(&b.reference))
    });

    for candidate in ranked {
        if config.birth_year_filter {
            if let Some(year) = birth_years.birth_year(&candidate.reference) {
                if year > config.max_birth_year {
                    log::trace!("Skipping {}, born {}", candidate.reference, year);
                    *skipped += 1;
                    continue;
                }
            }
        }
        return Some(ScoredReference::new(
            candidate.reference.clone(),
            candidate.confidence,
        ));
    }
    None
}

/// Trim, drop commas and collapse internal whitespace.
pub fn normalize_mention(raw: &str) -> String {
    raw.replace(',', "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
