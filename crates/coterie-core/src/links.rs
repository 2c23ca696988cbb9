//! Best external reference per identity.
//!
//! For each identity and each distinct reference only the highest confidence
//! ever observed is kept. Lists come out sorted by descending confidence, ties
//! broken by reference so the order never depends on insertion order.

use crate::{IdentityId, ScoredReference};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::io::Write;

/// Identity -> reference -> max confidence.
#[derive(Debug, Clone, Default)]
pub struct LinkTable {
    links: BTreeMap<IdentityId, HashMap<String, f64>>,
}

impl LinkTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one observation. Non-finite confidences are ignored.
    pub fn record_link(
        &mut self,
        identity: impl Into<IdentityId>,
        reference: impl Into<String>,
        confidence: f64,
    ) {
        if !confidence.is_finite() {
            return;
        }
        let slot = self
            .links
            .entry(identity.into())
            .or_default()
            .entry(reference.into())
            .or_insert(confidence);
        if confidence > *slot {
            *slot = confidence;
        }
    }

    /// Fold another table into this one.
    pub fn merge(&mut self, other: LinkTable) {
        for (identity, refs) in other.links {
            for (reference, confidence) in refs {
                self.record_link(identity.clone(), reference, confidence);
            }
        }
    }

    /// References for `identity`, best first.
    pub fn references(&self, identity: &IdentityId) -> Vec<ScoredReference> {
        self.links
            .get(identity)
            .map(ranked)
            .unwrap_or_default()
    }

    /// First-ranked reference for `identity`.
    ///
    /// When several references survive, the choice is still deterministic; the
    /// ambiguity is logged at debug level and counted by
    /// [`LinkTable::ambiguous_count`].
    pub fn best(&self, identity: &IdentityId) -> Option<ScoredReference> {
        let ranked = self.references(identity);
        if ranked.len() > 1 {
            log::debug!(
                "Ambiguous link for {}: keeping {} over {} other(s)",
                identity,
                ranked[0].reference,
                ranked.len() - 1
            );
        }
        ranked.into_iter().next()
    }

    /// Identities with more than one surviving reference.
    pub fn ambiguous_count(&self) -> usize {
        self.links.values().filter(|refs| refs.len() > 1).count()
    }

    /// Identities in label order.
    pub fn identities(&self) -> impl Iterator<Item = &IdentityId> {
        self.links.keys()
    }

    /// Number of identities with at least one reference.
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Write one line per identity: label, then references best first.
    pub fn write_to<W: Write>(&self, mut out: W, delimiter: &str) -> std::io::Result<()> {
        for (identity, refs) in &self.links {
            write!(out, "{}", identity)?;
            for scored in ranked(refs) {
                write!(out, "{}{}", delimiter, scored.reference)?;
            }
            writeln!(out)?;
        }
        Ok(())
    }
}

fn ranked(refs: &HashMap<String, f64>) -> Vec<ScoredReference> {
    let mut list: Vec<ScoredReference> = refs
        .iter()
        .map(|(r, c)| ScoredReference::new(r.clone(), *c))
        .collect();
    list.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.reference.cmp(&b.reference))
    });
    list
}
