//! Canonical person identities.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Canonical label of one real-world person after alias clustering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityId(pub String);

impl IdentityId {
    /// Create a new identity label.
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// Get the label as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for IdentityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for IdentityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// An external knowledge-base reference with the linker's confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredReference {
    /// External reference (e.g. a DBpedia resource URI).
    pub reference: String,
    /// Linker confidence.
    pub confidence: f64,
}

impl ScoredReference {
    /// Create a new scored reference.
    pub fn new(reference: impl Into<String>, confidence: f64) -> Self {
        Self {
            reference: reference.into(),
            confidence,
        }
    }
}

/// A vertex of the co-occurrence graph.
///
/// The label never changes once assigned; mentions only accumulate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonIdentity {
    /// Canonical label.
    pub id: IdentityId,

    /// Raw mention strings that resolved to this identity.
    #[serde(default)]
    pub mentions: BTreeSet<String>,

    /// Best external reference, attached after ingestion from the link table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<ScoredReference>,
}

impl PersonIdentity {
    /// Create an identity with no recorded mentions.
    pub fn new(id: impl Into<IdentityId>) -> Self {
        Self {
            id: id.into(),
            mentions: BTreeSet::new(),
            reference: None,
        }
    }

    /// Record a raw mention string.
    pub fn add_mention(&mut self, raw: impl Into<String>) {
        self.mentions.insert(raw.into());
    }
}
