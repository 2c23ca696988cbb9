//! Pipeline configuration.
//!
//! Every struct deserialises with defaults for missing fields, so a config file
//! only needs to name what it changes. Call [`PipelineConfig::validate`] before
//! running anything.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Smallest clique written to the output.
pub const DEFAULT_MIN_CLIQUE_SIZE: usize = 3;
/// Smallest original clique considered for almost-clique expansion.
pub const DEFAULT_MIN_ALMOST_CLIQUE_SIZE: usize = 4;
/// Candidates born after this year are skipped during link selection.
pub const DEFAULT_MAX_BIRTH_YEAR: i32 = 1943;

/// Clique filtering and expansion settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliqueConfig {
    /// Minimum accepted clique size.
    pub min_clique_size: usize,
    /// Minimum original clique size to attempt almost-clique expansion.
    pub min_almost_clique_size: usize,
    /// Enable almost-clique expansion.
    pub use_almost: bool,
}

impl Default for CliqueConfig {
    fn default() -> Self {
        Self {
            min_clique_size: DEFAULT_MIN_CLIQUE_SIZE,
            min_almost_clique_size: DEFAULT_MIN_ALMOST_CLIQUE_SIZE,
            use_almost: false,
        }
    }
}

/// Per-sentence identity collection settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Let untagged mentions inherit identities from their coreference chain.
    pub use_coref: bool,
    /// Skip link candidates born after `max_birth_year`.
    pub birth_year_filter: bool,
    /// Birth-year cutoff (inclusive).
    pub max_birth_year: i32,
    /// Only consider link candidates the linker marked as spotted.
    pub spotted_only: bool,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            use_coref: false,
            birth_year_filter: true,
            max_birth_year: DEFAULT_MAX_BIRTH_YEAR,
            spotted_only: false,
        }
    }
}

/// Graph freezing settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Edges seen in fewer observations than this are dropped at freeze time.
    pub min_edge_weight: u32,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self { min_edge_weight: 1 }
    }
}

/// Per-component limits for clique enumeration.
///
/// A component that trips any limit is skipped with a warning; the rest of the
/// run continues. `None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EnumerationBudget {
    /// Components with more vertices than this are not enumerated.
    pub max_component_size: Option<usize>,
    /// Maximum search frames expanded per component.
    pub max_frames: Option<u64>,
    /// Wall-clock limit per component.
    #[serde(with = "opt_millis")]
    pub max_duration: Option<Duration>,
}

impl EnumerationBudget {
    /// No limits at all.
    pub fn unbounded() -> Self {
        Self::default()
    }
}

/// Full configuration of one clique-mining job.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Clique settings.
    pub cliques: CliqueConfig,
    /// Collector settings.
    pub collector: CollectorConfig,
    /// Graph settings.
    pub graph: GraphConfig,
    /// Enumeration limits.
    pub budget: EnumerationBudget,
    /// Delimiter between clique members in the output file.
    pub delimiter: Delimiter,
}

/// Member separator used in clique and link files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Delimiter(pub String);

impl Default for Delimiter {
    fn default() -> Self {
        Self("\t".to_string())
    }
}

impl Delimiter {
    /// Delimiter as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PipelineConfig {
    /// Load a (possibly partial) JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        Ok(config)
    }

    /// Reject thresholds that cannot produce a meaningful run.
    pub fn validate(&self) -> Result<()> {
        let c = &self.cliques;
        if c.min_clique_size == 0 {
            return Err(Error::InvalidConfig(
                "min_clique_size must be at least 1".into(),
            ));
        }
        if c.min_almost_clique_size == 0 {
            return Err(Error::InvalidConfig(
                "min_almost_clique_size must be at least 1".into(),
            ));
        }
        if c.use_almost && c.min_almost_clique_size < c.min_clique_size {
            return Err(Error::InvalidConfig(format!(
                "min_almost_clique_size ({}) is below min_clique_size ({})",
                c.min_almost_clique_size, c.min_clique_size
            )));
        }
        if self.graph.min_edge_weight == 0 {
            return Err(Error::InvalidConfig(
                "min_edge_weight must be at least 1".into(),
            ));
        }
        let b = &self.budget;
        if b.max_component_size == Some(0) {
            return Err(Error::InvalidConfig(
                "max_component_size must be positive".into(),
            ));
        }
        if b.max_frames == Some(0) {
            return Err(Error::InvalidConfig("max_frames must be positive".into()));
        }
        if b.max_duration.is_some_and(|d| d.is_zero()) {
            return Err(Error::InvalidConfig("max_duration must be positive".into()));
        }
        if self.delimiter.0.is_empty() {
            return Err(Error::InvalidConfig("delimiter must not be empty".into()));
        }
        Ok(())
    }
}

mod opt_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&(d.as_millis() as u64)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_millis))
    }
}
