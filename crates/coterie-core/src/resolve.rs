//! Immutable lookup snapshots handed to the collector.
//!
//! Alias clustering and birth-date mining run offline. This module only loads
//! their results and answers lookups; nothing here mutates after load.

use crate::Result;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// Reference prefix prepended to page names in a dates file.
pub const DEFAULT_REFERENCE_PREFIX: &str = "http://dbpedia.org/resource/";

/// Maps a raw mention string to its canonical identity label.
pub trait IdentityResolver: Sync {
    /// Canonical label for `mention`.
    fn resolve<'a>(&'a self, mention: &'a str) -> &'a str;
}

/// Every mention is its own identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawMentions;

impl IdentityResolver for RawMentions {
    fn resolve<'a>(&'a self, mention: &'a str) -> &'a str {
        mention
    }
}

/// Alias clusters produced by the offline clustering pass.
#[derive(Debug, Clone, Default)]
pub struct ClusterMap {
    alias_to_label: HashMap<String, String>,
}

impl ClusterMap {
    /// Empty map (resolution falls back to the raw mention).
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from `(alias, label)` pairs.
    pub fn from_pairs<I, A, L>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (A, L)>,
        A: Into<String>,
        L: Into<String>,
    {
        Self {
            alias_to_label: pairs
                .into_iter()
                .map(|(a, l)| (a.into(), l.into()))
                .collect(),
        }
    }

    /// Read a clusters TSV: `label \t alias \t alias ...`.
    ///
    /// A later line that repeats an alias wins.
    pub fn read_clusters<R: Read>(reader: R) -> Result<Self> {
        let mut map = Self::new();
        for record in tsv_reader(reader).records() {
            let record = record?;
            let Some(label) = record.get(0) else { continue };
            for alias in record.iter().skip(1) {
                map.alias_to_label
                    .insert(alias.to_string(), label.to_string());
            }
        }
        Ok(map)
    }

    /// Apply a mappings TSV: `raw \t alias`.
    ///
    /// `raw` joins the cluster of `alias` when `alias` is already clustered;
    /// otherwise the line is ignored.
    pub fn apply_mappings<R: Read>(&mut self, reader: R) -> Result<usize> {
        let mut applied = 0;
        for record in tsv_reader(reader).records() {
            let record = record?;
            let (Some(raw), Some(alias)) = (record.get(0), record.get(1)) else {
                continue;
            };
            if let Some(label) = self.alias_to_label.get(alias).cloned() {
                self.alias_to_label.insert(raw.to_string(), label);
                applied += 1;
            }
        }
        Ok(applied)
    }

    /// Load clusters and optional mappings from files.
    pub fn from_files(clusters: impl AsRef<Path>, mappings: Option<&Path>) -> Result<Self> {
        let mut map = Self::read_clusters(std::fs::File::open(clusters)?)?;
        if let Some(path) = mappings {
            let applied = map.apply_mappings(std::fs::File::open(path)?)?;
            log::debug!("Applied {} cluster mappings", applied);
        }
        log::info!("Loaded {} clustered aliases", map.len());
        Ok(map)
    }

    /// Number of aliases with a known cluster.
    pub fn len(&self) -> usize {
        self.alias_to_label.len()
    }

    /// Whether no aliases are clustered.
    pub fn is_empty(&self) -> bool {
        self.alias_to_label.is_empty()
    }
}

impl IdentityResolver for ClusterMap {
    fn resolve<'a>(&'a self, mention: &'a str) -> &'a str {
        self.alias_to_label
            .get(mention)
            .map_or(mention, String::as_str)
    }
}

/// Answers "when was the person behind this reference born?".
pub trait BirthYearLookup: Sync {
    /// Birth year, if known.
    fn birth_year(&self, reference: &str) -> Option<i32>;
}

/// Birth years keyed by external reference.
#[derive(Debug, Clone, Default)]
pub struct BirthYears {
    years: HashMap<String, i32>,
}

impl BirthYears {
    /// Empty table: every lookup is unknown.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(reference, year)` pairs.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, i32)>,
        S: Into<String>,
    {
        Self {
            years: pairs.into_iter().map(|(r, y)| (r.into(), y)).collect(),
        }
    }

    /// Read a dates TSV: `id \t page \t year` where year may be `null`.
    ///
    /// References are stored as `prefix + page`. Rows with an unparsable year
    /// are logged and skipped.
    pub fn read<R: Read>(reader: R, prefix: &str) -> Result<Self> {
        let mut years = HashMap::new();
        for (line, record) in tsv_reader(reader).records().enumerate() {
            let record = record?;
            let (Some(page), Some(year)) = (record.get(1), record.get(2)) else {
                continue;
            };
            if year.is_empty() || year == "null" {
                continue;
            }
            match year.trim().parse::<i32>() {
                Ok(y) => {
                    years.insert(format!("{prefix}{page}"), y);
                }
                Err(e) => log::warn!("Skipping dates line {}: bad year {:?}: {}", line + 1, year, e),
            }
        }
        Ok(Self { years })
    }

    /// Load a dates file from disk.
    pub fn from_file(path: impl AsRef<Path>, prefix: &str) -> Result<Self> {
        let table = Self::read(std::fs::File::open(path)?, prefix)?;
        log::info!("Loaded {} birth dates", table.len());
        Ok(table)
    }

    /// Number of references with a known year.
    pub fn len(&self) -> usize {
        self.years.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }
}

impl BirthYearLookup for BirthYears {
    fn birth_year(&self, reference: &str) -> Option<i32> {
        self.years.get(reference).copied()
    }
}

fn tsv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(reader)
}
