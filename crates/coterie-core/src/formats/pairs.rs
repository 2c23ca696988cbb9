//! Weighted co-occurrence pairs.
//!
//! Headerless CSV: `a,b,weight`. Two-column rows get weight 1.

use super::Loaded;
use crate::{CoOccurrenceGraph, Error, IdentityId, Result};
use std::io::{Read, Write};

/// Weighted pair handler.
pub struct Pairs;

impl Pairs {
    /// Read pairs into `(a, b, weight)` triples. Rows with a bad weight, too
    /// few columns or invalid UTF-8 are logged and skipped.
    pub fn read<R: Read>(reader: R, source_name: &str) -> Result<Loaded<(IdentityId, IdentityId, u32)>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut loaded = Loaded::default();
        for (i, record) in reader.records().enumerate() {
            let record = match record {
                Ok(record) => record,
                Err(e) if matches!(e.kind(), csv::ErrorKind::Utf8 { .. }) => {
                    log::warn!(
                        "{}",
                        Error::MalformedInput {
                            source_name: source_name.to_string(),
                            line: i + 1,
                            reason: e.to_string(),
                        }
                    );
                    loaded.malformed += 1;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            let parsed = match record.len() {
                2 => Ok(1),
                n if n >= 3 => record[2].trim().parse::<u32>().map_err(|e| e.to_string()),
                _ => Err(format!("expected 2 or 3 columns, got {}", record.len())),
            };
            match parsed {
                Ok(weight) => loaded.records.push((
                    IdentityId::new(record[0].trim()),
                    IdentityId::new(record[1].trim()),
                    weight,
                )),
                Err(reason) => {
                    log::warn!(
                        "{}",
                        Error::MalformedInput {
                            source_name: source_name.to_string(),
                            line: i + 1,
                            reason,
                        }
                    );
                    loaded.malformed += 1;
                }
            }
        }
        Ok(loaded)
    }

    /// Write every edge of `graph`, heaviest first.
    /// Edges lighter than `min_edge_weight` are left out. Returns the number
    /// of rows written.
    pub fn write<W: Write>(
        graph: &CoOccurrenceGraph,
        writer: W,
        min_edge_weight: u32,
    ) -> Result<usize> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        let mut written = 0;
        for (a, b, w) in graph.weighted_pairs() {
            if w < min_edge_weight {
                continue;
            }
            let w = w.to_string();
            writer.write_record([a.as_str(), b.as_str(), w.as_str()])?;
            written += 1;
        }
        writer.flush()?;
        Ok(written)
    }
}
