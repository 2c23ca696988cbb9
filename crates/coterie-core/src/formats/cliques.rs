//! Clique output files: one clique per line, members joined by a delimiter.

use crate::{IdentityId, Result};
use std::io::{BufRead, Write};

/// Clique file handler.
pub struct CliqueFile;

/// Size statistics of a clique file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CliqueFileSummary {
    /// Non-blank lines.
    pub cliques: usize,
    /// Total members across all lines.
    pub members: usize,
    /// Mean clique size.
    pub avg_size: f64,
}

impl CliqueFile {
    /// Write cliques in the order given.
    pub fn write<W: Write>(cliques: &[Vec<IdentityId>], mut writer: W, delimiter: &str) -> Result<()> {
        for clique in cliques {
            let line = clique
                .iter()
                .map(IdentityId::as_str)
                .collect::<Vec<_>>()
                .join(delimiter);
            writeln!(writer, "{}", line)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Count cliques and members.
    #[allow(clippy::cast_precision_loss)]
    pub fn summarize<R: BufRead>(reader: R, delimiter: &str) -> Result<CliqueFileSummary> {
        let mut cliques = 0;
        let mut members = 0;
        for line in reader.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            cliques += 1;
            members += line.split(delimiter).count();
        }
        Ok(CliqueFileSummary {
            cliques,
            members,
            avg_size: if cliques > 0 {
                members as f64 / cliques as f64
            } else {
                0.0
            },
        })
    }
}
