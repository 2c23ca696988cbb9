//! File formats consumed and produced by the pipeline.
//!
//! - [`JsonLines`] - annotated documents, one JSON object per line
//! - [`SentenceSets`] - pre-resolved identity sets, one sentence per line
//! - [`Pairs`] - weighted co-occurrence pairs (`a,b,weight`)
//! - [`CliqueFile`] - clique output, one clique per line
//! - [`read_blacklist`] - one identity per line

mod cliques;
mod jsonl;
mod pairs;
mod tsv;

pub use cliques::{CliqueFile, CliqueFileSummary};
pub use jsonl::JsonLines;
pub use pairs::Pairs;
pub use tsv::{read_blacklist, SentenceSets};

use crate::{Error, Result};
use std::io::BufRead;

/// Records read from a stream plus how many lines were skipped as malformed.
#[derive(Debug, Clone)]
pub struct Loaded<T> {
    /// Successfully parsed records.
    pub records: Vec<T>,
    /// Lines that failed to parse.
    pub malformed: usize,
}

impl<T> Default for Loaded<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            malformed: 0,
        }
    }
}

/// Feed every UTF-8 line of `reader` to `f` with its 1-based number.
///
/// Lines that are not valid UTF-8 are logged and skipped rather than ending
/// the read; their count is returned. IO errors abort.
fn for_each_line<R, F>(mut reader: R, source_name: &str, mut f: F) -> Result<usize>
where
    R: BufRead,
    F: FnMut(usize, &str),
{
    let mut buf = Vec::new();
    let mut undecodable = 0;
    let mut number = 0;
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        number += 1;
        if buf.last() == Some(&b'\n') {
            buf.pop();
        }
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
        match std::str::from_utf8(&buf) {
            Ok(line) => f(number, line),
            Err(e) => {
                log::warn!(
                    "{}",
                    Error::MalformedInput {
                        source_name: source_name.to_string(),
                        line: number,
                        reason: e.to_string(),
                    }
                );
                undecodable += 1;
            }
        }
    }
    Ok(undecodable)
}
