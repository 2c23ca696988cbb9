//! Line-oriented identity lists.

use super::{for_each_line, Loaded};
use crate::collect::Blacklist;
use crate::{IdentityId, Result};
use std::collections::BTreeSet;
use std::io::BufRead;

/// Pre-resolved sentence identity sets: one sentence per line, identities
/// separated by a delimiter.
pub struct SentenceSets;

impl SentenceSets {
    /// Read identity sets. Lines with fewer than two distinct identities are
    /// dropped since they cannot contribute an edge; lines that are not UTF-8
    /// are counted as malformed.
    pub fn read<R: BufRead>(
        reader: R,
        source_name: &str,
        delimiter: &str,
    ) -> Result<Loaded<BTreeSet<IdentityId>>> {
        let mut loaded: Loaded<BTreeSet<IdentityId>> = Loaded::default();
        let undecodable = for_each_line(reader, source_name, |_, line| {
            let set: BTreeSet<IdentityId> = line
                .split(delimiter)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(IdentityId::from)
                .collect();
            if set.len() > 1 {
                loaded.records.push(set);
            }
        })?;
        loaded.malformed += undecodable;
        Ok(loaded)
    }
}

/// Read a blacklist: one identity per line, whitespace collapsed, blank lines
/// ignored.
pub fn read_blacklist<R: BufRead>(reader: R) -> Result<Blacklist> {
    let mut blacklist = Blacklist::new();
    for_each_line(reader, "blacklist", |_, line| {
        let name = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if !name.is_empty() {
            blacklist.insert(IdentityId::new(name));
        }
    })?;
    Ok(blacklist)
}
