//! JSON-lines documents.

use super::{for_each_line, Loaded};
use crate::collect::Document;
use crate::{Error, Result};
use std::io::BufRead;

/// JSON-lines document handler.
pub struct JsonLines;

impl JsonLines {
    /// Read one [`Document`] per non-blank line.
    ///
    /// A line that is not UTF-8 or does not parse is logged as malformed and
    /// skipped; IO errors abort.
    pub fn read_documents<R: BufRead>(reader: R, source_name: &str) -> Result<Loaded<Document>> {
        let mut loaded: Loaded<Document> = Loaded::default();
        let undecodable = for_each_line(reader, source_name, |number, line| {
            let line = line.trim();
            if line.is_empty() {
                return;
            }
            match serde_json::from_str::<Document>(line) {
                Ok(doc) => loaded.records.push(doc),
                Err(e) => {
                    let err = Error::MalformedInput {
                        source_name: source_name.to_string(),
                        line: number,
                        reason: e.to_string(),
                    };
                    log::warn!("{}", err);
                    loaded.malformed += 1;
                }
            }
        })?;
        loaded.malformed += undecodable;
        Ok(loaded)
    }
}
