//! Bulk dictionary loading.
//!
//! Input is one `word: definition` pair per line. Everything after the
//! first colon is the definition.

use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::peer::Peer;

/// Counters of one load run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub inserted: usize,
    /// Lines without a colon or with an empty word.
    pub skipped: usize,
    /// Lines whose insert failed; loading continued after them.
    pub failed: usize,
}

/// Splits a `word: definition` line, trimming both sides.
pub fn parse_line(line: &str) -> Option<(&str, &str)> {
    let (word, definition) = line.split_once(':')?;
    let word = word.trim();
    if word.is_empty() {
        return None;
    }
    Some((word, definition.trim()))
}

/// Inserts every well-formed line of `text` through `entry`.
pub async fn load_dictionary(entry: &dyn Peer, text: &str) -> LoadSummary {
    let mut summary = LoadSummary::default();
    for line in text.lines() {
        let Some((word, definition)) = parse_line(line) else {
            if !line.trim().is_empty() {
                debug!(line, "skipping malformed dictionary line");
            }
            summary.skipped += 1;
            continue;
        };
        match entry
            .insert(word.to_string(), Some(definition.to_string()))
            .await
        {
            Ok(owner) => {
                debug!(word, owner = %owner, "inserted");
                summary.inserted += 1;
            }
            Err(e) => {
                warn!(word, error = %e, "failed to insert");
                summary.failed += 1;
            }
        }
    }
    info!(
        inserted = summary.inserted,
        skipped = summary.skipped,
        failed = summary.failed,
        "dictionary load finished"
    );
    summary
}

/// Reads `path` and loads it through `entry`.
pub async fn load_file(entry: &dyn Peer, path: impl AsRef<Path>) -> Result<LoadSummary> {
    let text = std::fs::read_to_string(path)?;
    Ok(load_dictionary(entry, &text).await)
}
