//! Local partition of the dictionary.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::fmt::Write;

use crate::peer::Dictionary;

/// Concurrent word → definition map owned by one node.
///
/// Single-key operations are atomic; nothing spans several keys.
#[derive(Debug, Default)]
pub struct LocalStore {
    entries: DashMap<String, Option<String>>,
}

impl LocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, word: String, definition: Option<String>) {
        self.entries.insert(word, definition);
    }

    /// `None` when the word is absent; `Some(None)` when it is stored
    /// without a definition.
    /// Stores `definition` unless `word` already has an entry.
    pub fn put_if_absent(&self, word: String, definition: Option<String>) -> bool {
        match self.entries.entry(word) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(definition);
                true
            }
        }
    }

    pub fn get(&self, word: &str) -> Option<Option<String>> {
        self.entries.get(word).map(|entry| entry.value().clone())
    }

    pub fn remove(&self, word: &str) -> bool {
        self.entries.remove(word).is_some()
    }

    /// Removes `word` only if its current definition equals `expected`.
    pub fn remove_if_eq(&self, word: &str, expected: &Option<String>) -> bool {
        self.entries
            .remove_if(word, |_, current| current == expected)
            .is_some()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.entries.contains_key(word)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn snapshot(&self) -> Dictionary {
        self.entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Sorted `word: definition` listing.
    pub fn render(&self, url: &str) -> String {
        let mut words: Vec<(String, Option<String>)> = self.snapshot().into_iter().collect();
        words.sort_by(|a, b| a.0.cmp(&b.0));
        let mut out = String::new();
        let _ = writeln!(out, "Dictionary for {}:", url);
        for (word, definition) in words {
            let _ = writeln!(out, "{}: {}", word, definition.unwrap_or_default());
        }
        out
    }
}
