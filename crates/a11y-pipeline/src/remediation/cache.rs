/// In-memory store of raw AI remediation replies.
///
/// Keyed by rule id plus the first `HTML_PREFIX_CHARS` characters of the
/// offending HTML. Entries live as long as the owning generator; nothing is
/// evicted. Access is single-threaded by construction (the generator takes
/// `&mut self`), so there is no lock.
use std::collections::HashMap;

use sha2::{Digest, Sha256};

pub const HTML_PREFIX_CHARS: usize = 200;

#[derive(Debug, Default)]
pub struct SuggestionCache {
    entries: HashMap<String, String>,
}

impl SuggestionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, rule_id: &str, html: &str) -> Option<&str> {
        self.entries.get(&cache_key(rule_id, html)).map(String::as_str)
    }

    pub fn insert(&mut self, rule_id: &str, html: &str, raw: String) {
        self.entries.insert(cache_key(rule_id, html), raw);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Deterministic key: rule id plus a SHA-256 of the HTML prefix.
fn cache_key(rule_id: &str, html: &str) -> String {
    let prefix: String = html.chars().take(HTML_PREFIX_CHARS).collect();
    let mut hasher = Sha256::new();
    hasher.update(prefix.as_bytes());
    format!("{rule_id}:{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_ignore_html_past_the_prefix() {
        let base = "x".repeat(HTML_PREFIX_CHARS);
        let mut cache = SuggestionCache::new();
        cache.insert("image-alt", &format!("{base}<tail one>"), "cached".to_string());
        assert_eq!(cache.get("image-alt", &format!("{base}<tail two>")), Some("cached"));
        assert_eq!(cache.get("label", &format!("{base}<tail one>")), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn prefix_counts_characters_not_bytes() {
        let html: String = "é".repeat(HTML_PREFIX_CHARS + 5);
        let mut cache = SuggestionCache::new();
        cache.insert("label", &html, "ok".to_string());
        let shorter: String = "é".repeat(HTML_PREFIX_CHARS);
        assert_eq!(cache.get("label", &shorter), Some("ok"));
    }
}
