use crate::adapter::RawItem;
use crate::config::CollectionConfig;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;

/// One extracted item, ready for the downstream processing stage
#[derive(Debug, Clone, Serialize)]
pub struct CollectedItem {
    /// The target keyword this item was collected under
    pub target: String,

    /// Author handle ("unknown" when the feed did not expose one)
    pub author: String,

    /// Display text as captured
    pub text: String,

    /// `#`-prefixed tokens embedded in the text
    pub hashtags: Vec<String>,

    /// `@`-prefixed tokens embedded in the text
    pub mentions: Vec<String>,

    /// Raw reply counter display string ("0" when absent)
    pub replies: String,

    /// Raw repost counter display string ("0" when absent)
    pub retweets: String,

    /// Raw like counter display string ("0" when absent)
    pub likes: String,

    /// When the item was captured
    pub captured_at: DateTime<Utc>,
}

/// Working state for one target's collection run
///
/// Lives for the duration of a single collection loop. `collected` only
/// grows, in discovery order; the fingerprint set only grows.
#[derive(Debug, Default)]
pub struct CollectionState {
    /// Unique items in discovery order
    pub collected: Vec<CollectedItem>,

    /// Normalized-text fingerprints seen this run
    seen_fingerprints: HashSet<String>,

    /// Scroll passes performed
    pub scroll_count: u32,

    /// Consecutive extraction passes that yielded nothing new
    pub empty_scroll_streak: u32,

    /// Consecutive snapshot checks that carried a rate-limit signal
    pub consecutive_rate_limit_signals: u32,
}

impl CollectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempts to admit a raw item; returns true if it was new
    ///
    /// Empty-text items and fingerprint duplicates are skipped. Missing
    /// author/counter fields default rather than failing: a half-readable
    /// item is still worth keeping.
    pub fn admit(&mut self, raw: RawItem, target: &str, captured_at: DateTime<Utc>) -> bool {
        let text = raw.text.trim();
        if text.is_empty() {
            return false;
        }

        let print = fingerprint(text);
        if !self.seen_fingerprints.insert(print) {
            return false;
        }

        let hashtags = tokens_with_prefix(text, '#');
        let mentions = tokens_with_prefix(text, '@');

        self.collected.push(CollectedItem {
            target: target.to_string(),
            author: raw.author.unwrap_or_else(|| "unknown".to_string()),
            text: text.to_string(),
            hashtags,
            mentions,
            replies: counter_or_zero(raw.replies),
            retweets: counter_or_zero(raw.retweets),
            likes: counter_or_zero(raw.likes),
            captured_at,
        });
        true
    }

    /// Number of items collected so far
    pub fn count(&self) -> usize {
        self.collected.len()
    }
}

/// Computes the in-run duplicate-detection fingerprint of an item's text
///
/// Case-folded, punctuation stripped, whitespace collapsed. This is only the
/// in-run exact dedupe; near-duplicate detection happens downstream.
pub fn fingerprint(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    for c in text.chars() {
        if c.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            for lower in c.to_lowercase() {
                out.push(lower);
            }
        } else if c.is_whitespace() {
            pending_space = true;
        }
        // Punctuation contributes nothing, not even a break
    }
    out
}

/// How many consecutive empty scrolls to tolerate at the given item count
///
/// Progressive patience: a thin early feed is abandoned quickly, while a run
/// that has already banked hundreds of items tolerates longer stalls.
pub fn patience_threshold(collected: usize, config: &CollectionConfig) -> u32 {
    if collected < 100 {
        config.patience_early
    } else if collected < 300 {
        config.patience_mid
    } else if collected < 500 {
        config.patience_late
    } else {
        config.patience_final
    }
}

fn tokens_with_prefix(text: &str, prefix: char) -> Vec<String> {
    text.split_whitespace()
        .filter(|word| word.starts_with(prefix) && word.len() > 1)
        .map(str::to_string)
        .collect()
}

fn counter_or_zero(counter: Option<String>) -> String {
    match counter {
        Some(value) if !value.trim().is_empty() => value,
        _ => "0".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(text: &str) -> RawItem {
        RawItem {
            text: text.to_string(),
            author: Some("trader".to_string()),
            replies: Some("3".to_string()),
            retweets: Some("1.2k".to_string()),
            likes: Some("9".to_string()),
        }
    }

    #[test]
    fn test_admit_keeps_discovery_order() {
        let mut state = CollectionState::new();
        let now = Utc::now();
        assert!(state.admit(raw("first item"), "nifty50", now));
        assert!(state.admit(raw("second item"), "nifty50", now));
        assert_eq!(state.collected[0].text, "first item");
        assert_eq!(state.collected[1].text, "second item");
    }

    #[test]
    fn test_admit_rejects_exact_duplicate() {
        let mut state = CollectionState::new();
        let now = Utc::now();
        assert!(state.admit(raw("buy the dip"), "nifty50", now));
        assert!(!state.admit(raw("buy the dip"), "nifty50", now));
        assert_eq!(state.count(), 1);
    }

    #[test]
    fn test_admit_rejects_normalized_duplicate() {
        let mut state = CollectionState::new();
        let now = Utc::now();
        assert!(state.admit(raw("Buy the dip!!!"), "nifty50", now));
        assert!(!state.admit(raw("buy the dip"), "nifty50", now));
        assert_eq!(state.count(), 1);
    }

    #[test]
    fn test_admit_rejects_empty_text() {
        let mut state = CollectionState::new();
        assert!(!state.admit(raw("   "), "nifty50", Utc::now()));
    }

    #[test]
    fn test_admit_defaults_missing_fields() {
        let mut state = CollectionState::new();
        let item = RawItem {
            text: "bare item".to_string(),
            author: None,
            replies: None,
            retweets: None,
            likes: None,
        };
        assert!(state.admit(item, "sensex", Utc::now()));
        let collected = &state.collected[0];
        assert_eq!(collected.author, "unknown");
        assert_eq!(collected.replies, "0");
        assert_eq!(collected.retweets, "0");
        assert_eq!(collected.likes, "0");
    }

    #[test]
    fn test_admit_extracts_tags_and_mentions() {
        let mut state = CollectionState::new();
        state.admit(
            raw("#nifty50 breaking out, watch @niftyguru and #banknifty"),
            "nifty50",
            Utc::now(),
        );
        let collected = &state.collected[0];
        assert_eq!(collected.hashtags, vec!["#nifty50", "#banknifty"]);
        assert_eq!(collected.mentions, vec!["@niftyguru"]);
    }

    #[test]
    fn test_fingerprint_folds_case_and_punctuation() {
        assert_eq!(fingerprint("Buy THE dip!"), "buy the dip");
        assert_eq!(fingerprint("buy, the... dip"), "buy the dip");
        assert_eq!(fingerprint("  buy   the dip  "), "buy the dip");
    }

    #[test]
    fn test_fingerprint_distinguishes_different_text() {
        assert_ne!(fingerprint("buy the dip"), fingerprint("sell the rip"));
    }

    #[test]
    fn test_patience_boundaries() {
        let config = CollectionConfig::default();
        assert_eq!(patience_threshold(0, &config), 20);
        assert_eq!(patience_threshold(99, &config), 20);
        assert_eq!(patience_threshold(100, &config), 40);
        assert_eq!(patience_threshold(299, &config), 40);
        assert_eq!(patience_threshold(300, &config), 60);
        assert_eq!(patience_threshold(499, &config), 60);
        assert_eq!(patience_threshold(500, &config), 100);
        assert_eq!(patience_threshold(5000, &config), 100);
    }
}
