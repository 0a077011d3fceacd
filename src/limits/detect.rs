use crate::adapter::ViewSnapshot;

/// Phrases that indicate rate limiting when present anywhere in the page text
const PAGE_TEXT_PHRASES: [&str; 5] = [
    "rate limit",
    "too many requests",
    "please wait",
    "try again later",
    "requests are coming in too fast",
];

/// Broader patterns checked against dedicated inline error elements
const ERROR_ELEMENT_PATTERNS: [&str; 2] = ["rate limit", "too many"];

/// Where a rate-limit signal was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    /// Matched a known phrase in the visible page text
    PageText,
    /// Matched a dedicated inline error element
    ErrorElement,
}

/// A detected rate-limit signal
#[derive(Debug, Clone)]
pub struct RateLimitSignal {
    pub kind: SignalKind,
    pub message: String,
}

/// Inspects view snapshots for explicit or implicit rate-limiting signals
///
/// Detection is a pure read over an already-captured snapshot; failures
/// reading the view are the caller's to swallow (absence of detection must
/// never itself abort collection).
#[derive(Debug, Clone, Default)]
pub struct RateLimitDetector;

impl RateLimitDetector {
    pub fn new() -> Self {
        Self
    }

    /// Scans a snapshot and returns the first signal found, if any
    ///
    /// The page-text scan takes priority over the error-element scan.
    pub fn inspect(&self, snapshot: &ViewSnapshot) -> Option<RateLimitSignal> {
        let page_text = snapshot.text.to_lowercase();
        for phrase in PAGE_TEXT_PHRASES {
            if page_text.contains(phrase) {
                tracing::warn!("Rate limit indicator detected in page text: {}", phrase);
                return Some(RateLimitSignal {
                    kind: SignalKind::PageText,
                    message: phrase.to_string(),
                });
            }
        }

        for message in &snapshot.error_messages {
            let lowered = message.to_lowercase();
            if ERROR_ELEMENT_PATTERNS
                .iter()
                .any(|pattern| lowered.contains(pattern))
            {
                tracing::warn!("Rate limit error element found: {}", message);
                return Some(RateLimitSignal {
                    kind: SignalKind::ErrorElement,
                    message: message.clone(),
                });
            }
        }

        None
    }
}
