//! The seam to the external content source
//!
//! The engine never talks to the real feed directly; whatever browser or
//! automation layer drives the source implements [`FeedAdapter`] and the
//! engine consumes it through this trait alone. One authenticated session
//! and one live search view exist at a time.

mod replay;
mod snapshot;

pub use replay::ReplayFeed;
pub use snapshot::ViewSnapshot;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors surfaced by a feed adapter
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("failed to load search view for '{target}': {message}")]
    Load { target: String, message: String },

    #[error("failed to read the current view: {0}")]
    Read(String),

    #[error("failed to advance the view: {0}")]
    Scroll(String),
}

/// One item as it appears in the feed, before extraction
///
/// Engagement counters are raw display strings (possibly with `k`/`m`
/// suffixes); parsing them is downstream's job. Missing pieces come through
/// as `None` and are defaulted during extraction.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct RawItem {
    /// Display text of the item
    pub text: String,

    /// Author handle, if it could be read
    #[serde(default)]
    pub author: Option<String>,

    /// Raw reply counter display string
    #[serde(default)]
    pub replies: Option<String>,

    /// Raw repost counter display string
    #[serde(default)]
    pub retweets: Option<String>,

    /// Raw like counter display string
    #[serde(default)]
    pub likes: Option<String>,
}

/// Driver for an authenticated, scrollable search-result feed
///
/// Implementations own the session and the current view. Every method that
/// touches the source may suspend; the engine guarantees it never issues two
/// calls concurrently.
#[async_trait]
pub trait FeedAdapter: Send {
    /// Establishes the authenticated session
    async fn authenticate(&mut self) -> Result<(), AdapterError>;

    /// Loads the search-result view for a target, waiting until content is
    /// physically present before returning success
    async fn load_search_view(&mut self, target: &str) -> Result<(), AdapterError>;

    /// Captures the current view as text plus inline error-element messages
    async fn snapshot(&mut self) -> Result<ViewSnapshot, AdapterError>;

    /// Reads all currently visible items
    async fn visible_items(&mut self) -> Result<Vec<RawItem>, AdapterError>;

    /// Scrolls to the bottom of the view to trigger loading more content
    async fn scroll_to_bottom(&mut self) -> Result<(), AdapterError>;

    /// Waits for newly loaded content to stabilize, up to `timeout`
    async fn wait_for_stabilization(&mut self, timeout: Duration) -> Result<(), AdapterError>;

    /// Releases the session and any held resources
    ///
    /// Must be safe to call even if authentication never completed.
    async fn close(&mut self);
}

/// Builds the live search URL for a target keyword
///
/// Real adapters navigate here; kept in the library so the URL shape is in
/// one place.
pub fn search_url(target: &str) -> Result<Url, url::ParseError> {
    let mut url = Url::parse("https://twitter.com/search")?;
    url.query_pairs_mut()
        .append_pair("q", &format!("#{}", target))
        .append_pair("src", "typed_query")
        .append_pair("f", "live");
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_url_shape() {
        let url = search_url("nifty50").unwrap();
        assert_eq!(url.host_str(), Some("twitter.com"));
        assert_eq!(url.path(), "/search");
        assert_eq!(
            url.query(),
            Some("q=%23nifty50&src=typed_query&f=live")
        );
    }

    #[test]
    fn test_search_url_escapes_target() {
        let url = search_url("bank nifty").unwrap();
        assert!(url.query().unwrap().contains("%23bank+nifty"));
    }
}
