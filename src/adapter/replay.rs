use crate::adapter::{AdapterError, FeedAdapter, RawItem, ViewSnapshot};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Number of items revealed per scroll pass by default
const DEFAULT_PAGE_SIZE: usize = 15;

/// A feed adapter that replays a captured archive of per-target items
///
/// The archive is a JSON object mapping each target keyword to its item
/// batch. Items become visible a page at a time as the engine scrolls,
/// simulating infinite scroll, so the whole campaign pipeline can be
/// rehearsed offline without a live session.
pub struct ReplayFeed {
    batches: HashMap<String, Vec<RawItem>>,
    page_size: usize,
    authenticated: bool,
    current_target: Option<String>,
    visible: usize,
}

impl ReplayFeed {
    /// Creates a replay feed from in-memory batches
    pub fn new(batches: HashMap<String, Vec<RawItem>>) -> Self {
        Self {
            batches,
            page_size: DEFAULT_PAGE_SIZE,
            authenticated: false,
            current_target: None,
            visible: 0,
        }
    }

    /// Loads an archive file
    pub fn from_path(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let batches: HashMap<String, Vec<RawItem>> = serde_json::from_str(&content)?;
        Ok(Self::new(batches))
    }

    /// Overrides how many items each scroll pass reveals
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn current_batch(&self) -> Result<&[RawItem], AdapterError> {
        let target = self
            .current_target
            .as_deref()
            .ok_or_else(|| AdapterError::Read("no search view loaded".to_string()))?;
        // An unknown target behaves like a live search with no results
        Ok(self.batches.get(target).map(Vec::as_slice).unwrap_or(&[]))
    }
}

#[async_trait]
impl FeedAdapter for ReplayFeed {
    async fn authenticate(&mut self) -> Result<(), AdapterError> {
        self.authenticated = true;
        Ok(())
    }

    async fn load_search_view(&mut self, target: &str) -> Result<(), AdapterError> {
        if !self.authenticated {
            return Err(AdapterError::Load {
                target: target.to_string(),
                message: "not authenticated".to_string(),
            });
        }
        self.current_target = Some(target.to_string());
        let available = self.batches.get(target).map(Vec::len).unwrap_or(0);
        self.visible = self.page_size.min(available);
        Ok(())
    }

    async fn snapshot(&mut self) -> Result<ViewSnapshot, AdapterError> {
        let target = self
            .current_target
            .as_deref()
            .ok_or_else(|| AdapterError::Read("no search view loaded".to_string()))?;
        Ok(ViewSnapshot {
            text: format!("Live search results for #{}", target),
            error_messages: Vec::new(),
        })
    }

    async fn visible_items(&mut self) -> Result<Vec<RawItem>, AdapterError> {
        let visible = self.visible;
        let batch = self.current_batch()?;
        Ok(batch[..visible.min(batch.len())].to_vec())
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), AdapterError> {
        let page = self.page_size;
        let total = self.current_batch()?.len();
        self.visible = (self.visible + page).min(total);
        Ok(())
    }

    async fn wait_for_stabilization(&mut self, _timeout: Duration) -> Result<(), AdapterError> {
        Ok(())
    }

    async fn close(&mut self) {
        self.authenticated = false;
        self.current_target = None;
        self.visible = 0;
    }
}
