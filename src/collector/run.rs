//! The per-target collection loop
//!
//! Drives one target's scroll/extract/dedupe cycle until a stop condition
//! fires: target count reached, feed exhausted, scroll ceiling hit,
//! cancellation, or a rate-limit escalation.

use crate::adapter::FeedAdapter;
use crate::campaign::CampaignStats;
use crate::cancel::{sleep_unless_cancelled, CancelFlag};
use crate::collector::state::{patience_threshold, CollectionState};
use crate::collector::CollectedItem;
use crate::config::{CollectionConfig, RetryConfig};
use crate::limits::{BackoffPolicy, BudgetBook, RateLimitDetector, RateLimitSignal, RateLimitStatus};
use chrono::Utc;
use rand::Rng;
use std::time::{Duration, Instant};

/// Longest any single suspension may stall the campaign
const MAX_SINGLE_SLEEP: f64 = 300.0;

/// Consecutive in-loop rate-limit signals tolerated before escalating
const MAX_CONSECUTIVE_SIGNALS: u32 = 2;

/// Terminal result of one collection loop run
///
/// An explicit result type rather than an error, so the retry shell can
/// pattern-match without an exception hierarchy.
#[derive(Debug)]
pub enum LoopOutcome {
    /// Normal stop: target reached, feed exhausted, ceiling hit, or cancelled.
    /// Carries everything collected, possibly nothing.
    Collected(Vec<CollectedItem>),

    /// Rate limiting escalated past the in-loop tolerance
    RateLimited {
        /// Server-communicated wait, when one was signalled
        explicit_delay: Option<Duration>,
        reason: String,
    },

    /// A non-rate-limit adapter failure ended the run
    Failed(String),
}

/// Collects items for one target at a time
///
/// Borrows the campaign's shared collaborators; the campaign runner builds
/// one per target, which keeps budget accounting strictly sequential.
pub struct TargetCollector<'a, A: FeedAdapter> {
    pub(crate) adapter: &'a mut A,
    pub(crate) budgets: &'a mut BudgetBook,
    pub(crate) backoff: &'a BackoffPolicy,
    pub(crate) detector: &'a RateLimitDetector,
    pub(crate) collection: &'a CollectionConfig,
    pub(crate) retry: &'a RetryConfig,
    pub(crate) cancel: &'a CancelFlag,
    pub(crate) stats: &'a mut CampaignStats,
    /// Unique items to collect for this target
    pub(crate) target_count: usize,
}

impl<'a, A: FeedAdapter> TargetCollector<'a, A> {
    /// Runs the collection state machine once for `target`
    pub async fn run_once(&mut self, target: &str) -> LoopOutcome {
        let mut state = CollectionState::new();

        if self.cancel.is_cancelled() {
            return LoopOutcome::Collected(state.collected);
        }

        // Loading
        if let Err(load_err) = self.adapter.load_search_view(target).await {
            // A failed load is only a rate-limit failure if a signal is
            // independently present; otherwise the run ends with nothing.
            if let Some(signal) = self.try_detect().await {
                tracing::error!(
                    "Rate limit detected while loading view for '{}': {}",
                    target,
                    signal.message
                );
                return LoopOutcome::RateLimited {
                    explicit_delay: None,
                    reason: signal.message,
                };
            }
            tracing::warn!("Failed to load search view for '{}': {}", target, load_err);
            return LoopOutcome::Collected(state.collected);
        }

        // The search load is the request that consumes budget
        if !self.pace_search(target).await {
            return LoopOutcome::Collected(state.collected);
        }
        tracing::info!("Search view loaded for '{}'", target);

        while state.count() < self.target_count && state.scroll_count < self.collection.scroll_ceiling
        {
            if self.cancel.is_cancelled() {
                tracing::info!("Cancellation requested, stopping '{}'", target);
                break;
            }

            // Check for rate-limit signals before extracting
            if let Some(signal) = self.try_detect().await {
                state.consecutive_rate_limit_signals += 1;
                self.stats.rate_limit_hits += 1;
                if state.consecutive_rate_limit_signals > MAX_CONSECUTIVE_SIGNALS {
                    tracing::error!("Repeated rate limit signals for '{}'", target);
                    return LoopOutcome::RateLimited {
                        explicit_delay: None,
                        reason: signal.message,
                    };
                }
                let delay = self
                    .backoff
                    .delay(state.consecutive_rate_limit_signals - 1, None);
                tracing::warn!(
                    "Rate limit signal during scroll {} of '{}', backing off {:.1}s",
                    state.scroll_count,
                    target,
                    delay.as_secs_f64()
                );
                if !sleep_unless_cancelled(self.cancel, delay).await {
                    break;
                }
                // Skip extraction this pass
                continue;
            }
            state.consecutive_rate_limit_signals = 0;

            // Extracting
            let before = state.count();
            match self.adapter.visible_items().await {
                Ok(items) => {
                    let captured_at = Utc::now();
                    for item in items {
                        state.admit(item, target, captured_at);
                        if state.count() >= self.target_count {
                            break;
                        }
                    }
                }
                Err(read_err) => {
                    // Transient read problems count as an empty pass
                    tracing::debug!("Failed to read visible items: {}", read_err);
                }
            }

            // Evaluating
            if state.count() == before {
                state.empty_scroll_streak += 1;
                let patience = patience_threshold(state.count(), self.collection);
                if state.empty_scroll_streak % 5 == 0 {
                    tracing::info!(
                        "'{}': {} items, {}/{} empty scrolls",
                        target,
                        state.count(),
                        state.empty_scroll_streak,
                        patience
                    );
                }
                if state.empty_scroll_streak >= patience {
                    tracing::info!(
                        "No new items for {} consecutive scrolls at {} items. Feed exhausted for '{}'.",
                        patience,
                        state.count(),
                        target
                    );
                    break;
                }
            } else {
                state.empty_scroll_streak = 0;
            }

            if state.count() >= self.target_count {
                break;
            }

            // Advancing
            let delay = self.scroll_delay(&state);
            if !sleep_unless_cancelled(self.cancel, delay).await {
                break;
            }
            if let Err(scroll_err) = self.adapter.scroll_to_bottom().await {
                return LoopOutcome::Failed(format!("scroll failed: {}", scroll_err));
            }
            let timeout = Duration::from_secs(self.collection.stabilize_timeout_seconds);
            if let Err(wait_err) = self.adapter.wait_for_stabilization(timeout).await {
                tracing::debug!("Stabilization wait ended early: {}", wait_err);
            }
            state.scroll_count += 1;

            if state.scroll_count % 10 == 0 {
                tracing::info!(
                    "'{}': {} items collected (scroll {})",
                    target,
                    state.count(),
                    state.scroll_count
                );
            }
        }

        tracing::info!("Collected {} items for '{}'", state.count(), target);
        LoopOutcome::Collected(state.collected)
    }

    /// Reads a snapshot and scans it; read failures are treated as "no signal"
    async fn try_detect(&mut self) -> Option<RateLimitSignal> {
        match self.adapter.snapshot().await {
            Ok(snapshot) => self.detector.inspect(&snapshot),
            Err(read_err) => {
                tracing::debug!("Snapshot read failed: {}", read_err);
                None
            }
        }
    }

    /// Gates the search load on both budget scopes, applies the tier delay,
    /// and records the request
    ///
    /// Returns false if cancellation cut the wait short.
    async fn pace_search(&mut self, target: &str) -> bool {
        // Wait out exhausted windows, one cap-bounded sleep at a time
        loop {
            let now = Instant::now();
            let scope_ready = self.budgets.target(target, now).can_proceed(now);
            let global_ready = self.budgets.global(now).can_proceed(now);
            if scope_ready && global_ready {
                break;
            }
            let (scope_name, reset_in) = if !scope_ready {
                let budget = self.budgets.target(target, now);
                (budget.scope.clone(), budget.seconds_until_reset(now))
            } else {
                let budget = self.budgets.global(now);
                (budget.scope.clone(), budget.seconds_until_reset(now))
            };
            let wait = Duration::from_secs_f64((reset_in + 2.0).min(MAX_SINGLE_SLEEP));
            tracing::warn!(
                "Budget '{}' exhausted, waiting {:.0}s for window reset",
                scope_name,
                wait.as_secs_f64()
            );
            if !sleep_unless_cancelled(self.cancel, wait).await {
                return false;
            }
        }

        let delay = match self.budgets.global_status() {
            RateLimitStatus::Limited => {
                // Unreachable right after the gate, but every tier site
                // matches the full status set
                self.stats.rate_limit_hits += 1;
                let attempt = self.bump_global_backoff();
                self.backoff.delay(attempt, None)
            }
            RateLimitStatus::Approaching => uniform_delay(4.0, 6.0),
            RateLimitStatus::Ok => uniform_delay(2.0, 3.0),
        };
        if !sleep_unless_cancelled(self.cancel, delay).await {
            return false;
        }

        let now = Instant::now();
        self.budgets.target(target, now).record(now);
        self.budgets.global(now).record(now);
        self.stats.total_requests += 1;
        let global = self.budgets.global(now);
        tracing::debug!(
            "Request #{} ({}): global {}/{}",
            self.stats.total_requests,
            target,
            global.consumed,
            global.limit
        );
        true
    }

    /// Chooses the scroll-pacing delay from the global budget's tier
    fn scroll_delay(&mut self, state: &CollectionState) -> Duration {
        match self.budgets.global_status() {
            RateLimitStatus::Limited => {
                self.stats.rate_limit_hits += 1;
                let attempt = self.bump_global_backoff();
                let delay = self.backoff.delay(attempt, None);
                tracing::warn!(
                    "Rate limited during scrolling, backing off {:.1}s",
                    delay.as_secs_f64()
                );
                delay
            }
            RateLimitStatus::Approaching => uniform_delay(3.5, 5.0),
            RateLimitStatus::Ok => {
                if state.empty_scroll_streak > 5 {
                    // Struggling to surface new content; give it longer
                    uniform_delay(4.0, 6.0)
                } else {
                    uniform_delay(2.5, 3.5)
                }
            }
        }
    }

    /// Reads then bumps the global consecutive-backoff counter
    fn bump_global_backoff(&mut self) -> u32 {
        let now = Instant::now();
        let global = self.budgets.global(now);
        let attempt = global.consecutive_backoffs;
        global.bump_backoff();
        attempt
    }
}

/// A delay drawn uniformly from `[low, high]` seconds
pub(crate) fn uniform_delay(low: f64, high: f64) -> Duration {
    Duration::from_secs_f64(rand::rng().random_range(low..=high))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::ReplayFeed;
    use crate::adapter::{AdapterError, RawItem, ViewSnapshot};
    use crate::config::LimitsConfig;
    use async_trait::async_trait;
    use std::collections::HashMap;

    fn items(prefix: &str, count: usize) -> Vec<RawItem> {
        (0..count)
            .map(|i| RawItem {
                text: format!("{} item number {}", prefix, i),
                author: Some("trader".to_string()),
                replies: None,
                retweets: None,
                likes: None,
            })
            .collect()
    }

    fn replay(target: &str, count: usize) -> ReplayFeed {
        let mut batches = HashMap::new();
        batches.insert(target.to_string(), items(target, count));
        ReplayFeed::new(batches)
    }

    struct TestRig {
        budgets: BudgetBook,
        backoff: BackoffPolicy,
        detector: RateLimitDetector,
        collection: CollectionConfig,
        retry: RetryConfig,
        cancel: CancelFlag,
        stats: CampaignStats,
    }

    impl TestRig {
        fn new() -> Self {
            Self {
                budgets: BudgetBook::new(&LimitsConfig::default()),
                backoff: BackoffPolicy::default(),
                detector: RateLimitDetector::new(),
                collection: CollectionConfig::default(),
                retry: RetryConfig::default(),
                cancel: CancelFlag::new(),
                stats: CampaignStats::default(),
            }
        }

        fn collector<'a, A: FeedAdapter>(
            &'a mut self,
            adapter: &'a mut A,
            target_count: usize,
        ) -> TargetCollector<'a, A> {
            TargetCollector {
                adapter,
                budgets: &mut self.budgets,
                backoff: &self.backoff,
                detector: &self.detector,
                collection: &self.collection,
                retry: &self.retry,
                cancel: &self.cancel,
                stats: &mut self.stats,
                target_count,
            }
        }
    }

    /// Adapter whose snapshots report a rate-limit phrase a fixed number of times
    struct SignallingFeed {
        inner: ReplayFeed,
        signals_remaining: u32,
    }

    #[async_trait]
    impl FeedAdapter for SignallingFeed {
        async fn authenticate(&mut self) -> Result<(), AdapterError> {
            self.inner.authenticate().await
        }

        async fn load_search_view(&mut self, target: &str) -> Result<(), AdapterError> {
            self.inner.load_search_view(target).await
        }

        async fn snapshot(&mut self) -> Result<ViewSnapshot, AdapterError> {
            if self.signals_remaining > 0 {
                self.signals_remaining -= 1;
                return Ok(ViewSnapshot {
                    text: "Rate limit exceeded. Please wait.".to_string(),
                    error_messages: Vec::new(),
                });
            }
            self.inner.snapshot().await
        }

        async fn visible_items(&mut self) -> Result<Vec<RawItem>, AdapterError> {
            self.inner.visible_items().await
        }

        async fn scroll_to_bottom(&mut self) -> Result<(), AdapterError> {
            self.inner.scroll_to_bottom().await
        }

        async fn wait_for_stabilization(&mut self, timeout: Duration) -> Result<(), AdapterError> {
            self.inner.wait_for_stabilization(timeout).await
        }

        async fn close(&mut self) {
            self.inner.close().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_collects_until_target_count() {
        let mut feed = replay("nifty50", 60).with_page_size(20);
        feed.authenticate().await.unwrap();
        let mut rig = TestRig::new();
        let mut collector = rig.collector(&mut feed, 50);

        match collector.run_once("nifty50").await {
            LoopOutcome::Collected(collected) => {
                assert_eq!(collected.len(), 50);
                assert_eq!(collected[0].text, "nifty50 item number 0");
                assert_eq!(collected[49].text, "nifty50 item number 49");
            }
            other => panic!("expected Collected, got {:?}", other),
        }
        assert_eq!(rig.stats.total_requests, 1);
        assert_eq!(rig.stats.rate_limit_hits, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_thin_feed_stops_under_target() {
        let mut feed = replay("sensex", 7).with_page_size(5);
        feed.authenticate().await.unwrap();
        let mut rig = TestRig::new();
        let mut collector = rig.collector(&mut feed, 100);

        match collector.run_once("sensex").await {
            LoopOutcome::Collected(collected) => assert_eq!(collected.len(), 7),
            other => panic!("expected Collected, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_feed_items_collapse() {
        let mut batches = HashMap::new();
        batches.insert(
            "intraday".to_string(),
            vec![
                RawItem {
                    text: "Buy the dip!".to_string(),
                    author: None,
                    replies: None,
                    retweets: None,
                    likes: None,
                },
                RawItem {
                    text: "buy the dip".to_string(),
                    author: None,
                    replies: None,
                    retweets: None,
                    likes: None,
                },
            ],
        );
        let mut feed = ReplayFeed::new(batches);
        feed.authenticate().await.unwrap();
        let mut rig = TestRig::new();
        let mut collector = rig.collector(&mut feed, 10);

        match collector.run_once("intraday").await {
            LoopOutcome::Collected(collected) => assert_eq!(collected.len(), 1),
            other => panic!("expected Collected, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_signals_are_ridden_out() {
        let mut inner = replay("nifty50", 30).with_page_size(30);
        inner.authenticate().await.unwrap();
        let mut feed = SignallingFeed {
            inner,
            signals_remaining: 2,
        };
        let mut rig = TestRig::new();
        let mut collector = rig.collector(&mut feed, 30);

        match collector.run_once("nifty50").await {
            LoopOutcome::Collected(collected) => assert_eq!(collected.len(), 30),
            other => panic!("expected Collected, got {:?}", other),
        }
        assert_eq!(rig.stats.rate_limit_hits, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_three_consecutive_signals_escalate() {
        let mut inner = replay("nifty50", 30);
        inner.authenticate().await.unwrap();
        let mut feed = SignallingFeed {
            inner,
            signals_remaining: 3,
        };
        let mut rig = TestRig::new();
        let mut collector = rig.collector(&mut feed, 30);

        match collector.run_once("nifty50").await {
            LoopOutcome::RateLimited { explicit_delay, .. } => {
                assert!(explicit_delay.is_none());
            }
            other => panic!("expected RateLimited, got {:?}", other),
        }
        assert_eq!(rig.stats.rate_limit_hits, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_failure_without_signal_is_empty_stop() {
        // Never authenticated, so the view load fails and the snapshot
        // (also failing) yields no signal
        let mut feed = replay("nifty50", 30);
        let mut rig = TestRig::new();
        let mut collector = rig.collector(&mut feed, 30);

        match collector.run_once("nifty50").await {
            LoopOutcome::Collected(collected) => assert!(collected.is_empty()),
            other => panic!("expected Collected, got {:?}", other),
        }
        // No request was issued, so none was recorded
        assert_eq!(rig.stats.total_requests, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_flag_stops_promptly() {
        let mut feed = replay("nifty50", 500).with_page_size(5);
        feed.authenticate().await.unwrap();
        let mut rig = TestRig::new();
        rig.cancel.cancel();
        let mut collector = rig.collector(&mut feed, 400);

        match collector.run_once("nifty50").await {
            LoopOutcome::Collected(collected) => assert!(collected.is_empty()),
            other => panic!("expected Collected, got {:?}", other),
        }
    }
}
