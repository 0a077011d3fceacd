//! Retry shell around the collection loop
//!
//! Classifies each terminal loop outcome and decides whether another attempt
//! is worth making. A non-empty collection is accepted as-is; failed targets
//! are recorded in the campaign stats rather than aborting the campaign.

use crate::adapter::FeedAdapter;
use crate::cancel::sleep_unless_cancelled;
use crate::collector::run::{LoopOutcome, TargetCollector};
use crate::collector::CollectedItem;

impl<'a, A: FeedAdapter> TargetCollector<'a, A> {
    /// Collects one target's items, retrying failed attempts
    ///
    /// Returns whatever was collected on the first attempt that yields
    /// anything. Once every attempt has come back empty or failed, the target
    /// is recorded as failed and an empty batch is returned so the campaign
    /// can move on.
    pub async fn collect_with_retry(&mut self, target: &str) -> Vec<CollectedItem> {
        let max_attempts = self.retry.max_target_retries;

        for attempt in 0..max_attempts {
            if self.cancel.is_cancelled() {
                return Vec::new();
            }
            if attempt > 0 {
                tracing::info!(
                    "Attempt {}/{} for target '{}'",
                    attempt + 1,
                    max_attempts,
                    target
                );
            }

            match self.run_once(target).await {
                LoopOutcome::Collected(items) if !items.is_empty() => {
                    if attempt > 0 {
                        self.stats.successful_retries += 1;
                    }
                    return items;
                }
                LoopOutcome::Collected(_) => {
                    // An empty run needs no cool-down before trying again
                    tracing::warn!(
                        "No items collected for '{}' (attempt {}/{})",
                        target,
                        attempt + 1,
                        max_attempts
                    );
                }
                LoopOutcome::RateLimited {
                    explicit_delay,
                    reason,
                } => {
                    let delay = self.backoff.delay(attempt, explicit_delay);
                    tracing::warn!(
                        "Rate limited on '{}' ({}), cooling down {:.1}s",
                        target,
                        reason,
                        delay.as_secs_f64()
                    );
                    if !sleep_unless_cancelled(self.cancel, delay).await {
                        return Vec::new();
                    }
                }
                LoopOutcome::Failed(message) => {
                    let delay = self.backoff.delay(attempt, None);
                    tracing::warn!(
                        "Attempt {}/{} for '{}' failed ({}), waiting {:.1}s",
                        attempt + 1,
                        max_attempts,
                        target,
                        message,
                        delay.as_secs_f64()
                    );
                    if !sleep_unless_cancelled(self.cancel, delay).await {
                        return Vec::new();
                    }
                }
            }
        }

        tracing::error!(
            "All {} attempts for '{}' came back empty or failed",
            max_attempts,
            target
        );
        self.stats.failed_targets.push(target.to_string());
        Vec::new()
    }
}
