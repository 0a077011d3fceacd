//! Campaign orchestration across a list of targets
//!
//! A campaign authenticates once, then visits each configured target in
//! order, lending the shared budget book and stats to a fresh per-target
//! collector. Individual target failures are absorbed; only authentication
//! failure aborts the whole run.

mod stats;

pub use stats::{print_statistics, CampaignStats};

use crate::adapter::FeedAdapter;
use crate::cancel::{sleep_unless_cancelled, CancelFlag};
use crate::collector::run::uniform_delay;
use crate::collector::{CollectedItem, TargetCollector};
use crate::config::Config;
use crate::limits::{BackoffPolicy, BudgetBook, RateLimitDetector, RateLimitStatus};
use crate::DriftnetError;
use std::time::Duration;

/// Everything a finished campaign produced
#[derive(Debug)]
pub struct CampaignResult {
    /// All collected items across all targets, in collection order
    pub items: Vec<CollectedItem>,

    /// Campaign-wide counters and final budget consumption
    pub stats: CampaignStats,
}

/// Runs one collection campaign over the configured targets
pub struct CampaignRunner<A: FeedAdapter> {
    adapter: A,
    config: Config,
    cancel: CancelFlag,
}

impl<A: FeedAdapter> CampaignRunner<A> {
    pub fn new(adapter: A, config: Config, cancel: CancelFlag) -> Self {
        Self {
            adapter,
            config,
            cancel,
        }
    }

    /// Runs the campaign to completion
    ///
    /// Authentication failure is the only error; everything after it is
    /// absorbed into the result. The adapter is closed before returning on
    /// every path.
    pub async fn run(mut self) -> crate::Result<CampaignResult> {
        let mut stats = CampaignStats::default();

        if let Err(auth_err) = self.authenticate_with_retry().await {
            self.adapter.close().await;
            return Err(auth_err);
        }

        let mut budgets = BudgetBook::new(&self.config.limits);
        let backoff = BackoffPolicy::new(&self.config.backoff);
        let detector = RateLimitDetector::new();
        let targets = self.config.campaign.targets.clone();
        let mut items: Vec<CollectedItem> = Vec::new();

        for (index, target) in targets.iter().enumerate() {
            if self.cancel.is_cancelled() {
                tracing::info!("Cancellation requested, ending campaign early");
                break;
            }

            tracing::info!(
                "Collecting target {}/{}: '{}'",
                index + 1,
                targets.len(),
                target
            );

            let mut collector = TargetCollector {
                adapter: &mut self.adapter,
                budgets: &mut budgets,
                backoff: &backoff,
                detector: &detector,
                collection: &self.config.collection,
                retry: &self.config.retry,
                cancel: &self.cancel,
                stats: &mut stats,
                target_count: self.config.campaign.items_per_target,
            };
            let batch = collector.collect_with_retry(target).await;
            tracing::info!(
                "Target '{}' done: {} items ({} total)",
                target,
                batch.len(),
                items.len() + batch.len()
            );
            items.extend(batch);

            // Pause between targets, but not after the last one
            if index + 1 < targets.len() {
                let pause = match budgets.global_status() {
                    RateLimitStatus::Limited => backoff.delay(2, None),
                    RateLimitStatus::Approaching => uniform_delay(10.0, 15.0),
                    RateLimitStatus::Ok => uniform_delay(5.0, 8.0),
                };
                tracing::debug!("Pausing {:.1}s before next target", pause.as_secs_f64());
                if !sleep_unless_cancelled(&self.cancel, pause).await {
                    break;
                }
            }
        }

        self.adapter.close().await;
        stats.budgets = budgets.snapshots();
        Ok(CampaignResult { items, stats })
    }

    /// Authenticates with a progressive delay between attempts
    async fn authenticate_with_retry(&mut self) -> crate::Result<()> {
        let attempts = self.config.retry.login_attempts;
        let mut last_message = String::new();

        for attempt in 0..attempts {
            if self.cancel.is_cancelled() {
                return Err(DriftnetError::Auth("cancelled".to_string()));
            }
            match self.adapter.authenticate().await {
                Ok(()) => {
                    tracing::info!("Authenticated on attempt {}/{}", attempt + 1, attempts);
                    return Ok(());
                }
                Err(auth_err) => {
                    last_message = auth_err.to_string();
                    tracing::warn!(
                        "Authentication attempt {}/{} failed: {}",
                        attempt + 1,
                        attempts,
                        last_message
                    );
                    if attempt + 1 < attempts {
                        let delay = Duration::from_secs((attempt as u64 + 1) * 10);
                        if !sleep_unless_cancelled(&self.cancel, delay).await {
                            return Err(DriftnetError::Auth("cancelled".to_string()));
                        }
                    }
                }
            }
        }

        tracing::error!("Authentication failed after {} attempts", attempts);
        Err(DriftnetError::Auth(last_message))
    }
}
