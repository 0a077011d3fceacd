//! Campaign statistics accumulation and display
//!
//! Counters are bumped as the collection loops run and snapshotted once the
//! campaign finishes.

use crate::limits::BudgetSnapshot;
use serde::Serialize;

/// Counters accumulated across one whole campaign
#[derive(Debug, Clone, Default, Serialize)]
pub struct CampaignStats {
    /// Budget-consuming requests issued (search-view loads)
    pub total_requests: u64,

    /// Rate-limit conditions encountered (detector signals and exhausted
    /// budget tiers)
    pub rate_limit_hits: u64,

    /// Targets that only yielded items on a retry attempt
    pub successful_retries: u64,

    /// Targets that yielded nothing after every attempt
    pub failed_targets: Vec<String>,

    /// Final per-scope budget consumption, sorted by scope name
    pub budgets: Vec<BudgetSnapshot>,
}

/// Prints a campaign summary to stdout in a formatted manner
pub fn print_statistics(stats: &CampaignStats, total_items: usize, total_targets: usize) {
    println!("=== Campaign Statistics ===\n");

    println!("Overview:");
    println!("  Items collected: {}", total_items);
    println!("  Requests issued: {}", stats.total_requests);
    println!("  Rate limit hits: {}", stats.rate_limit_hits);
    println!("  Successful retries: {}", stats.successful_retries);
    println!();

    if !stats.failed_targets.is_empty() {
        println!("Failed Targets ({}):", stats.failed_targets.len());
        for target in &stats.failed_targets {
            println!("  - {}", target);
        }
        println!();
    }

    if !stats.budgets.is_empty() {
        println!("Budget Consumption:");
        for snapshot in &stats.budgets {
            println!("  {}: {}/{}", snapshot.scope, snapshot.consumed, snapshot.limit);
        }
        println!();
    }

    let succeeded = total_targets.saturating_sub(stats.failed_targets.len());
    let success_rate = if total_targets > 0 {
        (succeeded as f64 / total_targets as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Success Rate: {:.1}% ({} / {} targets yielded items)",
        success_rate, succeeded, total_targets
    );
}
