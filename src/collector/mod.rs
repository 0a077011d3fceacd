//! Per-target collection: the scroll/extract/dedupe loop and its retry shell
//!
//! [`TargetCollector`] borrows the campaign's adapter, budgets, and stats and
//! drives collection for exactly one target. [`run::LoopOutcome`] is its
//! terminal result; `collect_with_retry` wraps the loop with outcome
//! classification and bounded retries.

pub mod run;
mod state;

mod retry;

pub use run::{LoopOutcome, TargetCollector};
pub use state::{fingerprint, patience_threshold, CollectedItem, CollectionState};
