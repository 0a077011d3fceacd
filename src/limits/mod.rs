//! Rate limiting primitives
//!
//! This module contains the three leaves the collection engine is built on:
//! - Windowed request budgets per named scope ([`RateBudget`], [`BudgetBook`])
//! - Exponential backoff with jitter and caps ([`BackoffPolicy`])
//! - Signal detection over view snapshots ([`RateLimitDetector`])

mod backoff;
mod budget;
mod detect;

pub use backoff::BackoffPolicy;
pub use budget::{BudgetBook, BudgetSnapshot, RateBudget, RateLimitStatus, GLOBAL_SCOPE};
pub use detect::{RateLimitDetector, RateLimitSignal, SignalKind};
