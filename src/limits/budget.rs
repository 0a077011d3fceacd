use crate::config::LimitsConfig;
use serde::Serialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Scope name for the campaign-wide budget
pub const GLOBAL_SCOPE: &str = "global";

/// Coarse rate-limit condition derived from the global budget
///
/// Matched exhaustively wherever a delay tier is chosen, so adding a case
/// forces every pacing site to handle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitStatus {
    /// Plenty of budget left
    Ok,
    /// At or past 75% of the window's budget
    Approaching,
    /// Budget exhausted for the current window
    Limited,
}

/// Tracks request consumption against a quota over a rolling window
///
/// One budget exists per named scope: `global` for the whole campaign and
/// `target:<name>` for each collection target. All time-sensitive methods
/// take `now: Instant` so tests control the clock.
#[derive(Debug, Clone)]
pub struct RateBudget {
    /// Identifying key for this budget's scope
    pub scope: String,

    /// Requests recorded in the current window
    pub consumed: u32,

    /// Maximum requests allowed per window
    pub limit: u32,

    /// Length of one window
    pub window: Duration,

    /// When the current window rolls over
    pub window_reset_at: Instant,

    /// Timestamp of the most recent recorded request
    pub last_request_at: Option<Instant>,

    /// Consecutive rate-limit responses observed, capped at
    /// [`RateBudget::MAX_CONSECUTIVE_BACKOFFS`]
    pub consecutive_backoffs: u32,
}

impl RateBudget {
    /// Cap on the consecutive-backoff counter
    pub const MAX_CONSECUTIVE_BACKOFFS: u32 = 5;

    /// Utilization fraction at which the status becomes `Approaching`
    const APPROACHING_FRACTION: f64 = 0.75;

    /// Creates a budget whose first window starts at `now`
    pub fn new(scope: impl Into<String>, limit: u32, window: Duration, now: Instant) -> Self {
        Self {
            scope: scope.into(),
            consumed: 0,
            limit,
            window,
            window_reset_at: now + window,
            last_request_at: None,
            consecutive_backoffs: 0,
        }
    }

    /// Checks whether a request may be issued now
    ///
    /// If the current window has expired this performs the rollover reset
    /// (consumed back to zero, reset time advanced by one window length,
    /// backoff counter cleared) and returns true. Otherwise returns whether
    /// there is budget left in the window.
    pub fn can_proceed(&mut self, now: Instant) -> bool {
        if now >= self.window_reset_at {
            self.consumed = 0;
            self.window_reset_at = now + self.window;
            self.consecutive_backoffs = 0;
            return true;
        }
        self.consumed < self.limit
    }

    /// Records that a request was issued
    ///
    /// Must only be called after a corresponding [`Self::can_proceed`] check
    /// succeeded and the real request went out.
    pub fn record(&mut self, now: Instant) {
        self.consumed += 1;
        self.last_request_at = Some(now);
    }

    /// Seconds until the current window rolls over
    pub fn seconds_until_reset(&self, now: Instant) -> f64 {
        self.window_reset_at
            .saturating_duration_since(now)
            .as_secs_f64()
    }

    /// Fraction of this window's budget already consumed
    pub fn utilization(&self) -> f64 {
        self.consumed as f64 / self.limit as f64
    }

    /// Whether the window's budget is exhausted
    pub fn is_exhausted(&self) -> bool {
        self.consumed >= self.limit
    }

    /// Derives the coarse rate-limit status from current consumption
    pub fn status(&self) -> RateLimitStatus {
        if self.is_exhausted() {
            RateLimitStatus::Limited
        } else if self.utilization() >= Self::APPROACHING_FRACTION {
            RateLimitStatus::Approaching
        } else {
            RateLimitStatus::Ok
        }
    }

    /// Bumps the consecutive-backoff counter, saturating at the cap
    pub fn bump_backoff(&mut self) {
        self.consecutive_backoffs =
            (self.consecutive_backoffs + 1).min(Self::MAX_CONSECUTIVE_BACKOFFS);
    }

    /// Captures an immutable snapshot for statistics reporting
    pub fn snapshot(&self) -> BudgetSnapshot {
        BudgetSnapshot {
            scope: self.scope.clone(),
            consumed: self.consumed,
            limit: self.limit,
        }
    }
}

/// Point-in-time view of one budget, for stats output
#[derive(Debug, Clone, Serialize)]
pub struct BudgetSnapshot {
    pub scope: String,
    pub consumed: u32,
    pub limit: u32,
}

/// The set of budgets for one campaign, keyed by scope name
///
/// Owned by the campaign runner and lent to each collection loop in turn;
/// budgets are created lazily on first use of a scope and live for the
/// campaign lifetime.
#[derive(Debug)]
pub struct BudgetBook {
    budgets: HashMap<String, RateBudget>,
    global_limit: u32,
    target_limit: u32,
    window: Duration,
}

impl BudgetBook {
    /// Creates an empty book with the configured limits
    pub fn new(config: &LimitsConfig) -> Self {
        Self {
            budgets: HashMap::new(),
            global_limit: config.global_limit,
            target_limit: config.target_limit,
            window: Duration::from_secs(config.window_seconds),
        }
    }

    /// Gets or lazily creates the campaign-wide budget
    pub fn global(&mut self, now: Instant) -> &mut RateBudget {
        let limit = self.global_limit;
        let window = self.window;
        self.budgets
            .entry(GLOBAL_SCOPE.to_string())
            .or_insert_with(|| RateBudget::new(GLOBAL_SCOPE, limit, window, now))
    }

    /// Gets or lazily creates the budget for one target's scope
    pub fn target(&mut self, target: &str, now: Instant) -> &mut RateBudget {
        let limit = self.target_limit;
        let window = self.window;
        let scope = format!("target:{}", target);
        self.budgets
            .entry(scope.clone())
            .or_insert_with(|| RateBudget::new(scope, limit, window, now))
    }

    /// Status of the global budget without creating it
    ///
    /// Before any request has been recorded the status is trivially `Ok`.
    pub fn global_status(&self) -> RateLimitStatus {
        self.budgets
            .get(GLOBAL_SCOPE)
            .map(|b| b.status())
            .unwrap_or(RateLimitStatus::Ok)
    }

    /// Snapshots every live budget, sorted by scope name
    pub fn snapshots(&self) -> Vec<BudgetSnapshot> {
        let mut snaps: Vec<BudgetSnapshot> =
            self.budgets.values().map(RateBudget::snapshot).collect();
        snaps.sort_by(|a, b| a.scope.cmp(&b.scope));
        snaps
    }
}
