//! Driftnet: an adaptive rate-limited feed collector
//!
//! This crate implements a collection engine that drives an external, paginated
//! content source (a search-result feed with infinite scroll) across a list of
//! keyword targets, collecting as many unique items as possible per target
//! without tripping the source's rate-limiting policy.

pub mod adapter;
pub mod campaign;
pub mod cancel;
pub mod collector;
pub mod config;
pub mod limits;

use thiserror::Error;

/// Main error type for Driftnet operations
#[derive(Debug, Error)]
pub enum DriftnetError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Adapter error: {0}")]
    Adapter(#[from] adapter::AdapterError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for Driftnet operations
pub type Result<T> = std::result::Result<T, DriftnetError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use adapter::{AdapterError, FeedAdapter, RawItem, ViewSnapshot};
pub use campaign::{CampaignResult, CampaignRunner, CampaignStats};
pub use cancel::CancelFlag;
pub use collector::{CollectedItem, LoopOutcome};
pub use config::Config;
pub use limits::{BackoffPolicy, BudgetBook, RateBudget, RateLimitDetector, RateLimitStatus};
