use serde::Deserialize;

/// Main configuration structure for Driftnet
///
/// Every field carries a default matching the collection engine's built-in
/// constants, so a config file only needs to name what it overrides.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub campaign: CampaignConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub backoff: BackoffConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub collection: CollectionConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Campaign workload configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CampaignConfig {
    /// Keyword targets to collect for, in order
    #[serde(default)]
    pub targets: Vec<String>,

    /// Number of unique items to collect per target
    #[serde(rename = "items-per-target", default = "default_items_per_target")]
    pub items_per_target: usize,
}

/// Request budget configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Maximum requests per window across the whole campaign
    #[serde(rename = "global-limit", default = "default_global_limit")]
    pub global_limit: u32,

    /// Maximum requests per window for a single target scope
    #[serde(rename = "target-limit", default = "default_target_limit")]
    pub target_limit: u32,

    /// Length of the rolling budget window, in seconds
    #[serde(rename = "window-seconds", default = "default_window_seconds")]
    pub window_seconds: u64,
}

/// Exponential backoff configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BackoffConfig {
    /// Floor delay in seconds (also the first attempt's base)
    #[serde(rename = "base-seconds", default = "default_backoff_base")]
    pub base_seconds: f64,

    /// Ceiling on any single computed delay, in seconds
    #[serde(rename = "ceiling-seconds", default = "default_backoff_ceiling")]
    pub ceiling_seconds: f64,

    /// Growth factor per retry attempt
    #[serde(default = "default_backoff_multiplier")]
    pub multiplier: f64,

    /// Symmetric jitter fraction applied to the computed delay
    #[serde(default = "default_backoff_jitter")]
    pub jitter: f64,
}

/// Retry shell configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Full collection attempts per target before giving up on it
    #[serde(rename = "max-target-retries", default = "default_max_target_retries")]
    pub max_target_retries: u32,

    /// Authentication attempts before aborting the campaign
    #[serde(rename = "login-attempts", default = "default_login_attempts")]
    pub login_attempts: u32,
}

/// Per-target collection loop configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionConfig {
    /// Hard ceiling on scroll passes for one target
    #[serde(rename = "scroll-ceiling", default = "default_scroll_ceiling")]
    pub scroll_ceiling: u32,

    /// How long to wait for new content to stabilize after a scroll, in seconds
    #[serde(
        rename = "stabilize-timeout-seconds",
        default = "default_stabilize_timeout"
    )]
    pub stabilize_timeout_seconds: u64,

    /// Empty scrolls tolerated while fewer than 100 items are collected
    #[serde(rename = "patience-early", default = "default_patience_early")]
    pub patience_early: u32,

    /// Empty scrolls tolerated while fewer than 300 items are collected
    #[serde(rename = "patience-mid", default = "default_patience_mid")]
    pub patience_mid: u32,

    /// Empty scrolls tolerated while fewer than 500 items are collected
    #[serde(rename = "patience-late", default = "default_patience_late")]
    pub patience_late: u32,

    /// Empty scrolls tolerated at 500 items or more
    #[serde(rename = "patience-final", default = "default_patience_final")]
    pub patience_final: u32,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path the collected items are written to as JSON
    #[serde(rename = "items-path", default = "default_items_path")]
    pub items_path: String,
}

fn default_items_per_target() -> usize {
    750
}

fn default_global_limit() -> u32 {
    150
}

fn default_target_limit() -> u32 {
    100
}

fn default_window_seconds() -> u64 {
    900
}

fn default_backoff_base() -> f64 {
    2.0
}

fn default_backoff_ceiling() -> f64 {
    300.0
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_backoff_jitter() -> f64 {
    0.10
}

fn default_max_target_retries() -> u32 {
    3
}

fn default_login_attempts() -> u32 {
    5
}

fn default_scroll_ceiling() -> u32 {
    500
}

fn default_stabilize_timeout() -> u64 {
    10
}

fn default_patience_early() -> u32 {
    20
}

fn default_patience_mid() -> u32 {
    40
}

fn default_patience_late() -> u32 {
    60
}

fn default_patience_final() -> u32 {
    100
}

fn default_items_path() -> String {
    "./items.json".to_string()
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            targets: Vec::new(),
            items_per_target: default_items_per_target(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            global_limit: default_global_limit(),
            target_limit: default_target_limit(),
            window_seconds: default_window_seconds(),
        }
    }
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_seconds: default_backoff_base(),
            ceiling_seconds: default_backoff_ceiling(),
            multiplier: default_backoff_multiplier(),
            jitter: default_backoff_jitter(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_target_retries: default_max_target_retries(),
            login_attempts: default_login_attempts(),
        }
    }
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            scroll_ceiling: default_scroll_ceiling(),
            stabilize_timeout_seconds: default_stabilize_timeout(),
            patience_early: default_patience_early(),
            patience_mid: default_patience_mid(),
            patience_late: default_patience_late(),
            patience_final: default_patience_final(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            items_path: default_items_path(),
        }
    }
}
