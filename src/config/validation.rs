use crate::config::types::{
    BackoffConfig, CampaignConfig, CollectionConfig, Config, LimitsConfig, RetryConfig,
};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_campaign(&config.campaign)?;
    validate_limits(&config.limits)?;
    validate_backoff(&config.backoff)?;
    validate_retry(&config.retry)?;
    validate_collection(&config.collection)?;
    Ok(())
}

/// Validates the campaign workload
fn validate_campaign(config: &CampaignConfig) -> Result<(), ConfigError> {
    if config.targets.is_empty() {
        return Err(ConfigError::Validation(
            "campaign.targets must list at least one target".to_string(),
        ));
    }

    for target in &config.targets {
        if target.trim().is_empty() {
            return Err(ConfigError::Validation(
                "campaign.targets must not contain empty entries".to_string(),
            ));
        }
        // Targets are raw keywords; a leading # would double up in search URLs
        if target.starts_with('#') || target.starts_with('@') {
            return Err(ConfigError::Validation(format!(
                "target '{}' must be a bare keyword without a # or @ prefix",
                target
            )));
        }
    }

    if config.items_per_target == 0 {
        return Err(ConfigError::Validation(
            "items-per-target must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates request budgets
fn validate_limits(config: &LimitsConfig) -> Result<(), ConfigError> {
    if config.global_limit < 1 {
        return Err(ConfigError::Validation(format!(
            "global-limit must be >= 1, got {}",
            config.global_limit
        )));
    }

    if config.target_limit < 1 {
        return Err(ConfigError::Validation(format!(
            "target-limit must be >= 1, got {}",
            config.target_limit
        )));
    }

    if config.window_seconds < 1 {
        return Err(ConfigError::Validation(format!(
            "window-seconds must be >= 1, got {}",
            config.window_seconds
        )));
    }

    Ok(())
}

/// Validates backoff parameters
fn validate_backoff(config: &BackoffConfig) -> Result<(), ConfigError> {
    if config.base_seconds <= 0.0 {
        return Err(ConfigError::Validation(format!(
            "base-seconds must be > 0, got {}",
            config.base_seconds
        )));
    }

    if config.ceiling_seconds < config.base_seconds {
        return Err(ConfigError::Validation(format!(
            "ceiling-seconds ({}) must be >= base-seconds ({})",
            config.ceiling_seconds, config.base_seconds
        )));
    }

    if config.multiplier < 1.0 {
        return Err(ConfigError::Validation(format!(
            "multiplier must be >= 1.0, got {}",
            config.multiplier
        )));
    }

    if !(0.0..1.0).contains(&config.jitter) {
        return Err(ConfigError::Validation(format!(
            "jitter must be in [0.0, 1.0), got {}",
            config.jitter
        )));
    }

    Ok(())
}

/// Validates retry counts
fn validate_retry(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_target_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "max-target-retries must be >= 1, got {}",
            config.max_target_retries
        )));
    }

    if config.login_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "login-attempts must be >= 1, got {}",
            config.login_attempts
        )));
    }

    Ok(())
}

/// Validates the collection loop settings
fn validate_collection(config: &CollectionConfig) -> Result<(), ConfigError> {
    if config.scroll_ceiling < 1 {
        return Err(ConfigError::Validation(format!(
            "scroll-ceiling must be >= 1, got {}",
            config.scroll_ceiling
        )));
    }

    let levels = [
        ("patience-early", config.patience_early),
        ("patience-mid", config.patience_mid),
        ("patience-late", config.patience_late),
        ("patience-final", config.patience_final),
    ];
    for (name, value) in levels {
        if value < 1 {
            return Err(ConfigError::Validation(format!(
                "{} must be >= 1, got {}",
                name, value
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            campaign: CampaignConfig {
                targets: vec!["nifty50".to_string()],
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_config_passes() {
        let config = valid_config();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_empty_targets_rejected() {
        let mut config = valid_config();
        config.campaign.targets.clear();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_prefixed_target_rejected() {
        let mut config = valid_config();
        config.campaign.targets = vec!["#nifty50".to_string()];
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_items_per_target_rejected() {
        let mut config = valid_config();
        config.campaign.items_per_target = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_global_limit_rejected() {
        let mut config = valid_config();
        config.limits.global_limit = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_ceiling_below_base_rejected() {
        let mut config = valid_config();
        config.backoff.base_seconds = 10.0;
        config.backoff.ceiling_seconds = 5.0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_jitter_of_one_rejected() {
        let mut config = valid_config();
        config.backoff.jitter = 1.0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_jitter_allowed() {
        let mut config = valid_config();
        config.backoff.jitter = 0.0;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_submultiplicative_backoff_rejected() {
        let mut config = valid_config();
        config.backoff.multiplier = 0.5;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_scroll_ceiling_rejected() {
        let mut config = valid_config();
        config.collection.scroll_ceiling = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_patience_rejected() {
        let mut config = valid_config();
        config.collection.patience_mid = 0;
        assert!(validate(&config).is_err());
    }
}
