use serde::{Deserialize, Serialize};
use std::env;
use tracing::{debug, info, warn};

use crate::config::ConfigError;

/// Listing and notification settings for the quote workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteConfig {
    pub default_page_size: u64,
    /// Upper bound applied to the `limit` query parameter.
    pub max_page_size: u64,
    /// Recipient of the new-quote alert. No alert is sent when unset.
    pub admin_notification_email: Option<String>,
}

impl QuoteConfig {
    /// - QUOTE_DEFAULT_PAGE_SIZE (defaults to 20)
    /// - QUOTE_MAX_PAGE_SIZE (defaults to 100)
    /// - ADMIN_NOTIFICATION_EMAIL (optional)
    pub fn from_env() -> Result<Self, ConfigError> {
        info!("Loading quote configuration from environment variables");
        let defaults = QuoteConfig::default();

        let default_page_size = parse_or("QUOTE_DEFAULT_PAGE_SIZE", defaults.default_page_size)?;
        let max_page_size = parse_or("QUOTE_MAX_PAGE_SIZE", defaults.max_page_size)?;
        let admin_notification_email = env::var("ADMIN_NOTIFICATION_EMAIL")
            .ok()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
        if admin_notification_email.is_none() {
            warn!("ADMIN_NOTIFICATION_EMAIL not set, new-quote alerts are disabled");
        }

        let config = QuoteConfig { default_page_size, max_page_size, admin_notification_email };
        config.validate()?;
        debug!(?config, "Quote configuration loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_page_size == 0 {
            return Err(ConfigError::ValidationError("QUOTE_MAX_PAGE_SIZE must be greater than 0".to_string()));
        }
        if self.default_page_size == 0 || self.default_page_size > self.max_page_size {
            return Err(ConfigError::ValidationError(
                "QUOTE_DEFAULT_PAGE_SIZE must be between 1 and QUOTE_MAX_PAGE_SIZE".to_string(),
            ));
        }
        if let Some(email) = &self.admin_notification_email {
            if !email.contains('@') {
                return Err(ConfigError::ValidationError("Invalid ADMIN_NOTIFICATION_EMAIL".to_string()));
            }
        }
        Ok(())
    }

    /// Resolves a requested page size: missing → default, otherwise clamped to `1..=max`.
    pub fn page_size(&self, requested: Option<u64>) -> u64 {
        match requested {
            Some(limit) => limit.clamp(1, self.max_page_size),
            None => self.default_page_size,
        }
    }
}

fn parse_or(var: &str, default: u64) -> Result<u64, ConfigError> {
    match env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidValue(format!("Invalid {} value", var))),
        Err(_) => Ok(default),
    }
}

impl Default for QuoteConfig {
    fn default() -> Self {
        QuoteConfig {
            default_page_size: 20,
            max_page_size: 100,
            admin_notification_email: None,
        }
    }
}
