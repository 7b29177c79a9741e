pub mod app_conf;
pub mod branding_conf;
pub mod email_conf;
pub mod mongo_conf;
pub mod quote_conf;

pub use app_conf::AppConfig;
pub use branding_conf::BrandingConfig;
pub use email_conf::EmailConfig;
pub use mongo_conf::MongoConfig;
pub use quote_conf::QuoteConfig;

/// Common configuration error type
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}
