use serde::{Deserialize, Serialize};
use std::env;
use tracing::{debug, error, info, warn};

use crate::config::ConfigError;

/// MongoDB connection settings for the quote store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Overrides the default `quote_requests` collection name
    pub quote_collection: Option<String>,
    pub app_name: String,
    pub pool_size: u32,
    pub connection_timeout_secs: u64,
}

impl MongoConfig {
    /// Load MongoDB configuration from environment variables
    ///
    /// - MONGO_URI (required)
    /// - MONGO_DATABASE (required)
    /// - MONGO_USERNAME / MONGO_PASSWORD (optional, used together)
    /// - MONGO_QUOTE_COLLECTION (optional)
    /// - MONGO_APP_NAME (defaults to "PortfolioBackend")
    /// - MONGO_POOL_SIZE (defaults to 10)
    /// - MONGO_CONNECTION_TIMEOUT in seconds (defaults to 5)
    pub fn from_env() -> Result<Self, ConfigError> {
        info!("Loading MongoDB configuration from environment variables");

        let uri = env::var("MONGO_URI").map_err(|_| {
            error!("MONGO_URI environment variable not found");
            ConfigError::EnvVarNotFound("MONGO_URI".to_string())
        })?;

        let database = env::var("MONGO_DATABASE").map_err(|_| {
            error!("MONGO_DATABASE environment variable not found");
            ConfigError::EnvVarNotFound("MONGO_DATABASE".to_string())
        })?;
        debug!("MongoDB database: {}", database);

        let username = env::var("MONGO_USERNAME").ok();
        let password = env::var("MONGO_PASSWORD").ok();
        if username.is_some() != password.is_some() {
            warn!("Only one of MONGO_USERNAME / MONGO_PASSWORD is set; credentials will be ignored");
        }

        let quote_collection = env::var("MONGO_QUOTE_COLLECTION").ok();
        if let Some(ref coll) = quote_collection {
            debug!("MongoDB quote collection: {}", coll);
        }

        let app_name = env::var("MONGO_APP_NAME").unwrap_or_else(|_| "PortfolioBackend".to_string());

        let pool_size = env::var("MONGO_POOL_SIZE")
            .unwrap_or_else(|_| {
                warn!("MONGO_POOL_SIZE not set, using default: 10");
                "10".to_string()
            })
            .parse::<u32>()
            .map_err(|_| {
                error!("Invalid MONGO_POOL_SIZE value");
                ConfigError::InvalidValue("Invalid MONGO_POOL_SIZE value".to_string())
            })?;

        let connection_timeout_secs = env::var("MONGO_CONNECTION_TIMEOUT")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u64>()
            .map_err(|_| {
                error!("Invalid MONGO_CONNECTION_TIMEOUT value");
                ConfigError::InvalidValue("Invalid MONGO_CONNECTION_TIMEOUT value".to_string())
            })?;
        debug!(pool_size, connection_timeout_secs, "MongoDB pool settings");

        let config = MongoConfig {
            uri,
            database,
            username,
            password,
            quote_collection,
            app_name,
            pool_size,
            connection_timeout_secs,
        };

        config.validate()?;
        info!("MongoDB configuration loaded successfully");
        Ok(config)
    }

    pub fn from_test_env() -> Self {
        MongoConfig {
            uri: "mongodb://localhost:27017".to_string(),
            database: "portfolio_test".to_string(),
            username: None,
            password: None,
            quote_collection: Some("test_quote_requests".to_string()),
            app_name: "PortfolioBackendTest".to_string(),
            pool_size: 2,
            connection_timeout_secs: 2,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.uri.is_empty() {
            return Err(ConfigError::ValidationError("MongoDB URI cannot be empty".to_string()));
        }
        if !self.uri.starts_with("mongodb://") && !self.uri.starts_with("mongodb+srv://") {
            return Err(ConfigError::ValidationError(
                "MongoDB URI must start with mongodb:// or mongodb+srv://".to_string(),
            ));
        }
        if self.database.is_empty() {
            return Err(ConfigError::ValidationError("MongoDB database cannot be empty".to_string()));
        }
        if self.pool_size == 0 {
            return Err(ConfigError::ValidationError("MongoDB pool size must be greater than 0".to_string()));
        }
        if self.connection_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "MongoDB connection timeout must be greater than 0".to_string(),
            ));
        }
        if matches!(self.quote_collection.as_deref(), Some("")) {
            return Err(ConfigError::ValidationError("Quote collection name cannot be empty if set".to_string()));
        }
        Ok(())
    }
}

impl Default for MongoConfig {
    fn default() -> Self {
        MongoConfig {
            uri: "mongodb://localhost:27017".to_string(),
            database: "portfolio".to_string(),
            username: None,
            password: None,
            quote_collection: None,
            app_name: "PortfolioBackend".to_string(),
            pool_size: 10,
            connection_timeout_secs: 5,
        }
    }
}
