use std::env;

use crate::config::ConfigError;

/// HTTP listener settings.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Origins allowed by CORS. Empty means any origin.
    pub cors_allowed_origins: Vec<String>,
}

impl AppConfig {
    /// - APP_HOST (defaults to 127.0.0.1)
    /// - APP_PORT (defaults to 8080)
    /// - CORS_ALLOWED_ORIGINS (comma separated, optional)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = AppConfig::default();
        let host = env::var("APP_HOST").unwrap_or(defaults.host);
        let port = parse_port(env::var("APP_PORT").ok(), defaults.port)?;
        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .map(|raw| parse_list(&raw))
            .unwrap_or_default();
        Ok(AppConfig { host, port, cors_allowed_origins })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.parse::<std::net::IpAddr>().is_err() {
            return Err(ConfigError::InvalidValue(format!("APP_HOST '{}' is not an IP address", self.host)));
        }
        if let Some(bad) = self
            .cors_allowed_origins
            .iter()
            .find(|o| !(o.starts_with("http://") || o.starts_with("https://")))
        {
            return Err(ConfigError::InvalidValue(format!("CORS origin '{}' must include the scheme", bad)));
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            cors_allowed_origins: Vec::new(),
        }
    }
}

fn parse_port(raw: Option<String>, default: u16) -> Result<u16, ConfigError> {
    match raw {
        Some(raw) => raw
            .trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidValue(format!("Invalid APP_PORT value '{}'", raw))),
        None => Ok(default),
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_end_matches('/').to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list() {
        assert_eq!(
            parse_list(" https://a.dev/, ,http://localhost:5173"),
            vec!["https://a.dev".to_string(), "http://localhost:5173".to_string()]
        );
    }

    #[test]
    fn test_parse_port() {
        assert_eq!(parse_port(None, 8080).unwrap(), 8080);
        assert_eq!(parse_port(Some(" 3000 ".to_string()), 8080).unwrap(), 3000);
        assert!(matches!(
            parse_port(Some("eighty".to_string()), 8080),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(parse_port(Some("70000".to_string()), 8080).is_err());
    }

    #[test]
    fn test_default_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.port, 8080);
        assert!(config.cors_allowed_origins.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate() {
        let config = AppConfig {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_allowed_origins: vec!["https://example.dev".to_string()],
        };
        assert!(config.validate().is_ok());

        let bad_host = AppConfig { host: "localhost".to_string(), ..config.clone() };
        assert!(bad_host.validate().is_err());

        let bad_origin = AppConfig { cors_allowed_origins: vec!["example.dev".to_string()], ..config };
        assert!(bad_origin.validate().is_err());
    }
}
