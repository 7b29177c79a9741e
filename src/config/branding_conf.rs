use serde::{Deserialize, Serialize};
use std::env;

/// Site identity interpolated into every email template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandingConfig {
    pub site_name: String,
    pub site_url: String,
    pub contact_email: String,
    pub signature: String,
}

impl BrandingConfig {
    /// - SITE_NAME, SITE_URL, CONTACT_EMAIL, EMAIL_SIGNATURE; each falls back to the default.
    pub fn from_env() -> Self {
        let defaults = BrandingConfig::default();
        let read = |var: &str, fallback: String| {
            env::var(var)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(fallback)
        };
        BrandingConfig {
            site_name: read("SITE_NAME", defaults.site_name),
            site_url: read("SITE_URL", defaults.site_url).trim_end_matches('/').to_string(),
            contact_email: read("CONTACT_EMAIL", defaults.contact_email),
            signature: read("EMAIL_SIGNATURE", defaults.signature),
        }
    }
}

impl Default for BrandingConfig {
    fn default() -> Self {
        BrandingConfig {
            site_name: "Portfolio".to_string(),
            site_url: "http://localhost:5173".to_string(),
            contact_email: "hello@example.com".to_string(),
            signature: "The Portfolio Team".to_string(),
        }
    }
}
