use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use crate::util::email_templates::TemplateDataOverride;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewEmailRequest {
    pub template: String,
    #[serde(default)]
    pub custom_data: Option<TemplateDataOverride>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailRequest {
    pub template: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(email(message = "Please provide a valid recipient email address"))]
    pub to: String,
    #[serde(default)]
    pub custom_data: Option<TemplateDataOverride>,
}

fn trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(|s| s.trim().to_string())
}

#[derive(Debug, Clone, Serialize)]
pub struct SentEmailResponse {
    pub template: String,
    pub to: String,
    pub subject: String,
}
