use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::config::QuoteConfig;
use crate::model::quote::{
    Budget, NewQuoteRequest, Priority, ProjectType, QuoteRequest, QuoteStatus, QuoteUpdate, Timeline,
};
use crate::repository::quote_query::{QuoteFilter, QuoteListParams, SortOrder};
use crate::util::error::ServiceError;

pub const SUBMISSION_MESSAGE: &str =
    "Quote request submitted successfully. We'll get back to you within 24-48 hours.";

/// Public submission body. Every field is optional at the serde level so
/// missing required fields can be reported together with a 400.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuoteRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub project_type: Option<String>,
    pub budget: Option<String>,
    pub timeline: Option<String>,
    pub features: Option<Vec<String>>,
    pub description: Option<String>,
}

/// Normalized submission text fields, checked with `validator`.
#[derive(Debug, Validate)]
struct SubmissionFields {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    name: String,
    #[validate(email(message = "Please provide a valid email address"))]
    email: String,
    #[validate(length(max = 100, message = "Company name cannot exceed 100 characters"))]
    company: Option<String>,
    #[validate(length(max = 20, message = "No more than 20 features can be requested"))]
    features: Vec<String>,
    #[validate(length(min = 20, max = 5000, message = "Description must be between 20 and 5000 characters"))]
    description: String,
}

const MAX_FEATURE_CHARS: usize = 100;

fn trimmed(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl CreateQuoteRequest {
    /// Checks presence, normalizes (trim, lower-cased email) and validates.
    pub fn into_new_quote(self) -> Result<NewQuoteRequest, ServiceError> {
        let required = [
            ("name", &self.name),
            ("email", &self.email),
            ("projectType", &self.project_type),
            ("budget", &self.budget),
            ("timeline", &self.timeline),
            ("description", &self.description),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| trimmed(value).is_none())
            .map(|(field, _)| *field)
            .collect();
        if !missing.is_empty() {
            return Err(ServiceError::InvalidInput(format!(
                "Please provide all required fields: {}",
                missing.join(", ")
            )));
        }

        let fields = SubmissionFields {
            name: trimmed(&self.name).unwrap_or_default(),
            email: trimmed(&self.email).unwrap_or_default().to_lowercase(),
            company: trimmed(&self.company),
            features: self
                .features
                .unwrap_or_default()
                .into_iter()
                .map(|f| f.trim().to_string())
                .filter(|f| !f.is_empty())
                .collect(),
            description: trimmed(&self.description).unwrap_or_default(),
        };
        fields.validate()?;
        if fields.features.iter().any(|f| f.chars().count() > MAX_FEATURE_CHARS) {
            return Err(ServiceError::InvalidInput(format!(
                "Each feature must be at most {} characters",
                MAX_FEATURE_CHARS
            )));
        }

        let project_type: ProjectType = trimmed(&self.project_type).unwrap_or_default().parse()?;
        let budget: Budget = trimmed(&self.budget).unwrap_or_default().parse()?;
        let timeline: Timeline = trimmed(&self.timeline).unwrap_or_default().parse()?;

        Ok(NewQuoteRequest {
            name: fields.name,
            email: fields.email,
            company: fields.company,
            project_type,
            budget,
            timeline,
            features: fields.features,
            description: fields.description,
        })
    }
}

/// Admin partial update body.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuoteRequest {
    pub status: Option<String>,
    pub priority: Option<String>,
    #[validate(length(max = 2000, message = "Admin notes cannot exceed 2000 characters"))]
    pub admin_notes: Option<String>,
    #[validate(range(min = 0.0, message = "Estimated value cannot be negative"))]
    pub estimated_value: Option<f64>,
}

impl UpdateQuoteRequest {
    pub fn into_update(self) -> Result<QuoteUpdate, ServiceError> {
        self.validate()?;
        if self.estimated_value.is_some_and(|v| !v.is_finite()) {
            return Err(ServiceError::InvalidInput("Estimated value must be a finite number".to_string()));
        }
        let status = self.status.as_deref().map(str::parse::<QuoteStatus>).transpose()?;
        let priority = self.priority.as_deref().map(str::parse::<Priority>).transpose()?;
        Ok(QuoteUpdate {
            status,
            priority,
            admin_notes: self.admin_notes.map(|n| n.trim().to_string()),
            estimated_value: self.estimated_value,
        })
    }
}

/// Admin listing query string. Kept as raw strings so bad numbers fall back
/// to defaults instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuotesQuery {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl ListQuotesQuery {
    pub fn into_params(self, config: &QuoteConfig) -> Result<QuoteListParams, ServiceError> {
        let status = trimmed(&self.status).map(|s| s.parse::<QuoteStatus>()).transpose()?;
        let priority = trimmed(&self.priority).map(|p| p.parse::<Priority>()).transpose()?;
        let search = trimmed(&self.search);
        let sort = SortOrder::parse(self.sort.as_deref().unwrap_or(SortOrder::DEFAULT_EXPR))
            .map_err(ServiceError::InvalidInput)?;
        let page = self
            .page
            .as_deref()
            .and_then(|p| p.trim().parse::<u64>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1);
        let limit = config.page_size(self.limit.as_deref().and_then(|l| l.trim().parse::<u64>().ok()));

        Ok(QuoteListParams {
            filter: QuoteFilter { status, priority, search },
            sort,
            page,
            limit,
        })
    }
}

/// Quote as returned by the admin API, with the id as a hex string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponseDto {
    pub id: String,
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub project_type: ProjectType,
    pub budget: Budget,
    pub timeline: Timeline,
    pub features: Vec<String>,
    pub description: String,
    pub status: QuoteStatus,
    pub priority: Priority,
    pub admin_notes: Option<String>,
    pub estimated_value: Option<f64>,
    pub contacted_at: Option<String>,
    pub completed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<QuoteRequest> for QuoteResponseDto {
    fn from(quote: QuoteRequest) -> Self {
        QuoteResponseDto {
            id: quote.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: quote.name,
            email: quote.email,
            company: quote.company,
            project_type: quote.project_type,
            budget: quote.budget,
            timeline: quote.timeline,
            features: quote.features,
            description: quote.description,
            status: quote.status,
            priority: quote.priority,
            admin_notes: quote.admin_notes,
            estimated_value: quote.estimated_value,
            contacted_at: quote.contacted_at,
            completed_at: quote.completed_at,
            created_at: quote.created_at,
            updated_at: quote.updated_at,
        }
    }
}

/// Public echo of a stored submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub id: String,
    pub name: String,
    pub email: String,
    pub project_type: ProjectType,
}

impl From<&QuoteRequest> for SubmissionReceipt {
    fn from(quote: &QuoteRequest) -> Self {
        SubmissionReceipt {
            id: quote.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: quote.name.clone(),
            email: quote.email.clone(),
            project_type: quote.project_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pagination {
    pub total: u64,
    pub page: u64,
    pub pages: u64,
    pub limit: u64,
}

impl Pagination {
    pub fn new(total: u64, page: u64, limit: u64) -> Self {
        let pages = if limit == 0 { 0 } else { total.div_ceil(limit) };
        Pagination { total, page, pages, limit }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteListResponse {
    pub quotes: Vec<QuoteResponseDto>,
    pub pagination: Pagination,
    pub status_counts: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteEnvelope {
    pub quote: QuoteResponseDto,
}

/// `{"status": "success", "message"?, "data"}` envelope for every success response.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        ApiResponse { status: "success", message: None, data }
    }

    pub fn with_message<M: Into<String>>(message: M, data: T) -> Self {
        ApiResponse { status: "success", message: Some(message.into()), data }
    }
}
