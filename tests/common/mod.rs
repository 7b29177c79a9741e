#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use bson::oid::ObjectId;
use serde_json::Value;
use tower::ServiceExt;

use portfolio_backend::app::app::build_router;
use portfolio_backend::config::{AppConfig, BrandingConfig, QuoteConfig};
use portfolio_backend::model::quote::QuoteRequest;
use portfolio_backend::model::quote_stats::{QuoteStats, RecentQuote, StatsTotals};
use portfolio_backend::repository::quote_query::{QuoteFilter, QuoteListParams, SortOrder, RECENT_LIMIT};
use portfolio_backend::repository::quote_repo::QuoteRepository;
use portfolio_backend::repository::repository_error::{RepositoryError, RepositoryResult};
use portfolio_backend::service::quote_service::QuoteServiceImpl;
use portfolio_backend::util::email::{EmailError, EmailMessage, Mailer};
use portfolio_backend::util::email_templates::TemplateCatalog;

pub const ADMIN_EMAIL: &str = "owner@example.com";

/// In-memory quote store evaluating filters and sorts in process.
#[derive(Clone, Default)]
pub struct MockQuoteRepository {
    data: Arc<Mutex<Vec<QuoteRequest>>>,
}

impl MockQuoteRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<QuoteRequest> {
        self.data.lock().unwrap().clone()
    }

    pub fn insert(&self, mut quote: QuoteRequest) -> ObjectId {
        let id = ObjectId::new();
        quote.id = Some(id);
        self.data.lock().unwrap().push(quote);
        id
    }

    fn filtered(&self, filter: &QuoteFilter) -> Vec<QuoteRequest> {
        self.data
            .lock()
            .unwrap()
            .iter()
            .filter(|q| filter.matches(q))
            .cloned()
            .collect()
    }
}

fn count_by<F: Fn(&QuoteRequest) -> String>(quotes: &[QuoteRequest], key: F) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    for quote in quotes {
        *counts.entry(key(quote)).or_insert(0) += 1;
    }
    counts
}

#[async_trait]
impl QuoteRepository for MockQuoteRepository {
    async fn create(&self, mut quote: QuoteRequest) -> RepositoryResult<QuoteRequest> {
        quote.id = Some(ObjectId::new());
        self.data.lock().unwrap().push(quote.clone());
        Ok(quote)
    }

    async fn get_by_id(&self, id: ObjectId) -> RepositoryResult<QuoteRequest> {
        self.data
            .lock()
            .unwrap()
            .iter()
            .find(|q| q.id == Some(id))
            .cloned()
            .ok_or_else(|| RepositoryError::not_found(format!("Quote request {} not found", id)))
    }

    async fn replace(&self, id: ObjectId, mut quote: QuoteRequest) -> RepositoryResult<QuoteRequest> {
        quote.id = Some(id);
        let mut data = self.data.lock().unwrap();
        match data.iter_mut().find(|q| q.id == Some(id)) {
            Some(slot) => {
                *slot = quote.clone();
                Ok(quote)
            }
            None => Err(RepositoryError::not_found(format!("Quote request {} not found", id))),
        }
    }

    async fn delete(&self, id: ObjectId) -> RepositoryResult<()> {
        let mut data = self.data.lock().unwrap();
        let before = data.len();
        data.retain(|q| q.id != Some(id));
        if data.len() == before {
            return Err(RepositoryError::not_found(format!("Quote request {} not found", id)));
        }
        Ok(())
    }

    async fn count(&self, filter: &QuoteFilter) -> RepositoryResult<u64> {
        Ok(self.filtered(filter).len() as u64)
    }

    async fn find_page(&self, params: &QuoteListParams) -> RepositoryResult<Vec<QuoteRequest>> {
        let Some(skip) = params.skip() else {
            return Ok(Vec::new());
        };
        let mut quotes = self.filtered(&params.filter);
        quotes.sort_by(|a, b| params.sort.compare(a, b));
        Ok(quotes
            .into_iter()
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .take(params.limit as usize)
            .collect())
    }

    async fn status_counts(&self) -> RepositoryResult<BTreeMap<String, u64>> {
        Ok(count_by(&self.all(), |q| q.status.to_string()))
    }

    async fn stats(&self) -> RepositoryResult<QuoteStats> {
        let quotes = self.all();
        let values: Vec<f64> = quotes.iter().filter_map(|q| q.estimated_value).collect();
        let total_value: f64 = values.iter().sum();
        let avg_value = if values.is_empty() { 0.0 } else { total_value / values.len() as f64 };

        let mut newest = quotes.clone();
        newest.sort_by(|a, b| SortOrder::newest_first().compare(a, b));
        let recent = newest
            .into_iter()
            .take(RECENT_LIMIT as usize)
            .map(|q| RecentQuote {
                id: q.id.map(|id| id.to_hex()).unwrap_or_default(),
                name: q.name,
                email: q.email,
                project_type: Some(q.project_type),
                status: q.status,
                created_at: q.created_at,
            })
            .collect();

        Ok(QuoteStats {
            by_status: count_by(&quotes, |q| q.status.to_string()),
            by_priority: count_by(&quotes, |q| q.priority.to_string()),
            by_project_type: count_by(&quotes, |q| q.project_type.to_string()),
            totals: if quotes.is_empty() {
                StatsTotals::default()
            } else {
                StatsTotals { count: quotes.len() as u64, total_value, avg_value }
            },
            recent,
        })
    }
}

/// Records every message; optionally fails every send.
#[derive(Clone, Default)]
pub struct MockMailer {
    pub sent: Arc<Mutex<Vec<EmailMessage>>>,
    pub fail: bool,
}

impl MockMailer {
    pub fn failing() -> Self {
        MockMailer { fail: true, ..Default::default() }
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for MockMailer {
    async fn send_email(&self, message: EmailMessage) -> Result<(), EmailError> {
        if self.fail {
            return Err(EmailError::SmtpError("connection refused".to_string()));
        }
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub repo: MockQuoteRepository,
    pub mailer: Option<MockMailer>,
}

pub fn test_app(mailer: Option<MockMailer>) -> TestApp {
    let repo = MockQuoteRepository::new();
    let config = QuoteConfig {
        admin_notification_email: Some(ADMIN_EMAIL.to_string()),
        ..QuoteConfig::default()
    };
    let service = Arc::new(QuoteServiceImpl::new(
        Arc::new(repo.clone()),
        config,
        mailer.clone().map(|m| Arc::new(m) as Arc<dyn Mailer>),
        Arc::new(TemplateCatalog::new(BrandingConfig::default())),
    ));
    let app_config = AppConfig { port: 0, ..AppConfig::default() };
    TestApp { router: build_router(&app_config, service), repo, mailer }
}

pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).to_string()))
    };
    (status, json)
}

pub fn valid_submission() -> Value {
    serde_json::json!({
        "name": "Ada Lovelace",
        "email": "Ada@Example.com",
        "company": "Analytical Engines Ltd",
        "projectType": "web-app",
        "budget": "5000-15000",
        "timeline": "1-2",
        "features": ["Authentication", "Payments"],
        "description": "A booking platform with payments and an admin dashboard."
    })
}
