use std::sync::Arc;

use async_trait::async_trait;
use bson::oid::ObjectId;
use tracing::{error, info, instrument, warn};

use crate::config::QuoteConfig;
use crate::dto::quote_dto::{
    CreateQuoteRequest, ListQuotesQuery, Pagination, QuoteListResponse, QuoteResponseDto,
    SubmissionReceipt, UpdateQuoteRequest,
};
use crate::model::quote::{now_rfc3339, QuoteRequest};
use crate::model::quote_stats::QuoteStats;
use crate::repository::quote_query::zero_filled_status_counts;
use crate::repository::quote_repo::QuoteRepository;
use crate::repository::repository_error::RepositoryError;
use crate::util::email::{EmailError, EmailMessage, Mailer};
use crate::util::email_templates::{
    EmailTemplateKind, RenderedEmail, TemplateCatalog, TemplateData, TemplateDataOverride,
    TemplateDescriptor,
};
use crate::util::error::ServiceError;

pub const QUOTE_NOT_FOUND: &str = "Quote request not found";

#[async_trait]
pub trait QuoteService: Send + Sync {
    async fn submit_quote(&self, request: CreateQuoteRequest) -> Result<SubmissionReceipt, ServiceError>;
    async fn list_quotes(&self, query: ListQuotesQuery) -> Result<QuoteListResponse, ServiceError>;
    async fn get_quote(&self, id: ObjectId) -> Result<QuoteResponseDto, ServiceError>;
    async fn update_quote(&self, id: ObjectId, request: UpdateQuoteRequest) -> Result<QuoteResponseDto, ServiceError>;
    async fn delete_quote(&self, id: ObjectId) -> Result<(), ServiceError>;
    async fn quote_stats(&self) -> Result<QuoteStats, ServiceError>;
}

/// Admin access to the template catalog.
#[async_trait]
pub trait EmailTemplateService: Send + Sync {
    fn templates(&self) -> Vec<TemplateDescriptor>;
    fn preview(&self, template: &str, custom: Option<TemplateDataOverride>) -> Result<RenderedEmail, ServiceError>;
    async fn send(
        &self,
        template: &str,
        to: &str,
        custom: Option<TemplateDataOverride>,
    ) -> Result<RenderedEmail, ServiceError>;
}

pub struct QuoteServiceImpl {
    pub quote_repo: Arc<dyn QuoteRepository>,
    pub config: QuoteConfig,
    pub mailer: Option<Arc<dyn Mailer>>,
    pub catalog: Arc<TemplateCatalog>,
}

impl QuoteServiceImpl {
    pub fn new(
        quote_repo: Arc<dyn QuoteRepository>,
        config: QuoteConfig,
        mailer: Option<Arc<dyn Mailer>>,
        catalog: Arc<TemplateCatalog>,
    ) -> Self {
        QuoteServiceImpl { quote_repo, config, mailer, catalog }
    }

    // Missing records surface with the public message regardless of the
    // repository wording.
    fn map_lookup_error(err: RepositoryError) -> ServiceError {
        match err {
            RepositoryError::NotFound(_) => ServiceError::NotFound(QUOTE_NOT_FOUND.to_string()),
            other => other.into(),
        }
    }

    /// Confirmation to the client and alert to the site owner. Failures
    /// are logged and never propagated.
    async fn notify_submission(&self, quote: &QuoteRequest) {
        let Some(mailer) = &self.mailer else {
            return;
        };
        let data = TemplateData::from_quote(quote);

        let confirmation = self.catalog.render(EmailTemplateKind::QuoteConfirmation, &data);
        if let Err(e) = mailer
            .send_email(EmailMessage::from_rendered(quote.email.clone(), confirmation))
            .await
        {
            warn!(error = %e, "Failed to send quote confirmation email");
        }

        match &self.config.admin_notification_email {
            Some(admin) => {
                let alert = self.catalog.render(EmailTemplateKind::NewQuoteAlert, &data);
                if let Err(e) = mailer.send_email(EmailMessage::from_rendered(admin.clone(), alert)).await {
                    warn!(error = %e, "Failed to send new quote alert email");
                }
            }
            None => warn!("No admin notification address configured, skipping new quote alert"),
        }
    }
}

#[async_trait]
impl QuoteService for QuoteServiceImpl {
    #[instrument(skip(self, request))]
    async fn submit_quote(&self, request: CreateQuoteRequest) -> Result<SubmissionReceipt, ServiceError> {
        info!("Submitting new quote request");
        let new_quote = request.into_new_quote().map_err(|e| {
            warn!(error = %e, "Rejected quote request");
            e
        })?;

        let quote = QuoteRequest::new(new_quote, &now_rfc3339());
        let created = self.quote_repo.create(quote).await.map_err(|e| {
            error!("Failed to persist quote request: {}", e);
            ServiceError::from(e)
        })?;

        self.notify_submission(&created).await;

        info!(id = ?created.id, "Quote request submitted");
        Ok(SubmissionReceipt::from(&created))
    }

    #[instrument(skip(self))]
    async fn list_quotes(&self, query: ListQuotesQuery) -> Result<QuoteListResponse, ServiceError> {
        let params = query.into_params(&self.config)?;

        let (total, quotes, counts) = tokio::try_join!(
            self.quote_repo.count(&params.filter),
            self.quote_repo.find_page(&params),
            self.quote_repo.status_counts(),
        )
        .map_err(|e| {
            error!("Failed to list quote requests: {}", e);
            ServiceError::from(e)
        })?;

        info!(total, returned = quotes.len(), "Listed quote requests");
        Ok(QuoteListResponse {
            quotes: quotes.into_iter().map(QuoteResponseDto::from).collect(),
            pagination: Pagination::new(total, params.page, params.limit),
            status_counts: zero_filled_status_counts(counts),
        })
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn get_quote(&self, id: ObjectId) -> Result<QuoteResponseDto, ServiceError> {
        let quote = self.quote_repo.get_by_id(id).await.map_err(Self::map_lookup_error)?;
        Ok(quote.into())
    }

    #[instrument(skip(self, request), fields(id = %id))]
    async fn update_quote(&self, id: ObjectId, request: UpdateQuoteRequest) -> Result<QuoteResponseDto, ServiceError> {
        let update = request.into_update()?;
        let mut quote = self.quote_repo.get_by_id(id).await.map_err(Self::map_lookup_error)?;
        let previous_status = quote.status;

        quote.apply_update(update, &now_rfc3339());
        let saved = self.quote_repo.replace(id, quote).await.map_err(Self::map_lookup_error)?;

        info!(from = %previous_status, to = %saved.status, "Quote request updated");
        Ok(saved.into())
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn delete_quote(&self, id: ObjectId) -> Result<(), ServiceError> {
        self.quote_repo.get_by_id(id).await.map_err(Self::map_lookup_error)?;
        self.quote_repo.delete(id).await.map_err(Self::map_lookup_error)?;
        info!("Quote request deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn quote_stats(&self) -> Result<QuoteStats, ServiceError> {
        self.quote_repo.stats().await.map_err(|e| {
            error!("Failed to compute quote statistics: {}", e);
            ServiceError::from(e)
        })
    }
}

#[async_trait]
impl EmailTemplateService for QuoteServiceImpl {
    fn templates(&self) -> Vec<TemplateDescriptor> {
        self.catalog.descriptors().to_vec()
    }

    fn preview(&self, template: &str, custom: Option<TemplateDataOverride>) -> Result<RenderedEmail, ServiceError> {
        Ok(self.catalog.preview(template, custom)?)
    }

    #[instrument(skip(self, custom), fields(template = %template, to = %to))]
    async fn send(
        &self,
        template: &str,
        to: &str,
        custom: Option<TemplateDataOverride>,
    ) -> Result<RenderedEmail, ServiceError> {
        let rendered = self.catalog.preview(template, custom)?;
        let mailer = self
            .mailer
            .as_ref()
            .ok_or_else(|| ServiceError::Unavailable("Email delivery is not configured".to_string()))?;

        mailer
            .send_email(EmailMessage::from_rendered(to.trim().to_string(), rendered.clone()))
            .await
            .map_err(|e| match e {
                EmailError::AddressError(msg) => ServiceError::InvalidInput(msg),
                other => {
                    error!("Failed to send template email: {}", other);
                    ServiceError::InternalError(other.to_string())
                }
            })?;

        info!("Template email sent");
        Ok(rendered)
    }
}
