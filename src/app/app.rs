use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::{AppConfig, BrandingConfig, EmailConfig, MongoConfig, QuoteConfig};
use crate::repository::quote_repo::{MongoQuoteRepository, QuoteRepository};
use crate::router::email_router::email_router;
use crate::router::quote_router::quote_router;
use crate::service::quote_service::QuoteServiceImpl;
use crate::util::email::{Mailer, SmtpEmailService};
use crate::util::email_templates::TemplateCatalog;

pub type AppResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub struct App {
    config: AppConfig,
    router: Router,
    pub quote_service: Arc<QuoteServiceImpl>,
}

impl App {
    pub async fn new() -> AppResult<Self> {
        let config = AppConfig::from_env()?;
        config.validate()?;
        let mongo_config = MongoConfig::from_env()?;
        let quote_config = QuoteConfig::from_env()?;
        let branding = BrandingConfig::from_env();

        let quote_repo = MongoQuoteRepository::new(&mongo_config).await?;
        if let Err(e) = quote_repo.ensure_indexes().await {
            warn!("Could not create quote indexes: {}", e);
        }

        let mailer = Self::build_mailer();
        let catalog = Arc::new(TemplateCatalog::new(branding));
        let quote_service = Arc::new(QuoteServiceImpl::new(
            Arc::new(quote_repo) as Arc<dyn QuoteRepository>,
            quote_config,
            mailer,
            catalog,
        ));

        let router = build_router(&config, quote_service.clone());
        Ok(App { config, router, quote_service })
    }

    /// Email is optional: without SMTP settings the service runs and skips notifications.
    fn build_mailer() -> Option<Arc<dyn Mailer>> {
        let email_config = match EmailConfig::from_env() {
            Ok(c) => c,
            Err(e) => {
                warn!("Email not configured, notifications disabled: {}", e);
                return None;
            }
        };
        match SmtpEmailService::new(email_config) {
            Ok(service) => Some(Arc::new(service) as Arc<dyn Mailer>),
            Err(e) => {
                error!("Failed to initialize SMTP email service: {}", e);
                None
            }
        }
    }

    pub async fn start(self) -> AppResult<()> {
        let addr = SocketAddr::new(self.config.host.parse()?, self.config.port);
        info!("Server running at http://{}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, self.router).await?;
        Ok(())
    }
}

/// Full HTTP surface: `/api/v1` routes, `/health`, tracing and CORS.
pub fn build_router(config: &AppConfig, quote_service: Arc<QuoteServiceImpl>) -> Router {
    let api = Router::new()
        .merge(quote_router(quote_service.clone()))
        .merge(email_router(quote_service));

    Router::new()
        .nest("/api/v1", api)
        .route("/health", get(|| async { "OK" }))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(config))
}

/// An empty origin list allows any origin without credentials.
pub fn build_cors_layer(config: &AppConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    if config.cors_allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(e) => {
                warn!("Ignoring invalid CORS origin '{}': {}", o, e);
                None
            }
        })
        .collect();
    layer.allow_origin(origins).allow_credentials(true)
}
