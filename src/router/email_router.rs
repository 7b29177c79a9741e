use std::sync::Arc;

use axum::{routing::{get, post}, Router};

use crate::handler::email_handler::{
    list_templates_handler, preview_template_handler, send_template_handler,
};
use crate::service::quote_service::QuoteServiceImpl;

pub fn email_router(service: Arc<QuoteServiceImpl>) -> Router {
    Router::new()
        .route("/admin/emails/templates", get(list_templates_handler))
        .route("/admin/emails/preview", post(preview_template_handler))
        .route("/admin/emails/send", post(send_template_handler))
        .with_state(service)
}
