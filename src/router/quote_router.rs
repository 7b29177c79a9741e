use std::sync::Arc;

use axum::{routing::{get, post}, Router};

use crate::handler::quote_handler::{
    delete_quote_handler, get_quote_handler, list_quotes_handler, quote_stats_handler,
    submit_quote_handler, update_quote_handler,
};
use crate::service::quote_service::QuoteServiceImpl;

pub fn quote_router(service: Arc<QuoteServiceImpl>) -> Router {
    // Public route
    let public = Router::new()
        .route("/marketplace/quote-request", post(submit_quote_handler));

    // Admin routes; access control is left to the deployment.
    let admin = Router::new()
        .route("/admin/marketplace/quotes", get(list_quotes_handler))
        .route("/admin/marketplace/quotes/stats", get(quote_stats_handler))
        .route(
            "/admin/marketplace/quotes/{id}",
            get(get_quote_handler).put(update_quote_handler).delete(delete_quote_handler),
        );

    public
        .merge(admin)
        .with_state(service)
}
