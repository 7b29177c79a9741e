use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use bson::oid::ObjectId;
use tracing::{debug, info};

use crate::dto::quote_dto::{
    ApiResponse, CreateQuoteRequest, ListQuotesQuery, QuoteEnvelope, UpdateQuoteRequest,
    SUBMISSION_MESSAGE,
};
use crate::service::quote_service::{QuoteService, QuoteServiceImpl};
use crate::util::error::HandlerError;

pub(crate) fn parse_quote_id(id: &str) -> Result<ObjectId, HandlerError> {
    ObjectId::parse_str(id.trim()).map_err(|_| HandlerError::bad_request("Invalid quote id"))
}

pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, HandlerError> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            debug!(error = %rejection.body_text(), "Rejected request body");
            Err(HandlerError::bad_request("Invalid request body").with_details(rejection.body_text()))
        }
    }
}

// Handler: Submit Quote (public)
pub async fn submit_quote_handler(
    State(service): State<Arc<QuoteServiceImpl>>,
    payload: Result<Json<CreateQuoteRequest>, JsonRejection>,
) -> Result<impl IntoResponse, HandlerError> {
    info!("[submit_quote_handler] Handler called");
    let request = json_body(payload)?;
    let receipt = service.submit_quote(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::with_message(SUBMISSION_MESSAGE, receipt))))
}

// Handler: List Quotes (admin)
pub async fn list_quotes_handler(
    State(service): State<Arc<QuoteServiceImpl>>,
    Query(query): Query<ListQuotesQuery>,
) -> Result<impl IntoResponse, HandlerError> {
    let listing = service.list_quotes(query).await?;
    Ok(Json(ApiResponse::success(listing)))
}

// Handler: Quote Statistics (admin)
pub async fn quote_stats_handler(
    State(service): State<Arc<QuoteServiceImpl>>,
) -> Result<impl IntoResponse, HandlerError> {
    let stats = service.quote_stats().await?;
    Ok(Json(ApiResponse::success(stats)))
}

// Handler: Get Quote (admin)
pub async fn get_quote_handler(
    State(service): State<Arc<QuoteServiceImpl>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_quote_id(&id)?;
    let quote = service.get_quote(id).await?;
    Ok(Json(ApiResponse::success(QuoteEnvelope { quote })))
}

// Handler: Update Quote (admin)
pub async fn update_quote_handler(
    State(service): State<Arc<QuoteServiceImpl>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateQuoteRequest>, JsonRejection>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_quote_id(&id)?;
    let request = json_body(payload)?;
    let quote = service.update_quote(id, request).await?;
    Ok(Json(ApiResponse::with_message(
        "Quote request updated successfully",
        QuoteEnvelope { quote },
    )))
}

// Handler: Delete Quote (admin)
pub async fn delete_quote_handler(
    State(service): State<Arc<QuoteServiceImpl>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_quote_id(&id)?;
    service.delete_quote(id).await?;
    Ok(Json(ApiResponse::with_message("Quote request deleted successfully", ())))
}
