use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::dto::email_dto::{PreviewEmailRequest, SendEmailRequest, SentEmailResponse};
use crate::dto::quote_dto::ApiResponse;
use crate::handler::quote_handler::json_body;
use crate::service::quote_service::{EmailTemplateService, QuoteServiceImpl};
use crate::util::error::{validation_message, HandlerError};

// Handler: List Email Templates (admin)
pub async fn list_templates_handler(
    State(service): State<Arc<QuoteServiceImpl>>,
) -> Result<impl IntoResponse, HandlerError> {
    Ok(Json(ApiResponse::success(service.templates())))
}

// Handler: Preview Email Template (admin)
pub async fn preview_template_handler(
    State(service): State<Arc<QuoteServiceImpl>>,
    payload: Result<Json<PreviewEmailRequest>, JsonRejection>,
) -> Result<impl IntoResponse, HandlerError> {
    let request = json_body(payload)?;
    let rendered = service.preview(&request.template, request.custom_data)?;
    Ok(Json(ApiResponse::success(rendered)))
}

// Handler: Send Email Template (admin)
pub async fn send_template_handler(
    State(service): State<Arc<QuoteServiceImpl>>,
    payload: Result<Json<SendEmailRequest>, JsonRejection>,
) -> Result<impl IntoResponse, HandlerError> {
    let request = json_body(payload)?;
    request
        .validate()
        .map_err(|e| HandlerError::bad_request(validation_message(&e)))?;

    let rendered = service.send(&request.template, &request.to, request.custom_data).await?;
    Ok(Json(ApiResponse::with_message(
        "Email sent successfully",
        SentEmailResponse {
            template: request.template.trim().to_string(),
            to: request.to,
            subject: rendered.subject,
        },
    )))
}
