use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;

use crate::services::digest::DigestError;

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("Invalid session: {0}")]
    InvalidSession(String),
    #[error("Unknown session")]
    UnknownSession,
    #[error("Unknown keyword group {0}")]
    UnknownGroup(String),
    #[error("{0}")]
    EmptySelection(&'static str),
    #[error("A recipient address is mandatory")]
    EmptyRecipient,
    #[error("The summary panel is disabled")]
    SummaryDisabled,
    #[error("Digest error: {0}")]
    DigestError(#[from] DigestError),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::InvalidSession(detail) => HttpResponse::BadRequest().json(json!({
                "type": "/problem/invalid-session",
                "title": "Invalid session",
                "status": 400,
                "detail": detail})),
            ApiError::UnknownSession => HttpResponse::BadRequest().json(json!({
                "type": "/problem/unknown-session",
                "title": "Unknown session",
                "status": 400,
                "detail": "No session exists for this id. Create one with POST /session"})),
            ApiError::UnknownGroup(label) => HttpResponse::NotFound().json(json!({
                "type": "/problem/not-found",
                "title": "Keyword group not found",
                "status": 404,
                "detail": format!("No keyword group is labelled {label}")})),
            ApiError::EmptySelection(detail) => HttpResponse::BadRequest().json(json!({
                "type": "/problem/empty-selection",
                "title": "Empty selection",
                "status": 400,
                "detail": detail})),
            ApiError::EmptyRecipient => HttpResponse::BadRequest().json(json!({
                "type": "/problem/empty-recipient",
                "title": "Missing recipient",
                "status": 400,
                "detail": "A recipient address is mandatory to send a digest"})),
            ApiError::SummaryDisabled => HttpResponse::NotFound().json(json!({
                "type": "/problem/not-found",
                "title": "Summary panel disabled",
                "status": 404,
                "detail": "This deployment does not expose article summaries"})),
            ApiError::DigestError(error) => error.error_response(),
            _ => HttpResponse::build(StatusCode::INTERNAL_SERVER_ERROR).finish(),
        }
    }
}

impl ResponseError for DigestError {
    fn error_response(&self) -> HttpResponse {
        match self {
            DigestError::EmptyDigest => HttpResponse::BadRequest().json(json!({
                "type": "/problem/empty-digest",
                "title": "Empty digest",
                "status": 400,
                "detail": "There is no article to send; an empty digest is never sent"})),
            DigestError::InvalidRecipient(address) => HttpResponse::BadRequest().json(json!({
                "type": "/problem/invalid-recipient",
                "title": "Invalid recipient",
                "status": 400,
                "detail": format!("{address} is not a valid mail address")})),
            DigestError::NotConfigured => HttpResponse::ServiceUnavailable().json(json!({
                "type": "/problem/mail-not-configured",
                "title": "Mail transport not configured",
                "status": 503,
                "detail": "This deployment has no SMTP settings"})),
            DigestError::Transport(_) | DigestError::Message(_) => {
                HttpResponse::BadGateway().json(json!({
                "type": "/problem/mail-transport",
                "title": "Could not send the digest",
                "status": 502,
                "detail": "The mail transport refused the message. Nothing was retried"}))
            }
        }
    }
}
