use actix_web::{post, web, HttpResponse};
use serde_json::json;

use crate::errors::ApiError;
use crate::model::DigestRequest;
use crate::routes::articles::ALL_LABEL;
use crate::services::articles;
use crate::services::digest::{self, DigestError};
use crate::session::SessionId;
use crate::startup::AppState;

/// Compose and send the digest of the currently selected articles.
///
/// Aborts before any side effect on an empty recipient or an empty
/// selection; a transport failure is surfaced as-is, never retried.
#[post("/digest")]
#[tracing::instrument(skip(app_state, body))]
pub async fn send_digest(
    body: web::Json<DigestRequest>,
    session: SessionId,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let request = body.into_inner();
    if request.recipient.trim().is_empty() {
        return Err(ApiError::EmptyRecipient);
    }

    let configuration = &app_state.configuration;
    let state = app_state
        .sessions
        .snapshot(&session.0)
        .ok_or(ApiError::UnknownSession)?;

    if state.selection.is_empty() {
        return Err(ApiError::EmptySelection(
            "Select at least one article to send",
        ));
    }

    let (label, scope) = match request.group.as_deref() {
        None => (ALL_LABEL.to_string(), state.history.clone()),
        Some(requested) => {
            let group = configuration
                .group(requested)
                .ok_or_else(|| ApiError::UnknownGroup(requested.to_string()))?;
            (
                group.label.clone(),
                articles::filter_by_keywords(&state.history, &group.keywords),
            )
        }
    };

    let rows = articles::filter_by_links(&scope, &state.selection);
    let body = digest::compose(&label, &rows)?;

    let mailer = app_state.mailer.as_ref().ok_or(DigestError::NotConfigured)?;
    mailer
        .send(&request.recipient, digest::DIGEST_SUBJECT, body)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "recipient": request.recipient,
        "sent": rows.len(),
    })))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(send_digest);
}
