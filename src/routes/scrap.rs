use actix_web::{get, post, web, HttpResponse};
use serde_json::json;

use crate::errors::ApiError;
use crate::model::LinkList;
use crate::services::articles;
use crate::session::SessionId;
use crate::startup::AppState;

#[get("/scrap")]
#[tracing::instrument(skip(app_state))]
pub async fn get_scrap(
    session: SessionId,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let state = app_state
        .sessions
        .snapshot(&session.0)
        .ok_or(ApiError::UnknownSession)?;

    Ok(HttpResponse::Ok().json(state.scrap))
}

/// Save the currently selected articles into the scrap table, under the
/// same dedup and sort rule as the history table.
#[post("/scrap")]
#[tracing::instrument(skip(app_state))]
pub async fn save_scrap(
    session: SessionId,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let saved = app_state
        .sessions
        .with_session(&session.0, |state| {
            if state.selection.is_empty() {
                return Err(ApiError::EmptySelection(
                    "Select at least one article to scrap",
                ));
            }

            let picked = articles::filter_by_links(&state.history, &state.selection);
            let count = picked.len();

            let scrap = std::mem::take(&mut state.scrap);
            state.scrap = articles::merge(scrap, picked);

            Ok(count)
        })
        .ok_or(ApiError::UnknownSession)??;

    Ok(HttpResponse::Ok().json(json!({ "saved": saved })))
}

/// Drop the listed links from the scrap table. Unconditional and
/// idempotent: deleting an absent link changes nothing.
#[post("/scrap/delete")]
#[tracing::instrument(skip(app_state))]
pub async fn delete_scrap(
    body: web::Json<LinkList>,
    session: SessionId,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let links = body.into_inner().links;
    let removed = app_state
        .sessions
        .with_session(&session.0, |state| {
            let before = state.scrap.len();
            articles::remove_links(&mut state.scrap, &links);
            before - state.scrap.len()
        })
        .ok_or(ApiError::UnknownSession)?;

    Ok(HttpResponse::Ok().json(json!({ "removed": removed })))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(get_scrap)
        .service(save_scrap)
        .service(delete_scrap);
}
