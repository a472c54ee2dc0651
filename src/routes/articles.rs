use actix_web::{get, post, web, HttpResponse};
use chrono::{Duration, Utc};
use serde_json::json;

use crate::errors::ApiError;
use crate::model::{ArticlesView, ExportRow, GroupBlock, LinkList, SummaryQuery, ViewQuery};
use crate::services::{articles, fetching, summary};
use crate::session::SessionId;
use crate::startup::AppState;

pub(crate) const ALL_LABEL: &str = "all trends";

/// The current view: all groups or a single one. The refresh check runs
/// inline on every listing interaction; there is no background fetch.
#[get("/articles")]
#[tracing::instrument(skip(app_state))]
pub async fn get_articles(
    query: web::Query<ViewQuery>,
    session: SessionId,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let view = build_view(&app_state, session, query.into_inner().group.as_deref(), false).await?;

    Ok(HttpResponse::Ok().json(view))
}

/// Manual refresh: fetches unconditionally, whatever the elapsed time.
#[post("/articles/refresh")]
#[tracing::instrument(skip(app_state))]
pub async fn refresh_articles(
    query: web::Query<ViewQuery>,
    session: SessionId,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let view = build_view(&app_state, session, query.into_inner().group.as_deref(), true).await?;

    Ok(HttpResponse::Ok().json(view))
}

#[post("/articles/select")]
#[tracing::instrument(skip(app_state))]
pub async fn select_articles(
    body: web::Json<LinkList>,
    session: SessionId,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let links = body.into_inner().links;
    app_state
        .sessions
        .with_session(&session.0, |state| {
            state.selection.extend(links);
        })
        .ok_or(ApiError::UnknownSession)?;

    Ok(HttpResponse::Accepted().finish())
}

#[post("/articles/deselect")]
#[tracing::instrument(skip(app_state))]
pub async fn deselect_articles(
    body: web::Json<LinkList>,
    session: SessionId,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let links = body.into_inner().links;
    app_state
        .sessions
        .with_session(&session.0, |state| {
            for link in &links {
                state.selection.remove(link);
            }
        })
        .ok_or(ApiError::UnknownSession)?;

    Ok(HttpResponse::Accepted().finish())
}

/// Flat, spreadsheet friendly projection of the current view. Does not
/// trigger a refresh.
#[get("/articles/export")]
#[tracing::instrument(skip(app_state))]
pub async fn export_articles(
    query: web::Query<ViewQuery>,
    session: SessionId,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let configuration = &app_state.configuration;
    let state = app_state
        .sessions
        .snapshot(&session.0)
        .ok_or(ApiError::UnknownSession)?;

    let rows = match query.into_inner().group.as_deref() {
        None => state.history,
        Some(label) => {
            let group = configuration
                .group(label)
                .ok_or_else(|| ApiError::UnknownGroup(label.to_string()))?;
            articles::filter_by_keywords(&state.history, &group.keywords)
        }
    };

    let rows: Vec<ExportRow> = rows.iter().map(ExportRow::from).collect();
    Ok(HttpResponse::Ok().json(rows))
}

/// Best-effort summary of an article page, behind the summary_panel flag.
#[get("/articles/summary")]
#[tracing::instrument(skip(app_state))]
pub async fn article_summary(
    query: web::Query<SummaryQuery>,
    session: SessionId,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    if !app_state.configuration.summary_panel {
        return Err(ApiError::SummaryDisabled);
    }
    app_state
        .sessions
        .snapshot(&session.0)
        .ok_or(ApiError::UnknownSession)?;

    let link = query.into_inner().link;
    let summary = summary::summarize(&link).await;

    Ok(HttpResponse::Ok().json(json!({ "link": link, "summary": summary })))
}

/// Run the refresh decision, fetch if due, and build the requested view.
async fn build_view(
    app_state: &AppState,
    session: SessionId,
    group_label: Option<&str>,
    force: bool,
) -> Result<ArticlesView, ApiError> {
    let configuration = &app_state.configuration;

    // Resolve the group before spending a fetch cycle on a bad label.
    if let Some(label) = group_label {
        configuration
            .group(label)
            .ok_or_else(|| ApiError::UnknownGroup(label.to_string()))?;
    }

    let state = app_state
        .sessions
        .snapshot(&session.0)
        .ok_or(ApiError::UnknownSession)?;

    let now = Utc::now();
    let interval = Duration::minutes(configuration.refresh_interval_minutes);
    let refreshed = force || fetching::refresh_due(now, state.last_update, interval);

    let mut notices = Vec::new();
    if refreshed {
        let outcome = app_state.fetcher.fetch_all(&configuration.search_terms()).await;
        notices = outcome.notices;

        let incoming = outcome.articles;
        app_state
            .sessions
            .with_session(&session.0, |state| {
                let history = std::mem::take(&mut state.history);
                state.history = articles::merge(history, incoming);
                // The timestamp advances even when some keywords failed:
                // a partial cycle is still a cycle.
                state.last_update = Some(now);
            })
            .ok_or(ApiError::UnknownSession)?;
    }

    let state = app_state
        .sessions
        .snapshot(&session.0)
        .ok_or(ApiError::UnknownSession)?;

    let (label, groups) = match group_label {
        None => (
            ALL_LABEL.to_string(),
            configuration
                .groups
                .iter()
                .map(|group| GroupBlock {
                    label: group.label.clone(),
                    articles: articles::filter_by_keywords(&state.history, &group.keywords),
                })
                .collect(),
        ),
        Some(requested) => {
            let group = configuration
                .group(requested)
                .ok_or_else(|| ApiError::UnknownGroup(requested.to_string()))?;
            (
                group.label.clone(),
                vec![GroupBlock {
                    label: group.label.clone(),
                    articles: articles::filter_by_keywords(&state.history, &group.keywords),
                }],
            )
        }
    };

    Ok(ArticlesView {
        label,
        last_update: state.last_update,
        refreshed,
        notices,
        groups,
    })
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(get_articles)
        .service(refresh_articles)
        .service(select_articles)
        .service(deselect_articles)
        .service(export_articles)
        .service(article_summary);
}
