use actix_web::{get, post, web, HttpResponse};
use rand::Rng;
use serde_json::json;
use tracing::info;

use crate::startup::AppState;

pub mod articles;
pub mod digest;
pub mod scrap;

#[get("/ping")]
#[tracing::instrument]
pub async fn ping() -> HttpResponse {
    let mut rng = rand::thread_rng();
    let quotes = [
        "Stop the presses",
        "Extra! Extra! Read all about it",
        "Bad news travels fast",
        "No news is good news",
        "Tomorrow's fish and chip paper",
        "If it bleeds, it leads",
        "Always check your sources",
        "Yesterday's scoop is today's archive",
    ];

    HttpResponse::Ok()
        .content_type("text/plain")
        .body(quotes[rng.gen_range(0..quotes.len())])
}

/// Open an isolated monitoring session. Everything a session accumulates
/// (history, scraps, selection) dies with the process.
#[post("/session")]
#[tracing::instrument(skip(app_state))]
pub async fn create_session(app_state: web::Data<AppState>) -> HttpResponse {
    let id = app_state.sessions.create();
    info!("Created session {id}");

    HttpResponse::Created().json(json!({ "session_id": id }))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.configure(articles::configure)
        .configure(scrap::configure)
        .configure(digest::configure);
}
