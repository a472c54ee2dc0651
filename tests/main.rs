use speculoos::prelude::*;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use helpers::{spawn_app, SESSION_HEADER};

mod helpers;

const SEARCH_PATH: &str = "/v1/search/news.json";

fn search_endpoint(mock: &MockServer) -> String {
    format!("{}{}", mock.uri(), SEARCH_PATH)
}

/// One mock per search term, covering the interesting cases: loose title
/// matching, a link surfacing under two keywords, a missing date and an
/// alias term.
async fn mount_search_fixtures(mock: &MockServer, cycles: u64) {
    let acme = ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "items": [
            {"title": "<b>Acme</b> wins award", "link": "https://news.example/l1",
             "pubDate": "Mon, 06 Jan 2025 10:30:00 +0900"},
            {"title": "Unrelated Co news", "link": "https://news.example/unrelated",
             "pubDate": "Mon, 06 Jan 2025 11:00:00 +0900"},
            {"title": "Acme quarterly report", "link": "https://news.example/l2",
             "pubDate": ""}
        ]
    }));
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("query", "Acme"))
        .respond_with(acme)
        .expect(cycles)
        .mount(mock)
        .await;

    let globex = ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "items": [
            {"title": "Acme and Globex sign deal", "link": "https://news.example/l1",
             "pubDate": "Mon, 06 Jan 2025 10:30:00 +0900"},
            {"title": "Globex expands", "link": "https://news.example/l3",
             "pubDate": "Mon, 06 Jan 2025 09:00:00 +0900"}
        ]
    }));
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("query", "Globex"))
        .respond_with(globex)
        .expect(cycles)
        .mount(mock)
        .await;

    let acme_bio = ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "items": [
            {"title": "Acme Biosciences trial results", "link": "https://news.example/l4",
             "pubDate": "Mon, 06 Jan 2025 12:00:00 +0900"}
        ]
    }));
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("query", "Acme Biosciences"))
        .respond_with(acme_bio)
        .expect(cycles)
        .mount(mock)
        .await;
}

fn block_links(view: &serde_json::Value, group_index: usize) -> Vec<String> {
    view["groups"][group_index]["articles"]
        .as_array()
        .unwrap()
        .iter()
        .map(|article| article["link"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn fetch_cycle_dedups_normalizes_and_sorts() {
    let mock = MockServer::start().await;
    // First listing fetches, second is within the interval, the manual
    // refresh fetches again.
    mount_search_fixtures(&mock, 2).await;
    let app = spawn_app(&search_endpoint(&mock)).await;
    let session = app.create_session().await;

    let first: serde_json::Value = app
        .client
        .get(app.url("/api/v1/articles"))
        .header(SESSION_HEADER, &session)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_that!(first["refreshed"].as_bool().unwrap()).is_true();
    assert_that!(first["last_update"].is_null()).is_false();

    // Affiliate block: alias row first (12:00), then l1 (10:30), then the
    // dateless l2 last. The duplicate l1 from the Globex batch lost the
    // merge, so its keyword attribution stays "Acme".
    let affiliate = block_links(&first, 0);
    assert_that!(affiliate).is_equal_to(vec![
        "https://news.example/l4".to_string(),
        "https://news.example/l1".to_string(),
        "https://news.example/l2".to_string(),
    ]);
    let competitor = block_links(&first, 1);
    assert_that!(competitor).is_equal_to(vec!["https://news.example/l3".to_string()]);

    let alias_row = &first["groups"][0]["articles"][0];
    assert_that!(alias_row["keyword"].as_str().unwrap()).is_equal_to("Acme");

    // Second listing inside the refresh interval: no new fetch cycle.
    let second: serde_json::Value = app
        .client
        .get(app.url("/api/v1/articles"))
        .header(SESSION_HEADER, &session)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_that!(second["refreshed"].as_bool().unwrap()).is_false();

    // Manual refresh fetches unconditionally; merging the same links
    // leaves the row counts unchanged.
    let third: serde_json::Value = app
        .client
        .post(app.url("/api/v1/articles/refresh"))
        .header(SESSION_HEADER, &session)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_that!(third["refreshed"].as_bool().unwrap()).is_true();
    assert_that!(block_links(&third, 0)).has_length(3);
    assert_that!(block_links(&third, 1)).has_length(1);
}

#[tokio::test]
async fn a_failing_keyword_degrades_to_a_notice() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("query", "Globex"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock)
        .await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [{"title": "Acme ships", "link": "https://news.example/l5",
                       "pubDate": "Tue, 07 Jan 2025 09:00:00 +0900"}]
        })))
        .mount(&mock)
        .await;
    let app = spawn_app(&search_endpoint(&mock)).await;
    let session = app.create_session().await;

    let response = app
        .client
        .get(app.url("/api/v1/articles"))
        .header(SESSION_HEADER, &session)
        .send()
        .await
        .unwrap();

    assert_that!(response.status().as_u16()).is_equal_to(200);
    let view: serde_json::Value = response.json().await.unwrap();
    let notices = view["notices"].as_array().unwrap();
    assert_that!(notices).has_length(1);
    assert_that!(notices[0].as_str().unwrap()).contains("Globex");
    assert_that!(block_links(&view, 0)).has_length(1);
}

#[tokio::test]
async fn scrap_flow_saves_and_deletes_by_link() {
    let mock = MockServer::start().await;
    mount_search_fixtures(&mock, 1).await;
    let app = spawn_app(&search_endpoint(&mock)).await;
    let session = app.create_session().await;

    // Populate the history.
    app.client
        .get(app.url("/api/v1/articles"))
        .header(SESSION_HEADER, &session)
        .send()
        .await
        .unwrap();

    // Saving with an empty selection is a warning, not a side effect.
    let empty = app
        .client
        .post(app.url("/api/v1/scrap"))
        .header(SESSION_HEADER, &session)
        .send()
        .await
        .unwrap();
    assert_that!(empty.status().as_u16()).is_equal_to(400);

    app.client
        .post(app.url("/api/v1/articles/select"))
        .header(SESSION_HEADER, &session)
        .json(&serde_json::json!({"links": ["https://news.example/l1"]}))
        .send()
        .await
        .unwrap();

    let saved: serde_json::Value = app
        .client
        .post(app.url("/api/v1/scrap"))
        .header(SESSION_HEADER, &session)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_that!(saved["saved"].as_u64().unwrap()).is_equal_to(1);

    // Saving the same selection again collapses on the link identity.
    app.client
        .post(app.url("/api/v1/scrap"))
        .header(SESSION_HEADER, &session)
        .send()
        .await
        .unwrap();
    let scrap: serde_json::Value = app
        .client
        .get(app.url("/api/v1/scrap"))
        .header(SESSION_HEADER, &session)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_that!(scrap.as_array().unwrap()).has_length(1);

    // Deleting an absent link is a no-op.
    let removed: serde_json::Value = app
        .client
        .post(app.url("/api/v1/scrap/delete"))
        .header(SESSION_HEADER, &session)
        .json(&serde_json::json!({"links": ["https://news.example/l9"]}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_that!(removed["removed"].as_u64().unwrap()).is_equal_to(0);

    let removed: serde_json::Value = app
        .client
        .post(app.url("/api/v1/scrap/delete"))
        .header(SESSION_HEADER, &session)
        .json(&serde_json::json!({"links": ["https://news.example/l1"]}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_that!(removed["removed"].as_u64().unwrap()).is_equal_to(1);
}

#[tokio::test]
async fn digest_aborts_before_any_side_effect_on_bad_input() {
    let mock = MockServer::start().await;
    let app = spawn_app(&search_endpoint(&mock)).await;
    let session = app.create_session().await;

    // Missing recipient.
    let response = app
        .client
        .post(app.url("/api/v1/digest"))
        .header(SESSION_HEADER, &session)
        .json(&serde_json::json!({"recipient": "  "}))
        .send()
        .await
        .unwrap();
    assert_that!(response.status().as_u16()).is_equal_to(400);

    // Empty selection.
    let response = app
        .client
        .post(app.url("/api/v1/digest"))
        .header(SESSION_HEADER, &session)
        .json(&serde_json::json!({"recipient": "someone@example.com"}))
        .send()
        .await
        .unwrap();
    assert_that!(response.status().as_u16()).is_equal_to(400);
}

#[tokio::test]
async fn every_session_gets_its_own_tables() {
    let mock = MockServer::start().await;
    mount_search_fixtures(&mock, 1).await;
    let app = spawn_app(&search_endpoint(&mock)).await;
    let first = app.create_session().await;
    let second = app.create_session().await;

    app.client
        .get(app.url("/api/v1/articles"))
        .header(SESSION_HEADER, &first)
        .send()
        .await
        .unwrap();

    // The second session never refreshed: its export is empty.
    let export: serde_json::Value = app
        .client
        .get(app.url("/api/v1/articles/export"))
        .header(SESSION_HEADER, &second)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_that!(export.as_array().unwrap()).is_empty();

    let export: serde_json::Value = app
        .client
        .get(app.url("/api/v1/articles/export"))
        .header(SESSION_HEADER, &first)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_that!(export.as_array().unwrap()).has_length(4);
}

#[tokio::test]
async fn the_session_header_is_mandatory() {
    let mock = MockServer::start().await;
    let app = spawn_app(&search_endpoint(&mock)).await;

    let missing = app
        .client
        .get(app.url("/api/v1/articles"))
        .send()
        .await
        .unwrap();
    assert_that!(missing.status().as_u16()).is_equal_to(400);

    let not_a_uuid = app
        .client
        .get(app.url("/api/v1/articles"))
        .header(SESSION_HEADER, "not-a-uuid")
        .send()
        .await
        .unwrap();
    assert_that!(not_a_uuid.status().as_u16()).is_equal_to(400);

    let unknown = app
        .client
        .get(app.url("/api/v1/articles"))
        .header(SESSION_HEADER, "00000000-0000-4000-8000-000000000000")
        .send()
        .await
        .unwrap();
    assert_that!(unknown.status().as_u16()).is_equal_to(400);
}

#[tokio::test]
async fn unknown_groups_are_rejected_before_fetching() {
    let mock = MockServer::start().await;
    let app = spawn_app(&search_endpoint(&mock)).await;
    let session = app.create_session().await;

    let response = app
        .client
        .get(app.url("/api/v1/articles"))
        .query(&[("group", "no such group")])
        .header(SESSION_HEADER, &session)
        .send()
        .await
        .unwrap();

    assert_that!(response.status().as_u16()).is_equal_to(404);
    // The mock server saw no search request at all.
    assert_that!(mock.received_requests().await.unwrap()).is_empty();
}

#[tokio::test]
async fn the_summary_panel_is_behind_its_flag() {
    let mock = MockServer::start().await;
    let app = spawn_app(&search_endpoint(&mock)).await;
    let session = app.create_session().await;

    // The test configuration leaves summary_panel off.
    let response = app
        .client
        .get(app.url("/api/v1/articles/summary"))
        .query(&[("link", "https://news.example/l1")])
        .header(SESSION_HEADER, &session)
        .send()
        .await
        .unwrap();

    assert_that!(response.status().as_u16()).is_equal_to(404);
}
