use std::net::TcpListener;

use newswatch_api::model::configuration::AppConfiguration;
use newswatch_api::services::fetching::NewsFetcher;
use newswatch_api::session::SessionRegistry;
use newswatch_api::startup::{startup, AppState};

pub const SESSION_HEADER: &str = "X-Session-Id";

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Open a session and return its id.
    pub async fn create_session(&self) -> String {
        let response = self
            .client
            .post(self.url("/session"))
            .send()
            .await
            .expect("Failed to create a session");

        let body: serde_json::Value = response.json().await.expect("Invalid session response");
        body["session_id"]
            .as_str()
            .expect("Missing session id")
            .to_string()
    }
}

/// A configuration pointing at the given mock search endpoint: two small
/// keyword groups and one alias, no SMTP.
pub fn test_configuration(search_endpoint: &str) -> AppConfiguration {
    serde_json::from_value(serde_json::json!({
        "groups": [
            {"label": "affiliate trend", "keywords": ["Acme"]},
            {"label": "competitor trend", "keywords": ["Globex"]}
        ],
        "aliases": {"Acme Biosciences": "Acme"},
        "search": {
            "endpoint": search_endpoint,
            "client_id": "client-id",
            "client_secret": "client-secret"
        },
        "refresh_interval_minutes": 60
    }))
    .expect("Invalid test configuration")
}

/// Spawn the application on a random port, against the given search
/// endpoint, and hand back an HTTP client pointed at it.
pub async fn spawn_app(search_endpoint: &str) -> TestApp {
    let configuration = test_configuration(search_endpoint);
    let fetcher = NewsFetcher::new(
        configuration.search.clone(),
        configuration.aliases.clone(),
    );

    let state = AppState {
        configuration,
        sessions: SessionRegistry::default(),
        fetcher,
        mailer: None,
    };

    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind a random port");
    let port = listener.local_addr().unwrap().port();
    // The actix server future is `!Send`, so it cannot be handed to
    // `tokio::spawn`. Run it on its own thread with a dedicated actix
    // runtime instead; the test's reqwest client reaches it over TCP.
    std::thread::spawn(move || {
        actix_web::rt::System::new().block_on(startup(state, listener))
    });

    TestApp {
        address: format!("http://127.0.0.1:{port}"),
        client: reqwest::Client::new(),
    }
}
