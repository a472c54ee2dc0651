use std::env;
use std::net::TcpListener;

use tracing::error;

use newswatch_api::email::SmtpMailer;
use newswatch_api::model::configuration::AppConfiguration;
use newswatch_api::services::fetching::NewsFetcher;
use newswatch_api::session::SessionRegistry;
use newswatch_api::startup::AppState;
use newswatch_api::{observability, startup};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Init dotenv
    dotenvy::dotenv().ok();

    let subscriber = observability::get_subscriber("info");
    observability::init_subscriber(subscriber);

    let configuration = AppConfiguration::load().unwrap_or_else(|error| {
        error!("Could not load the configuration: {error:#}");
        panic!()
    });

    if !check_configuration(&configuration) {
        panic!()
    }

    let listener = TcpListener::bind(
        env::var("NEWSWATCH_LISTEN_ON").unwrap_or_else(|_| String::from("0.0.0.0:8080")),
    )?;

    let mailer = match &configuration.smtp {
        Some(smtp) => Some(SmtpMailer::new(smtp).expect("Could not build the SMTP transport")),
        None => None,
    };
    let fetcher = NewsFetcher::new(
        configuration.search.clone(),
        configuration.aliases.clone(),
    );

    let state = AppState {
        configuration,
        sessions: SessionRegistry::default(),
        fetcher,
        mailer,
    };

    startup::startup(state, listener).await
}

/// Check that the configuration is OK
fn check_configuration(configuration: &AppConfiguration) -> bool {
    if configuration.groups.is_empty() {
        error!("At least one keyword group is mandatory");
        return false;
    }

    if !configuration.has_search_credentials() {
        error!("Search credentials are mandatory (SEARCH_CLIENT_ID / SEARCH_CLIENT_SECRET)");
        return false;
    }

    true
}
