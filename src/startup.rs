use std::env;
use std::net::TcpListener;

use actix_governor::{Governor, GovernorConfigBuilder};
use actix_web::web::Data;
use actix_web::{web, App, HttpServer};

use crate::email::SmtpMailer;
use crate::model::configuration::AppConfiguration;
use crate::routes;
use crate::services::fetching::NewsFetcher;
use crate::session::SessionRegistry;

pub struct AppState {
    pub configuration: AppConfiguration,
    pub sessions: SessionRegistry,
    pub fetcher: NewsFetcher,
    pub mailer: Option<SmtpMailer>,
}

pub async fn startup(state: AppState, listener: TcpListener) -> std::io::Result<()> {
    let governor_conf = GovernorConfigBuilder::default()
        .per_second(
            env::var("RATE_LIMITING_REFILL_RATE")
                .unwrap_or_else(|_| "10".to_owned())
                .parse()
                .unwrap(),
        )
        .burst_size(
            env::var("RATE_LIMITING_BUCKET_SIZE")
                .unwrap_or_else(|_| "100".to_owned())
                .parse()
                .unwrap(),
        )
        .finish()
        .unwrap();

    let state = Data::new(state);

    HttpServer::new(move || {
        App::new()
            .wrap(tracing_actix_web::TracingLogger::default())
            .app_data(state.clone())
            .service(routes::ping)
            .service(routes::create_session)
            .service(
                web::scope("/api/v1")
                    .wrap(Governor::new(&governor_conf))
                    .configure(routes::configure),
            )
            .service(actix_files::Files::new("/", "./static/").index_file("index.html"))
    })
    .listen(listener)?
    .run()
    .await
}
