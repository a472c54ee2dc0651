use tracing::subscriber::set_global_default;
use tracing::Subscriber;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry};

/// Build the tracing subscriber. `RUST_LOG` wins over the given default
/// filter; `NEWSWATCH_LOG_JSON` switches the fmt layer to JSON lines.
pub fn get_subscriber(env_filter: &str) -> Box<dyn Subscriber + Send + Sync> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(env_filter));

    if std::env::var("NEWSWATCH_LOG_JSON").is_ok() {
        Box::new(
            Registry::default()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json()),
        )
    } else {
        Box::new(
            Registry::default()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer()),
        )
    }
}

pub fn init_subscriber(subscriber: impl Subscriber + Send + Sync) {
    set_global_default(subscriber).expect("Failed to set subscriber");
}
