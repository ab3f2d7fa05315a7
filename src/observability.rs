//! Tracing initialization (§10 ambient stack).

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};

/// Sets up console logging with the configured level and format. `RUST_LOG`
/// overrides `logging.level` when present, matching the usual tracing
/// convention.
pub fn init_tracing(config: &LoggingConfig) {
    let filter = build_env_filter(config);

    match config.format {
        LogFormat::Pretty => {
            let fmt_layer = tracing_subscriber::fmt::layer().pretty().with_target(true);
            tracing_subscriber::registry().with(filter).with(fmt_layer).init();
        }
        LogFormat::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer().json().with_current_span(true);
            tracing_subscriber::registry().with(filter).with(fmt_layer).init();
        }
    }
}

fn build_env_filter(config: &LoggingConfig) -> EnvFilter {
    if let Ok(env_filter) = std::env::var("RUST_LOG") {
        return EnvFilter::try_new(env_filter).unwrap_or_else(|_| EnvFilter::new(&config.level));
    }
    EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"))
}
