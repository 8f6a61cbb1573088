/// Logging setup using `tracing` and `tracing-subscriber`.
///
/// `RUST_LOG` wins over the configured filter so a user can turn on
/// `star_gallery=debug` to watch event fan-out without editing the config.
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

pub fn build_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Later calls are ignored.
pub fn init(config: &Config) {
    let result = tracing_subscriber::registry()
        .with(build_filter(&config.log_filter))
        .with(fmt::layer().with_target(true))
        .try_init();

    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
