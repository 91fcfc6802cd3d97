//! Logging and tracing initialization.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;

/// Build the level filter: `RUST_LOG` wins over the configured level.
fn level_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
}

/// Install the global tracing subscriber.
///
/// Returns `false` if a subscriber was already installed (e.g. a second
/// call from a test harness); the existing one is kept.
pub fn init_logging(config: &LoggingConfig) -> bool {
    let builder = fmt::Subscriber::builder().with_env_filter(level_filter(config));

    if config.json {
        tracing::subscriber::set_global_default(builder.json().finish()).is_ok()
    } else {
        let subscriber = builder
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .finish();
        tracing::subscriber::set_global_default(subscriber).is_ok()
    }
}

/// Route tracing output through the libtest capture so per-tick debug
/// logs show up only for failing tests.
pub fn init_test_logging() {
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(level_filter(&LoggingConfig {
            level: "debug".to_string(),
            json: false,
        }))
        .with_test_writer()
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}
