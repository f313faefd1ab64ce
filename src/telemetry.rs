//! Tracing subscriber setup for embedders and tests.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Install the global subscriber from the logging config. Safe to call
/// more than once; later calls are no-ops.
pub fn init(logging: &LoggingConfig) {
    let filter = match logging.filter.as_deref() {
        Some(directives) => {
            EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new("info"))
        }
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let result = if logging.stdout {
        tracing_subscriber::fmt().with_env_filter(filter).try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::sink)
            .try_init()
    };
    // A subscriber installed by the embedder wins.
    let _ = result;
}
