//! Logging setup utilities for the Parley binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber with the specified default log level.
///
/// Sets up logging for the Parley crates and the binary itself.
/// The log level can be overridden using the `RUST_LOG` environment variable.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "parley_server", "parley_client")
/// * `default_level` - The default log level (e.g., "debug", "info", "warn", "error")
///
/// # Examples
///
/// ```no_run
/// use parley_shared::logger::setup_logger;
///
/// setup_logger("parley_server", "debug");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    let binary_target = binary_name.replace('-', "_");
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "parley_shared={level},parley_server={level},parley_client={level},{}={level}",
                    binary_target,
                    level = default_log_level,
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
