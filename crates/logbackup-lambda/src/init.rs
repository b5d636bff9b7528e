// Logging/tracing setup for the Lambda runtime
//
// CloudWatch Logs stamps every line itself, so event timestamps are left out.

use logbackup_config::{LogConfig, LogFormat};

/// Initialize tracing from the log configuration.
///
/// `RUST_LOG` takes precedence over the configured level when set.
pub fn init_tracing(config: &LogConfig) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    // Try to set the global subscriber; ignore error if already set (idempotent)
    let _ = match config.format {
        LogFormat::Json => tracing::subscriber::set_global_default(
            registry.with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(true)
                    .with_target(true)
                    .without_time(),
            ),
        ),
        LogFormat::Text => tracing::subscriber::set_global_default(
            registry.with(fmt::layer().with_ansi(false).without_time()),
        ),
    };
}
