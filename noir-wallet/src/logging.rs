//! Logging bootstrap for hosts embedding the wallet engine.
//!
//! The engine itself only emits `tracing` events; nothing is printed unless the
//! host installs a subscriber, either its own or the console one set up here.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{LoggingError, LoggingResult};

/// Configuration for logging output.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level filter. If None, falls back to `RUST_LOG`, then INFO.
    pub level: Option<LevelFilter>,
    /// Whether to output logs to console (stderr).
    pub console: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: None,
            console: true,
        }
    }
}

/// Initialize console logging with the given level.
pub fn init_console_logging(level: LevelFilter) -> LoggingResult<()> {
    init_logging(LoggingConfig {
        level: Some(level),
        console: true,
    })
}

/// Initialize logging with the given configuration.
///
/// # Errors
///
/// Returns [`LoggingError::SubscriberInit`] if a global subscriber is already set.
///
/// Note: if console output is disabled, nothing is installed and the tracing
/// macros stay no-ops.
///
/// # Examples
///
/// ```no_run
/// use noir_wallet::logging::{init_logging, LoggingConfig};
/// use tracing::level_filters::LevelFilter;
///
/// init_logging(LoggingConfig {
///     level: Some(LevelFilter::DEBUG),
///     console: true,
/// })
/// .unwrap();
/// ```
pub fn init_logging(config: LoggingConfig) -> LoggingResult<()> {
    if !config.console {
        return Ok(());
    }

    let env_filter = match config.level {
        Some(level) => EnvFilter::new(level.to_string()),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(LevelFilter::INFO.to_string())),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .try_init()
        .map_err(|e| LoggingError::SubscriberInit(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_console_is_noop() {
        let result = init_logging(LoggingConfig {
            level: Some(LevelFilter::TRACE),
            console: false,
        });
        assert!(result.is_ok());
    }

    #[test]
    fn test_second_init_fails() {
        let _ = init_console_logging(LevelFilter::WARN);
        let second = init_console_logging(LevelFilter::WARN);
        assert!(matches!(second, Err(LoggingError::SubscriberInit(_))));
    }
}
