//! Logging configuration.

use super::parse::{env_opt, env_or};
use super::ConfigError;

const DEFAULT_FILTER: &str = "queue_httpd=info";

/// Output format for log lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Human-readable tracing-subscriber output.
    Text,
}

/// Logging configuration loaded from environment.
#[derive(Clone, Debug)]
pub struct LoggingConfig {
    /// Log level filter (from LOG_LEVEL or RUST_LOG).
    pub filter: String,
    /// Service name for structured logging.
    pub service_name: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            service_name: "queue_httpd".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl LoggingConfig {
    /// Load configuration from environment variables.
    ///
    /// Priority: LOG_LEVEL > RUST_LOG > default
    ///
    /// LOG_LEVEL accepts simple values: trace, debug, info, warn, error
    /// RUST_LOG accepts full tracing filter syntax: queue_httpd=debug,tokio=warn
    pub fn from_env() -> Result<Self, ConfigError> {
        let format = match env_or("LOG_FORMAT", "json").to_lowercase().as_str() {
            "json" => LogFormat::Json,
            "text" | "pretty" => LogFormat::Text,
            other => {
                return Err(ConfigError::Invalid {
                    key: "LOG_FORMAT".into(),
                    message: format!("expected json or text, got '{}'", other),
                })
            }
        };

        Ok(Self {
            filter: resolve_log_filter(env_opt("LOG_LEVEL").as_deref(), env_opt("RUST_LOG")),
            service_name: env_or("SERVICE_NAME", "queue_httpd"),
            format,
        })
    }
}

/// Resolve the filter directive from LOG_LEVEL and RUST_LOG values.
fn resolve_log_filter(log_level: Option<&str>, rust_log: Option<String>) -> String {
    if let Some(level) = log_level {
        let level = level.to_lowercase();
        match level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {
                return format!("queue_httpd={}", level);
            }
            _ => {
                // Logging is not up yet, so stderr is the only channel.
                eprintln!(
                    "Warning: Invalid LOG_LEVEL '{}', expected: trace, debug, info, warn, error",
                    level
                );
            }
        }
    }

    rust_log.unwrap_or_else(|| DEFAULT_FILTER.to_string())
}
