//! Logging setup for the bounty board client
//!
//! Installs a `tracing-subscriber` registry with an `EnvFilter` and either
//! a compact or a JSON formatting layer.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Telemetry configuration
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name recorded at startup
    pub service_name: String,
    /// Enable console logging
    pub enable_console: bool,
    /// Enable JSON logging format
    pub json_format: bool,
    /// Log level filter
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "bounty-board".to_string(),
            enable_console: true,
            json_format: false,
            log_level: "info".to_string(),
        }
    }
}

impl TelemetryConfig {
    pub fn from_env() -> Self {
        Self {
            service_name: std::env::var("SERVICE_NAME")
                .unwrap_or_else(|_| "bounty-board".to_string()),
            enable_console: std::env::var("LOG_CONSOLE")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
            json_format: std::env::var("LOG_JSON")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            log_level: std::env::var("LOG_LEVEL")
                .or_else(|_| std::env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),
        }
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.log_level))
            .unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Initialize logging with the given configuration.
///
/// Fails if a global subscriber is already installed.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = tracing_subscriber::registry().with(config.env_filter());

    if !config.enable_console {
        subscriber.try_init()?;
    } else if config.json_format {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);
        subscriber.with(fmt_layer).try_init()?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
            .compact();
        subscriber.with(fmt_layer).try_init()?;
    }

    tracing::debug!(service = %config.service_name, "Telemetry initialized");
    Ok(())
}

/// Span and field names used across the crate
pub mod spans {
    pub const CREATE_BOUNTY: &str = "bounty.create";
    pub const SUBMIT_PROOF: &str = "proof.submit";
    pub const PACKAGE_PROOF: &str = "proof.package";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_telemetry_config_default() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "bounty-board");
        assert_eq!(config.log_level, "info");
        assert!(config.enable_console);
        assert!(!config.json_format);
    }

    #[test]
    fn test_invalid_level_falls_back() {
        let config = TelemetryConfig {
            log_level: "not a [valid filter".to_string(),
            ..TelemetryConfig::default()
        };
        // Must not panic whatever RUST_LOG holds
        let _ = config.env_filter();
    }
}
