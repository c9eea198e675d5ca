//! Telemetry configuration from environment variables.

use serde::{Deserialize, Serialize};
use std::env;

/// Configuration for log output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Service name attached to every log line
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error) or full directive
    pub log_level: String,

    /// Whether to enable console output
    pub console_output: bool,

    /// Whether to enable JSON formatted logs
    pub json_logs: bool,

    /// Network identifier (localnet, testnet, mainnet)
    pub network: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "discipline-escrow".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            network: "localnet".to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `DISCIPLINE_SERVICE_NAME`: Service name (default: discipline-escrow)
    /// - `DISCIPLINE_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `DISCIPLINE_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `DISCIPLINE_JSON_LOGS`: Enable JSON logs (default: false, true in containers)
    /// - `DISCIPLINE_NETWORK`: Network name (default: localnet)
    ///
    /// Flags accept `true`, `1`, `yes` or `on`. Anything else reads as false.
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("DISCIPLINE_SERVICE_NAME")
                .unwrap_or_else(|_| "discipline-escrow".to_string()),

            log_level: env::var("DISCIPLINE_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            console_output: env::var("DISCIPLINE_CONSOLE_OUTPUT")
                .map(|v| parse_flag(&v))
                .unwrap_or(true),

            json_logs: env::var("DISCIPLINE_JSON_LOGS")
                .map(|v| parse_flag(&v))
                .unwrap_or(is_container),

            network: env::var("DISCIPLINE_NETWORK").unwrap_or_else(|_| "localnet".to_string()),
        }
    }

    /// Same configuration with another log level.
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "discipline-escrow");
        assert_eq!(config.log_level, "info");
        assert!(config.console_output);
        assert!(!config.json_logs);
    }

    #[test]
    fn test_with_log_level() {
        let config = TelemetryConfig::default().with_log_level("debug");
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("TRUE"));
        assert!(parse_flag("1"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag(""));
    }

    #[test]
    fn test_config_from_env() {
        let keys = [
            "DISCIPLINE_SERVICE_NAME",
            "DISCIPLINE_LOG_LEVEL",
            "DISCIPLINE_CONSOLE_OUTPUT",
            "DISCIPLINE_JSON_LOGS",
            "DISCIPLINE_NETWORK",
        ];
        let saved: Vec<_> = keys.iter().map(|k| (*k, env::var(k).ok())).collect();

        env::set_var("DISCIPLINE_SERVICE_NAME", "escrow-replay");
        env::set_var("DISCIPLINE_LOG_LEVEL", "discipline_contract=trace");
        env::set_var("DISCIPLINE_CONSOLE_OUTPUT", "maybe");
        env::set_var("DISCIPLINE_JSON_LOGS", "ON");
        env::set_var("DISCIPLINE_NETWORK", "testnet");
        let config = TelemetryConfig::from_env();

        for (key, value) in saved {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }

        assert_eq!(config.service_name, "escrow-replay");
        assert_eq!(config.log_level, "discipline_contract=trace");
        assert!(!config.console_output);
        assert!(config.json_logs);
        assert_eq!(config.network, "testnet");
    }
}
