//! # Discipline Telemetry
//!
//! Structured logging for the discipline escrow host and tools.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use discipline_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let _guard = init_telemetry(TelemetryConfig::from_env())?;
//!     // spans and events from discipline-contract are now printed
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `DISCIPLINE_LOG_LEVEL` | `info` | Log level filter (`RUST_LOG` also honoured) |
//! | `DISCIPLINE_JSON_LOGS` | `false` | JSON lines instead of pretty output |
//! | `DISCIPLINE_CONSOLE_OUTPUT` | `true` | Write logs to stderr |
//! | `DISCIPLINE_SERVICE_NAME` | `discipline-escrow` | Service name field |
//! | `DISCIPLINE_NETWORK` | `localnet` | Network field |

#![warn(missing_docs)]

mod config;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use tracing_setup::build_filter;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// A global subscriber is already installed, or installation failed.
    #[error("Failed to initialize tracing subscriber: {0}")]
    SubscriberInit(String),

    /// Configuration could not be applied.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging for the process.
///
/// Returns a guard to hold for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    tracing_setup::init_tracing(&config)?;
    Ok(TelemetryGuard {
        service_name: config.service_name,
    })
}

/// Guard that keeps telemetry active. Logs a shutdown line when dropped.
#[derive(Debug)]
pub struct TelemetryGuard {
    service_name: String,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TelemetryError::Config("bad level".to_string());
        assert_eq!(err.to_string(), "Invalid configuration: bad level");
    }

    #[test]
    fn test_second_init_fails() {
        let config = TelemetryConfig {
            console_output: false,
            ..TelemetryConfig::default()
        };
        let _first = init_telemetry(config.clone());
        assert!(init_telemetry(config).is_err());
    }
}
