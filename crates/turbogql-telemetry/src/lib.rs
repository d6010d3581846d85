//! Observability setup for turbogql applications
//!
//! - **Structured Logging**: a `tracing-subscriber` with an `EnvFilter`,
//!   JSON or human-readable output, stderr or stdout
//! - **Metrics Export**: a Prometheus recorder for the metrics emitted by
//!   `turbogql_client::MetricsObserver`, rendered on demand or served over HTTP
//!
//! Libraries in this workspace only emit `tracing` events and `metrics`
//! samples; installing the subscriber and recorder is up to the application.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use turbogql_telemetry::TelemetryConfig;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let telemetry = TelemetryConfig::builder()
//!         .service_name("users-gateway")
//!         .prometheus(true)
//!         .build()
//!         .init()?;
//!
//!     // ... run queries ...
//!
//!     if let Some(metrics) = telemetry.render_metrics() {
//!         println!("{metrics}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Feature Flags
//!
//! - `tracing-json` - JSON log output by default (enabled by default)
//! - `prometheus` - Prometheus metrics export
//! - `full` - All features enabled

#![cfg_attr(docsrs, feature(doc_cfg))]

mod config;
mod error;
mod init;

#[cfg(feature = "prometheus")]
#[cfg_attr(docsrs, doc(cfg(feature = "prometheus")))]
pub mod metrics;

// Re-exports
pub use config::{TelemetryConfig, TelemetryConfigBuilder};
pub use error::{TelemetryError, TelemetryResult};
pub use init::TelemetryGuard;

// Re-export tracing macros for convenience
pub use tracing::{Instrument, instrument};
pub use tracing::{debug, error, info, trace, warn};

/// Prelude module for convenient imports
pub mod prelude {
    pub use super::config::{TelemetryConfig, TelemetryConfigBuilder};
    pub use super::error::{TelemetryError, TelemetryResult};
    pub use super::init::TelemetryGuard;
    pub use tracing::{Instrument, debug, error, info, instrument, trace, warn};
}
