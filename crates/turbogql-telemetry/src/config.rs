//! Telemetry configuration

/// Telemetry configuration
///
/// Use [`TelemetryConfigBuilder`] for ergonomic configuration construction.
///
/// # Example
///
/// ```rust
/// use turbogql_telemetry::TelemetryConfig;
///
/// let config = TelemetryConfig::builder()
///     .service_name("users-gateway")
///     .log_level("info,turbogql_client=debug")
///     .json_logs(false)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name for telemetry identification
    pub service_name: String,
    /// Log level filter used when `RUST_LOG` is unset
    pub log_level: String,
    /// Enable JSON-formatted log output
    pub json_logs: bool,
    /// Write logs to stderr instead of stdout
    pub stderr_output: bool,

    /// Install a Prometheus recorder
    #[cfg(feature = "prometheus")]
    pub prometheus: bool,
    /// Serve metrics over HTTP on this port (implies `prometheus`)
    #[cfg(feature = "prometheus")]
    pub prometheus_port: Option<u16>,
    /// Prefix of the client metric names
    #[cfg(feature = "prometheus")]
    pub metrics_prefix: String,
    /// Histogram buckets for the request duration, in milliseconds
    #[cfg(feature = "prometheus")]
    pub duration_buckets: Option<Vec<f64>>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "turbogql".to_string(),
            log_level: "info".to_string(),
            json_logs: cfg!(feature = "tracing-json"),
            stderr_output: true,

            #[cfg(feature = "prometheus")]
            prometheus: false,
            #[cfg(feature = "prometheus")]
            prometheus_port: None,
            #[cfg(feature = "prometheus")]
            metrics_prefix: turbogql_client::metrics::DEFAULT_PREFIX.to_string(),
            #[cfg(feature = "prometheus")]
            duration_buckets: None,
        }
    }
}

impl TelemetryConfig {
    /// Create a new configuration builder
    #[must_use]
    pub fn builder() -> TelemetryConfigBuilder {
        TelemetryConfigBuilder::default()
    }

    /// Initialize telemetry with this configuration
    ///
    /// # Errors
    ///
    /// See [`TelemetryGuard::init`](crate::TelemetryGuard::init).
    pub fn init(self) -> Result<crate::TelemetryGuard, crate::TelemetryError> {
        crate::TelemetryGuard::init(self)
    }

    /// Whether a Prometheus recorder will be installed
    #[cfg(feature = "prometheus")]
    pub fn wants_prometheus(&self) -> bool {
        self.prometheus || self.prometheus_port.is_some()
    }
}

/// Builder for [`TelemetryConfig`]
#[derive(Debug, Clone, Default)]
pub struct TelemetryConfigBuilder {
    service_name: Option<String>,
    log_level: Option<String>,
    json_logs: Option<bool>,
    stderr_output: Option<bool>,

    #[cfg(feature = "prometheus")]
    prometheus: Option<bool>,
    #[cfg(feature = "prometheus")]
    prometheus_port: Option<u16>,
    #[cfg(feature = "prometheus")]
    metrics_prefix: Option<String>,
    #[cfg(feature = "prometheus")]
    duration_buckets: Option<Vec<f64>>,
}

impl TelemetryConfigBuilder {
    /// Set the service name
    #[must_use]
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Set the log level filter
    ///
    /// Examples: "info", "debug", "warn,turbogql_client=debug"
    #[must_use]
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    /// Enable or disable JSON log output
    #[must_use]
    pub fn json_logs(mut self, enabled: bool) -> Self {
        self.json_logs = Some(enabled);
        self
    }

    /// Enable or disable stderr output
    #[must_use]
    pub fn stderr_output(mut self, enabled: bool) -> Self {
        self.stderr_output = Some(enabled);
        self
    }

    /// Install a Prometheus recorder
    #[cfg(feature = "prometheus")]
    #[cfg_attr(docsrs, doc(cfg(feature = "prometheus")))]
    #[must_use]
    pub fn prometheus(mut self, enabled: bool) -> Self {
        self.prometheus = Some(enabled);
        self
    }

    /// Serve Prometheus metrics on this port
    #[cfg(feature = "prometheus")]
    #[cfg_attr(docsrs, doc(cfg(feature = "prometheus")))]
    #[must_use]
    pub fn prometheus_port(mut self, port: u16) -> Self {
        self.prometheus_port = Some(port);
        self
    }

    /// Set the client metric name prefix
    #[cfg(feature = "prometheus")]
    #[cfg_attr(docsrs, doc(cfg(feature = "prometheus")))]
    #[must_use]
    pub fn metrics_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.metrics_prefix = Some(prefix.into());
        self
    }

    /// Set the request duration histogram buckets (milliseconds)
    #[cfg(feature = "prometheus")]
    #[cfg_attr(docsrs, doc(cfg(feature = "prometheus")))]
    #[must_use]
    pub fn duration_buckets(mut self, buckets: Vec<f64>) -> Self {
        self.duration_buckets = Some(buckets);
        self
    }

    /// Build the configuration
    #[must_use]
    pub fn build(self) -> TelemetryConfig {
        let defaults = TelemetryConfig::default();

        TelemetryConfig {
            service_name: self.service_name.unwrap_or(defaults.service_name),
            log_level: self.log_level.unwrap_or(defaults.log_level),
            json_logs: self.json_logs.unwrap_or(defaults.json_logs),
            stderr_output: self.stderr_output.unwrap_or(defaults.stderr_output),

            #[cfg(feature = "prometheus")]
            prometheus: self.prometheus.unwrap_or(defaults.prometheus),
            #[cfg(feature = "prometheus")]
            prometheus_port: self.prometheus_port.or(defaults.prometheus_port),
            #[cfg(feature = "prometheus")]
            metrics_prefix: self.metrics_prefix.unwrap_or(defaults.metrics_prefix),
            #[cfg(feature = "prometheus")]
            duration_buckets: self.duration_buckets.or(defaults.duration_buckets),
        }
    }
}
