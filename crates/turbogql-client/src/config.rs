//! Serde-deserialisable client configuration.
//!
//! Every field is optional so a client table can be layered over a shared
//! `defaults` table before the client is built.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::client::GraphqlClientBuilder;
use crate::options::LogLevel;
use crate::retry::RetryConfig;

/// Retry settings as written in configuration: a bare retry count or a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RetrySetting {
    /// `retry = 3`
    Count(u32),
    /// `[retry] retries = 3, min_timeout = 500`
    Options(RetryOptions),
}

/// Retry table. Timeouts are in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryOptions {
    /// Maximum retries.
    pub retries: Option<u32>,
    /// Base delay in milliseconds.
    #[serde(alias = "minTimeout")]
    pub min_timeout: Option<u64>,
    /// Delay cap in milliseconds.
    #[serde(alias = "maxTimeout")]
    pub max_timeout: Option<u64>,
    /// Growth factor.
    pub factor: Option<f64>,
    /// Randomise delays.
    pub randomize: Option<bool>,
}

impl From<RetrySetting> for RetryConfig {
    fn from(setting: RetrySetting) -> Self {
        match setting {
            RetrySetting::Count(retries) => Self::new(retries),
            RetrySetting::Options(options) => {
                let defaults = Self::default();
                Self {
                    retries: options.retries.unwrap_or(defaults.retries),
                    min_timeout: options
                        .min_timeout
                        .map_or(defaults.min_timeout, Duration::from_millis),
                    max_timeout: options.max_timeout.map(Duration::from_millis),
                    factor: options.factor.unwrap_or(defaults.factor),
                    randomize: options.randomize.unwrap_or(defaults.randomize),
                    on_retry: None,
                }
            }
        }
    }
}

/// Configuration of one client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Server origin.
    pub origin: Option<String>,
    /// Endpoint path (default `/graphql`).
    pub path: Option<String>,
    /// Bearer token.
    pub token: Option<String>,
    /// Headers sent with every request.
    pub headers: HashMap<String, String>,
    /// HTTP timeout in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Fixed request id.
    pub req_id: Option<String>,
    /// Request id header name.
    pub req_id_header: Option<String>,
    /// Request name header name.
    pub req_name_header: Option<String>,
    /// Retry settings.
    pub retry: Option<RetrySetting>,
    /// Level for successful response logs.
    pub response_log_level: Option<LogLevel>,
    /// Log variables and headers.
    pub will_log_options: Option<bool>,
    /// Log extracted response properties.
    pub will_log_response_props: Option<bool>,
    /// Log response data.
    pub will_log_response_data: Option<bool>,
    /// Record request metrics.
    pub metrics: Option<bool>,
    /// Metric name prefix (implies `metrics`).
    pub metrics_prefix: Option<String>,
}

impl ClientConfig {
    /// Layer `self` over `defaults`: fields set here win, headers merge.
    #[must_use]
    pub fn merged_over(self, defaults: &Self) -> Self {
        let mut headers = defaults.headers.clone();
        headers.extend(self.headers);
        Self {
            origin: self.origin.or_else(|| defaults.origin.clone()),
            path: self.path.or_else(|| defaults.path.clone()),
            token: self.token.or_else(|| defaults.token.clone()),
            headers,
            timeout_ms: self.timeout_ms.or(defaults.timeout_ms),
            req_id: self.req_id.or_else(|| defaults.req_id.clone()),
            req_id_header: self.req_id_header.or_else(|| defaults.req_id_header.clone()),
            req_name_header: self
                .req_name_header
                .or_else(|| defaults.req_name_header.clone()),
            retry: self.retry.or_else(|| defaults.retry.clone()),
            response_log_level: self.response_log_level.or(defaults.response_log_level),
            will_log_options: self.will_log_options.or(defaults.will_log_options),
            will_log_response_props: self
                .will_log_response_props
                .or(defaults.will_log_response_props),
            will_log_response_data: self
                .will_log_response_data
                .or(defaults.will_log_response_data),
            metrics: self.metrics.or(defaults.metrics),
            metrics_prefix: self.metrics_prefix.or_else(|| defaults.metrics_prefix.clone()),
        }
    }

    /// Builder for a client named `name` with these settings applied.
    pub fn builder(&self, name: &str) -> GraphqlClientBuilder {
        let mut builder = GraphqlClientBuilder::new().with_name(name);
        if let Some(origin) = &self.origin {
            builder = builder.with_origin(origin.clone());
        }
        if let Some(path) = &self.path {
            builder = builder.with_path(path.clone());
        }
        if let Some(token) = &self.token {
            builder = builder.with_token(token.clone());
        }
        for (header, value) in &self.headers {
            builder = builder.with_header(header.clone(), value.clone());
        }
        if let Some(timeout) = self.timeout_ms {
            builder = builder.with_timeout(Duration::from_millis(timeout));
        }
        if let Some(req_id) = &self.req_id {
            builder = builder.with_req_id(req_id.clone());
        }
        if let Some(header) = &self.req_id_header {
            builder = builder.with_req_id_header(header.clone());
        }
        if let Some(header) = &self.req_name_header {
            builder = builder.with_req_name_header(header.clone());
        }
        if let Some(retry) = &self.retry {
            builder = builder.with_retry(retry.clone());
        }
        if let Some(level) = self.response_log_level {
            builder = builder.with_response_log_level(level);
        }
        if let Some(enabled) = self.will_log_options {
            builder = builder.with_will_log_options(enabled);
        }
        if let Some(enabled) = self.will_log_response_props {
            builder = builder.with_will_log_response_props(enabled);
        }
        if let Some(enabled) = self.will_log_response_data {
            builder = builder.with_will_log_response_data(enabled);
        }
        match (&self.metrics_prefix, self.metrics) {
            (_, Some(false)) => {}
            (Some(prefix), _) => builder = builder.with_metrics_prefix(prefix.clone()),
            (None, Some(true)) => builder = builder.with_metrics(),
            (None, None) => {}
        }
        builder
    }
}

/// Named clients with shared defaults.
///
/// ```toml
/// [defaults]
/// retry = 2
///
/// [clients.users]
/// origin = "https://users.example.com"
///
/// [clients.billing]
/// origin = "https://billing.example.com"
/// token = "secret"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientsConfig {
    /// Values applied under every client.
    pub defaults: ClientConfig,
    /// Client tables keyed by name.
    pub clients: BTreeMap<String, ClientConfig>,
}

impl ClientsConfig {
    /// Each client's configuration with the defaults applied.
    pub fn resolved(&self) -> impl Iterator<Item = (&str, ClientConfig)> + '_ {
        self.clients
            .iter()
            .map(|(name, config)| (name.as_str(), config.clone().merged_over(&self.defaults)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_retry_setting_forms() {
        let count: RetrySetting = serde_json::from_str("3").unwrap();
        assert_eq!(RetryConfig::from(count).retries, 3);

        let table: RetrySetting =
            serde_json::from_str(r#"{ "retries": 1, "minTimeout": 250, "randomize": false }"#)
                .unwrap();
        let config = RetryConfig::from(table);
        assert_eq!(config.retries, 1);
        assert_eq!(config.min_timeout, Duration::from_millis(250));
        assert!(!config.randomize);
        assert_eq!(config.factor, 2.0);
    }

    #[test]
    fn test_merge_over_defaults() {
        let defaults = ClientConfig {
            path: Some("/api".to_string()),
            retry: Some(RetrySetting::Count(2)),
            headers: HashMap::from([("x-team".to_string(), "core".to_string())]),
            ..ClientConfig::default()
        };
        let client = ClientConfig {
            origin: Some("https://users.example.com".to_string()),
            retry: Some(RetrySetting::Count(5)),
            headers: HashMap::from([("x-app".to_string(), "users".to_string())]),
            ..ClientConfig::default()
        };

        let merged = client.merged_over(&defaults);
        assert_eq!(merged.origin.as_deref(), Some("https://users.example.com"));
        assert_eq!(merged.path.as_deref(), Some("/api"));
        assert_eq!(merged.retry, Some(RetrySetting::Count(5)));
        assert_eq!(merged.headers.len(), 2);
    }

    #[test]
    fn test_clients_config_from_json() {
        let config: ClientsConfig = serde_json::from_value(serde_json::json!({
            "defaults": { "retry": 1, "response_log_level": "info" },
            "clients": {
                "users": { "origin": "http://users" },
                "billing": { "origin": "http://billing", "retry": 4 }
            }
        }))
        .unwrap();

        let resolved: BTreeMap<_, _> = config.resolved().collect();
        assert_eq!(resolved["users"].retry, Some(RetrySetting::Count(1)));
        assert_eq!(resolved["billing"].retry, Some(RetrySetting::Count(4)));
        assert_eq!(resolved["users"].response_log_level, Some(LogLevel::Info));
    }
}
