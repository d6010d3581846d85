//! Per-call request options and the client-level defaults they merge over.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::error::BoxError;
use crate::response::GraphqlResponse;
use crate::retry::RetryConfig;

/// JSON object used for variables and log metadata.
pub type JsonMap = serde_json::Map<String, serde_json::Value>;

/// Function deriving a loggable value from a response.
///
/// Failures are replaced by an empty object when logging.
pub type ResponseExtractor =
    Arc<dyn Fn(&GraphqlResponse) -> Result<serde_json::Value, BoxError> + Send + Sync>;

/// Log level for response logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// `TRACE`
    Trace,
    /// `DEBUG`
    #[default]
    Debug,
    /// `INFO`
    Info,
    /// `WARN`
    Warn,
    /// `ERROR`
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown log level: {other}")),
        }
    }
}

/// Default response-properties extractor: an empty object.
pub fn default_log_response_props() -> ResponseExtractor {
    Arc::new(|_| Ok(serde_json::Value::Object(JsonMap::new())))
}

/// Default response-data extractor: the response's `data`.
pub fn default_log_response_data() -> ResponseExtractor {
    Arc::new(|response| Ok(response.data.clone().unwrap_or(serde_json::Value::Null)))
}

/// Options for a single call. Unset fields fall back to the client defaults.
#[derive(Clone, Default)]
pub struct RequestOptions {
    /// Operation name override.
    pub name: Option<String>,
    /// Operation variables.
    pub variables: JsonMap,
    /// Extra request headers.
    pub headers: HeaderMap,
    /// Retry configuration.
    pub retry: Option<RetryConfig>,
    /// Level at which successful responses are logged.
    pub response_log_level: Option<LogLevel>,
    /// Include variables and headers in the logged `meta`.
    pub will_log_options: Option<bool>,
    /// Log the extracted response properties.
    pub will_log_response_props: Option<bool>,
    /// Log the extracted response data.
    pub will_log_response_data: Option<bool>,
    /// Response-properties extractor.
    pub get_log_response_props: Option<ResponseExtractor>,
    /// Response-data extractor.
    pub get_log_response_data: Option<ResponseExtractor>,
    /// Free-form metadata attached to every log line of the call.
    pub meta: JsonMap,
}

impl RequestOptions {
    /// Create empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the operation name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Replace the variables.
    #[must_use]
    pub fn variables(mut self, variables: JsonMap) -> Self {
        self.variables = variables;
        self
    }

    /// Set a single variable.
    #[must_use]
    pub fn variable(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    /// Add a request header. Invalid names or values are skipped.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            reqwest::header::HeaderName::from_bytes(name.as_bytes()),
            reqwest::header::HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Set the retry configuration (an integer is a retry count).
    #[must_use]
    pub fn retry(mut self, retry: impl Into<RetryConfig>) -> Self {
        self.retry = Some(retry.into());
        self
    }

    /// Set the response log level.
    #[must_use]
    pub fn response_log_level(mut self, level: LogLevel) -> Self {
        self.response_log_level = Some(level);
        self
    }

    /// Toggle logging of variables and headers.
    #[must_use]
    pub fn will_log_options(mut self, enabled: bool) -> Self {
        self.will_log_options = Some(enabled);
        self
    }

    /// Toggle logging of extracted response properties.
    #[must_use]
    pub fn will_log_response_props(mut self, enabled: bool) -> Self {
        self.will_log_response_props = Some(enabled);
        self
    }

    /// Toggle logging of response data.
    #[must_use]
    pub fn will_log_response_data(mut self, enabled: bool) -> Self {
        self.will_log_response_data = Some(enabled);
        self
    }

    /// Set the response-properties extractor.
    #[must_use]
    pub fn get_log_response_props<F>(mut self, f: F) -> Self
    where
        F: Fn(&GraphqlResponse) -> Result<serde_json::Value, BoxError> + Send + Sync + 'static,
    {
        self.get_log_response_props = Some(Arc::new(f));
        self
    }

    /// Set the response-data extractor.
    #[must_use]
    pub fn get_log_response_data<F>(mut self, f: F) -> Self
    where
        F: Fn(&GraphqlResponse) -> Result<serde_json::Value, BoxError> + Send + Sync + 'static,
    {
        self.get_log_response_data = Some(Arc::new(f));
        self
    }

    /// Attach a metadata field to the call's log lines.
    #[must_use]
    pub fn meta(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// Overlay `other` on top of `self`: set fields of `other` win,
    /// maps are merged key by key.
    pub(crate) fn merge(mut self, other: Self) -> Self {
        if other.name.is_some() {
            self.name = other.name;
        }
        self.variables.extend(other.variables);
        for (name, value) in &other.headers {
            self.headers.insert(name.clone(), value.clone());
        }
        self.retry = other.retry.or(self.retry);
        self.response_log_level = other.response_log_level.or(self.response_log_level);
        self.will_log_options = other.will_log_options.or(self.will_log_options);
        self.will_log_response_props = other
            .will_log_response_props
            .or(self.will_log_response_props);
        self.will_log_response_data = other
            .will_log_response_data
            .or(self.will_log_response_data);
        self.get_log_response_props = other
            .get_log_response_props
            .or(self.get_log_response_props);
        self.get_log_response_data = other
            .get_log_response_data
            .or(self.get_log_response_data);
        self.meta.extend(other.meta);
        self
    }
}

impl fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOptions")
            .field("name", &self.name)
            .field("variables", &self.variables)
            .field("headers", &self.headers)
            .field("retry", &self.retry)
            .field("response_log_level", &self.response_log_level)
            .field("will_log_options", &self.will_log_options)
            .field("will_log_response_props", &self.will_log_response_props)
            .field("will_log_response_data", &self.will_log_response_data)
            .field("meta", &self.meta)
            .finish_non_exhaustive()
    }
}

/// Client-level defaults for every call.
#[derive(Clone)]
pub struct DefaultOptions {
    /// Retry configuration.
    pub retry: RetryConfig,
    /// Level at which successful responses are logged.
    pub response_log_level: LogLevel,
    /// Include variables and headers in the logged `meta`.
    pub will_log_options: bool,
    /// Log the extracted response properties.
    pub will_log_response_props: bool,
    /// Log the extracted response data.
    pub will_log_response_data: bool,
    /// Response-properties extractor.
    pub get_log_response_props: ResponseExtractor,
    /// Response-data extractor.
    pub get_log_response_data: ResponseExtractor,
}

impl Default for DefaultOptions {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            response_log_level: LogLevel::Debug,
            will_log_options: true,
            will_log_response_props: true,
            will_log_response_data: false,
            get_log_response_props: default_log_response_props(),
            get_log_response_data: default_log_response_data(),
        }
    }
}

impl fmt::Debug for DefaultOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultOptions")
            .field("retry", &self.retry)
            .field("response_log_level", &self.response_log_level)
            .field("will_log_options", &self.will_log_options)
            .field("will_log_response_props", &self.will_log_response_props)
            .field("will_log_response_data", &self.will_log_response_data)
            .finish_non_exhaustive()
    }
}

/// Logging options after merging a call's options over the defaults.
#[derive(Clone)]
pub(crate) struct LogOptions {
    pub(crate) response_log_level: LogLevel,
    pub(crate) will_log_options: bool,
    pub(crate) will_log_response_props: bool,
    pub(crate) will_log_response_data: bool,
    pub(crate) get_log_response_props: ResponseExtractor,
    pub(crate) get_log_response_data: ResponseExtractor,
    pub(crate) meta: JsonMap,
}

impl DefaultOptions {
    /// Resolve the retry and logging options of a call.
    pub(crate) fn resolve(&self, options: &RequestOptions) -> (RetryConfig, LogOptions) {
        let retry = options.retry.clone().unwrap_or_else(|| self.retry.clone());
        let log = LogOptions {
            response_log_level: options
                .response_log_level
                .unwrap_or(self.response_log_level),
            will_log_options: options.will_log_options.unwrap_or(self.will_log_options),
            will_log_response_props: options
                .will_log_response_props
                .unwrap_or(self.will_log_response_props),
            will_log_response_data: options
                .will_log_response_data
                .unwrap_or(self.will_log_response_data),
            get_log_response_props: options
                .get_log_response_props
                .clone()
                .unwrap_or_else(|| Arc::clone(&self.get_log_response_props)),
            get_log_response_data: options
                .get_log_response_data
                .clone()
                .unwrap_or_else(|| Arc::clone(&self.get_log_response_data)),
            meta: options.meta.clone(),
        };
        (retry, log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_log_level_parse() {
        assert_eq!("INFO".parse::<LogLevel>(), Ok(LogLevel::Info));
        assert_eq!("warning".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert!("loud".parse::<LogLevel>().is_err());
        assert_eq!(tracing::Level::from(LogLevel::Trace), tracing::Level::TRACE);
    }

    #[test]
    fn test_merge_prefers_later_values() {
        let inline = RequestOptions::new()
            .name("Inline")
            .variable("a", 1)
            .response_log_level(LogLevel::Info);
        let separate = RequestOptions::new().variable("b", 2).retry(3);

        let merged = inline.merge(separate);
        assert_eq!(merged.name.as_deref(), Some("Inline"));
        assert_eq!(merged.variables.get("a"), Some(&json!(1)));
        assert_eq!(merged.variables.get("b"), Some(&json!(2)));
        assert_eq!(merged.retry.map(|r| r.retries), Some(3));
        assert_eq!(merged.response_log_level, Some(LogLevel::Info));
    }

    #[test]
    fn test_resolve_falls_back_to_defaults() {
        let defaults = DefaultOptions::default();
        let (retry, log) = defaults.resolve(&RequestOptions::new().will_log_response_data(true));
        assert_eq!(retry.retries, defaults.retry.retries);
        assert_eq!(log.response_log_level, LogLevel::Debug);
        assert!(log.will_log_options);
        assert!(log.will_log_response_props);
        assert!(log.will_log_response_data);
    }

    #[test]
    fn test_default_extractors() {
        let response = GraphqlResponse::from_data(json!({ "foo": "hello" }));
        assert_eq!((default_log_response_props())(&response).unwrap(), json!({}));
        assert_eq!(
            (default_log_response_data())(&response).unwrap(),
            json!({ "foo": "hello" })
        );
    }

    #[test]
    fn test_header_skips_invalid() {
        let options = RequestOptions::new()
            .header("x-tenant", "acme")
            .header("bad header", "x");
        assert_eq!(options.headers.len(), 1);
        assert_eq!(options.headers["x-tenant"], "acme");
    }
}
