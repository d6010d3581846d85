//! Structured log output for client calls.

use std::panic::{self, AssertUnwindSafe};

use serde_json::Value;
use tracing::{Level, Span};

use crate::error::GraphqlClientError;
use crate::operation::Operation;
use crate::options::{JsonMap, LogLevel, LogOptions, ResponseExtractor};
use crate::response::GraphqlResponse;

macro_rules! event_at {
    ($level:expr, $($arg:tt)+) => {
        match $level {
            LogLevel::Trace => tracing::trace!($($arg)+),
            LogLevel::Debug => tracing::debug!($($arg)+),
            LogLevel::Info => tracing::info!($($arg)+),
            LogLevel::Warn => tracing::warn!($($arg)+),
            LogLevel::Error => tracing::error!($($arg)+),
        }
    };
}

fn level_enabled(level: LogLevel) -> bool {
    match level {
        LogLevel::Trace => tracing::enabled!(Level::TRACE),
        LogLevel::Debug => tracing::enabled!(Level::DEBUG),
        LogLevel::Info => tracing::enabled!(Level::INFO),
        LogLevel::Warn => tracing::enabled!(Level::WARN),
        LogLevel::Error => tracing::enabled!(Level::ERROR),
    }
}

/// Span fields shared by every line a call logs.
pub(crate) struct CallSpan<'a> {
    pub(crate) client: &'a str,
    pub(crate) req_id: &'a str,
    pub(crate) operation: &'a Operation,
    pub(crate) resource_name: &'a str,
    pub(crate) log: &'a LogOptions,
}

impl CallSpan<'_> {
    pub(crate) fn span(&self) -> Span {
        let mut meta = self.log.meta.clone();
        if self.log.will_log_options {
            meta.insert(
                "variables".to_string(),
                Value::Object(self.operation.variables.clone()),
            );
            meta.insert(
                "headers".to_string(),
                Value::Object(headers_to_json(&self.operation.headers)),
            );
        }
        let meta = Value::Object(meta);
        tracing::info_span!(
            "graphql",
            client = %self.client,
            req_id = %self.req_id,
            method = self.operation.kind.verb(),
            resource_name = %self.resource_name,
            req_name = self.operation.name.as_deref(),
            gql = %self.operation.document,
            meta = %meta,
        )
    }
}

fn headers_to_json(headers: &reqwest::header::HeaderMap) -> JsonMap {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.to_string(), Value::String(value.to_string())))
        })
        .collect()
}

/// Run an extractor; an error or a panic yields an empty object.
fn extract(extractor: &ResponseExtractor, response: &GraphqlResponse) -> Value {
    match panic::catch_unwind(AssertUnwindSafe(|| extractor(response))) {
        Ok(Ok(value)) => value,
        Ok(Err(_)) | Err(_) => Value::Object(JsonMap::new()),
    }
}

/// Values logged with a successful response.
pub(crate) fn response_fields(log: &LogOptions, response: &GraphqlResponse) -> JsonMap {
    let mut fields = JsonMap::new();
    if log.will_log_response_props {
        match extract(&log.get_log_response_props, response) {
            Value::Object(props) => fields.extend(props),
            other => {
                fields.insert("props".to_string(), other);
            }
        }
    }
    if log.will_log_response_data {
        fields.insert(
            "data".to_string(),
            extract(&log.get_log_response_data, response),
        );
    }
    fields
}

/// Log a successful call at the configured level. Nothing is computed when
/// that level is disabled.
pub(crate) fn log_success(name: &str, log: &LogOptions, response: &GraphqlResponse) {
    if !level_enabled(log.response_log_level) {
        return;
    }
    let fields = Value::Object(response_fields(log, response));
    let elapsed_ms = response.timings.map(|t| t.phases.total).unwrap_or_default();
    event_at!(
        log.response_log_level,
        status_code = 200u16,
        elapsed_ms,
        response = %fields,
        "{}: Success",
        name
    );
}

/// Log a failed call at error level.
pub(crate) fn log_failure(name: &str, error: &GraphqlClientError) {
    let elapsed_ms = error.timings().map(|t| t.phases.total);
    tracing::error!(
        status_code = error.status_code(),
        elapsed_ms,
        err = %error,
        "{}: Fail",
        name
    );
}
