//! Error types for the GraphQL client.

use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::response::Timings;

/// Boxed error used for opaque transport sources and extractor failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// GraphQL error location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphqlErrorLocation {
    /// Line number in the query (1-based).
    pub line: u32,
    /// Column number in the query (1-based).
    pub column: u32,
}

/// GraphQL path segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GraphqlPathSegment {
    /// Field name.
    Key(String),
    /// Array index.
    Index(i64),
}

/// GraphQL error as returned in a response's `errors` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphqlError {
    /// Human-readable error message.
    pub message: String,
    /// Location(s) within the query.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<GraphqlErrorLocation>,
    /// Path within the response where the error occurred.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<GraphqlPathSegment>,
    /// Extensions metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<serde_json::Value>,
}

impl GraphqlError {
    /// Create an error with only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: Vec::new(),
            path: Vec::new(),
            extensions: None,
        }
    }
}

/// The part of a failed network exchange the retry policy inspects.
#[derive(Debug, Clone, Default)]
pub struct NetworkError {
    /// HTTP status code of the upstream response, if one was received.
    pub status_code: Option<u16>,
    /// Low-level connection error code such as `ECONNREFUSED`.
    pub code: Option<String>,
    /// Upstream response headers (empty when no response was received).
    pub headers: HeaderMap,
}

impl NetworkError {
    /// Network error for an HTTP response with the given status.
    pub fn with_status(status_code: u16) -> Self {
        Self {
            status_code: Some(status_code),
            ..Self::default()
        }
    }

    /// Network error for a connection-level failure.
    pub fn with_code(code: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            ..Self::default()
        }
    }

    /// Attach response headers.
    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }
}

/// Failure reported by a [`Transport`](crate::Transport).
///
/// Only [`NetworkError`] is inspected by the retry policy; the message and
/// source are carried through untouched.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
    network_error: Option<NetworkError>,
    timings: Option<Timings>,
    #[source]
    source: Option<BoxError>,
}

impl TransportError {
    /// Create an error with no network details (never retried).
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            network_error: None,
            timings: None,
            source: None,
        }
    }

    /// Create an error carrying network details.
    pub fn network(message: impl Into<String>, network_error: NetworkError) -> Self {
        Self {
            network_error: Some(network_error),
            ..Self::new(message)
        }
    }

    /// Attach the underlying error.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Network details, if the failure happened on the wire.
    pub fn network_error(&self) -> Option<&NetworkError> {
        self.network_error.as_ref()
    }

    /// Timing recorded by the executor once the call finished.
    pub fn timings(&self) -> Option<&Timings> {
        self.timings.as_ref()
    }
}

/// Programmer errors in the supplied document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    /// No document was supplied.
    #[error("Expecting a parsed GraphQL document")]
    Missing,

    /// The document failed to parse.
    #[error("GraphQL syntax error: {}", .0.join("; "))]
    Syntax(Vec<String>),

    /// The document parsed but defines no query or mutation.
    #[error("GraphQL document contains no executable operation")]
    NoOperation,

    /// Inline options of a JSON request did not deserialize.
    #[error("Invalid request options: {0}")]
    InvalidOptions(String),
}

/// Error type for GraphQL client operations.
#[derive(Debug, Error)]
pub enum GraphqlClientError {
    /// Transport or network failure.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// GraphQL-level errors returned in an otherwise successful response.
    #[error("GraphQL errors: {}", join_messages(.errors))]
    GraphqlErrors {
        /// GraphQL error list.
        errors: Vec<GraphqlError>,
        /// Timing recorded by the executor.
        timings: Option<Timings>,
    },

    /// Missing or malformed document.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Client construction failed.
    #[error("Failed to build GraphQL client: {0}")]
    Build(String),
}

impl GraphqlClientError {
    /// Network details of a transport failure.
    pub fn network_error(&self) -> Option<&NetworkError> {
        match self {
            Self::Transport(err) => err.network_error(),
            _ => None,
        }
    }

    /// Upstream HTTP status code, when the failure carried one.
    pub fn status_code(&self) -> Option<u16> {
        self.network_error().and_then(|network| network.status_code)
    }

    /// Timing recorded on the error, if it passed through the executor.
    pub fn timings(&self) -> Option<&Timings> {
        match self {
            Self::Transport(err) => err.timings(),
            Self::GraphqlErrors { timings, .. } => timings.as_ref(),
            _ => None,
        }
    }

    pub(crate) fn record_timings(&mut self, recorded: Timings) {
        match self {
            Self::Transport(err) => err.timings = Some(recorded),
            Self::GraphqlErrors { timings, .. } => *timings = Some(recorded),
            Self::Document(_) | Self::Build(_) => {}
        }
    }
}

impl From<reqwest::Error> for GraphqlClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::Build(err.to_string())
    }
}

fn join_messages(errors: &[GraphqlError]) -> String {
    errors
        .iter()
        .map(|err| err.message.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graphql_errors_display() {
        let err = GraphqlClientError::GraphqlErrors {
            errors: vec![GraphqlError::new("boom"), GraphqlError::new("bang")],
            timings: None,
        };
        assert_eq!(err.to_string(), "GraphQL errors: boom, bang");
    }

    #[test]
    fn test_status_code_from_transport() {
        let err = GraphqlClientError::from(TransportError::network(
            "Response not successful: Received status code 503",
            NetworkError::with_status(503),
        ));
        assert_eq!(err.status_code(), Some(503));
        assert!(err.timings().is_none());
    }

    #[test]
    fn test_record_timings() {
        let mut err = GraphqlClientError::from(TransportError::new("offline"));
        err.record_timings(Timings::from_millis(12));
        assert_eq!(err.timings().map(|t| t.phases.total), Some(12));

        let mut err = GraphqlClientError::from(DocumentError::Missing);
        err.record_timings(Timings::from_millis(12));
        assert!(err.timings().is_none());
    }

    #[test]
    fn test_graphql_error_deserialize() {
        let err: GraphqlError = serde_json::from_value(serde_json::json!({
            "message": "Cannot query field",
            "locations": [{ "line": 1, "column": 3 }],
            "path": ["user", 0, "name"]
        }))
        .unwrap();
        assert_eq!(err.locations[0].column, 3);
        assert_eq!(err.path[1], GraphqlPathSegment::Index(0));
    }
}
