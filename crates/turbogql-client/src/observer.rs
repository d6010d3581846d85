//! Request lifecycle hooks.

use std::time::Duration;

use crate::error::GraphqlClientError;
use crate::operation::OperationKind;
use crate::response::GraphqlResponse;

/// Identifies the call an event belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestEvent {
    /// Client name.
    pub client: String,
    /// Operation name, if any.
    pub name: Option<String>,
    /// `"<Label> <name>"`.
    pub resource_name: String,
    /// Query or mutation.
    pub method: OperationKind,
}

/// How a call finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The call returned a response.
    Success,
    /// The call returned an error.
    Failure,
}

impl Outcome {
    /// Lowercase label used in metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

/// Receives lifecycle events for every call made by a client.
///
/// Each call emits `on_start`, then exactly one of `on_success` or
/// `on_fail`, then `on_done`. All methods default to no-ops.
pub trait RequestObserver: Send + Sync {
    /// Call started.
    fn on_start(&self, _event: &RequestEvent) {}

    /// Call succeeded after `elapsed`.
    fn on_success(&self, _event: &RequestEvent, _response: &GraphqlResponse, _elapsed: Duration) {}

    /// Call failed after `elapsed`.
    fn on_fail(&self, _event: &RequestEvent, _error: &GraphqlClientError, _elapsed: Duration) {}

    /// Call finished.
    fn on_done(&self, _event: &RequestEvent, _outcome: Outcome) {}
}
