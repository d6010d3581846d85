//! Response container and call timings.

use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::GraphqlError;

/// GraphQL response as returned by a transport.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphqlResponse {
    /// Response data.
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    /// GraphQL errors.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphqlError>,
    /// Extensions payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<serde_json::Value>,
    /// Wall-clock timing recorded by the client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timings: Option<Timings>,
}

impl GraphqlResponse {
    /// Response carrying only data.
    pub fn from_data(data: serde_json::Value) -> Self {
        Self {
            data: Some(data),
            ..Self::default()
        }
    }

    /// Returns `true` if no GraphQL errors were returned.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Deserialize `data` into a typed value.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<Option<T>, serde_json::Error> {
        self.data
            .as_ref()
            .map(|data| T::deserialize(data))
            .transpose()
    }
}

/// Timing attached to a finished call, `timings.phases.total` in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timings {
    /// Measured phases.
    pub phases: Phases,
}

/// Phases of a call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phases {
    /// Total wall-clock time from call start to completion, in milliseconds.
    pub total: u64,
}

impl Timings {
    /// Timing from an explicit millisecond count.
    pub fn from_millis(total: u64) -> Self {
        Self {
            phases: Phases { total },
        }
    }

    /// Timing measured from `start` until now.
    pub fn since(start: Instant) -> Self {
        Self::from_duration(start.elapsed())
    }

    /// Timing from a measured duration.
    pub fn from_duration(elapsed: Duration) -> Self {
        Self::from_millis(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
    }

    /// Total as a [`Duration`].
    pub fn total(&self) -> Duration {
        Duration::from_millis(self.phases.total)
    }
}
