//! Error types for CLI operations

use thiserror::Error;
use turbogql_client::{DocumentError, GraphqlClientError};
use turbogql_telemetry::TelemetryError;

/// CLI errors
#[derive(Error, Debug)]
pub enum CliError {
    /// The request failed
    #[error(transparent)]
    Client(#[from] GraphqlClientError),

    /// The document could not be parsed
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Invalid command arguments
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// `--client` named a client the configuration does not define
    #[error("Unknown client '{0}'")]
    UnknownClient(String),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    /// Telemetry setup error
    #[error("Telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Hints for resolving the error
    pub fn suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::Client(err) if err.network_error().is_some_and(|n| n.status_code.is_none()) => vec![
                "Check that the server is running",
                "Verify --url and --path",
            ],
            Self::Document(_) => vec!["Pass a document with a named query or mutation"],
            Self::InvalidArguments(_) => vec!["Use --help to see expected arguments"],
            Self::UnknownClient(_) => vec!["Define the client under [clients.<name>] in --config"],
            _ => vec![],
        }
    }
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
