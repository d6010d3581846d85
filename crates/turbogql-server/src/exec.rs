//! Execute an operation against a schema with argument checks and logging.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::{Instrument, debug, error, info, info_span};
use turbogql_client::{BoxError, GraphqlError, GraphqlResponse, JsonMap};

/// The GraphQL execution engine behind a schema.
///
/// Implemented by adapters over an actual engine; this crate only calls it.
#[async_trait]
pub trait SchemaExecutor: Send + Sync {
    /// Execute one operation.
    async fn execute(&self, request: &ExecRequest) -> Result<GraphqlResponse, BoxError>;
}

/// Errors returned by [`exec`].
#[derive(Debug, Error)]
pub enum ExecError {
    /// A required argument was missing or empty.
    #[error("Missing argument {0}")]
    MissingArgument(&'static str),

    /// The response carried GraphQL errors.
    #[error("GraphQL Errors: {}", errors_json(.errors))]
    GraphqlErrors {
        /// Errors from the response.
        errors: Vec<GraphqlError>,
    },

    /// The executor failed.
    #[error("{0}")]
    Execution(#[source] BoxError),
}

/// Result type for [`exec`].
pub type ExecResult<T> = Result<T, ExecError>;

fn errors_json(errors: &[GraphqlError]) -> String {
    serde_json::to_string(errors).unwrap_or_else(|_| {
        errors
            .iter()
            .map(|err| err.message.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    })
}

/// One operation to execute.
#[derive(Clone)]
pub struct ExecRequest {
    /// Executor for the target schema.
    pub schema: Option<Arc<dyn SchemaExecutor>>,
    /// Document source.
    pub query: String,
    /// Operation to run.
    pub operation_name: String,
    /// Root value passed to resolvers.
    pub root: Option<Value>,
    /// Context passed to resolvers.
    pub context: JsonMap,
    /// Variables.
    pub variables: JsonMap,
    /// Turn GraphQL errors in the response into [`ExecError::GraphqlErrors`].
    pub throw_gql_errors: bool,
}

impl Default for ExecRequest {
    fn default() -> Self {
        Self {
            schema: None,
            query: String::new(),
            operation_name: String::new(),
            root: None,
            context: JsonMap::new(),
            variables: JsonMap::new(),
            throw_gql_errors: true,
        }
    }
}

impl ExecRequest {
    /// Request against `schema`.
    pub fn new(schema: Arc<dyn SchemaExecutor>) -> Self {
        Self {
            schema: Some(schema),
            ..Self::default()
        }
    }

    /// Set the document.
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    /// Set the operation name.
    #[must_use]
    pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = name.into();
        self
    }

    /// Set the root value.
    #[must_use]
    pub fn with_root(mut self, root: Value) -> Self {
        self.root = Some(root);
        self
    }

    /// Set the context.
    #[must_use]
    pub fn with_context(mut self, context: JsonMap) -> Self {
        self.context = context;
        self
    }

    /// Set the variables.
    #[must_use]
    pub fn with_variables(mut self, variables: JsonMap) -> Self {
        self.variables = variables;
        self
    }

    /// Return responses with GraphQL errors instead of failing.
    #[must_use]
    pub fn allow_gql_errors(mut self) -> Self {
        self.throw_gql_errors = false;
        self
    }
}

impl fmt::Debug for ExecRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecRequest")
            .field("schema", &self.schema.is_some())
            .field("query", &self.query)
            .field("operation_name", &self.operation_name)
            .field("variables", &self.variables)
            .field("throw_gql_errors", &self.throw_gql_errors)
            .finish_non_exhaustive()
    }
}

/// Execute `request` against its schema.
///
/// `schema`, `operation_name` and `query` are required, checked in that
/// order. Logs `"GraphQL <operation>: Start"` and the result.
///
/// # Errors
///
/// [`ExecError::MissingArgument`] before anything runs, the executor's own
/// failure, or [`ExecError::GraphqlErrors`] when `throw_gql_errors` is set.
pub async fn exec(request: ExecRequest) -> ExecResult<GraphqlResponse> {
    let Some(schema) = request.schema.clone() else {
        return Err(ExecError::MissingArgument("schema"));
    };
    if request.operation_name.trim().is_empty() {
        return Err(ExecError::MissingArgument("operationName"));
    }
    if request.query.trim().is_empty() {
        return Err(ExecError::MissingArgument("query"));
    }

    let operation_name = request.operation_name.clone();
    let name = format!("GraphQL {operation_name}");
    let span = info_span!("graphql_exec", is_graphql = true, operation_name = %operation_name);

    async {
        info!("{}: Start", name);
        let result = match schema.execute(&request).await {
            Ok(response) => check_for_errors(response, request.throw_gql_errors),
            Err(err) => Err(ExecError::Execution(err)),
        };
        match result {
            Ok(response) => {
                debug!(data = ?response.data, "{}: Success", name);
                Ok(response)
            }
            Err(err) => {
                error!(err = %err, "{}: Fail", operation_name);
                Err(err)
            }
        }
    }
    .instrument(span)
    .await
}

fn check_for_errors(response: GraphqlResponse, throw_gql_errors: bool) -> ExecResult<GraphqlResponse> {
    if throw_gql_errors && !response.errors.is_empty() {
        return Err(ExecError::GraphqlErrors {
            errors: response.errors,
        });
    }
    Ok(response)
}

/// Log a schema error and pass it through unchanged.
pub fn format_error(err: GraphqlError) -> GraphqlError {
    error!(err = ?err, "GraphQL: Schema Error");
    err
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graphql_errors_message() {
        let err = ExecError::GraphqlErrors {
            errors: vec![GraphqlError::new("boom")],
        };
        assert_eq!(err.to_string(), r#"GraphQL Errors: [{"message":"boom"}]"#);
    }

    #[test]
    fn test_check_for_errors() {
        let mut response = GraphqlResponse::default();
        response.errors.push(GraphqlError::new("boom"));
        assert!(check_for_errors(response.clone(), true).is_err());
        assert!(check_for_errors(response, false).is_ok());
        assert!(check_for_errors(GraphqlResponse::default(), true).is_ok());
    }

    #[test]
    fn test_format_error_passthrough() {
        let err = GraphqlError::new("Cannot query field");
        assert_eq!(format_error(err.clone()), err);
    }
}
