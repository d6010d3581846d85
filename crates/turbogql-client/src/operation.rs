//! Operations and the two accepted request-argument forms.

use std::fmt;

use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::Document;
use crate::error::DocumentError;
use crate::options::{JsonMap, LogLevel, RequestOptions};
use crate::retry::RetryConfig;

/// Query or mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// `query`
    Query,
    /// `mutation`
    Mutation,
}

impl OperationKind {
    /// Client method name: `query` or `mutate`.
    pub fn verb(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Mutation => "mutate",
        }
    }

    /// Key holding the document in a single-object request: `query` or `mutation`.
    pub fn noun(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Mutation => "mutation",
        }
    }

    /// Capitalised label used in resource names.
    pub fn label(self) -> &'static str {
        match self {
            Self::Query => "Query",
            Self::Mutation => "Mutation",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.noun())
    }
}

/// Single-object request: a document plus inline options.
#[derive(Debug, Clone)]
pub struct GraphqlRequest {
    /// The document.
    pub document: Document,
    /// Inline options.
    pub options: RequestOptions,
}

impl GraphqlRequest {
    /// Request with default options.
    pub fn new(document: Document) -> Self {
        Self {
            document,
            options: RequestOptions::default(),
        }
    }

    /// Replace the inline options.
    #[must_use]
    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }
}

/// Arguments accepted by [`GraphqlClient::query`](crate::GraphqlClient::query)
/// and [`GraphqlClient::mutate`](crate::GraphqlClient::mutate).
#[derive(Debug, Clone)]
pub enum RequestArgs {
    /// One object carrying the document and its options.
    SingleArg(GraphqlRequest),
    /// A document followed by separate options.
    DocumentWithOptions(Document, RequestOptions),
}

impl From<Document> for RequestArgs {
    fn from(document: Document) -> Self {
        Self::DocumentWithOptions(document, RequestOptions::default())
    }
}

impl From<(Document, RequestOptions)> for RequestArgs {
    fn from((document, options): (Document, RequestOptions)) -> Self {
        Self::DocumentWithOptions(document, options)
    }
}

impl From<GraphqlRequest> for RequestArgs {
    fn from(request: GraphqlRequest) -> Self {
        Self::SingleArg(request)
    }
}

/// Inline options as they appear in a JSON request object.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct InlineOptions {
    name: Option<String>,
    variables: JsonMap,
    headers: std::collections::HashMap<String, String>,
    retry: Option<crate::config::RetrySetting>,
    response_log_level: Option<LogLevel>,
    will_log_options: Option<bool>,
    will_log_response_props: Option<bool>,
    will_log_response_data: Option<bool>,
    meta: JsonMap,
}

impl InlineOptions {
    fn into_options(self) -> RequestOptions {
        let mut options = RequestOptions {
            name: self.name,
            variables: self.variables,
            retry: self.retry.map(RetryConfig::from),
            response_log_level: self.response_log_level,
            will_log_options: self.will_log_options,
            will_log_response_props: self.will_log_response_props,
            will_log_response_data: self.will_log_response_data,
            meta: self.meta,
            ..RequestOptions::default()
        };
        for (name, value) in &self.headers {
            options = options.header(name, value);
        }
        options
    }
}

impl RequestArgs {
    /// Parse a JSON-shaped request.
    ///
    /// An object with a `query` (or `mutation`) key is the single-object
    /// form; its other keys are inline options. A string is a bare document.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Missing`] when no document is present, a
    /// parse error from [`Document::parse`], or
    /// [`DocumentError::InvalidOptions`] for malformed inline options.
    pub fn from_json(kind: OperationKind, value: Value) -> Result<Self, DocumentError> {
        match value {
            Value::String(source) => Ok(Document::parse(source)?.into()),
            Value::Object(mut object) => {
                let source = match object.remove(kind.noun()) {
                    Some(Value::String(source)) => source,
                    _ => return Err(DocumentError::Missing),
                };
                let document = Document::parse(source)?;
                let inline: InlineOptions = serde_json::from_value(Value::Object(object))
                    .map_err(|err| DocumentError::InvalidOptions(err.to_string()))?;
                Ok(Self::SingleArg(
                    GraphqlRequest::new(document).with_options(inline.into_options()),
                ))
            }
            _ => Err(DocumentError::Missing),
        }
    }

    /// Resolve either form into the operation and its call options.
    pub(crate) fn normalize(self, kind: OperationKind) -> (Operation, RequestOptions) {
        let (document, options) = match self {
            Self::SingleArg(request) => (request.document, request.options),
            Self::DocumentWithOptions(document, options) => (document, options),
        };
        let name = options
            .name
            .clone()
            .or_else(|| document.operation_name().map(str::to_owned));
        let operation = Operation {
            kind,
            document,
            name,
            variables: options.variables.clone(),
            headers: options.headers.clone(),
        };
        (operation, options)
    }
}

/// The operation a single call executes.
#[derive(Debug, Clone)]
pub struct Operation {
    /// Query or mutation.
    pub kind: OperationKind,
    /// The document.
    pub document: Document,
    /// Explicit name, else the document's first operation name.
    pub name: Option<String>,
    /// Variables.
    pub variables: JsonMap,
    /// Caller headers.
    pub headers: HeaderMap,
}

impl Operation {
    /// `"<Label> <name>"`, or just the label for anonymous operations.
    pub fn resource_name(&self) -> String {
        match &self.name {
            Some(name) => format!("{} {}", self.kind.label(), name),
            None => self.kind.label().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(source: &str) -> Document {
        Document::parse(source).unwrap()
    }

    #[test]
    fn test_kind_words() {
        assert_eq!(OperationKind::Query.verb(), "query");
        assert_eq!(OperationKind::Mutation.verb(), "mutate");
        assert_eq!(OperationKind::Mutation.noun(), "mutation");
        assert_eq!(OperationKind::Mutation.label(), "Mutation");
    }

    #[test]
    fn test_name_from_document() {
        let (op, _) = RequestArgs::from(doc("query DoFoo { foo }")).normalize(OperationKind::Query);
        assert_eq!(op.name.as_deref(), Some("DoFoo"));
        assert_eq!(op.resource_name(), "Query DoFoo");
    }

    #[test]
    fn test_explicit_name_wins() {
        let args = RequestArgs::from((doc("query DoFoo { foo }"), RequestOptions::new().name("Bar")));
        let (op, _) = args.normalize(OperationKind::Query);
        assert_eq!(op.resource_name(), "Query Bar");
    }

    #[test]
    fn test_anonymous_resource_name() {
        let (op, _) = RequestArgs::from(doc("{ foo }")).normalize(OperationKind::Mutation);
        assert_eq!(op.name, None);
        assert_eq!(op.resource_name(), "Mutation");
    }

    #[test]
    fn test_forms_normalize_identically() {
        let options = RequestOptions::new().variable("id", 7).header("x-a", "1");
        let single = RequestArgs::from(
            GraphqlRequest::new(doc("query A { foo }")).with_options(options.clone()),
        )
        .normalize(OperationKind::Query);
        let pair = RequestArgs::from((doc("query A { foo }"), options)).normalize(OperationKind::Query);

        assert_eq!(single.0.name, pair.0.name);
        assert_eq!(single.0.variables, pair.0.variables);
        assert_eq!(single.0.headers, pair.0.headers);
        assert_eq!(single.0.document, pair.0.document);
    }

    #[test]
    fn test_from_json_single_arg() {
        let args = RequestArgs::from_json(
            OperationKind::Mutation,
            json!({
                "mutation": "mutation DoBar { foo }",
                "variables": { "x": 1 },
                "headers": { "x-tenant": "acme" },
                "retry": 2
            }),
        )
        .unwrap();
        let (op, options) = args.normalize(OperationKind::Mutation);
        assert_eq!(op.name.as_deref(), Some("DoBar"));
        assert_eq!(op.variables.get("x"), Some(&json!(1)));
        assert_eq!(op.headers["x-tenant"], "acme");
        assert_eq!(options.retry.map(|r| r.retries), Some(2));
    }

    #[test]
    fn test_from_json_bare_string() {
        let args = RequestArgs::from_json(OperationKind::Query, json!("query Q { foo }")).unwrap();
        assert!(matches!(args, RequestArgs::DocumentWithOptions(..)));
    }

    #[test]
    fn test_from_json_missing_document() {
        assert_eq!(
            RequestArgs::from_json(OperationKind::Query, json!({ "variables": {} })).unwrap_err(),
            DocumentError::Missing
        );
        assert_eq!(
            RequestArgs::from_json(OperationKind::Query, Value::Null).unwrap_err(),
            DocumentError::Missing
        );
        // A mutation document under the wrong key is not found.
        assert_eq!(
            RequestArgs::from_json(OperationKind::Mutation, json!({ "query": "{ foo }" })).unwrap_err(),
            DocumentError::Missing
        );
    }

    #[test]
    fn test_from_json_invalid_options() {
        let err = RequestArgs::from_json(
            OperationKind::Query,
            json!({ "query": "query Q { foo }", "retry": "x" }),
        )
        .unwrap_err();
        assert!(matches!(err, DocumentError::InvalidOptions(_)), "{err:?}");
        assert!(err.to_string().starts_with("Invalid request options: "));
    }
}
