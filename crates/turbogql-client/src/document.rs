//! Parsed GraphQL documents.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use apollo_parser::{Parser, cst};

use crate::error::DocumentError;
use crate::operation::OperationKind;

/// Introspection query used by [`GraphqlClient::health`](crate::GraphqlClient::health).
pub const HEALTH_QUERY: &str = "{__schema {types {name}}}";

/// A validated GraphQL document.
///
/// The source is parsed once on construction. Syntax errors and documents
/// without an executable operation are rejected, so every `Document` held by
/// the client can be sent as-is.
#[derive(Clone, PartialEq, Eq)]
pub struct Document {
    source: Arc<str>,
    operation_kind: Option<OperationKind>,
    operation_name: Option<String>,
}

impl Document {
    /// Parse a GraphQL document.
    pub fn parse(source: impl AsRef<str>) -> Result<Self, DocumentError> {
        let source = source.as_ref();
        if source.trim().is_empty() {
            return Err(DocumentError::Missing);
        }

        let tree = Parser::new(source).parse();
        let errors: Vec<String> = tree
            .errors()
            .map(|err| format!("{} at {}", err.message(), err.index()))
            .collect();
        if !errors.is_empty() {
            return Err(DocumentError::Syntax(errors));
        }

        let operation = tree
            .document()
            .definitions()
            .find_map(|definition| match definition {
                cst::Definition::OperationDefinition(operation) => Some(operation),
                _ => None,
            })
            .ok_or(DocumentError::NoOperation)?;

        let operation_kind = match operation.operation_type() {
            None => Some(OperationKind::Query),
            Some(ty) if ty.query_token().is_some() => Some(OperationKind::Query),
            Some(ty) if ty.mutation_token().is_some() => Some(OperationKind::Mutation),
            Some(_) => None,
        };
        let operation_name = operation.name().map(|name| name.text().to_string());

        Ok(Self {
            source: Arc::from(source),
            operation_kind,
            operation_name,
        })
    }

    /// The default health check document.
    pub fn health() -> Self {
        Self {
            source: Arc::from(HEALTH_QUERY),
            operation_kind: Some(OperationKind::Query),
            operation_name: None,
        }
    }

    /// Document source text.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Name of the first operation definition, if it has one.
    pub fn operation_name(&self) -> Option<&str> {
        self.operation_name.as_deref()
    }

    /// Kind of the first operation definition (`None` for subscriptions).
    pub fn operation_kind(&self) -> Option<OperationKind> {
        self.operation_kind
    }
}

impl FromStr for Document {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("operation_kind", &self.operation_kind)
            .field("operation_name", &self.operation_name)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_query() {
        let doc = Document::parse("query DoFoo { foo }").unwrap();
        assert_eq!(doc.operation_name(), Some("DoFoo"));
        assert_eq!(doc.operation_kind(), Some(OperationKind::Query));
        assert_eq!(doc.as_str(), "query DoFoo { foo }");
    }

    #[test]
    fn test_named_mutation() {
        let doc: Document = "mutation DoBar { foo }".parse().unwrap();
        assert_eq!(doc.operation_name(), Some("DoBar"));
        assert_eq!(doc.operation_kind(), Some(OperationKind::Mutation));
    }

    #[test]
    fn test_anonymous_shorthand() {
        let doc = Document::parse("{ foo }").unwrap();
        assert_eq!(doc.operation_name(), None);
        assert_eq!(doc.operation_kind(), Some(OperationKind::Query));
    }

    #[test]
    fn test_first_operation_after_fragment() {
        let doc = Document::parse(
            "fragment Fields on Foo { bar }\nquery WithFragment { foo { ...Fields } }",
        )
        .unwrap();
        assert_eq!(doc.operation_name(), Some("WithFragment"));
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(Document::parse("  \n"), Err(DocumentError::Missing));
    }

    #[test]
    fn test_syntax_error() {
        assert!(matches!(
            Document::parse("query { foo "),
            Err(DocumentError::Syntax(_))
        ));
    }

    #[test]
    fn test_schema_only_document() {
        assert_eq!(
            Document::parse("type Query { foo: String }"),
            Err(DocumentError::NoOperation)
        );
    }

    #[test]
    fn test_health_document_parses() {
        assert_eq!(Document::parse(HEALTH_QUERY).unwrap(), Document::health());
    }
}
