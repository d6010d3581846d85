//! The facade exposes a working client through its prelude.

use std::sync::Arc;

use serde_json::json;
use turbogql::prelude::*;
use turbogql::{GraphqlResponse, TransportError};

#[derive(Debug)]
struct Echo;

#[async_trait]
impl Transport for Echo {
    async fn query(&self, request: TransportRequest) -> Result<GraphqlResponse, TransportError> {
        Ok(GraphqlResponse::from_data(json!({
            "operation": request.operation_name,
        })))
    }

    async fn mutate(&self, _request: TransportRequest) -> Result<GraphqlResponse, TransportError> {
        Err(TransportError::new("read only"))
    }
}

#[tokio::test]
async fn test_prelude_client() {
    let client = GraphqlClient::builder()
        .with_name("facade")
        .with_shared_transport(Arc::new(Echo))
        .with_retry(0)
        .build()
        .unwrap();

    let response = client
        .query(Document::parse("query Hello { hello }").unwrap())
        .await
        .unwrap();
    assert_eq!(response.data, Some(json!({ "operation": "Hello" })));

    let err = client
        .mutate(Document::parse("mutation Bye { bye }").unwrap())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "read only");
}
