//! End-to-end tests of the client over the HTTP transport.

use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use serde_json::json;
use turbogql_client::{
    Document, GraphqlClient, GraphqlClientError, GraphqlRequest, OperationKind, RequestOptions,
    RetryConfig,
};
use wiremock::matchers::{body_json, body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GQL_PATH: &str = "/graphql";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn do_foo() -> Document {
    Document::parse("query DoFoo { foo }").unwrap()
}

fn client(server: &MockServer, retry: RetryConfig) -> GraphqlClient {
    GraphqlClient::builder()
        .with_origin(server.uri())
        .with_path(GQL_PATH)
        .with_req_id("req-id")
        .with_req_id_header("x-r-id")
        .with_req_name_header("x-r-name")
        .with_retry(retry)
        .build()
        .unwrap()
}

fn fast_retry(retries: u32) -> RetryConfig {
    RetryConfig::new(retries)
        .with_min_timeout(Duration::from_millis(5))
        .with_randomize(false)
}

fn ok_body() -> serde_json::Value {
    json!({ "data": { "foo": "hello" } })
}

#[tokio::test]
async fn test_query_returns_data() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GQL_PATH))
        .and(body_partial_json(json!({ "operationName": "DoFoo" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
        .expect(1)
        .mount(&server)
        .await;

    let response = client(&server, RetryConfig::disabled())
        .query(do_foo())
        .await
        .unwrap();

    assert_eq!(response.data, Some(json!({ "foo": "hello" })));
    assert!(response.timings.is_some());
}

#[tokio::test]
async fn test_single_argument_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GQL_PATH))
        .and(body_partial_json(json!({ "variables": { "id": 7 } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
        .expect(1)
        .mount(&server)
        .await;

    let request = GraphqlRequest::new(do_foo()).with_options(RequestOptions::new().variable("id", 7));
    let response = client(&server, RetryConfig::disabled())
        .query(request)
        .await
        .unwrap();

    assert_eq!(response.data, Some(json!({ "foo": "hello" })));
}

#[tokio::test]
async fn test_json_request_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GQL_PATH))
        .and(header("x-r-name", "Query Renamed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
        .expect(1)
        .mount(&server)
        .await;

    client(&server, RetryConfig::disabled())
        .execute_json(
            OperationKind::Query,
            json!({ "query": "query DoFoo { foo }", "name": "Renamed" }),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_status_error_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GQL_PATH))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server, RetryConfig::disabled())
        .query(do_foo())
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Response not successful: Received status code 500"
    );
    assert_eq!(err.status_code(), Some(500));
    assert!(err.timings().is_some());
}

#[tokio::test]
async fn test_retries_after_server_error() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GQL_PATH))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(GQL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
        .expect(1)
        .mount(&server)
        .await;

    let response = client(&server, fast_retry(2)).query(do_foo()).await.unwrap();
    assert_eq!(response.data, Some(json!({ "foo": "hello" })));
}

#[tokio::test]
async fn test_retry_waits_min_backoff() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GQL_PATH))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(GQL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
        .expect(1)
        .mount(&server)
        .await;

    let retry = RetryConfig::new(1)
        .with_min_timeout(Duration::from_millis(200))
        .with_randomize(false);
    let start = Instant::now();
    let response = client(&server, retry).query(do_foo()).await.unwrap();

    assert_eq!(response.data, Some(json!({ "foo": "hello" })));
    assert!(start.elapsed() >= Duration::from_millis(200));
}

#[tokio::test]
async fn test_gives_up_after_retries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GQL_PATH))
        .respond_with(ResponseTemplate::new(502))
        .expect(3)
        .mount(&server)
        .await;

    let err = client(&server, fast_retry(2)).query(do_foo()).await.unwrap_err();
    assert_eq!(err.status_code(), Some(502));
}

#[tokio::test]
async fn test_client_error_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GQL_PATH))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server, fast_retry(3)).query(do_foo()).await.unwrap_err();
    assert_eq!(err.status_code(), Some(400));
}

#[tokio::test]
async fn test_retry_after_header_delays_next_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GQL_PATH))
        .respond_with(ResponseTemplate::new(503).insert_header("retry-after", "1"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(GQL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
        .expect(1)
        .mount(&server)
        .await;

    let retry = RetryConfig::new(1)
        .with_min_timeout(Duration::from_millis(500))
        .with_randomize(false);
    let start = Instant::now();
    client(&server, retry).query(do_foo()).await.unwrap();

    // 500 ms of backoff plus (1000 - 500) ms requested by the header.
    assert!(start.elapsed() >= Duration::from_millis(1000));
}

#[tokio::test]
async fn test_request_id_and_name_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GQL_PATH))
        .and(header("x-r-id", "req-id"))
        .and(header("x-r-name", "Query DoFoo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
        .expect(1)
        .mount(&server)
        .await;

    client(&server, RetryConfig::disabled())
        .query(do_foo())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_custom_name() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GQL_PATH))
        .and(header("x-r-name", "Query CustomName"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
        .expect(1)
        .mount(&server)
        .await;

    client(&server, RetryConfig::disabled())
        .query((do_foo(), RequestOptions::new().name("CustomName")))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_mutate() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GQL_PATH))
        .and(header("x-r-name", "Mutation DoBar"))
        .and(body_partial_json(json!({ "query": "mutation DoBar { foo }" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
        .expect(1)
        .mount(&server)
        .await;

    let mutation = Document::parse("mutation DoBar { foo }").unwrap();
    let response = client(&server, RetryConfig::disabled())
        .mutate(mutation)
        .await
        .unwrap();
    assert_eq!(response.data, Some(json!({ "foo": "hello" })));
}

#[tokio::test]
async fn test_graphql_errors_fail_the_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GQL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": null,
            "errors": [{ "message": "Cannot query field \"bar\"" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server, fast_retry(3)).query(do_foo()).await.unwrap_err();
    let GraphqlClientError::GraphqlErrors { errors, timings } = err else {
        panic!("expected GraphQL errors");
    };
    assert_eq!(errors[0].message, "Cannot query field \"bar\"");
    assert!(timings.is_some());
}

#[tokio::test]
async fn test_bearer_token_and_default_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api"))
        .and(header("authorization", "Bearer token"))
        .and(header("x-team", "core"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = GraphqlClient::builder()
        .with_origin(server.uri())
        .with_path("/api")
        .with_token("token")
        .with_header("x-team", "core")
        .with_retry(0)
        .build()
        .unwrap();
    client.query(do_foo()).await.unwrap();
}

#[tokio::test]
async fn test_health() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GQL_PATH))
        .and(header("x-r-name", "Query Health"))
        .and(body_partial_json(json!({ "query": "{__schema {types {name}}}" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "__schema": { "types": [] } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client(&server, RetryConfig::disabled()).health().await.unwrap());
}

#[tokio::test]
async fn test_health_body_has_no_operation_name() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GQL_PATH))
        .and(body_json(json!({ "query": "{__schema {types {name}}}", "variables": {} })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "__schema": { "types": [] } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client(&server, RetryConfig::disabled()).health().await.unwrap());
}

#[tokio::test]
async fn test_custom_name_sends_document_operation_name() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GQL_PATH))
        .and(header("x-r-name", "Query MyOperation"))
        .and(body_json(json!({
            "query": "query DoFoo { foo }",
            "variables": {},
            "operationName": "DoFoo"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
        .expect(1)
        .mount(&server)
        .await;

    client(&server, RetryConfig::disabled())
        .query((do_foo(), RequestOptions::new().name("MyOperation")))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_panicking_extractor_does_not_fail_call() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GQL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": null })))
        .expect(1)
        .mount(&server)
        .await;

    let options = RequestOptions::new()
        .get_log_response_props(|response| Ok(response.data.clone().unwrap()["x"].clone()));
    let response = client(&server, RetryConfig::disabled())
        .query((do_foo(), options))
        .await
        .unwrap();
    assert_eq!(response.data, None);
}

#[tokio::test]
async fn test_unhealthy() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GQL_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client(&server, RetryConfig::disabled()).health().await.unwrap_err();
    assert_eq!(err.status_code(), Some(500));
}

#[tokio::test]
async fn test_connection_refused_code() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let client = GraphqlClient::builder()
        .with_origin(format!("http://127.0.0.1:{port}"))
        .with_retry(0)
        .build()
        .unwrap();
    let err = client.query(do_foo()).await.unwrap_err();

    let network = err.network_error().expect("network error");
    assert_eq!(network.code.as_deref(), Some("ECONNREFUSED"));
    assert_eq!(network.status_code, None);
}
