//! Integration tests for fetch-adapter using mockito

use fetch_adapter::{
    BasicAuth, Environment, ErrorCode, FetchAdapter, FormData, RequestConfig, ResponseData,
    ResponseType, UrlSearchParams, ValidateStatus, Value,
};
use futures::TryStreamExt;
use mockito::Matcher;

fn adapter() -> FetchAdapter {
    FetchAdapter::builder()
        .environment(Environment::non_browser())
        .build()
}

// === Request translation ===

#[tokio::test]
async fn test_get_with_params() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("GET", "/api/users")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("page".into(), "2".into()),
            Matcher::UrlEncoded("tags[]".into(), "a".into()),
        ]))
        .with_status(200)
        .with_body("ok")
        .create_async()
        .await;

    let response = adapter()
        .request(
            RequestConfig::get("/api/users")
                .base_url(server.url())
                .params(Value::object([
                    ("page", Value::from(2)),
                    ("tags", Value::array(["a"])),
                    ("skipped", Value::Null),
                ])),
        )
        .await
        .expect("Request should succeed");

    assert_eq!(response.status, 200);
    assert_eq!(response.data.as_text(), Some("ok"));

    mock.assert_async().await;
}

#[tokio::test]
async fn test_post_json_body() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/api/submit")
        .match_header("content-type", "application/json")
        .match_body(r#"{"name":"test","value":42}"#)
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success": true}"#)
        .create_async()
        .await;

    let url = format!("{}/api/submit", server.url());
    let response = adapter()
        .request(
            RequestConfig::post(
                url,
                Value::object([("name", Value::from("test")), ("value", Value::from(42))]),
            )
            .response_type(ResponseType::Json),
        )
        .await
        .expect("Request should succeed");

    assert_eq!(response.status, 201);
    assert_eq!(
        response.data.as_json(),
        Some(&serde_json::json!({"success": true}))
    );

    mock.assert_async().await;
}

#[tokio::test]
async fn test_post_search_params() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/api/form")
        .match_header(
            "content-type",
            "application/x-www-form-urlencoded;charset=UTF-8",
        )
        .match_body("name=test+user&value=42")
        .with_status(200)
        .create_async()
        .await;

    let params: UrlSearchParams = [("name", "test user"), ("value", "42")].into_iter().collect();
    let url = format!("{}/api/form", server.url());
    adapter()
        .request(RequestConfig::post(url, params))
        .await
        .expect("Request should succeed");

    mock.assert_async().await;
}

#[tokio::test]
async fn test_multipart_body() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("PUT", "/upload")
        .match_header(
            "content-type",
            Matcher::Regex("^multipart/form-data; boundary=.+".into()),
        )
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#"name="title""#.into()),
            Matcher::Regex(r#"filename="notes.txt""#.into()),
            Matcher::Regex("hello file".into()),
        ]))
        .with_status(204)
        .create_async()
        .await;

    let mut form = FormData::new();
    form.append("title", "notes");
    form.append_file("file", "notes.txt", Some("text/plain"), b"hello file".to_vec());

    let url = format!("{}/upload", server.url());
    let response = adapter()
        .request(RequestConfig::new("put", url).data(form))
        .await
        .expect("Request should succeed");

    assert!(response.data.is_empty());

    mock.assert_async().await;
}

#[tokio::test]
async fn test_basic_auth_and_headers() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("GET", "/secure")
        .match_header("authorization", "Basic dXNlcjpwYXNz")
        .match_header("x-request-id", "7")
        .with_status(200)
        .create_async()
        .await;

    let url = format!("{}/secure", server.url());
    adapter()
        .request(
            RequestConfig::get(url)
                .header("X-Request-Id", 7)
                .auth(BasicAuth::new("user", "pass")),
        )
        .await
        .expect("Request should succeed");

    mock.assert_async().await;
}

// === Response translation ===

#[tokio::test]
async fn test_response_headers_and_status_text() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("GET", "/headers")
        .with_status(200)
        .with_header("x-custom", "value")
        .with_body("body")
        .create_async()
        .await;

    let url = format!("{}/headers", server.url());
    let response = adapter()
        .request(RequestConfig::get(url))
        .await
        .expect("Request should succeed");

    assert_eq!(response.status_text, "OK");
    assert_eq!(
        response.headers.get("x-custom").map(String::as_str),
        Some("value")
    );
    assert!(response.request.url().as_str().ends_with("/headers"));
}

#[tokio::test]
async fn test_array_buffer_and_blob() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("GET", "/bytes")
        .with_status(200)
        .with_header("content-type", "application/octet-stream")
        .with_body([1u8, 2, 3])
        .expect(2)
        .create_async()
        .await;

    let url = format!("{}/bytes", server.url());
    let response = adapter()
        .request(RequestConfig::get(&url).response_type(ResponseType::ArrayBuffer))
        .await
        .expect("Request should succeed");
    match response.data {
        ResponseData::ArrayBuffer(bytes) => assert_eq!(bytes, vec![1, 2, 3]),
        other => panic!("Expected array buffer, got {other:?}"),
    }

    let response = adapter()
        .request(RequestConfig::get(&url).response_type(ResponseType::Blob))
        .await
        .expect("Request should succeed");
    match response.data {
        ResponseData::Blob(blob) => {
            assert_eq!(blob.bytes, vec![1, 2, 3]);
            assert_eq!(blob.content_type, "application/octet-stream");
        }
        other => panic!("Expected blob, got {other:?}"),
    }
}

#[tokio::test]
async fn test_stream_response() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("GET", "/stream")
        .with_status(200)
        .with_body("streamed body")
        .create_async()
        .await;

    let url = format!("{}/stream", server.url());
    let response = adapter()
        .request(RequestConfig::get(url).response_type(ResponseType::Stream))
        .await
        .expect("Request should succeed");

    let ResponseData::Stream(stream) = response.data else {
        panic!("Expected stream");
    };
    let chunks: Vec<Vec<u8>> = stream.try_collect().await.expect("Readable stream");
    assert_eq!(chunks.concat(), b"streamed body");
}

#[tokio::test]
async fn test_malformed_json_rejects() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("GET", "/bad-json")
        .with_status(200)
        .with_body("not json")
        .create_async()
        .await;

    let url = format!("{}/bad-json", server.url());
    let error = adapter()
        .request(RequestConfig::get(url).response_type(ResponseType::Json))
        .await
        .expect_err("Malformed JSON should fail");

    assert_eq!(error.code(), None);
    assert!(error.request().is_some());
}

// === Settling ===

#[tokio::test]
async fn test_not_found_rejects_with_response() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("GET", "/missing")
        .with_status(404)
        .with_body("Not Found")
        .create_async()
        .await;

    let url = format!("{}/missing", server.url());
    let error = adapter()
        .request(RequestConfig::get(url))
        .await
        .expect_err("404 should be rejected");

    assert_eq!(error.message(), "Request failed with status code 404");
    assert_eq!(error.code(), Some(ErrorCode::BadRequest));
    assert_eq!(error.status(), Some(404));
    let response = error.into_response().expect("Response attached");
    assert_eq!(response.data.as_text(), Some("Not Found"));

    mock.assert_async().await;
}

#[tokio::test]
async fn test_server_error_accepted_without_validator() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("GET", "/flaky")
        .with_status(503)
        .with_body("Unavailable")
        .create_async()
        .await;

    let url = format!("{}/flaky", server.url());
    let response = adapter()
        .request(RequestConfig::get(&url).validate_status(None))
        .await
        .expect("Every status accepted");
    assert_eq!(response.status, 503);

    let error = adapter()
        .request(
            RequestConfig::get(&url)
                .validate_status(Some(ValidateStatus::new(|status| status < 500))),
        )
        .await
        .expect_err("Rejected by validator");
    assert_eq!(error.code(), Some(ErrorCode::BadResponse));
}

// === Failures ===

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    let error = adapter()
        .request(RequestConfig::get("http://127.0.0.1:1/unreachable").timeout(5_000))
        .await
        .expect_err("Connection should fail");

    assert_eq!(error.message(), "Network Error");
    assert_eq!(error.code(), Some(ErrorCode::Network));
    assert!(error.request().is_some());
    assert!(error.response().is_none());
}

#[tokio::test]
async fn test_invalid_part_type_is_bad_option() {
    let mut form = FormData::new();
    form.append_file("file", "a.bin", Some("not a mime"), b"data".to_vec());

    let error = adapter()
        .request(RequestConfig::post("http://127.0.0.1:1/upload", form))
        .await
        .expect_err("Part type should be rejected");

    assert_eq!(error.code(), Some(ErrorCode::BadOptionValue));
    assert_ne!(error.message(), "Network Error");
    assert!(error.message().contains("Invalid part type"));
    assert!(error.response().is_none());
}

#[tokio::test]
async fn test_invalid_url() {
    let error = adapter()
        .request(RequestConfig::get("/relative/without/base"))
        .await
        .expect_err("URL cannot be resolved");

    assert_eq!(error.code(), Some(ErrorCode::InvalidUrl));
    assert!(error.request().is_none());
    assert_eq!(error.to_json()["code"], "ERR_INVALID_URL");
}
