use nanogen::{
    CancellationToken, GenerationError, GenerationRequest, GenerationTaskClient, HttpTaskApi,
    NanoBananaConfig, PollOptions, TaskApi, TaskHandle,
};
use serde_json::json;
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "test-key";

fn fast_options() -> PollOptions {
    PollOptions::new()
        .with_warm_up_delay(Duration::from_millis(0))
        .with_poll_interval(Duration::from_millis(20))
        .with_max_wait_time(Duration::from_secs(5))
}

fn config_for(base_url: String) -> NanoBananaConfig {
    NanoBananaConfig::new()
        .with_api_key(API_KEY)
        .with_base_url(base_url)
}

fn client_for(server: &MockServer) -> GenerationTaskClient {
    GenerationTaskClient::new(config_for(server.uri())).unwrap()
}

fn status_body(flag: u8, extra: serde_json::Value) -> serde_json::Value {
    let mut data = json!({"taskId": "task-1", "successFlag": flag});
    if let (Some(data), Some(extra)) = (data.as_object_mut(), extra.as_object()) {
        for (k, v) in extra {
            data.insert(k.clone(), v.clone());
        }
    }
    json!({"code": 200, "msg": "success", "data": data})
}

async fn status_checks(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == "/record-info")
        .count()
}

#[tokio::test]
async fn test_submit_sends_wire_body_and_returns_task_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_json(json!({
            "prompt": "a fox in the snow",
            "type": "TEXTTOIAMGE",
            "numImages": 1
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "msg": "success",
            "data": {"taskId": "task-1"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = GenerationRequest::new("a fox in the snow").unwrap();
    let handle = client_for(&server).submit(&request).await.unwrap();
    assert_eq!(handle, TaskHandle::new("task-1"));
}

#[tokio::test]
async fn test_submit_non_200_code_surfaces_remote_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 402,
            "msg": "Insufficient credits, please top up"
        })))
        .mount(&server)
        .await;

    let request = GenerationRequest::new("a fox").unwrap();
    let err = client_for(&server).submit(&request).await.unwrap_err();
    match err {
        GenerationError::SubmissionError(msg) => {
            assert_eq!(msg, "Insufficient credits, please top up")
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_submit_without_body_uses_fallback_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
        .mount(&server)
        .await;

    let request = GenerationRequest::new("a fox").unwrap();
    let err = client_for(&server).submit(&request).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Submission error: Failed to submit image generation task"
    );
}

/// Answers one request with headers promising more body than it sends.
async fn truncated_body_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            let mut buf = vec![0u8; 8192];
            let _ = socket.read(&mut buf).await;
            let _ = socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 256\r\n\r\n{\"code\":200",
                )
                .await;
            let _ = socket.shutdown().await;
        }
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_submit_body_read_failure_keeps_transport_error() {
    let base_url = truncated_body_server().await;
    let client = GenerationTaskClient::new(config_for(base_url)).unwrap();

    let request = GenerationRequest::new("a fox").unwrap();
    let err = client.submit(&request).await.unwrap_err();
    match err {
        GenerationError::SubmissionError(msg) => {
            assert!(!msg.is_empty());
            assert_ne!(msg, "Failed to submit image generation task");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_generate_polls_until_completed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200, "msg": "success", "data": {"taskId": "task-1"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/record-info"))
        .and(query_param("taskId", "task-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body(0, json!({}))))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/record-info"))
        .and(query_param("taskId", "task-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body(
            1,
            json!({"response": {"resultImageUrls": ["https://cdn/fox-1.png", "https://cdn/fox-2.png"]}}),
        )))
        .mount(&server)
        .await;

    let request = GenerationRequest::new("a fox").unwrap();
    let image = client_for(&server)
        .generate(&request, &fast_options())
        .await
        .unwrap();

    assert_eq!(image.image_url, "https://cdn/fox-1.png");
    assert_eq!(image.prompt, "a fox");
    assert_eq!(status_checks(&server).await, 3);
}

#[tokio::test]
async fn test_generation_failure_stops_after_third_check() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/record-info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body(0, json!({}))))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/record-info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body(
            3,
            json!({"errorMessage": "Image violates content policy"}),
        )))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .poll(&TaskHandle::new("task-1"), &fast_options())
        .await
        .unwrap_err();

    match err {
        GenerationError::TaskFailed { reason, .. } => {
            assert_eq!(reason, "Image violates content policy")
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(status_checks(&server).await, 3);
}

#[tokio::test]
async fn test_not_found_until_budget_exhausted_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/record-info"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"msg": "record not found"})))
        .mount(&server)
        .await;

    let options = PollOptions::new()
        .with_warm_up_delay(Duration::from_millis(10))
        .with_poll_interval(Duration::from_millis(50))
        .with_max_wait_time(Duration::from_millis(300));

    let err = client_for(&server)
        .poll(&TaskHandle::new("task-1"), &options)
        .await
        .unwrap_err();

    assert!(matches!(err, GenerationError::Timeout { .. }));
    let checks = status_checks(&server).await;
    assert!((1..=7).contains(&checks), "unexpected check count {}", checks);
}

#[tokio::test]
async fn test_server_error_is_treated_as_pending() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/record-info"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/record-info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body(
            1,
            json!({"response": {"resultImageUrl": "https://cdn/after-500.png"}}),
        )))
        .mount(&server)
        .await;

    let asset = client_for(&server)
        .poll(&TaskHandle::new("task-1"), &fast_options())
        .await
        .unwrap();
    assert_eq!(asset.url, "https://cdn/after-500.png");
    assert_eq!(status_checks(&server).await, 3);
}

#[tokio::test]
async fn test_http_error_without_message_uses_status_text() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/record-info"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"code": 403})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/record-info"))
        .respond_with(ResponseTemplate::new(429).set_body_string(""))
        .mount(&server)
        .await;

    let api = HttpTaskApi::new(config_for(server.uri())).unwrap();

    let err = api.fetch_status("task-1").await.unwrap_err();
    assert!(err.is_transient());
    assert_eq!(
        err.to_string(),
        "Failed to check task status: HTTP 403: Forbidden"
    );

    let err = api.fetch_status("task-1").await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Failed to check task status: HTTP 429: Too Many Requests"
    );
}

#[tokio::test]
async fn test_cancellation_aborts_in_flight_status_check() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/record-info"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(status_body(0, json!({})))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let err = client_for(&server)
        .poll_with_cancel(&TaskHandle::new("task-1"), &fast_options(), &token)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        GenerationError::Cancelled { task_id: Some(ref id) } if id == "task-1"
    ));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_other_http_errors_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/record-info"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({"error": "slow down"})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/record-info"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/record-info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "successFlag": 1,
            "response": {"resultImageUrl": "https://cdn/flat.png"}
        })))
        .mount(&server)
        .await;

    let asset = client_for(&server)
        .poll(&TaskHandle::new("task-1"), &fast_options())
        .await
        .unwrap();
    assert_eq!(asset.url, "https://cdn/flat.png");
    assert_eq!(status_checks(&server).await, 3);
}

#[tokio::test]
async fn test_completed_without_urls_is_empty_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/record-info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body(
            1,
            json!({"response": {"resultImageUrls": []}}),
        )))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .poll(&TaskHandle::new("task-1"), &fast_options())
        .await
        .unwrap_err();
    assert!(matches!(err, GenerationError::EmptyResult(_)));
    assert_eq!(status_checks(&server).await, 1);
}

#[test]
fn test_missing_api_key_is_config_error() {
    let result = GenerationTaskClient::new(NanoBananaConfig::new());
    assert!(matches!(result, Err(GenerationError::ConfigError(_))));
}
