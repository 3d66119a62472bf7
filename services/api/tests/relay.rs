mod common;

use api_lib::web::relay::MISSING_KEY_MESSAGE;
use axum::http::StatusCode;
use common::{test_config, FakeCallProvider, FakeMailer, TestAppBuilder};
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn create_call_without_agent_id_is_rejected() {
    let provider = Arc::new(FakeCallProvider::ok(json!({"joinUrl": "wss://x"})));
    let app = TestAppBuilder::new().call_provider(provider.clone()).build().await;

    let (status, body) = app.request("POST", "/api/create-call", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "agentId is required");

    let (status, _) = app
        .request("POST", "/api/create-call", Some(json!({"agentId": "  "})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(provider.agent_ids.lock().unwrap().is_empty());
}

#[tokio::test]
async fn create_call_without_key_reports_configuration_error() {
    let app = TestAppBuilder::new().build().await;

    let (status, body) = app
        .request("POST", "/api/create-call", Some(json!({"agentId": "agent-1"})))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], MISSING_KEY_MESSAGE);
}

#[tokio::test]
async fn create_call_passes_provider_body_through() {
    let upstream = json!({
        "callId": "c-42",
        "joinUrl": "wss://voice.example/join/c-42",
        "created": "2024-05-01T10:00:00Z",
        "extra": {"nested": [1, 2, 3]}
    });
    let provider = Arc::new(FakeCallProvider::ok(upstream.clone()));
    let app = TestAppBuilder::new().call_provider(provider.clone()).build().await;

    let (status, body) = app
        .request("POST", "/api/create-call", Some(json!({"agentId": "agent-1"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, upstream);
    assert_eq!(*provider.agent_ids.lock().unwrap(), vec!["agent-1".to_string()]);
}

#[tokio::test]
async fn create_call_accepts_a_numeric_agent_id() {
    let provider = Arc::new(FakeCallProvider::ok(json!({"joinUrl": "wss://x"})));
    let app = TestAppBuilder::new().call_provider(provider.clone()).build().await;

    let (status, _) = app
        .request("POST", "/api/create-call", Some(json!({"agentId": 42})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(*provider.agent_ids.lock().unwrap(), vec!["42".to_string()]);

    let (status, _) = app
        .request("POST", "/api/create-call", Some(json!({"agentId": 0})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_call_keeps_upstream_status_and_details() {
    let provider = Arc::new(FakeCallProvider::upstream_error(403, r#"{"detail":"Invalid API key"}"#));
    let app = TestAppBuilder::new().call_provider(provider).build().await;

    let (status, body) = app
        .request("POST", "/api/create-call", Some(json!({"agentId": "agent-1"})))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Failed to create call");
    assert_eq!(body["details"]["detail"], "Invalid API key");
    assert_eq!(body["status"], 403);
}

#[tokio::test]
async fn relays_answer_other_methods_with_405() {
    let app = TestAppBuilder::new().build().await;

    let (status, body) = app.request("GET", "/api/create-call", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["error"], "Method not allowed");

    let (status, _) = app.request("PUT", "/api/send-notification", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn send_notification_validates_type() {
    let mailer = Arc::new(FakeMailer::default());
    let app = TestAppBuilder::new().mailer(mailer.clone()).build().await;

    let (status, body) = app
        .request("POST", "/api/send-notification", Some(json!({"data": {}})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Notification type is required");

    let (status, body) = app
        .request(
            "POST",
            "/api/send-notification",
            Some(json!({"type": "task_deleted", "data": {}})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid notification type");
    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn send_notification_mails_the_staff_list() {
    let mailer = Arc::new(FakeMailer::default());
    let config = test_config(&[
        ("NOTIFY_RECIPIENTS", "a@example.com, b@example.com"),
        ("MAIL_FROM", "Panel <panel@example.com>"),
    ]);
    let app = TestAppBuilder::new()
        .config(config)
        .mailer(mailer.clone())
        .build()
        .await;

    let (status, body) = app
        .request(
            "POST",
            "/api/send-notification",
            Some(json!({"type": "task_created", "data": {"text": "Llamar al deudor", "category": "mc2"}})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "emailId": "email-1"}));

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].from, "Panel <panel@example.com>");
    assert_eq!(sent[0].to, vec!["a@example.com", "b@example.com"]);
    assert!(sent[0].html.contains("Llamar al deudor"));
}

#[tokio::test]
async fn send_notification_reports_provider_failure() {
    let mailer = Arc::new(FakeMailer::default());
    mailer.fail.store(true, std::sync::atomic::Ordering::SeqCst);
    let app = TestAppBuilder::new().mailer(mailer).build().await;

    let (status, body) = app
        .request(
            "POST",
            "/api/send-notification",
            Some(json!({"type": "feedback_created", "data": {"text": "Hola"}})),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to send notification");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn send_notification_without_key_reports_configuration_error() {
    let app = TestAppBuilder::new().build().await;
    let (status, body) = app
        .request(
            "POST",
            "/api/send-notification",
            Some(json!({"type": "task_created", "data": {}})),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], MISSING_KEY_MESSAGE);
}
