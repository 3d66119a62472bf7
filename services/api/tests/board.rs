mod common;

use api_lib::web::protocol::BoardEvent;
use axum::http::StatusCode;
use call_desk_core::domain::{Message, SenderRole, Task};
use chrono::Utc;
use common::{test_config, FakeMailer, MemoryDb, TestAppBuilder};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

fn message(text: &str) -> Message {
    Message {
        id: Uuid::new_v4(),
        sender: SenderRole::User,
        text: text.to_string(),
        author_name: Some("Ana".to_string()),
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn complete_then_restore_returns_task_to_pending() {
    let app = TestAppBuilder::new().build().await;

    let (status, task) = app
        .request(
            "POST",
            "/api/tasks",
            Some(json!({"text": "  Enviar guion  ", "category": "telvia"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(task["text"], "Enviar guion");
    assert_eq!(task["category"], "telvia");
    let id = task["id"].as_str().unwrap().to_string();

    let (status, done) = app
        .request("POST", &format!("/api/tasks/{}/complete", id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(done["completed_at"].is_string());

    let (_, pending) = app.request("GET", "/api/tasks", None).await;
    assert_eq!(pending, json!([]));

    let (status, restored) = app
        .request("POST", &format!("/api/tasks/{}/restore", id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(restored["completed_at"].is_null());

    let (_, pending) = app.request("GET", "/api/tasks?state=pending", None).await;
    assert_eq!(pending.as_array().unwrap().len(), 1);
    assert_eq!(pending[0]["id"], id.as_str());
}

#[tokio::test]
async fn task_board_groups_by_category() {
    let app = TestAppBuilder::new().build().await;
    for (text, category) in [("A", "mc2"), ("B", "telvia"), ("C", "mc2")] {
        app.request(
            "POST",
            "/api/tasks",
            Some(json!({"text": text, "category": category})),
        )
        .await;
    }

    let (status, board) = app.request("GET", "/api/tasks/board?state=all", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(board["mc2"].as_array().unwrap().len(), 2);
    assert_eq!(board["telvia"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn empty_task_text_is_rejected() {
    let app = TestAppBuilder::new().build().await;
    let (status, _) = app
        .request("POST", "/api/tasks", Some(json!({"text": "   "})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .request(
            "PATCH",
            &format!("/api/tasks/{}", Uuid::new_v4()),
            Some(json!({"text": ""})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_task_is_not_found() {
    let app = TestAppBuilder::new().build().await;
    let (status, _) = app
        .request("POST", &format!("/api/tasks/{}/complete", Uuid::new_v4()), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn failed_message_delete_is_reconciled_from_the_store() {
    let db = Arc::new(MemoryDb::new());
    let kept = message("No borrar");
    db.seed_message(kept.clone());
    let app = TestAppBuilder::new().db(db.clone()).build().await;
    let mut events = app.state.board.subscribe();

    db.set_fail_writes(true);
    let (status, _) = app
        .request("DELETE", &format!("/api/messages/{}", kept.id), None)
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    // The removal is pushed first, then the store's copy wins.
    assert_eq!(events.recv().await.unwrap(), BoardEvent::MessageRemoved { id: kept.id });
    match events.recv().await.unwrap() {
        BoardEvent::Snapshot { messages, .. } => assert_eq!(messages, vec![kept.clone()]),
        other => panic!("expected a snapshot, got {:?}", other),
    }
    match app.state.board.snapshot().await {
        BoardEvent::Snapshot { messages, .. } => assert_eq!(messages, vec![kept.clone()]),
        other => panic!("expected a snapshot, got {:?}", other),
    }
    assert_eq!(db.messages(), vec![kept]);
}

fn snapshot_tasks(event: BoardEvent) -> Vec<Task> {
    match event {
        BoardEvent::Snapshot { tasks, .. } => tasks,
        other => panic!("expected a snapshot, got {:?}", other),
    }
}

#[tokio::test]
async fn task_deleted_during_an_edit_stays_deleted() {
    let db = Arc::new(MemoryDb::new());
    let app = TestAppBuilder::new().db(db.clone()).build().await;
    let (_, task) = app
        .request("POST", "/api/tasks", Some(json!({"text": "Llamar a Pedro"})))
        .await;
    let path = format!("/api/tasks/{}", task["id"].as_str().unwrap());

    // The edit reaches the store, then the delete lands before the edit's reply.
    let pause = db.pause_after("update_task");
    let edit = app.request("PATCH", &path, Some(json!({"text": "Llamar a Pedro hoy"})));
    let delete = async {
        pause.entered.await.unwrap();
        let (status, _) = app.request("DELETE", &path, None).await;
        pause.release.send(()).unwrap();
        status
    };
    let ((edit_status, _), delete_status) = tokio::join!(edit, delete);
    assert_eq!(edit_status, StatusCode::OK);
    assert_eq!(delete_status, StatusCode::NO_CONTENT);

    assert!(db.tasks().is_empty());
    assert!(snapshot_tasks(app.state.board.snapshot().await).is_empty());
}

#[tokio::test]
async fn task_deleted_before_its_create_returns_is_not_revived() {
    let db = Arc::new(MemoryDb::new());
    let app = TestAppBuilder::new().db(db.clone()).build().await;
    let mut events = app.state.board.subscribe();

    let pause = db.pause_after("create_task");
    let create = app.request("POST", "/api/tasks", Some(json!({"text": "Revisar acuerdo"})));
    let delete = async {
        pause.entered.await.unwrap();
        let id = match events.recv().await.unwrap() {
            BoardEvent::TaskUpserted { task } => task.id,
            other => panic!("expected the optimistic task, got {:?}", other),
        };
        let (status, _) = app.request("DELETE", &format!("/api/tasks/{}", id), None).await;
        pause.release.send(()).unwrap();
        status
    };
    let ((create_status, _), delete_status) = tokio::join!(create, delete);
    assert_eq!(create_status, StatusCode::CREATED);
    assert_eq!(delete_status, StatusCode::NO_CONTENT);

    assert!(db.tasks().is_empty());
    assert!(snapshot_tasks(app.state.board.snapshot().await).is_empty());
}

#[tokio::test]
async fn deleting_an_unknown_message_does_not_resync() {
    let app = TestAppBuilder::new().build().await;
    let mut events = app.state.board.subscribe();
    let id = Uuid::new_v4();

    let (status, _) = app
        .request("DELETE", &format!("/api/messages/{}", id), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Nothing was in the mirror and the store agrees, so no snapshot is pushed.
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn message_board_round_trip() {
    let app = TestAppBuilder::new().build().await;

    let (status, posted) = app
        .request(
            "POST",
            "/api/messages",
            Some(json!({"text": "El guion suena bien", "author_name": "Ana"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(posted["sender"], "user");
    let id = posted["id"].as_str().unwrap().to_string();

    let (status, edited) = app
        .request(
            "PATCH",
            &format!("/api/messages/{}", id),
            Some(json!({"text": "El guion suena muy bien"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(edited["text"], "El guion suena muy bien");

    let (status, _) = app
        .request("DELETE", &format!("/api/messages/{}", id), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, listed) = app.request("GET", "/api/messages", None).await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn board_changes_mail_staff_when_enabled() {
    let mailer = Arc::new(FakeMailer::default());
    let app = TestAppBuilder::new()
        .config(test_config(&[("NOTIFY_ON_CHANGES", "true")]))
        .mailer(mailer.clone())
        .build()
        .await;

    app.request(
        "POST",
        "/api/tasks",
        Some(json!({"text": "Revisar grabaciones", "category": "mc2"})),
    )
    .await;
    app.request(
        "POST",
        "/api/messages",
        Some(json!({"text": "Respuesta", "sender": "agency"})),
    )
    .await;

    let mut waited = 0;
    while mailer.sent().is_empty() && waited < 50 {
        tokio::time::sleep(Duration::from_millis(20)).await;
        waited += 1;
    }
    // Give a stray agency notification time to show up before counting.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].html.contains("Revisar grabaciones"));
}

#[tokio::test]
async fn documents_require_http_links() {
    let app = TestAppBuilder::new().build().await;

    let (status, _) = app
        .request(
            "POST",
            "/api/documents",
            Some(json!({"name": "Guion", "url": "ftp://files/guion.pdf"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, doc) = app
        .request(
            "POST",
            "/api/documents",
            Some(json!({"name": "Guion", "url": "https://docs.example.com/guion"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .request("DELETE", &format!("/api/documents/{}", doc["id"].as_str().unwrap()), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}
