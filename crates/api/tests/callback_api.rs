//! Integration tests for the provider callback endpoint.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, build_test_app, failure_callback, get, post_json, post_raw, success_callback,
};
use serde_json::json;
use soraclean_core::task::{OwnerContext, TaskState};
use uuid::Uuid;
use wiremock::MockServer;

// ---------------------------------------------------------------------------
// Test: failure callback for an unregistered task (scenario T2)
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failure_callback_without_registration_is_reported() {
    let provider = MockServer::start().await;
    let test_app = build_test_app(&provider.uri());

    let response = post_json(test_app.app(), "/callback", failure_callback("T2", "oops")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "received": true, "taskId": "T2" }));

    let response = get(test_app.app(), "/task/T2").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        json!({ "status": "failed", "error": "oops" })
    );
}

// ---------------------------------------------------------------------------
// Test: malformed payloads are rejected and change nothing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn malformed_callbacks_return_400() {
    let provider = MockServer::start().await;
    let test_app = build_test_app(&provider.uri());
    test_app.state.registry.register("T1", None).await.unwrap();

    for body in [
        "not json at all",
        r#"{"code":200}"#,
        r#"{"code":200,"data":{"state":"success"}}"#,
        r#"{"code":200,"data":{"taskId":"","state":"fail"}}"#,
    ] {
        let response = post_raw(test_app.app(), "/callback", body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body {body}");
    }

    assert_eq!(test_app.state.registry.len().await, 1);
    assert_eq!(
        test_app.state.registry.get("T1").await.unwrap().state,
        TaskState::Pending
    );
}

// ---------------------------------------------------------------------------
// Test: duplicate callbacks keep the first outcome
// ---------------------------------------------------------------------------

#[tokio::test]
async fn duplicate_callbacks_keep_first_outcome() {
    let provider = MockServer::start().await;
    let test_app = build_test_app(&provider.uri());
    test_app.state.registry.register("T1", None).await.unwrap();

    let first = post_json(
        test_app.app(),
        "/callback",
        success_callback("T1", "https://cdn.kie.ai/first.mp4"),
    )
    .await;
    let second = post_json(test_app.app(), "/callback", failure_callback("T1", "late failure")).await;

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::OK, "duplicates are still acknowledged");

    let json = body_json(get(test_app.app(), "/task/T1").await).await;
    assert_eq!(json["status"], "completed");
    assert_eq!(json["originalUrl"], "https://cdn.kie.ai/first.mp4");
}

// ---------------------------------------------------------------------------
// Test: progress notifications do not finish the task
// ---------------------------------------------------------------------------

#[tokio::test]
async fn progress_callback_is_acknowledged_without_change() {
    let provider = MockServer::start().await;
    let test_app = build_test_app(&provider.uri());
    test_app.state.registry.register("T3", None).await.unwrap();

    let response = post_json(
        test_app.app(),
        "/callback",
        json!({ "code": 200, "data": { "taskId": "T3", "state": "generating" } }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(get(test_app.app(), "/task/T3").await).await;
    assert_eq!(json["status"], "processing");
}

// ---------------------------------------------------------------------------
// Test: success without a usable result is a failure
// ---------------------------------------------------------------------------

#[tokio::test]
async fn success_without_result_urls_is_failed() {
    let provider = MockServer::start().await;
    let test_app = build_test_app(&provider.uri());

    let response = post_json(
        test_app.app(),
        "/callback",
        json!({
            "code": 200,
            "data": { "taskId": "T4", "state": "success", "resultJson": "{\"resultUrls\":[]}" }
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(test_app.app(), "/task/T4").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["error"], "Provider returned no result");
}

// ---------------------------------------------------------------------------
// Test: the owner's history entry is closed by the callback
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failure_callback_updates_owner_history() {
    let provider = MockServer::start().await;
    let test_app = build_test_app(&provider.uri());
    let user_id = Uuid::new_v4();
    let history = soraclean_db::ledger::CreditLedger::create_history(
        test_app.ledger.as_ref(),
        &soraclean_db::models::history::CreateHistoryEntry {
            user_id,
            subscription_id: None,
            video_url: common::SORA_URL.to_string(),
        },
    )
    .await
    .unwrap();

    test_app
        .state
        .registry
        .register(
            "T5",
            Some(OwnerContext {
                user_id,
                subscription_id: None,
                history_id: Some(history.id),
            }),
        )
        .await
        .unwrap();

    post_json(test_app.app(), "/callback", failure_callback("T5", "content rejected")).await;

    let entries = test_app.ledger.history_entries();
    assert_eq!(entries[0].status, "failed");
    assert_eq!(entries[0].error_message.as_deref(), Some("content rejected"));
    assert!(entries[0].processing_completed_at.is_some());
}
