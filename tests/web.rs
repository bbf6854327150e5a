mod common;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use batch_admin::config::UnreachablePolicy;
use batch_admin::gate::AccessGate;
use batch_admin::web::{router, AppState};
use common::{record, Call, RecordingApi, RecordingValidator};
use std::sync::Arc;
use tower::ServiceExt;

fn app(api: &RecordingApi, validator: &RecordingValidator) -> Router {
    let gate = AccessGate::new(Arc::new(validator.clone()), UnreachablePolicy::Deny);
    router(Arc::new(AppState::new(Arc::new(api.clone()), gate)))
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, String) {
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let location = res
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let body = location.unwrap_or_else(|| String::from_utf8_lossy(&bytes).into_owned());
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn missing_token_redirects_without_calling_validator() {
    let api = RecordingApi::default();
    let validator = RecordingValidator::accepting(&["good"]);
    let app = app(&api, &validator);

    let (status, location) = send(&app, get("/")).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location, "/permission");

    let (status, _) = send(&app, get("/?token=")).await;
    assert_eq!(status, StatusCode::SEE_OTHER);

    assert!(validator.calls().await.is_empty());
    assert!(api.calls().await.is_empty());
}

#[tokio::test]
async fn rejected_token_redirects_to_denial_view() {
    let api = RecordingApi::default();
    let validator = RecordingValidator::accepting(&["good"]);
    let app = app(&api, &validator);

    let (status, location) = send(&app, get("/?token=bad")).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location, "/permission");
    assert_eq!(validator.calls().await, vec!["bad".to_string()]);

    let (status, body) = send(&app, get("/permission")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Permission Denied"));
}

#[tokio::test]
async fn accepted_token_renders_management_view() {
    let api = RecordingApi::with_records(vec![record(Some(1), "Daily Sync", true)]);
    let validator = RecordingValidator::accepting(&["good"]);
    let app = app(&api, &validator);

    let (status, body) = send(&app, get("/?token=good")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Batch Management"));
    assert!(body.contains("Daily Sync"));
    assert!(body.contains(">Enabled</span>"));
    assert!(body.contains("/batches/s1/edit?token=good"));
    assert_eq!(api.calls().await, vec![Call::List]);
}

#[tokio::test]
async fn actions_are_gated_too() {
    let api = RecordingApi::default();
    let validator = RecordingValidator::accepting(&["good"]);
    let app = app(&api, &validator);

    let (status, _) = send(&app, post_form("/batches/form", "jobName=x")).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    let (status, _) = send(&app, post_form("/batches/s1/delete?token=bad", "")).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert!(api.calls().await.is_empty());
}

#[tokio::test]
async fn invalid_submit_shows_errors_and_makes_no_call() {
    let api = RecordingApi::default();
    let validator = RecordingValidator::accepting(&["good"]);
    let app = app(&api, &validator);

    let (status, body) = send(&app, get("/batches/new?token=good")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("name=\"jobName\""));

    let (status, body) = send(
        &app,
        post_form(
            "/batches/form?token=good",
            "jobName=&cronExpression=0+0+*+*+*&targetUrl=https%3A%2F%2Fx.example&enabled=on",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body.contains("Job name is required"));
    assert!(!body.contains("Invalid cron expression"));
    assert!(api.mutation_calls().await.is_empty());
}

#[tokio::test]
async fn create_flow_refreshes_list() {
    let api = RecordingApi::default();
    let validator = RecordingValidator::accepting(&["good"]);
    let app = app(&api, &validator);

    send(&app, get("/batches/new?token=good")).await;
    let (status, body) = send(
        &app,
        post_form(
            "/batches/form?token=good",
            "jobName=Weekly+Report&cronExpression=0+8+*+*+1&targetUrl=https%3A%2F%2Fx.example%2Fweekly",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Weekly Report"));
    assert!(body.contains(">Disabled</span>"));
    assert!(!body.contains("name=\"jobName\""));

    let calls = api.calls().await;
    assert!(matches!(calls[0], Call::Create(ref r) if !r.enabled));
    assert_eq!(calls[1], Call::List);
    assert_eq!(api.records().await[0].id, Some(1));
}

#[tokio::test]
async fn delete_requires_confirmation_then_refreshes() {
    let api = RecordingApi::with_records(vec![
        record(Some(1), "Keep", true),
        record(Some(2), "Remove Me", false),
    ]);
    let validator = RecordingValidator::accepting(&["good"]);
    let app = app(&api, &validator);
    send(&app, get("/?token=good")).await;

    let (status, _) = send(&app, post_form("/batches/s2/delete?token=good", "")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, get("/batches/s2/delete?token=good")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Are you sure you want to delete <strong>Remove Me</strong>?"));

    let (status, body) = send(&app, post_form("/batches/s2/delete?token=good", "")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body.contains("Remove Me"));
    assert!(body.contains("Keep"));
    assert_eq!(api.mutation_calls().await, vec![Call::Delete(2)]);
}

#[tokio::test]
async fn unknown_entry_is_not_found() {
    let api = RecordingApi::default();
    let validator = RecordingValidator::accepting(&["good"]);
    let app = app(&api, &validator);

    let (status, _) = send(&app, get("/batches/s99/edit?token=good")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, get("/batches/garbage/edit?token=good")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
