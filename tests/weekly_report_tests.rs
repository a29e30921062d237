//! Weekly report endpoints: aggregation through the HTTP surface, PDF
//! growth across pages, and the three email outcomes (unconfigured,
//! unreachable relay, bad address).

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use therapy_center::config::SmtpSettings;
use therapy_center::notify::ReportMailer;
use therapy_center::router::{AppState, app_router};
use therapy_center::store::memory::MemoryStore;
use tower::ServiceExt;

fn test_app() -> Router {
    app_router(AppState::new(Arc::new(MemoryStore::new()), ReportMailer::disabled()))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

async fn create(app: &Router, uri: &str, body: Value) -> String {
    let (status, body) = send(app, post_json(uri, body)).await;
    assert_eq!(status, StatusCode::CREATED, "create on {uri} failed: {body}");
    body["id"].as_str().unwrap().to_string()
}

async fn seed_child(app: &Router, first: &str, last: &str, parent: &str) -> String {
    create(
        app,
        "/children",
        json!({
            "first_name": first, "last_name": last,
            "parent_ids": [parent], "therapist_ids": [],
        }),
    )
    .await
}

async fn seed_session(app: &Router, child_id: &str, updates: usize) {
    let entries: Vec<Value> =
        (0..updates).map(|i| json!({ "goal_id": format!("g{i}"), "rating": 3 })).collect();
    create(
        app,
        "/sessions",
        json!({
            "child_id": child_id, "therapist_id": "t1",
            "date": "2026-08-18", "duration_minutes": 45,
            "goals_progress": entries,
        }),
    )
    .await;
}

#[tokio::test]
async fn weekly_report_folds_counts_per_child() {
    let app = test_app();
    let child_a = seed_child(&app, "Mara", "Voss", "p1").await;
    let child_b = seed_child(&app, "Iris", "Voss", "p1").await;
    seed_child(&app, "Noa", "Lindt", "p2").await;

    // Child A: three sessions, two carrying one update each, one goal.
    seed_session(&app, &child_a, 1).await;
    seed_session(&app, &child_a, 1).await;
    seed_session(&app, &child_a, 0).await;
    create(&app, "/goals", json!({ "child_id": &child_a, "title": "Cut with scissors" })).await;
    // Child B: no sessions, two goals.
    create(&app, "/goals", json!({ "child_id": &child_b, "title": "Stack blocks" })).await;
    create(&app, "/goals", json!({ "child_id": &child_b, "title": "Name colors" })).await;

    let (status, report) = send(&app, get("/reports/weekly?parent_id=p1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["parent_id"], json!("p1"));
    assert_eq!(report["total_sessions"], json!(3));
    assert_eq!(report["total_progress_updates"], json!(2));

    let children = report["children"].as_array().unwrap();
    assert_eq!(children.len(), 2, "the other parent's child must not appear");

    let a = children.iter().find(|c| c["child_id"] == json!(child_a)).unwrap();
    assert_eq!(a["name"], json!("Mara Voss"));
    assert_eq!(a["session_count"], json!(3));
    assert_eq!(a["goal_count"], json!(1));
    assert_eq!(a["progress_update_count"], json!(2));

    let b = children.iter().find(|c| c["child_id"] == json!(child_b)).unwrap();
    assert_eq!(b["session_count"], json!(0));
    assert_eq!(b["goal_count"], json!(2));
    assert_eq!(b["progress_update_count"], json!(0));
}

#[tokio::test]
async fn unknown_parent_gets_an_empty_report_not_an_error() {
    let app = test_app();
    let (status, report) = send(&app, get("/reports/weekly?parent_id=nobody")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["children"], json!([]));
    assert_eq!(report["total_sessions"], json!(0));
}

#[tokio::test]
async fn pdf_grows_when_children_spill_onto_more_pages() {
    let app = test_app();
    seed_child(&app, "Only", "Child", "small").await;
    for i in 0..80 {
        seed_child(&app, "Child", &format!("Number{i}"), "big").await;
    }

    let small = app
        .clone()
        .oneshot(get("/reports/weekly.pdf?parent_id=small"))
        .await
        .unwrap();
    let big = app
        .clone()
        .oneshot(get("/reports/weekly.pdf?parent_id=big"))
        .await
        .unwrap();
    assert_eq!(small.status(), StatusCode::OK);
    assert_eq!(big.status(), StatusCode::OK);

    let small = to_bytes(small.into_body(), usize::MAX).await.unwrap();
    let big = to_bytes(big.into_body(), usize::MAX).await.unwrap();
    assert!(small.starts_with(b"%PDF"));
    assert!(big.starts_with(b"%PDF"));
    assert!(big.len() > small.len());
}

#[tokio::test]
async fn email_without_smtp_config_is_unavailable() {
    let app = test_app();
    let (status, body) = send(
        &app,
        post_json(
            "/notifications/email/weekly-report",
            json!({ "parent_id": "p1", "to_email": "parent@example.com" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], json!("MAIL_NOT_CONFIGURED"));
}

fn app_with_relay(host: &str, port: u16) -> Router {
    let settings = SmtpSettings {
        host: host.to_string(),
        port,
        username: None,
        password: None,
        from: "reports@example.com".to_string(),
    };
    let mailer = ReportMailer::new(Some(&settings)).unwrap();
    app_router(AppState::new(Arc::new(MemoryStore::new()), mailer))
}

#[tokio::test]
async fn unreachable_relay_is_reported_as_bad_gateway() {
    // Nothing listens on this port; the send itself fails, which must be
    // distinguishable from the not-configured case.
    let app = app_with_relay("localhost", 1);
    let (status, body) = send(
        &app,
        post_json(
            "/notifications/email/weekly-report",
            json!({ "parent_id": "p1", "to_email": "parent@example.com" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], json!("MAIL_SEND_FAILED"));
}

#[tokio::test]
async fn malformed_recipient_is_a_validation_error() {
    let app = app_with_relay("localhost", 1);
    let (status, body) = send(
        &app,
        post_json(
            "/notifications/email/weekly-report",
            json!({ "parent_id": "p1", "to_email": "not-an-address" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], json!("VALIDATION"));
}
