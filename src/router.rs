use std::sync::Arc;

use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};

use crate::handlers::{auth, entities, reports};
use crate::notify::ReportMailer;
use crate::store::DocumentStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub mailer: Arc<ReportMailer>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, mailer: ReportMailer) -> Self {
        Self { store, mailer: Arc::new(mailer) }
    }
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "Therapy Center API running" }))
}

pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/users", post(entities::create_user).get(entities::list_users))
        .route("/children", post(entities::create_child).get(entities::list_children))
        .route("/goals", post(entities::create_goal).get(entities::list_goals))
        .route("/sessions", post(entities::create_session).get(entities::list_sessions))
        .route("/sessions/{id}/goals-progress", patch(entities::append_goals_progress))
        .route(
            "/progress-notes",
            post(entities::create_progress_note).get(entities::list_progress_notes),
        )
        .route("/donations", post(entities::create_donation).get(entities::list_donations))
        .route("/donations/summary", get(entities::donations_summary))
        .route("/reports/weekly", get(reports::weekly_json))
        .route("/reports/weekly.pdf", get(reports::weekly_pdf))
        .route("/notifications/email/weekly-report", post(reports::email_weekly))
        .layer(cors)
        .with_state(state)
}
