//! Weekly report endpoints: JSON, PDF download, and email delivery.

use axum::{
    Json,
    extract::{Query, State},
    http::header,
    response::IntoResponse,
};
use serde_json::json;

use crate::error::ApiError;
use crate::notify::send_weekly_report_email;
use crate::report::{Report, render_pdf, weekly_report};
use crate::router::AppState;
use crate::types::{EmailWeeklyReportRequest, WeeklyReportQuery};

pub async fn weekly_json(
    State(state): State<AppState>,
    Query(query): Query<WeeklyReportQuery>,
) -> Result<Json<Report>, ApiError> {
    let report = weekly_report(state.store.as_ref(), &query.parent_id).await?;
    Ok(Json(report))
}

pub async fn weekly_pdf(
    State(state): State<AppState>,
    Query(query): Query<WeeklyReportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let report = weekly_report(state.store.as_ref(), &query.parent_id).await?;
    let bytes = render_pdf(&report)?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (header::CONTENT_DISPOSITION, "inline; filename=\"weekly_report.pdf\""),
        ],
        bytes,
    ))
}

pub async fn email_weekly(
    State(state): State<AppState>,
    Json(request): Json<EmailWeeklyReportRequest>,
) -> Result<impl IntoResponse, ApiError> {
    send_weekly_report_email(
        state.store.as_ref(),
        &state.mailer,
        &request.parent_id,
        &request.to_email,
    )
    .await?;
    Ok(Json(json!({ "sent": true })))
}
