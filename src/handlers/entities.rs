//! Create/list handlers for the record-keeping entities, plus the
//! goals-progress append and the donations summary.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::{Map, Value, json};

use crate::error::ApiError;
use crate::router::AppState;
use crate::store::{DocumentStore, Filter, collections, find_as};
use crate::types::{
    Child, Donation, DonationsSummaryQuery, Goal, GoalsProgressPatch, ListChildrenQuery,
    ListDonationsQuery, ListGoalsQuery, ListProgressNotesQuery, ListSessionsQuery, ListUsersQuery,
    ProgressNote, Session, User, Validate,
};

async fn create<T>(
    store: &dyn DocumentStore,
    collection: &str,
    entity: &T,
) -> Result<(StatusCode, Json<Value>), ApiError>
where
    T: Validate + serde::Serialize,
{
    entity.validate()?;
    let doc = serde_json::to_value(entity)?;
    let id = store.insert(collection, doc).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

pub async fn create_user(
    State(state): State<AppState>,
    Json(user): Json<User>,
) -> Result<impl IntoResponse, ApiError> {
    create(state.store.as_ref(), collections::USER, &user).await
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Vec<User>>, ApiError> {
    let mut filter = Filter::new();
    if let Some(role) = query.role {
        filter = filter.eq("role", serde_json::to_value(role)?);
    }
    let mut users: Vec<User> = find_as(state.store.as_ref(), collections::USER, filter).await?;
    // Hashes never leave the service.
    for user in &mut users {
        user.password_hash = None;
    }
    Ok(Json(users))
}

pub async fn create_child(
    State(state): State<AppState>,
    Json(child): Json<Child>,
) -> Result<impl IntoResponse, ApiError> {
    create(state.store.as_ref(), collections::CHILD, &child).await
}

pub async fn list_children(
    State(state): State<AppState>,
    Query(query): Query<ListChildrenQuery>,
) -> Result<Json<Vec<Child>>, ApiError> {
    let mut filter = Filter::new();
    if let Some(parent_id) = query.parent_id {
        filter = filter.eq("parent_ids", parent_id);
    }
    if let Some(therapist_id) = query.therapist_id {
        filter = filter.eq("therapist_ids", therapist_id);
    }
    Ok(Json(find_as(state.store.as_ref(), collections::CHILD, filter).await?))
}

pub async fn create_goal(
    State(state): State<AppState>,
    Json(goal): Json<Goal>,
) -> Result<impl IntoResponse, ApiError> {
    create(state.store.as_ref(), collections::GOAL, &goal).await
}

pub async fn list_goals(
    State(state): State<AppState>,
    Query(query): Query<ListGoalsQuery>,
) -> Result<Json<Vec<Goal>>, ApiError> {
    let filter = Filter::new().eq("child_id", query.child_id);
    Ok(Json(find_as(state.store.as_ref(), collections::GOAL, filter).await?))
}

pub async fn create_session(
    State(state): State<AppState>,
    Json(session): Json<Session>,
) -> Result<impl IntoResponse, ApiError> {
    create(state.store.as_ref(), collections::SESSION, &session).await
}

pub async fn list_sessions(
    State(state): State<AppState>,
    Query(query): Query<ListSessionsQuery>,
) -> Result<Json<Vec<Session>>, ApiError> {
    let mut filter = Filter::new();
    if let Some(child_id) = query.child_id {
        filter = filter.eq("child_id", child_id);
    }
    if let Some(therapist_id) = query.therapist_id {
        filter = filter.eq("therapist_id", therapist_id);
    }
    Ok(Json(find_as(state.store.as_ref(), collections::SESSION, filter).await?))
}

/// Append a batch of progress entries to a session. The write is a single
/// store-side push, so concurrent batches interleave without losing entries.
pub async fn append_goals_progress(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<GoalsProgressPatch>,
) -> Result<impl IntoResponse, ApiError> {
    patch.validate()?;
    let items: Vec<Value> =
        patch.items.iter().map(serde_json::to_value).collect::<Result<_, _>>()?;
    let count = items.len();
    let matched = state.store.push(collections::SESSION, &id, "goals_progress", items).await?;
    if matched == 0 {
        return Err(ApiError::NotFound("session"));
    }
    Ok(Json(json!({ "updated": true, "count": count })))
}

pub async fn create_progress_note(
    State(state): State<AppState>,
    Json(note): Json<ProgressNote>,
) -> Result<impl IntoResponse, ApiError> {
    create(state.store.as_ref(), collections::PROGRESS_NOTE, &note).await
}

pub async fn list_progress_notes(
    State(state): State<AppState>,
    Query(query): Query<ListProgressNotesQuery>,
) -> Result<Json<Vec<ProgressNote>>, ApiError> {
    let filter = Filter::new().eq("child_id", query.child_id);
    Ok(Json(find_as(state.store.as_ref(), collections::PROGRESS_NOTE, filter).await?))
}

pub async fn create_donation(
    State(state): State<AppState>,
    Json(donation): Json<Donation>,
) -> Result<impl IntoResponse, ApiError> {
    create(state.store.as_ref(), collections::DONATION, &donation).await
}

pub async fn list_donations(
    State(state): State<AppState>,
    Query(query): Query<ListDonationsQuery>,
) -> Result<Json<Vec<Donation>>, ApiError> {
    let mut filter = Filter::new();
    if let Some(child_id) = query.child_id {
        filter = filter.eq("child_id", child_id);
    }
    if let Some(donor_id) = query.donor_id {
        filter = filter.eq("donor_id", donor_id);
    }
    Ok(Json(find_as(state.store.as_ref(), collections::DONATION, filter).await?))
}

/// Sum and count donations store-side. No matching rows means a zero
/// summary, not an error.
pub async fn donations_summary(
    State(state): State<AppState>,
    Query(query): Query<DonationsSummaryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let mut match_doc = Map::new();
    if let Some(child_id) = query.child_id {
        match_doc.insert("child_id".to_string(), Value::String(child_id));
    }
    if let Some(donor_id) = query.donor_id {
        match_doc.insert("donor_id".to_string(), Value::String(donor_id));
    }
    let pipeline = vec![
        json!({ "$match": Value::Object(match_doc) }),
        json!({ "$group": { "_id": null, "total": { "$sum": "$amount" }, "count": { "$sum": 1 } } }),
    ];
    let rows = state.store.aggregate(collections::DONATION, pipeline).await?;
    let (total, count) = match rows.first() {
        Some(row) => (
            row.get("total").and_then(Value::as_f64).unwrap_or(0.0),
            row.get("count").and_then(Value::as_u64).unwrap_or(0),
        ),
        None => (0.0, 0),
    };
    Ok(Json(json!({ "total": total, "count": count })))
}
