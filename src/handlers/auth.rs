//! Signup and login.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::router::AppState;
use crate::store::{Filter, collections};
use crate::types::{LoginRequest, SignupRequest, User, Validate};

pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()?;

    let username_taken = state
        .store
        .find_one(collections::USER, Filter::new().eq("username", payload.username.as_str()))
        .await?
        .is_some();
    let email_taken = state
        .store
        .find_one(collections::USER, Filter::new().eq("email", payload.email.as_str()))
        .await?
        .is_some();
    if username_taken || email_taken {
        return Err(ApiError::Conflict("username or email already exists".to_string()));
    }

    let SignupRequest { name, email, username, password, role } = payload;
    // bcrypt is CPU-bound; keep it off the async workers.
    let password_hash =
        tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt::DEFAULT_COST))
            .await
            .map_err(|e| ApiError::Internal(format!("hashing task failed: {e}")))??;

    let doc = json!({
        "name": name,
        "email": email,
        "username": username,
        "password_hash": password_hash,
        "role": role,
        "is_active": true,
    });
    let id = state.store.insert(collections::USER, doc).await?;
    info!(user = %id, "account created");

    Ok((StatusCode::CREATED, Json(json!({ "id": id, "name": name, "role": role }))))
}

/// Logged server-side, but the response is the same for every failure mode
/// (unknown username, account without a hash, wrong password).
fn rejected(username: &str) -> ApiError {
    warn!(username = %username, "login rejected");
    ApiError::InvalidCredentials
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(doc) = state
        .store
        .find_one(collections::USER, Filter::new().eq("username", payload.username.as_str()))
        .await?
    else {
        return Err(rejected(&payload.username));
    };
    let user: User = serde_json::from_value(doc)?;
    let Some(hash) = user.password_hash.clone() else {
        return Err(rejected(&payload.username));
    };

    let password = payload.password.clone();
    let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| ApiError::Internal(format!("verify task failed: {e}")))??;
    if !verified {
        return Err(rejected(&payload.username));
    }

    Ok(Json(json!({
        "id": user.id,
        "name": user.name,
        "role": user.role,
        "email": user.email,
        "username": user.username,
    })))
}
