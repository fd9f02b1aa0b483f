//! Account routes
//!
//! Signup, login and id checks are public; everything else acts on the
//! user resolved from the bearer token.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use mediguard_auth::NewUser;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::error::{ApiError, Result};
use crate::extract::{ApiJson, ApiQuery, AuthUser};
use crate::state::AppState;

/// Account routes (mounted at `/api/users`)
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/check-id", get(check_id))
        .route("/logout", post(logout))
        .route("/delete", post(delete))
        .route("/name", get(name))
        .route("/role", put(set_role))
        .route("/push-token", post(push_token))
}

// =============================================================================
// Request / Response Types
// =============================================================================

/// Signup response
#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub user_id: String,
}

/// Login request
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub user_id: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: String,
    pub display_name: String,
    pub expires_at: i64,
    pub first_login: bool,
}

/// Id availability query
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CheckIdQuery {
    pub user_id: String,
}

/// Role update request
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RoleRequest {
    pub is_elderly: Option<bool>,
}

/// Push token registration request
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PushTokenRequest {
    pub push_token: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /api/users/signup
async fn signup(
    State(state): State<AppState>,
    ApiJson(candidate): ApiJson<NewUser>,
) -> Result<impl IntoResponse> {
    let user_id = state.credentials.register(&candidate).await?;
    info!(user_id = %user_id, "user registered");
    Ok((StatusCode::CREATED, Json(SignupResponse { user_id })))
}

/// POST /api/users/login
async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let auth = state
        .credentials
        .authenticate(&req.user_id, &req.password)
        .await?;

    Ok(Json(LoginResponse {
        token: auth.token,
        user_id: auth.user.user_id,
        display_name: auth.user.display_name,
        expires_at: auth.expires_at,
        first_login: auth.first_login,
    }))
}

/// GET /api/users/check-id?user_id=
async fn check_id(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CheckIdQuery>,
) -> Result<Json<serde_json::Value>> {
    let available = state.credentials.check_id_available(&query.user_id).await?;
    Ok(Json(json!({ "available": available })))
}

/// POST /api/users/logout
///
/// Tokens are not revocable; the client discards its token.
async fn logout() -> Json<serde_json::Value> {
    Json(json!({ "success": true }))
}

/// POST /api/users/delete
async fn delete(State(state): State<AppState>, user: AuthUser) -> Result<impl IntoResponse> {
    let withdrawn = state.credentials.withdraw(&user.user_id).await?;
    let status = if withdrawn {
        info!(user_id = %user.user_id, "user withdrawn");
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    };
    Ok((status, Json(json!({ "success": withdrawn }))))
}

/// GET /api/users/name
async fn name(State(state): State<AppState>, user: AuthUser) -> Result<Json<serde_json::Value>> {
    let display_name = state.credentials.display_name(&user.user_id).await?;
    Ok(Json(json!({
        "user_id": user.user_id,
        "display_name": display_name,
    })))
}

/// PUT /api/users/role
async fn set_role(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<RoleRequest>,
) -> Result<Json<serde_json::Value>> {
    let is_elderly = req
        .is_elderly
        .ok_or_else(|| ApiError::validation("is_elderly is required"))?;

    if !state.credentials.set_role(&user.user_id, is_elderly).await? {
        return Err(ApiError::not_found(format!("user '{}'", user.user_id)));
    }
    Ok(Json(json!({ "success": true, "is_elderly": is_elderly })))
}

/// POST /api/users/push-token
async fn push_token(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<PushTokenRequest>,
) -> Result<Json<serde_json::Value>> {
    state
        .credentials
        .register_push_token(&user.user_id, &req.push_token)
        .await?;
    Ok(Json(json!({ "success": true })))
}
