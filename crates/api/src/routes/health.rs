//! Health alert routes

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use mediguard_care::HealthAlert;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::extract::{ApiJson, ApiQuery, AuthUser};
use crate::state::AppState;

/// Health routes (mounted at `/api/health`)
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_alert))
        .route("/alerts", get(list_alerts))
        .route("/alerts/{user_id}", get(list_user_alerts))
}

/// Alert creation request
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AlertRequest {
    pub alert_type: String,
    pub meal_slot: String,
}

/// Alert filter
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AlertsQuery {
    pub user_id: Option<String>,
}

/// Alert list response
#[derive(Debug, Serialize)]
pub struct AlertsResponse {
    pub alerts: Vec<HealthAlert>,
}

/// POST /api/health
///
/// Records an anomaly for the caller and counts it in the daily log.
async fn create_alert(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<AlertRequest>,
) -> Result<impl IntoResponse> {
    let record = state
        .care
        .alerts
        .create_alert(&user.user_id, &req.alert_type, &req.meal_slot)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /api/health/alerts[?user_id=]
///
/// Newest first. Caregivers read other users' alerts here.
async fn list_alerts(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiQuery(query): ApiQuery<AlertsQuery>,
) -> Result<Json<AlertsResponse>> {
    let user_id = query.user_id.as_deref().filter(|id| !id.trim().is_empty());
    let alerts = state.care.alerts.list_alerts(user_id).await?;
    Ok(Json(AlertsResponse { alerts }))
}

/// GET /api/health/alerts/{user_id}
async fn list_user_alerts(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(user_id): Path<String>,
) -> Result<Json<AlertsResponse>> {
    let alerts = state.care.alerts.list_alerts(Some(&user_id)).await?;
    Ok(Json(AlertsResponse { alerts }))
}
