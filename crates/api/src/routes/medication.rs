//! Medication routes
//!
//! Catalog, manual schedule entries, reminder times and dose confirmation.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use mediguard_care::{
    Confirmation, MealSlot, MealTimes, Medication, MedicationStatus, NewMedication,
    NewScheduleEntry, ScheduleEntry,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::parse_date;
use crate::error::{ApiError, Result};
use crate::extract::{ApiJson, ApiQuery, AuthUser};
use crate::state::AppState;

/// Medication routes (mounted at `/api/medication`)
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_medications))
        .route("/ocr", post(register_medication))
        .route("/schedule", post(record_schedule).get(list_schedule))
        .route("/time", post(set_meal_times).get(get_meal_times))
        .route("/confirm", post(confirm))
}

// =============================================================================
// Request / Response Types
// =============================================================================

/// Medication list response
#[derive(Debug, Serialize)]
pub struct MedicationsResponse {
    pub medications: Vec<Medication>,
}

/// Manual schedule entry request
///
/// Date and slot arrive as strings so that absent or malformed values are
/// reported as validation errors.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ScheduleRequest {
    pub medication_name: String,
    pub dosage: String,
    pub scheduled_date: String,
    pub meal_slot: String,
    pub status: Option<MedicationStatus>,
    pub taken_at: Option<DateTime<Utc>>,
}

/// Schedule listing query
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ScheduleQuery {
    /// `YYYY-MM-DD`, defaults to today
    pub date: Option<String>,
}

/// Schedule listing response
#[derive(Debug, Serialize)]
pub struct ScheduleResponse {
    pub date: chrono::NaiveDate,
    pub entries: Vec<ScheduleEntry>,
}

/// Dose confirmation request
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfirmRequest {
    pub medication_name: String,
    pub meal_slot: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /api/medication
async fn list_medications(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<MedicationsResponse>> {
    let medications = state.care.catalog.list_medications(&user.user_id).await?;
    Ok(Json(MedicationsResponse { medications }))
}

/// POST /api/medication/ocr
///
/// Stores a medication captured from a prescription label.
async fn register_medication(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(med): ApiJson<NewMedication>,
) -> Result<impl IntoResponse> {
    let id = state
        .care
        .catalog
        .register_medication(&user.user_id, &med)
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "medication_id": id }))))
}

/// POST /api/medication/schedule
async fn record_schedule(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<ScheduleRequest>,
) -> Result<impl IntoResponse> {
    let scheduled_date = parse_date("scheduled_date", &req.scheduled_date)?;
    let meal_slot: MealSlot = req.meal_slot.parse()?;

    let entry = NewScheduleEntry {
        medication_name: req.medication_name,
        dosage: req.dosage,
        scheduled_date,
        meal_slot,
        status: req.status,
        taken_at: req.taken_at,
    };
    let entry = state
        .care
        .catalog
        .record_schedule_entry(&user.user_id, &entry)
        .await?;

    Ok((StatusCode::CREATED, Json(entry)))
}

/// GET /api/medication/schedule?date=YYYY-MM-DD
async fn list_schedule(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<ScheduleQuery>,
) -> Result<Json<ScheduleResponse>> {
    let date = match query.date.as_deref() {
        Some(date) => parse_date("date", date)?,
        None => state.care.calendar.today(),
    };
    let entries = state
        .care
        .catalog
        .list_schedule(&user.user_id, date)
        .await?;
    Ok(Json(ScheduleResponse { date, entries }))
}

/// POST /api/medication/time
///
/// 201 when the row was created, 200 when it was updated.
async fn set_meal_times(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(times): ApiJson<MealTimes>,
) -> Result<impl IntoResponse> {
    let update = state
        .care
        .catalog
        .set_meal_times(&user.user_id, &times)
        .await?;
    let status = if update.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(update.times)))
}

/// GET /api/medication/time
async fn get_meal_times(State(state): State<AppState>, user: AuthUser) -> Result<Json<MealTimes>> {
    state
        .care
        .catalog
        .meal_times(&user.user_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("meal times for '{}'", user.user_id)))
}

/// POST /api/medication/confirm
async fn confirm(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<ConfirmRequest>,
) -> Result<Json<Confirmation>> {
    let confirmation = state
        .care
        .confirmations
        .confirm(&user.user_id, &req.medication_name, &req.meal_slot)
        .await?;
    Ok(Json(confirmation))
}
