//! Calendar routes
//!
//! Read-only projections of the caller's daily health log.

use axum::{Json, Router, extract::State, routing::get};
use chrono::{Datelike, NaiveDate};
use mediguard_care::{DailySummary, MonthlySummary};
use serde::Deserialize;

use super::parse_date;
use crate::error::{ApiError, Result};
use crate::extract::{ApiQuery, AuthUser};
use crate::state::AppState;

/// Calendar routes (mounted at `/api/calendar`)
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/daily-summary", get(daily_summary))
        .route("/monthly-summary", get(monthly_summary))
}

/// Daily summary query
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DailyQuery {
    /// `YYYY-MM-DD`, defaults to today
    pub log_date: Option<String>,
}

/// Monthly summary query
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MonthlyQuery {
    /// `YYYY-MM`
    pub month: String,
}

/// GET /api/calendar/daily-summary?log_date=YYYY-MM-DD
async fn daily_summary(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<DailyQuery>,
) -> Result<Json<DailySummary>> {
    let date = match query.log_date.as_deref() {
        Some(date) => parse_date("log_date", date)?,
        None => state.care.calendar.today(),
    };
    let summary = state.care.engine.daily_summary(&user.user_id, date).await?;
    Ok(Json(summary))
}

/// GET /api/calendar/monthly-summary?month=YYYY-MM
async fn monthly_summary(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<MonthlyQuery>,
) -> Result<Json<MonthlySummary>> {
    let (year, month) = parse_month(&query.month)?;
    let summary = state
        .care
        .engine
        .monthly_summary(&user.user_id, year, month)
        .await?;
    Ok(Json(summary))
}

/// Parse `YYYY-MM`
fn parse_month(value: &str) -> Result<(i32, u32)> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::validation("month is required"));
    }
    let first = NaiveDate::parse_from_str(&format!("{}-01", value), "%Y-%m-%d")
        .map_err(|_| ApiError::validation(format!("month must be YYYY-MM, got '{}'", value)))?;
    Ok((first.year(), first.month()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_month() {
        assert_eq!(parse_month("2025-03").unwrap(), (2025, 3));
        assert_eq!(parse_month(" 2024-12 ").unwrap(), (2024, 12));
        assert!(parse_month("2025-13").is_err());
        assert!(parse_month("March").is_err());
        assert!(parse_month("").unwrap_err().to_string().contains("required"));
    }
}
