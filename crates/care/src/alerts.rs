//! Health alert recorder
//!
//! Anomaly reports are appended to `health_alerts` and counted as symptom
//! events in the daily health log. Alerts are never updated or deleted.

use chrono::{DateTime, NaiveDate, Utc};
use mediguard_config::WithdrawnDataPolicy;
use serde::Serialize;
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use tracing::{debug, info};

use crate::calendar::{LocalCalendar, parse_timestamp, timestamp};
use crate::daily_log::{DailyHealthLog, DailyLogEngine};
use crate::error::{CareError, Result, require};
use crate::meal::MealSlot;

/// Recorded anomaly event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthAlert {
    /// Alert ID
    pub id: i64,
    /// Owning user
    pub user_id: String,
    /// Free-form alert type (e.g. "dizziness")
    pub alert_type: String,
    /// Meal slot the alert was counted in
    pub meal_slot: MealSlot,
    /// Detection time
    pub detected_at: DateTime<Utc>,
}

/// Result of [`HealthAlertRecorder::create_alert`]
#[derive(Debug, Clone, Serialize)]
pub struct AlertRecord {
    /// Created alert ID
    pub alert_id: i64,
    /// Calendar date derived from the detection time
    pub log_date: NaiveDate,
    /// Daily health log row after the symptom increment
    pub daily_log: DailyHealthLog,
}

/// Health alert recorder
#[derive(Debug, Clone)]
pub struct HealthAlertRecorder {
    pool: SqlitePool,
    engine: DailyLogEngine,
    calendar: LocalCalendar,
    withdrawn: WithdrawnDataPolicy,
}

impl HealthAlertRecorder {
    /// Create the recorder on an existing pool
    pub async fn new(
        pool: SqlitePool,
        engine: DailyLogEngine,
        calendar: LocalCalendar,
        withdrawn: WithdrawnDataPolicy,
    ) -> Result<Self> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS health_alerts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                alert_type TEXT NOT NULL,
                meal_slot TEXT NOT NULL CHECK (meal_slot IN ('morning', 'lunch', 'dinner')),
                detected_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| CareError::Database(format!("failed to create health_alerts table: {}", e)))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_health_alerts_user ON health_alerts(user_id, detected_at)",
        )
        .execute(&pool)
        .await
        .map_err(|e| CareError::Database(format!("failed to create index: {}", e)))?;

        Ok(Self {
            pool,
            engine,
            calendar,
            withdrawn,
        })
    }

    /// Record an anomaly and count it in the daily health log
    ///
    /// The log date is the calendar date of the detection time.
    pub async fn create_alert(
        &self,
        user_id: &str,
        alert_type: &str,
        meal_slot: &str,
    ) -> Result<AlertRecord> {
        let user_id = require("user_id", user_id)?;
        let alert_type = require("alert_type", alert_type)?;
        let meal_slot: MealSlot = require("meal_slot", meal_slot)?.parse()?;

        let detected_at = Utc::now();

        let alert_id = sqlx::query(
            "INSERT INTO health_alerts (user_id, alert_type, meal_slot, detected_at) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(alert_type)
        .bind(meal_slot.as_str())
        .bind(timestamp(detected_at))
        .execute(&self.pool)
        .await
        .map_err(|e| CareError::Database(format!("failed to record alert: {}", e)))?
        .last_insert_rowid();

        let log_date = self.calendar.date_of(detected_at);
        let daily_log = self
            .engine
            .record_symptom_event(user_id, log_date, meal_slot)
            .await?;

        info!(
            user_id = %user_id,
            alert_id,
            alert_type = %alert_type,
            meal_slot = %meal_slot,
            "health alert recorded"
        );

        Ok(AlertRecord {
            alert_id,
            log_date,
            daily_log,
        })
    }

    /// Alerts newest first, optionally for one user
    pub async fn list_alerts(&self, user_id: Option<&str>) -> Result<Vec<HealthAlert>> {
        let mut sql = String::from(
            "SELECT a.id, a.user_id, a.alert_type, a.meal_slot, a.detected_at \
             FROM health_alerts a WHERE 1 = 1",
        );
        if user_id.is_some() {
            sql.push_str(" AND a.user_id = ?");
        }
        if self.withdrawn.hides_withdrawn() {
            sql.push_str(
                " AND EXISTS (SELECT 1 FROM users u WHERE u.user_id = a.user_id AND u.delyn = 'N')",
            );
        }
        sql.push_str(" ORDER BY a.detected_at DESC, a.id DESC");

        let mut query = sqlx::query(&sql);
        if let Some(user_id) = user_id {
            query = query.bind(user_id);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| CareError::Database(format!("failed to list alerts: {}", e)))?;

        debug!(user_id = ?user_id, count = rows.len(), "alerts listed");
        rows.iter().map(row_to_alert).collect()
    }
}

fn row_to_alert(row: &SqliteRow) -> Result<HealthAlert> {
    let meal_slot: String = row.get("meal_slot");
    let detected_at: String = row.get("detected_at");

    Ok(HealthAlert {
        id: row.get("id"),
        user_id: row.get("user_id"),
        alert_type: row.get("alert_type"),
        meal_slot: MealSlot::from_stored(&meal_slot)?,
        detected_at: parse_timestamp(&detected_at),
    })
}
