//! Daily health log aggregation
//!
//! One row per (user, calendar date, meal slot) counting medication
//! confirmations and symptom alerts. This module is the only writer of the
//! `daily_health_log` table.
//!
//! Both write paths are a single `INSERT .. ON CONFLICT DO UPDATE` statement,
//! so the `UNIQUE (user_id, log_date, meal_slot)` table constraint arbitrates
//! concurrent first events and no increment is lost.
//!
//! ```text
//! absent ──medication──► present(1,0)     present(m,s) ──medication──► present(m+1,s)
//! absent ──symptom─────► present(0,1)     present(m,s) ──symptom─────► present(m,s+1)
//! ```

use chrono::{Datelike, NaiveDate, Utc};
use mediguard_config::WithdrawnDataPolicy;
use serde::Serialize;
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use tracing::{debug, error};

use crate::calendar::{format_date, parse_date, parse_timestamp, timestamp};
use crate::error::{CareError, Result};
use crate::meal::MealSlot;

const LOG_COLUMNS: &str =
    "id, user_id, log_date, meal_slot, medication_count, symptom_count, created_at, updated_at";

/// Stored daily health log row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyHealthLog {
    /// Row ID
    pub id: i64,
    /// Owning user
    pub user_id: String,
    /// Calendar date
    pub log_date: NaiveDate,
    /// Meal slot
    pub meal_slot: MealSlot,
    /// Medication confirmations in the slot
    pub medication_count: i64,
    /// Symptom alerts in the slot
    pub symptom_count: i64,
    /// First event
    pub created_at: chrono::DateTime<Utc>,
    /// Latest event
    pub updated_at: chrono::DateTime<Utc>,
}

/// Counters for one meal slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlotSummary {
    /// Meal slot
    pub meal_slot: MealSlot,
    /// Medication confirmations
    pub medication_count: i64,
    /// Symptom alerts
    pub symptom_count: i64,
}

impl SlotSummary {
    fn empty(meal_slot: MealSlot) -> Self {
        Self {
            meal_slot,
            medication_count: 0,
            symptom_count: 0,
        }
    }

    /// Zero-filled entries for every slot in canonical order
    pub fn zeroed() -> [SlotSummary; 3] {
        MealSlot::ALL.map(Self::empty)
    }
}

/// Three-slot summary of one day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailySummary {
    /// User
    pub user_id: String,
    /// Date
    pub log_date: NaiveDate,
    /// Morning, lunch, dinner
    pub slots: [SlotSummary; 3],
}

/// Days of a month that have at least one log row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlySummary {
    /// User
    pub user_id: String,
    /// Year
    pub year: i32,
    /// Month (1-12)
    pub month: u32,
    /// Per-slot totals over the month
    pub totals: [SlotSummary; 3],
    /// Per-day breakdown, ordered by date
    pub days: Vec<DaySummary>,
}

/// One day inside a [`MonthlySummary`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DaySummary {
    /// Date
    pub log_date: NaiveDate,
    /// Morning, lunch, dinner
    pub slots: [SlotSummary; 3],
}

#[derive(Debug, Clone, Copy)]
enum Counter {
    Medication,
    Symptom,
}

impl Counter {
    fn deltas(self) -> (i64, i64) {
        match self {
            Self::Medication => (1, 0),
            Self::Symptom => (0, 1),
        }
    }
}

/// Daily aggregation engine
#[derive(Debug, Clone)]
pub struct DailyLogEngine {
    pool: SqlitePool,
    withdrawn: WithdrawnDataPolicy,
}

impl DailyLogEngine {
    /// Create the engine on an existing pool
    ///
    /// Creates the `daily_health_log` table if missing. The
    /// `(user_id, log_date, meal_slot)` key is a table constraint.
    pub async fn new(pool: SqlitePool, withdrawn: WithdrawnDataPolicy) -> Result<Self> {
        let engine = Self { pool, withdrawn };
        engine.init_schema().await?;
        Ok(engine)
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS daily_health_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                log_date TEXT NOT NULL,
                meal_slot TEXT NOT NULL CHECK (meal_slot IN ('morning', 'lunch', 'dinner')),
                medication_count INTEGER NOT NULL DEFAULT 0 CHECK (medication_count >= 0),
                symptom_count INTEGER NOT NULL DEFAULT 0 CHECK (symptom_count >= 0),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE (user_id, log_date, meal_slot)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            CareError::Database(format!("failed to create daily_health_log table: {}", e))
        })?;

        debug!("daily health log schema initialized");
        Ok(())
    }

    /// Count a medication confirmation for (user, date, slot)
    pub async fn record_medication_event(
        &self,
        user_id: &str,
        date: NaiveDate,
        meal_slot: MealSlot,
    ) -> Result<DailyHealthLog> {
        self.increment(user_id, date, meal_slot, Counter::Medication)
            .await
    }

    /// Count a symptom alert for (user, date, slot)
    pub async fn record_symptom_event(
        &self,
        user_id: &str,
        date: NaiveDate,
        meal_slot: MealSlot,
    ) -> Result<DailyHealthLog> {
        self.increment(user_id, date, meal_slot, Counter::Symptom)
            .await
    }

    async fn increment(
        &self,
        user_id: &str,
        date: NaiveDate,
        meal_slot: MealSlot,
        counter: Counter,
    ) -> Result<DailyHealthLog> {
        let (medication, symptom) = counter.deltas();
        let now = timestamp(Utc::now());

        let sql = format!(
            r#"
            INSERT INTO daily_health_log
                (user_id, log_date, meal_slot, medication_count, symptom_count, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (user_id, log_date, meal_slot) DO UPDATE SET
                medication_count = medication_count + excluded.medication_count,
                symptom_count = symptom_count + excluded.symptom_count,
                updated_at = excluded.updated_at
            RETURNING {}
            "#,
            LOG_COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(user_id)
            .bind(format_date(date))
            .bind(meal_slot.as_str())
            .bind(medication)
            .bind(symptom)
            .bind(&now)
            .bind(&now)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!(
                    user_id = %user_id,
                    log_date = %date,
                    meal_slot = %meal_slot,
                    counter = ?counter,
                    error = %e,
                    "failed to update daily health log"
                );
                CareError::Database(format!("failed to update daily health log: {}", e))
            })?;

        let log = row_to_log(&row)?;
        debug!(
            user_id = %user_id,
            log_date = %date,
            meal_slot = %meal_slot,
            medication_count = log.medication_count,
            symptom_count = log.symptom_count,
            "daily health log updated"
        );
        Ok(log)
    }

    /// Stored row for (user, date, slot), if any
    pub async fn get(
        &self,
        user_id: &str,
        date: NaiveDate,
        meal_slot: MealSlot,
    ) -> Result<Option<DailyHealthLog>> {
        let sql = format!(
            "SELECT {} FROM daily_health_log WHERE user_id = ? AND log_date = ? AND meal_slot = ?",
            LOG_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(user_id)
            .bind(format_date(date))
            .bind(meal_slot.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CareError::Database(format!("failed to query daily health log: {}", e)))?;

        row.as_ref().map(row_to_log).transpose()
    }

    /// Three-slot summary of one day
    ///
    /// Pure read: slots without a row are zero-filled, nothing is created.
    pub async fn daily_summary(&self, user_id: &str, date: NaiveDate) -> Result<DailySummary> {
        let day = format_date(date);
        let rows = self.fetch_range(user_id, &day, &day).await?;

        let mut slots = SlotSummary::zeroed();
        for (_, slot) in rows {
            slots[slot.meal_slot.index()] = slot;
        }

        Ok(DailySummary {
            user_id: user_id.to_string(),
            log_date: date,
            slots,
        })
    }

    /// Per-slot totals and per-day breakdown for one month
    pub async fn monthly_summary(
        &self,
        user_id: &str,
        year: i32,
        month: u32,
    ) -> Result<MonthlySummary> {
        let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
            CareError::validation(format!("invalid month {:04}-{:02}", year, month))
        })?;
        let last = last_day_of_month(first);

        let rows = self
            .fetch_range(user_id, &format_date(first), &format_date(last))
            .await?;

        let mut totals = SlotSummary::zeroed();
        let mut days: Vec<DaySummary> = Vec::new();

        for (date, slot) in rows {
            let total = &mut totals[slot.meal_slot.index()];
            total.medication_count += slot.medication_count;
            total.symptom_count += slot.symptom_count;

            match days.last_mut() {
                Some(day) if day.log_date == date => day.slots[slot.meal_slot.index()] = slot,
                _ => {
                    let mut slots = SlotSummary::zeroed();
                    slots[slot.meal_slot.index()] = slot;
                    days.push(DaySummary {
                        log_date: date,
                        slots,
                    });
                }
            }
        }

        Ok(MonthlySummary {
            user_id: user_id.to_string(),
            year,
            month,
            totals,
            days,
        })
    }

    /// Rows between two dates inclusive, ordered by date
    async fn fetch_range(
        &self,
        user_id: &str,
        from: &str,
        to: &str,
    ) -> Result<Vec<(NaiveDate, SlotSummary)>> {
        let mut sql = String::from(
            "SELECT d.log_date, d.meal_slot, d.medication_count, d.symptom_count \
             FROM daily_health_log d \
             WHERE d.user_id = ? AND d.log_date BETWEEN ? AND ?",
        );
        if self.withdrawn.hides_withdrawn() {
            sql.push_str(
                " AND EXISTS (SELECT 1 FROM users u WHERE u.user_id = d.user_id AND u.delyn = 'N')",
            );
        }
        sql.push_str(" ORDER BY d.log_date");

        let rows = sqlx::query(&sql)
            .bind(user_id)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!(user_id = %user_id, from, to, error = %e, "failed to read daily health log");
                CareError::Database(format!("failed to read daily health log: {}", e))
            })?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let date: String = row.get("log_date");
            let slot: String = row.get("meal_slot");
            out.push((
                parse_date(&date),
                SlotSummary {
                    meal_slot: MealSlot::from_stored(&slot)?,
                    medication_count: row.get("medication_count"),
                    symptom_count: row.get("symptom_count"),
                },
            ));
        }
        Ok(out)
    }
}

fn last_day_of_month(first: NaiveDate) -> NaiveDate {
    let (year, month) = if first.month() == 12 {
        (first.year() + 1, 1)
    } else {
        (first.year(), first.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|next| next.pred_opt())
        .unwrap_or(first)
}

fn row_to_log(row: &SqliteRow) -> Result<DailyHealthLog> {
    let log_date: String = row.get("log_date");
    let meal_slot: String = row.get("meal_slot");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(DailyHealthLog {
        id: row.get("id"),
        user_id: row.get("user_id"),
        log_date: parse_date(&log_date),
        meal_slot: MealSlot::from_stored(&meal_slot)?,
        medication_count: row.get("medication_count"),
        symptom_count: row.get("symptom_count"),
        created_at: parse_timestamp(&created_at),
        updated_at: parse_timestamp(&updated_at),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediguard_auth::db::memory_pool;

    async fn engine() -> DailyLogEngine {
        DailyLogEngine::new(memory_pool().await.unwrap(), WithdrawnDataPolicy::Retain)
            .await
            .unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn row_count(engine: &DailyLogEngine) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM daily_health_log")
            .fetch_one(&engine.pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_first_medication_event_creates_row() {
        let engine = engine().await;
        let log = engine
            .record_medication_event("alice", date(2025, 5, 1), MealSlot::Morning)
            .await
            .unwrap();

        assert_eq!(log.medication_count, 1);
        assert_eq!(log.symptom_count, 0);
        assert_eq!(log.log_date, date(2025, 5, 1));
        assert_eq!(log.meal_slot, MealSlot::Morning);
    }

    #[tokio::test]
    async fn test_first_symptom_event_creates_row() {
        let engine = engine().await;
        let log = engine
            .record_symptom_event("alice", date(2025, 5, 1), MealSlot::Dinner)
            .await
            .unwrap();

        assert_eq!(log.medication_count, 0);
        assert_eq!(log.symptom_count, 1);
    }

    #[tokio::test]
    async fn test_mixed_sequence_keeps_one_row() {
        let engine = engine().await;
        let day = date(2025, 5, 1);

        let mut last = None;
        for i in 0..7 {
            last = Some(if i % 3 == 0 {
                engine
                    .record_symptom_event("alice", day, MealSlot::Lunch)
                    .await
                    .unwrap()
            } else {
                engine
                    .record_medication_event("alice", day, MealSlot::Lunch)
                    .await
                    .unwrap()
            });
        }

        let last = last.unwrap();
        assert_eq!(last.symptom_count, 3);
        assert_eq!(last.medication_count, 4);
        assert_eq!(row_count(&engine).await, 1);

        let stored = engine.get("alice", day, MealSlot::Lunch).await.unwrap().unwrap();
        assert_eq!(stored, last);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let engine = engine().await;
        let day = date(2025, 5, 1);

        engine
            .record_medication_event("alice", day, MealSlot::Morning)
            .await
            .unwrap();
        engine
            .record_medication_event("alice", day, MealSlot::Lunch)
            .await
            .unwrap();
        engine
            .record_medication_event("bob", day, MealSlot::Morning)
            .await
            .unwrap();
        engine
            .record_medication_event("alice", date(2025, 5, 2), MealSlot::Morning)
            .await
            .unwrap();

        assert_eq!(row_count(&engine).await, 4);
    }

    #[tokio::test]
    async fn test_daily_summary_zero_filled_and_pure() {
        let engine = engine().await;
        let day = date(2025, 5, 1);

        let summary = engine.daily_summary("alice", day).await.unwrap();
        assert_eq!(summary.slots, SlotSummary::zeroed());
        assert_eq!(
            summary.slots.map(|s| s.meal_slot),
            [MealSlot::Morning, MealSlot::Lunch, MealSlot::Dinner]
        );
        assert_eq!(row_count(&engine).await, 0);

        engine
            .record_symptom_event("alice", day, MealSlot::Dinner)
            .await
            .unwrap();
        let first = engine.daily_summary("alice", day).await.unwrap();
        let second = engine.daily_summary("alice", day).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.slots[2].symptom_count, 1);
        assert_eq!(first.slots[0].symptom_count, 0);
        assert_eq!(row_count(&engine).await, 1);
    }

    #[tokio::test]
    async fn test_monthly_summary() {
        let engine = engine().await;

        engine
            .record_medication_event("alice", date(2025, 2, 1), MealSlot::Morning)
            .await
            .unwrap();
        engine
            .record_medication_event("alice", date(2025, 2, 1), MealSlot::Dinner)
            .await
            .unwrap();
        engine
            .record_symptom_event("alice", date(2025, 2, 28), MealSlot::Morning)
            .await
            .unwrap();
        engine
            .record_medication_event("alice", date(2025, 2, 28), MealSlot::Morning)
            .await
            .unwrap();
        // Outside the month
        engine
            .record_medication_event("alice", date(2025, 3, 1), MealSlot::Morning)
            .await
            .unwrap();
        engine
            .record_medication_event("alice", date(2025, 1, 31), MealSlot::Morning)
            .await
            .unwrap();

        let summary = engine.monthly_summary("alice", 2025, 2).await.unwrap();
        assert_eq!(summary.days.len(), 2);
        assert_eq!(summary.days[0].log_date, date(2025, 2, 1));
        assert_eq!(summary.days[1].log_date, date(2025, 2, 28));
        assert_eq!(summary.days[0].slots[2].medication_count, 1);
        assert_eq!(summary.days[0].slots[1].medication_count, 0);

        assert_eq!(summary.totals[0].medication_count, 2);
        assert_eq!(summary.totals[0].symptom_count, 1);
        assert_eq!(summary.totals[1].medication_count, 0);
        assert_eq!(summary.totals[2].medication_count, 1);
    }

    #[tokio::test]
    async fn test_monthly_summary_december() {
        let engine = engine().await;
        engine
            .record_medication_event("alice", date(2024, 12, 31), MealSlot::Lunch)
            .await
            .unwrap();

        let summary = engine.monthly_summary("alice", 2024, 12).await.unwrap();
        assert_eq!(summary.days.len(), 1);
        assert_eq!(summary.totals[1].medication_count, 1);
    }

    #[tokio::test]
    async fn test_monthly_summary_invalid_month() {
        let engine = engine().await;
        let err = engine.monthly_summary("alice", 2025, 13).await.unwrap_err();
        assert!(matches!(err, CareError::Validation(_)));
    }

    #[test]
    fn test_last_day_of_month() {
        assert_eq!(last_day_of_month(date(2024, 2, 1)), date(2024, 2, 29));
        assert_eq!(last_day_of_month(date(2025, 2, 1)), date(2025, 2, 28));
        assert_eq!(last_day_of_month(date(2025, 12, 1)), date(2025, 12, 31));
    }
}
