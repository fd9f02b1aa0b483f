//! Medication catalog, dose schedule and meal reminder times
//!
//! Medications are registered from prescription capture; schedule entries
//! record individual doses; meal times hold each user's three reminder
//! times.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use tracing::{debug, info};

use crate::calendar::{format_date, parse_date, parse_timestamp, timestamp};
use crate::error::{CareError, Result, require};
use crate::meal::{MealSlot, MedicationStatus};

const MEDICATION_COLUMNS: &str =
    "id, user_id, name, dosage, times_per_day, duration_days, created_at";

const SCHEDULE_COLUMNS: &str =
    "id, user_id, medication_name, dosage, scheduled_date, meal_slot, status, taken_at, created_at";

/// Prescribed medication
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Medication {
    /// Row ID
    pub id: i64,
    /// Owning user
    pub user_id: String,
    /// Medication name
    pub name: String,
    /// Dosage text (e.g. "1 tablet")
    pub dosage: String,
    /// Doses per day
    pub times_per_day: i64,
    /// Prescription length in days
    pub duration_days: i64,
    /// When registered
    pub created_at: DateTime<Utc>,
}

/// Medication registration input
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewMedication {
    /// Medication name
    pub name: String,
    /// Dosage text
    pub dosage: String,
    /// Doses per day
    pub times_per_day: i64,
    /// Prescription length in days
    pub duration_days: i64,
}

/// One dose occurrence
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleEntry {
    /// Row ID
    pub id: i64,
    /// Owning user
    pub user_id: String,
    /// Medication name
    pub medication_name: String,
    /// Dosage copied from the medication
    pub dosage: String,
    /// Scheduled date
    pub scheduled_date: NaiveDate,
    /// Meal slot
    pub meal_slot: MealSlot,
    /// Dose status
    pub status: MedicationStatus,
    /// When the dose was taken
    pub taken_at: Option<DateTime<Utc>>,
    /// When recorded
    pub created_at: DateTime<Utc>,
}

/// Schedule entry input
#[derive(Debug, Clone, Deserialize)]
pub struct NewScheduleEntry {
    /// Medication name
    #[serde(default)]
    pub medication_name: String,
    /// Dosage text
    #[serde(default)]
    pub dosage: String,
    /// Scheduled date
    pub scheduled_date: NaiveDate,
    /// Meal slot
    pub meal_slot: MealSlot,
    /// Status (defaults to not taken)
    #[serde(default)]
    pub status: Option<MedicationStatus>,
    /// When taken
    #[serde(default)]
    pub taken_at: Option<DateTime<Utc>>,
}

/// Reminder times (`HH:MM`) for the three meal slots
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MealTimes {
    /// Morning reminder
    pub morning: Option<String>,
    /// Lunch reminder
    pub lunch: Option<String>,
    /// Dinner reminder
    pub dinner: Option<String>,
}

impl MealTimes {
    fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("morning", &self.morning),
            ("lunch", &self.lunch),
            ("dinner", &self.dinner),
        ] {
            if let Some(v) = value
                && NaiveTime::parse_from_str(v, "%H:%M").is_err()
            {
                return Err(CareError::validation(format!(
                    "{} must be HH:MM, got '{}'",
                    field, v
                )));
            }
        }
        Ok(())
    }
}

/// Result of [`MedicationCatalog::set_meal_times`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MealTimesUpdate {
    /// The row did not exist before
    pub created: bool,
    /// Stored times after the update
    pub times: MealTimes,
}

/// Medication catalog and schedule store
#[derive(Debug, Clone)]
pub struct MedicationCatalog {
    pool: SqlitePool,
}

impl MedicationCatalog {
    /// Create the catalog on an existing pool
    pub async fn new(pool: SqlitePool) -> Result<Self> {
        let catalog = Self { pool };
        catalog.init_schema().await?;
        Ok(catalog)
    }

    async fn init_schema(&self) -> Result<()> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS medications (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                dosage TEXT NOT NULL,
                times_per_day INTEGER NOT NULL,
                duration_days INTEGER NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_medications_user ON medications(user_id, name)",
            r#"
            CREATE TABLE IF NOT EXISTS medication_schedule (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                medication_name TEXT NOT NULL,
                dosage TEXT NOT NULL,
                scheduled_date TEXT NOT NULL,
                meal_slot TEXT NOT NULL CHECK (meal_slot IN ('morning', 'lunch', 'dinner')),
                status TEXT NOT NULL DEFAULT 'n' CHECK (status IN ('y', 'n', 'm')),
                taken_at TEXT,
                created_at TEXT NOT NULL
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_schedule_user_date \
             ON medication_schedule(user_id, scheduled_date)",
            r#"
            CREATE TABLE IF NOT EXISTS meal_times (
                user_id TEXT PRIMARY KEY,
                morning TEXT,
                lunch TEXT,
                dinner TEXT,
                updated_at TEXT NOT NULL
            )
            "#,
        ];

        for sql in statements {
            sqlx::query(sql)
                .execute(&self.pool)
                .await
                .map_err(|e| CareError::Database(format!("failed to create schema: {}", e)))?;
        }

        debug!("medication schema initialized");
        Ok(())
    }

    // =========================================================================
    // Medications
    // =========================================================================

    /// Register a medication for a user
    pub async fn register_medication(&self, user_id: &str, med: &NewMedication) -> Result<i64> {
        let name = require("name", &med.name)?;
        let dosage = require("dosage", &med.dosage)?;
        if med.times_per_day <= 0 {
            return Err(CareError::validation("times_per_day must be positive"));
        }
        if med.duration_days <= 0 {
            return Err(CareError::validation("duration_days must be positive"));
        }

        let result = sqlx::query(
            "INSERT INTO medications (user_id, name, dosage, times_per_day, duration_days, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(name)
        .bind(dosage)
        .bind(med.times_per_day)
        .bind(med.duration_days)
        .bind(timestamp(Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(|e| CareError::Database(format!("failed to register medication: {}", e)))?;

        let id = result.last_insert_rowid();
        info!(user_id = %user_id, medication = %name, id, "medication registered");
        Ok(id)
    }

    /// A user's medications, newest first
    pub async fn list_medications(&self, user_id: &str) -> Result<Vec<Medication>> {
        let sql = format!(
            "SELECT {} FROM medications WHERE user_id = ? ORDER BY id DESC",
            MEDICATION_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| CareError::Database(format!("failed to list medications: {}", e)))?;

        Ok(rows.iter().map(row_to_medication).collect())
    }

    /// Most recently registered medication with this name
    pub async fn find_medication(&self, user_id: &str, name: &str) -> Result<Option<Medication>> {
        let sql = format!(
            "SELECT {} FROM medications WHERE user_id = ? AND name = ? ORDER BY id DESC LIMIT 1",
            MEDICATION_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(user_id)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CareError::Database(format!("failed to query medication: {}", e)))?;

        Ok(row.as_ref().map(row_to_medication))
    }

    // =========================================================================
    // Schedule
    // =========================================================================

    /// Record a dose occurrence
    ///
    /// Status defaults to not taken. Does not touch the daily health log.
    pub async fn record_schedule_entry(
        &self,
        user_id: &str,
        entry: &NewScheduleEntry,
    ) -> Result<ScheduleEntry> {
        let medication_name = require("medication_name", &entry.medication_name)?;
        let dosage = require("dosage", &entry.dosage)?;
        let status = entry.status.unwrap_or_default();

        let sql = format!(
            "INSERT INTO medication_schedule \
             (user_id, medication_name, dosage, scheduled_date, meal_slot, status, taken_at, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING {}",
            SCHEDULE_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(user_id)
            .bind(medication_name)
            .bind(dosage)
            .bind(format_date(entry.scheduled_date))
            .bind(entry.meal_slot.as_str())
            .bind(status.code())
            .bind(entry.taken_at.map(timestamp))
            .bind(timestamp(Utc::now()))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| CareError::Database(format!("failed to record schedule entry: {}", e)))?;

        let entry = row_to_schedule(&row)?;
        debug!(
            user_id = %user_id,
            medication = %entry.medication_name,
            status = entry.status.code(),
            "schedule entry recorded"
        );
        Ok(entry)
    }

    /// Schedule entries for one date, by meal slot then insertion order
    pub async fn list_schedule(&self, user_id: &str, date: NaiveDate) -> Result<Vec<ScheduleEntry>> {
        let sql = format!(
            "SELECT {} FROM medication_schedule WHERE user_id = ? AND scheduled_date = ? \
             ORDER BY CASE meal_slot WHEN 'morning' THEN 0 WHEN 'lunch' THEN 1 ELSE 2 END, id",
            SCHEDULE_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .bind(format_date(date))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| CareError::Database(format!("failed to list schedule: {}", e)))?;

        rows.iter().map(row_to_schedule).collect()
    }

    // =========================================================================
    // Meal times
    // =========================================================================

    /// Create or update a user's reminder times
    ///
    /// Omitted slots keep their stored value on update.
    pub async fn set_meal_times(&self, user_id: &str, times: &MealTimes) -> Result<MealTimesUpdate> {
        times.validate()?;
        let now = timestamp(Utc::now());

        let updated = sqlx::query(
            "UPDATE meal_times SET morning = COALESCE(?, morning), lunch = COALESCE(?, lunch), \
             dinner = COALESCE(?, dinner), updated_at = ? WHERE user_id = ?",
        )
        .bind(&times.morning)
        .bind(&times.lunch)
        .bind(&times.dinner)
        .bind(&now)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| CareError::Database(format!("failed to update meal times: {}", e)))?
        .rows_affected()
            > 0;

        if !updated {
            sqlx::query(
                r#"
                INSERT INTO meal_times (user_id, morning, lunch, dinner, updated_at)
                VALUES (?, ?, ?, ?, ?)
                ON CONFLICT (user_id) DO UPDATE SET
                    morning = COALESCE(excluded.morning, morning),
                    lunch = COALESCE(excluded.lunch, lunch),
                    dinner = COALESCE(excluded.dinner, dinner),
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(user_id)
            .bind(&times.morning)
            .bind(&times.lunch)
            .bind(&times.dinner)
            .bind(&now)
            .execute(&self.pool)
            .await
            .map_err(|e| CareError::Database(format!("failed to save meal times: {}", e)))?;
        }

        let stored = self
            .meal_times(user_id)
            .await?
            .ok_or_else(|| CareError::not_found(format!("meal times for '{}'", user_id)))?;

        info!(user_id = %user_id, created = !updated, "meal times saved");
        Ok(MealTimesUpdate {
            created: !updated,
            times: stored,
        })
    }

    /// A user's reminder times, if set
    pub async fn meal_times(&self, user_id: &str) -> Result<Option<MealTimes>> {
        let row = sqlx::query("SELECT morning, lunch, dinner FROM meal_times WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CareError::Database(format!("failed to query meal times: {}", e)))?;

        Ok(row.map(|row| MealTimes {
            morning: row.get("morning"),
            lunch: row.get("lunch"),
            dinner: row.get("dinner"),
        }))
    }
}

fn row_to_medication(row: &SqliteRow) -> Medication {
    let created_at: String = row.get("created_at");
    Medication {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        dosage: row.get("dosage"),
        times_per_day: row.get("times_per_day"),
        duration_days: row.get("duration_days"),
        created_at: parse_timestamp(&created_at),
    }
}

fn row_to_schedule(row: &SqliteRow) -> Result<ScheduleEntry> {
    let scheduled_date: String = row.get("scheduled_date");
    let meal_slot: String = row.get("meal_slot");
    let status: String = row.get("status");
    let taken_at: Option<String> = row.get("taken_at");
    let created_at: String = row.get("created_at");

    Ok(ScheduleEntry {
        id: row.get("id"),
        user_id: row.get("user_id"),
        medication_name: row.get("medication_name"),
        dosage: row.get("dosage"),
        scheduled_date: parse_date(&scheduled_date),
        meal_slot: MealSlot::from_stored(&meal_slot)?,
        status: MedicationStatus::from_code(&status).ok_or_else(|| {
            CareError::Database(format!("unknown stored status code '{}'", status))
        })?,
        taken_at: taken_at.as_deref().map(parse_timestamp),
        created_at: parse_timestamp(&created_at),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediguard_auth::db::memory_pool;

    async fn catalog() -> MedicationCatalog {
        MedicationCatalog::new(memory_pool().await.unwrap())
            .await
            .unwrap()
    }

    fn aspirin() -> NewMedication {
        NewMedication {
            name: "Aspirin".to_string(),
            dosage: "100mg".to_string(),
            times_per_day: 3,
            duration_days: 7,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_register_and_list() {
        let catalog = catalog().await;
        let first = catalog.register_medication("alice", &aspirin()).await.unwrap();
        let mut tylenol = aspirin();
        tylenol.name = "Tylenol".to_string();
        let second = catalog.register_medication("alice", &tylenol).await.unwrap();
        assert!(second > first);

        let meds = catalog.list_medications("alice").await.unwrap();
        assert_eq!(meds.len(), 2);
        assert_eq!(meds[0].name, "Tylenol");
        assert!(catalog.list_medications("bob").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_register_validation() {
        let catalog = catalog().await;

        let mut med = aspirin();
        med.name = " ".to_string();
        assert!(matches!(
            catalog.register_medication("alice", &med).await.unwrap_err(),
            CareError::Validation(_)
        ));

        let mut med = aspirin();
        med.times_per_day = 0;
        assert!(catalog.register_medication("alice", &med).await.is_err());

        let mut med = aspirin();
        med.duration_days = -1;
        assert!(catalog.register_medication("alice", &med).await.is_err());
    }

    #[tokio::test]
    async fn test_find_medication_is_per_user() {
        let catalog = catalog().await;
        catalog.register_medication("alice", &aspirin()).await.unwrap();

        let found = catalog.find_medication("alice", "Aspirin").await.unwrap().unwrap();
        assert_eq!(found.dosage, "100mg");
        assert!(catalog.find_medication("bob", "Aspirin").await.unwrap().is_none());
        assert!(catalog.find_medication("alice", "aspirin").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_schedule_defaults_and_order() {
        let catalog = catalog().await;
        let day = date(2025, 5, 1);

        for slot in [MealSlot::Dinner, MealSlot::Morning, MealSlot::Lunch] {
            catalog
                .record_schedule_entry(
                    "alice",
                    &NewScheduleEntry {
                        medication_name: "Aspirin".to_string(),
                        dosage: "100mg".to_string(),
                        scheduled_date: day,
                        meal_slot: slot,
                        status: None,
                        taken_at: None,
                    },
                )
                .await
                .unwrap();
        }

        let entries = catalog.list_schedule("alice", day).await.unwrap();
        assert_eq!(
            entries.iter().map(|e| e.meal_slot).collect::<Vec<_>>(),
            vec![MealSlot::Morning, MealSlot::Lunch, MealSlot::Dinner]
        );
        assert!(entries.iter().all(|e| e.status == MedicationStatus::NotTaken));
        assert!(entries.iter().all(|e| e.taken_at.is_none()));
        assert!(catalog.list_schedule("alice", date(2025, 5, 2)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_schedule_entry_with_status() {
        let catalog = catalog().await;
        let taken_at = Utc::now();
        let entry = catalog
            .record_schedule_entry(
                "alice",
                &NewScheduleEntry {
                    medication_name: "Aspirin".to_string(),
                    dosage: "100mg".to_string(),
                    scheduled_date: date(2025, 5, 1),
                    meal_slot: MealSlot::Lunch,
                    status: Some(MedicationStatus::Failed),
                    taken_at: Some(taken_at),
                },
            )
            .await
            .unwrap();

        assert_eq!(entry.status, MedicationStatus::Failed);
        assert_eq!(
            entry.taken_at.map(|t| t.timestamp_micros()),
            Some(taken_at.timestamp_micros())
        );
    }

    #[tokio::test]
    async fn test_meal_times_create_then_update() {
        let catalog = catalog().await;
        assert!(catalog.meal_times("alice").await.unwrap().is_none());

        let created = catalog
            .set_meal_times(
                "alice",
                &MealTimes {
                    morning: Some("08:00".to_string()),
                    lunch: Some("12:30".to_string()),
                    dinner: Some("18:00".to_string()),
                },
            )
            .await
            .unwrap();
        assert!(created.created);

        let updated = catalog
            .set_meal_times(
                "alice",
                &MealTimes {
                    lunch: Some("13:00".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(!updated.created);
        assert_eq!(updated.times.morning.as_deref(), Some("08:00"));
        assert_eq!(updated.times.lunch.as_deref(), Some("13:00"));
    }

    #[tokio::test]
    async fn test_meal_times_validation() {
        let catalog = catalog().await;
        let err = catalog
            .set_meal_times(
                "alice",
                &MealTimes {
                    morning: Some("8am".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("morning"));
    }
}
