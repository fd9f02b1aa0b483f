//! MediGuard - Care Records
//!
//! Medication catalog and schedule, the daily health log aggregation
//! engine, and the recorders that feed it.
//!
//! # Data flow
//!
//! ```text
//! confirm ──► schedule entry ──► DailyLogEngine::record_medication_event ──► notify
//! alert   ──► health_alerts  ──► DailyLogEngine::record_symptom_event
//! ```
//!
//! Callers hand in an already verified user id; nothing here sees tokens.

mod alerts;
mod calendar;
mod confirm;
mod daily_log;
mod error;
mod meal;
mod medication;
mod notify;

use std::sync::Arc;

use mediguard_auth::UserStore;
use mediguard_config::{FanOut, WithdrawnDataPolicy};
use sqlx::sqlite::SqlitePool;

pub use alerts::{AlertRecord, HealthAlert, HealthAlertRecorder};
pub use calendar::LocalCalendar;
pub use confirm::{CONFIRMATION_TITLE, Confirmation, ConfirmationRecorder};
pub use daily_log::{
    DailyHealthLog, DailyLogEngine, DailySummary, DaySummary, MonthlySummary, SlotSummary,
};
pub use error::{CareError, Result};
pub use meal::{MealSlot, MedicationStatus};
pub use medication::{
    MealTimes, MealTimesUpdate, Medication, MedicationCatalog, NewMedication, NewScheduleEntry,
    ScheduleEntry,
};
pub use notify::{
    DeliveryReceipt, DeliveryStatus, ExpoPushDispatcher, LogDispatcher, NotificationDispatcher,
    PushMessage, dispatcher_from_config,
};

/// Settings shared by the care components
#[derive(Debug, Clone, Copy)]
pub struct CareOptions {
    /// Calendar used for "today" and alert dates
    pub calendar: LocalCalendar,
    /// Treatment of rows owned by withdrawn users
    pub withdrawn: WithdrawnDataPolicy,
    /// Recipients of confirmation notifications
    pub fan_out: FanOut,
}

impl Default for CareOptions {
    fn default() -> Self {
        Self {
            calendar: LocalCalendar::utc(),
            withdrawn: WithdrawnDataPolicy::Retain,
            fan_out: FanOut::AllRegistered,
        }
    }
}

/// All care components over one database
#[derive(Debug, Clone)]
pub struct Care {
    /// Daily health log aggregation
    pub engine: DailyLogEngine,
    /// Medications, schedule and meal times
    pub catalog: MedicationCatalog,
    /// Health alerts
    pub alerts: HealthAlertRecorder,
    /// Medication confirmations
    pub confirmations: ConfirmationRecorder,
    /// Calendar used for "today"
    pub calendar: LocalCalendar,
}

impl Care {
    /// Create every component and its tables
    pub async fn new(
        pool: SqlitePool,
        users: Arc<dyn UserStore>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        options: CareOptions,
    ) -> Result<Self> {
        let engine = DailyLogEngine::new(pool.clone(), options.withdrawn).await?;
        let catalog = MedicationCatalog::new(pool.clone()).await?;
        let alerts = HealthAlertRecorder::new(
            pool,
            engine.clone(),
            options.calendar,
            options.withdrawn,
        )
        .await?;
        let confirmations = ConfirmationRecorder::new(
            catalog.clone(),
            engine.clone(),
            users,
            dispatcher,
            options.fan_out,
            options.calendar,
        );

        Ok(Self {
            engine,
            catalog,
            alerts,
            confirmations,
            calendar: options.calendar,
        })
    }
}
