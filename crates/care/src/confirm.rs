//! Medication confirmation recorder
//!
//! A confirmation writes a taken schedule entry for today, counts it in the
//! daily health log and then notifies registered devices. Notification
//! failures are reported in the receipts and never undo the first two steps.

use std::sync::Arc;

use chrono::Utc;
use mediguard_auth::UserStore;
use mediguard_config::FanOut;
use serde::Serialize;
use tracing::{info, warn};

use crate::calendar::{LocalCalendar, format_date};
use crate::daily_log::{DailyHealthLog, DailyLogEngine};
use crate::error::{CareError, Result, require};
use crate::meal::{MealSlot, MedicationStatus};
use crate::medication::{MedicationCatalog, NewScheduleEntry, ScheduleEntry};
use crate::notify::{DeliveryReceipt, NotificationDispatcher, PushMessage};

/// Notification title for confirmations
pub const CONFIRMATION_TITLE: &str = "Medication taken";

/// Result of [`ConfirmationRecorder::confirm`]
#[derive(Debug, Clone, Serialize)]
pub struct Confirmation {
    /// Schedule entry created for the dose
    pub schedule_entry: ScheduleEntry,
    /// Daily health log row after the medication increment
    pub daily_log: DailyHealthLog,
    /// Delivery receipts from the dispatcher
    pub receipts: Vec<DeliveryReceipt>,
}

/// Medication confirmation recorder
#[derive(Clone)]
pub struct ConfirmationRecorder {
    catalog: MedicationCatalog,
    engine: DailyLogEngine,
    users: Arc<dyn UserStore>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    fan_out: FanOut,
    calendar: LocalCalendar,
}

impl std::fmt::Debug for ConfirmationRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfirmationRecorder")
            .field("fan_out", &self.fan_out)
            .field("calendar", &self.calendar)
            .finish_non_exhaustive()
    }
}

impl ConfirmationRecorder {
    /// Create a recorder
    pub fn new(
        catalog: MedicationCatalog,
        engine: DailyLogEngine,
        users: Arc<dyn UserStore>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        fan_out: FanOut,
        calendar: LocalCalendar,
    ) -> Self {
        Self {
            catalog,
            engine,
            users,
            dispatcher,
            fan_out,
            calendar,
        }
    }

    /// Confirm that `user_id` took `medication_name` in `meal_slot` today
    pub async fn confirm(
        &self,
        user_id: &str,
        medication_name: &str,
        meal_slot: &str,
    ) -> Result<Confirmation> {
        let medication_name = require("medication_name", medication_name)?;
        let meal_slot: MealSlot = require("meal_slot", meal_slot)?.parse()?;

        let medication = self
            .catalog
            .find_medication(user_id, medication_name)
            .await?
            .ok_or_else(|| CareError::not_found(format!("medication '{}'", medication_name)))?;

        let now = Utc::now();
        let today = self.calendar.date_of(now);

        let schedule_entry = self
            .catalog
            .record_schedule_entry(
                user_id,
                &NewScheduleEntry {
                    medication_name: medication.name.clone(),
                    dosage: medication.dosage.clone(),
                    scheduled_date: today,
                    meal_slot,
                    status: Some(MedicationStatus::Taken),
                    taken_at: Some(now),
                },
            )
            .await?;

        let daily_log = self
            .engine
            .record_medication_event(user_id, today, meal_slot)
            .await?;

        info!(
            user_id = %user_id,
            medication = %medication.name,
            meal_slot = %meal_slot,
            medication_count = daily_log.medication_count,
            "medication confirmed"
        );

        let receipts = self
            .notify(user_id, &medication.name, meal_slot, &format_date(today))
            .await;

        Ok(Confirmation {
            schedule_entry,
            daily_log,
            receipts,
        })
    }

    /// Best-effort notification; every failure ends up in the receipts or a log line
    async fn notify(
        &self,
        user_id: &str,
        medication: &str,
        meal_slot: MealSlot,
        log_date: &str,
    ) -> Vec<DeliveryReceipt> {
        let (tokens, display_name) = match self.recipients(user_id).await {
            Ok(r) => r,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "could not resolve notification recipients");
                return Vec::new();
            }
        };

        if tokens.is_empty() {
            return Vec::new();
        }

        let message = PushMessage {
            title: CONFIRMATION_TITLE.to_string(),
            body: format!("{} took {} ({})", display_name, medication, meal_slot),
            data: serde_json::json!({
                "user_id": user_id,
                "medication": medication,
                "meal_slot": meal_slot,
                "log_date": log_date,
            }),
        };

        match self.dispatcher.dispatch(&tokens, &message).await {
            Ok(receipts) => receipts,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "notification dispatch failed");
                Vec::new()
            }
        }
    }

    async fn recipients(&self, user_id: &str) -> Result<(Vec<String>, String)> {
        let owner = self.users.get_active(user_id).await?;
        let display_name = owner
            .as_ref()
            .map(|u| u.display_name.clone())
            .unwrap_or_else(|| user_id.to_string());

        let tokens = match self.fan_out {
            FanOut::AllRegistered => self.users.active_push_tokens().await?,
            FanOut::OwnerOnly => owner
                .and_then(|u| u.push_token)
                .filter(|t| !t.is_empty())
                .into_iter()
                .collect(),
        };

        Ok((tokens, display_name))
    }
}
