//! Confirmation and alert flows over a shared database

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mediguard_auth::db::memory_pool;
use mediguard_auth::test_utils::{TEST_PASSWORD, test_candidate, test_service};
use mediguard_auth::{CredentialService, LocalUserStore, UserStore};
use mediguard_care::{
    Care, CareError, CareOptions, DeliveryReceipt, DeliveryStatus, LocalCalendar, MealSlot,
    MedicationStatus, NewMedication, NotificationDispatcher, PushMessage,
};
use mediguard_config::{FanOut, WithdrawnDataPolicy};

/// Records every dispatch and acknowledges each token
#[derive(Default)]
struct RecordingDispatcher {
    sent: Mutex<Vec<(Vec<String>, PushMessage)>>,
}

#[async_trait]
impl NotificationDispatcher for RecordingDispatcher {
    async fn dispatch(
        &self,
        tokens: &[String],
        message: &PushMessage,
    ) -> mediguard_care::Result<Vec<DeliveryReceipt>> {
        self.sent
            .lock()
            .unwrap()
            .push((tokens.to_vec(), message.clone()));
        Ok(tokens
            .iter()
            .map(|t| DeliveryReceipt {
                token: t.clone(),
                status: DeliveryStatus::Ok,
                ticket_id: Some(format!("ticket-{}", t)),
                message: None,
            })
            .collect())
    }
}

/// Always fails
struct BrokenDispatcher;

#[async_trait]
impl NotificationDispatcher for BrokenDispatcher {
    async fn dispatch(
        &self,
        _tokens: &[String],
        _message: &PushMessage,
    ) -> mediguard_care::Result<Vec<DeliveryReceipt>> {
        Err(CareError::Database("push backend down".to_string()))
    }
}

struct Harness {
    credentials: CredentialService,
    care: Care,
}

async fn harness(
    dispatcher: Arc<dyn NotificationDispatcher>,
    fan_out: FanOut,
    withdrawn: WithdrawnDataPolicy,
) -> Harness {
    let pool = memory_pool().await.unwrap();
    let store = LocalUserStore::new(pool.clone()).await.unwrap();
    let users: Arc<dyn UserStore> = Arc::new(store.clone());
    let care = Care::new(
        pool,
        users,
        dispatcher,
        CareOptions {
            calendar: LocalCalendar::utc(),
            withdrawn,
            fan_out,
        },
    )
    .await
    .unwrap();

    Harness {
        credentials: test_service(store),
        care,
    }
}

fn aspirin() -> NewMedication {
    NewMedication {
        name: "Aspirin".to_string(),
        dosage: "100mg".to_string(),
        times_per_day: 1,
        duration_days: 30,
    }
}

#[tokio::test]
async fn test_end_to_end_scenario() {
    let h = harness(
        Arc::new(RecordingDispatcher::default()),
        FanOut::AllRegistered,
        WithdrawnDataPolicy::Retain,
    )
    .await;

    h.credentials.register(&test_candidate("alice")).await.unwrap();
    let login = h.credentials.authenticate("alice", TEST_PASSWORD).await.unwrap();
    assert!(login.first_login);
    let user = h.credentials.verify(&login.token).await.unwrap();

    h.care
        .catalog
        .register_medication(&user.user_id, &aspirin())
        .await
        .unwrap();

    let confirmation = h
        .care
        .confirmations
        .confirm(&user.user_id, "Aspirin", "morning")
        .await
        .unwrap();
    assert_eq!(confirmation.daily_log.medication_count, 1);
    assert_eq!(confirmation.daily_log.symptom_count, 0);
    assert_eq!(confirmation.schedule_entry.status, MedicationStatus::Taken);
    assert_eq!(confirmation.schedule_entry.dosage, "100mg");
    assert!(confirmation.schedule_entry.taken_at.is_some());

    let alert = h
        .care
        .alerts
        .create_alert(&user.user_id, "dizziness", "morning")
        .await
        .unwrap();
    assert_eq!(alert.daily_log.id, confirmation.daily_log.id);
    assert_eq!(alert.daily_log.medication_count, 1);
    assert_eq!(alert.daily_log.symptom_count, 1);

    let today = LocalCalendar::utc().today();
    let summary = h.care.engine.daily_summary("alice", today).await.unwrap();
    let counts: Vec<_> = summary
        .slots
        .iter()
        .map(|s| (s.meal_slot, s.medication_count, s.symptom_count))
        .collect();
    assert_eq!(
        counts,
        vec![
            (MealSlot::Morning, 1, 1),
            (MealSlot::Lunch, 0, 0),
            (MealSlot::Dinner, 0, 0),
        ]
    );
}

#[tokio::test]
async fn test_confirm_unknown_medication() {
    let h = harness(
        Arc::new(RecordingDispatcher::default()),
        FanOut::AllRegistered,
        WithdrawnDataPolicy::Retain,
    )
    .await;
    h.credentials.register(&test_candidate("alice")).await.unwrap();

    let err = h
        .care
        .confirmations
        .confirm("alice", "Aspirin", "morning")
        .await
        .unwrap_err();
    assert!(matches!(err, CareError::NotFound(_)));

    let today = LocalCalendar::utc().today();
    assert!(h.care.catalog.list_schedule("alice", today).await.unwrap().is_empty());
    let summary = h.care.engine.daily_summary("alice", today).await.unwrap();
    assert!(summary.slots.iter().all(|s| s.medication_count == 0));
}

#[tokio::test]
async fn test_confirm_validation() {
    let h = harness(
        Arc::new(RecordingDispatcher::default()),
        FanOut::AllRegistered,
        WithdrawnDataPolicy::Retain,
    )
    .await;

    for (name, slot) in [("", "morning"), ("Aspirin", ""), ("Aspirin", "midnight")] {
        let err = h
            .care
            .confirmations
            .confirm("alice", name, slot)
            .await
            .unwrap_err();
        assert!(matches!(err, CareError::Validation(_)));
    }
}

#[tokio::test]
async fn test_fan_out_all_registered() {
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let h = harness(
        dispatcher.clone(),
        FanOut::AllRegistered,
        WithdrawnDataPolicy::Retain,
    )
    .await;

    for id in ["alice", "bob", "carol"] {
        h.credentials.register(&test_candidate(id)).await.unwrap();
    }
    h.credentials.register_push_token("alice", "tok-alice").await.unwrap();
    h.credentials.register_push_token("bob", "tok-bob").await.unwrap();
    h.credentials.register_push_token("carol", "tok-carol").await.unwrap();
    h.credentials.withdraw("carol").await.unwrap();

    h.care.catalog.register_medication("alice", &aspirin()).await.unwrap();
    let confirmation = h
        .care
        .confirmations
        .confirm("alice", "Aspirin", "lunch")
        .await
        .unwrap();
    assert_eq!(confirmation.receipts.len(), 2);

    let sent = dispatcher.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    let (tokens, message) = &sent[0];
    assert_eq!(tokens, &vec!["tok-alice".to_string(), "tok-bob".to_string()]);
    assert_eq!(message.title, "Medication taken");
    assert_eq!(message.body, "Alice took Aspirin (lunch)");
    assert_eq!(message.data["medication"], "Aspirin");
    assert_eq!(message.data["meal_slot"], "lunch");
}

#[tokio::test]
async fn test_fan_out_owner_only() {
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let h = harness(
        dispatcher.clone(),
        FanOut::OwnerOnly,
        WithdrawnDataPolicy::Retain,
    )
    .await;

    for id in ["alice", "bob"] {
        h.credentials.register(&test_candidate(id)).await.unwrap();
    }
    h.credentials.register_push_token("alice", "tok-alice").await.unwrap();
    h.credentials.register_push_token("bob", "tok-bob").await.unwrap();

    h.care.catalog.register_medication("alice", &aspirin()).await.unwrap();
    let confirmation = h
        .care
        .confirmations
        .confirm("alice", "Aspirin", "dinner")
        .await
        .unwrap();

    assert_eq!(confirmation.receipts.len(), 1);
    assert_eq!(confirmation.receipts[0].token, "tok-alice");
}

#[tokio::test]
async fn test_no_tokens_skips_dispatch() {
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let h = harness(
        dispatcher.clone(),
        FanOut::AllRegistered,
        WithdrawnDataPolicy::Retain,
    )
    .await;
    h.credentials.register(&test_candidate("alice")).await.unwrap();
    h.care.catalog.register_medication("alice", &aspirin()).await.unwrap();

    let confirmation = h
        .care
        .confirmations
        .confirm("alice", "Aspirin", "morning")
        .await
        .unwrap();
    assert!(confirmation.receipts.is_empty());
    assert!(dispatcher.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_dispatch_failure_keeps_confirmation() {
    let h = harness(
        Arc::new(BrokenDispatcher),
        FanOut::AllRegistered,
        WithdrawnDataPolicy::Retain,
    )
    .await;
    h.credentials.register(&test_candidate("alice")).await.unwrap();
    h.credentials.register_push_token("alice", "tok-alice").await.unwrap();
    h.care.catalog.register_medication("alice", &aspirin()).await.unwrap();

    let confirmation = h
        .care
        .confirmations
        .confirm("alice", "Aspirin", "morning")
        .await
        .unwrap();
    assert!(confirmation.receipts.is_empty());
    assert_eq!(confirmation.daily_log.medication_count, 1);

    let today = LocalCalendar::utc().today();
    assert_eq!(h.care.catalog.list_schedule("alice", today).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_withdrawn_data_retained_by_default() {
    let h = harness(
        Arc::new(RecordingDispatcher::default()),
        FanOut::AllRegistered,
        WithdrawnDataPolicy::Retain,
    )
    .await;
    h.credentials.register(&test_candidate("alice")).await.unwrap();
    h.care.alerts.create_alert("alice", "dizziness", "lunch").await.unwrap();
    h.credentials.withdraw("alice").await.unwrap();

    let today = LocalCalendar::utc().today();
    let summary = h.care.engine.daily_summary("alice", today).await.unwrap();
    assert_eq!(summary.slots[1].symptom_count, 1);
    assert_eq!(h.care.alerts.list_alerts(None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_withdrawn_data_hidden() {
    let h = harness(
        Arc::new(RecordingDispatcher::default()),
        FanOut::AllRegistered,
        WithdrawnDataPolicy::Hide,
    )
    .await;
    for id in ["alice", "bob"] {
        h.credentials.register(&test_candidate(id)).await.unwrap();
    }
    h.care.alerts.create_alert("alice", "dizziness", "lunch").await.unwrap();
    h.care.alerts.create_alert("bob", "fall", "lunch").await.unwrap();
    h.credentials.withdraw("alice").await.unwrap();

    let today = LocalCalendar::utc().today();
    let summary = h.care.engine.daily_summary("alice", today).await.unwrap();
    assert!(summary.slots.iter().all(|s| s.symptom_count == 0));

    let month = h
        .care
        .engine
        .monthly_summary("alice", chrono::Datelike::year(&today), chrono::Datelike::month(&today))
        .await
        .unwrap();
    assert!(month.days.is_empty());

    let alerts = h.care.alerts.list_alerts(None).await.unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].user_id, "bob");
    assert!(h.care.alerts.list_alerts(Some("alice")).await.unwrap().is_empty());

    // Revived account sees its history again
    h.credentials.register(&test_candidate("alice")).await.unwrap();
    let summary = h.care.engine.daily_summary("alice", today).await.unwrap();
    assert_eq!(summary.slots[1].symptom_count, 1);
}
