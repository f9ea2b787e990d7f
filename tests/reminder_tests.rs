use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use plantcare::clients::push::{PushError, PushGateway, SubscriptionTarget};
use plantcare::config::Config;
use plantcare::services::{PlantInput, Registration};
use plantcare::state::SharedState;
use serde_json::Value;

/// Records every message and answers 410 for endpoints containing "gone".
/// Endpoints containing "relay-down" fail as if the relay itself rejected them.
#[derive(Default)]
struct RecordingGateway {
    sent: Mutex<Vec<(String, Value)>>,
    delay: Option<std::time::Duration>,
}

impl RecordingGateway {
    fn sent(&self) -> Vec<(String, Value)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl PushGateway for RecordingGateway {
    async fn deliver(
        &self,
        target: &SubscriptionTarget,
        payload: &str,
    ) -> Result<Option<u16>, PushError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let body: Value = serde_json::from_str(payload).unwrap();
        self.sent
            .lock()
            .unwrap()
            .push((target.endpoint.clone(), body));

        if target.endpoint.contains("relay-down") {
            Err(PushError::Relay {
                status: 404,
                body: "no such route".to_string(),
            })
        } else if target.endpoint.contains("gone") {
            Ok(Some(410))
        } else if target.endpoint.contains("broken") {
            Ok(Some(500))
        } else {
            Ok(Some(201))
        }
    }
}

async fn setup() -> (SharedState, Arc<RecordingGateway>) {
    setup_with(RecordingGateway::default()).await
}

async fn setup_with(gateway: RecordingGateway) -> (SharedState, Arc<RecordingGateway>) {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;

    let gateway = Arc::new(gateway);
    let state = SharedState::with_gateway(config, gateway.clone())
        .await
        .expect("Failed to create state");

    (state, gateway)
}

async fn user(state: &SharedState, email: &str) -> i32 {
    state
        .auth_service
        .register(Registration {
            email: email.to_string(),
            password: "hunter22".to_string(),
            firstname: "Test".to_string(),
            lastname: None,
        })
        .await
        .unwrap()
        .user
        .id
}

async fn plant(state: &SharedState, user_id: i32, name: &str, frequency: i32) -> i32 {
    state
        .plant_service
        .create_plant(
            user_id,
            PlantInput {
                name: name.to_string(),
                species: None,
                purchase_date: None,
                image_url: None,
                notes: None,
                location: None,
                water_amount_ml: 200,
                water_frequency_days: frequency,
            },
        )
        .await
        .unwrap()
        .id
}

async fn subscribe(state: &SharedState, user_id: i32, endpoint: &str) {
    state
        .notification_service
        .subscribe(user_id, endpoint, "BKey", "auth-secret")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_due_check_groups_plants_per_user() {
    let (state, gateway) = setup().await;

    let alice = user(&state, "alice@example.com").await;
    let mut due_ids = vec![
        plant(&state, alice, "Basil", 1).await,
        plant(&state, alice, "Mint", 2).await,
        plant(&state, alice, "Thyme", 3).await,
    ];
    plant(&state, alice, "Cactus", 30).await;
    plant(&state, alice, "Aloe", 30).await;
    subscribe(&state, alice, "https://push.example.com/alice").await;

    let summary = state
        .reminders
        .run_due_check(Utc::now() + Duration::days(5))
        .await
        .unwrap()
        .expect("run should not be skipped");

    assert_eq!(summary.users, 1);
    assert_eq!(summary.plants, 3);
    assert_eq!(summary.delivered, 1);

    let sent = gateway.sent();
    assert_eq!(sent.len(), 1);

    let (endpoint, message) = &sent[0];
    assert_eq!(endpoint, "https://push.example.com/alice");
    assert_eq!(message["body"], "3 plants need water");
    assert_eq!(message["data"]["type"], "watering_reminder");
    assert_eq!(message["data"]["plantCount"], 3);

    let mut sent_ids: Vec<i32> = message["data"]["plantIds"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| i32::try_from(v.as_i64().unwrap()).unwrap())
        .collect();
    sent_ids.sort_unstable();
    due_ids.sort_unstable();
    assert_eq!(sent_ids, due_ids);
}

#[tokio::test]
async fn test_single_due_plant_is_named() {
    let (state, gateway) = setup().await;

    let alice = user(&state, "alice@example.com").await;
    plant(&state, alice, "Basil", 1).await;
    subscribe(&state, alice, "https://push.example.com/alice").await;

    state
        .reminders
        .run_due_check(Utc::now() + Duration::days(2))
        .await
        .unwrap();

    let sent = gateway.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1["body"], "Basil needs water");
}

#[tokio::test]
async fn test_nothing_due_sends_nothing() {
    let (state, gateway) = setup().await;

    let alice = user(&state, "alice@example.com").await;
    plant(&state, alice, "Cactus", 30).await;
    subscribe(&state, alice, "https://push.example.com/alice").await;

    let summary = state
        .reminders
        .run_due_check(Utc::now())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(summary.users, 0);
    assert!(gateway.sent().is_empty());
}

#[tokio::test]
async fn test_gone_subscriptions_are_pruned() {
    let (state, gateway) = setup().await;

    let bob = user(&state, "bob@example.com").await;
    plant(&state, bob, "Fern", 1).await;
    subscribe(&state, bob, "https://push.example.com/gone").await;
    subscribe(&state, bob, "https://push.example.com/broken").await;
    subscribe(&state, bob, "https://push.example.com/phone").await;

    let summary = state
        .reminders
        .run_due_check(Utc::now() + Duration::days(3))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(summary.delivered, 1);
    assert_eq!(summary.pruned, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(gateway.sent().len(), 3);

    let remaining: Vec<String> = state
        .notification_service
        .list_subscriptions(bob)
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.endpoint)
        .collect();

    assert_eq!(remaining.len(), 2);
    assert!(!remaining.iter().any(|e| e.contains("gone")));
}

#[tokio::test]
async fn test_relay_errors_fail_without_pruning() {
    let (state, _gateway) = setup().await;

    let dana = user(&state, "dana@example.com").await;
    plant(&state, dana, "Orchid", 1).await;
    subscribe(&state, dana, "https://push.example.com/relay-down").await;

    let summary = state
        .reminders
        .run_due_check(Utc::now() + Duration::days(2))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.pruned, 0);

    let remaining = state
        .notification_service
        .list_subscriptions(dana)
        .await
        .unwrap();
    assert_eq!(remaining.len(), 1);
}

#[tokio::test]
async fn test_users_without_subscriptions_are_counted_but_not_sent() {
    let (state, gateway) = setup().await;

    let carol = user(&state, "carol@example.com").await;
    plant(&state, carol, "Ivy", 1).await;

    let summary = state
        .reminders
        .run_due_check(Utc::now() + Duration::days(2))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(summary.users, 1);
    assert_eq!(summary.delivered, 0);
    assert!(gateway.sent().is_empty());
}

#[tokio::test]
async fn test_daily_digest_includes_plants_due_within_a_day() {
    let (state, gateway) = setup().await;

    let alice = user(&state, "alice@example.com").await;
    plant(&state, alice, "Basil", 1).await;
    plant(&state, alice, "Cactus", 30).await;
    subscribe(&state, alice, "https://push.example.com/alice").await;

    // Basil falls due tomorrow; a plain due check finds nothing yet.
    let due = state
        .reminders
        .run_due_check(Utc::now())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(due.plants, 0);

    let digest = state
        .reminders
        .run_daily_digest(Utc::now() + Duration::minutes(1))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(digest.plants, 1);

    let sent = gateway.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1["data"]["type"], "daily_reminder");
    assert_eq!(sent[0].1["body"], "1 plant to check today");
}

fn slow_gateway() -> RecordingGateway {
    RecordingGateway {
        delay: Some(std::time::Duration::from_millis(50)),
        ..RecordingGateway::default()
    }
}

#[tokio::test]
async fn test_overlapping_due_checks_are_skipped() {
    let (state, gateway) = setup_with(slow_gateway()).await;

    let alice = user(&state, "alice@example.com").await;
    plant(&state, alice, "Basil", 1).await;
    subscribe(&state, alice, "https://push.example.com/alice").await;

    let now = Utc::now() + Duration::days(2);
    let (first, second) = tokio::join!(
        state.reminders.run_due_check(now),
        state.reminders.run_due_check(now),
    );

    let results = [first.unwrap(), second.unwrap()];
    assert_eq!(results.iter().filter(|r| r.is_some()).count(), 1);
    assert_eq!(gateway.sent().len(), 1);

    let ran = state.reminders.run_due_check(now).await.unwrap();
    assert!(ran.is_some());
    assert_eq!(gateway.sent().len(), 2);
}

#[tokio::test]
async fn test_due_check_and_digest_run_side_by_side() {
    let (state, gateway) = setup_with(slow_gateway()).await;

    let alice = user(&state, "alice@example.com").await;
    plant(&state, alice, "Basil", 1).await;
    subscribe(&state, alice, "https://push.example.com/alice").await;

    let now = Utc::now() + Duration::days(2);
    let (due, digest) = tokio::join!(
        state.reminders.run_due_check(now),
        state.reminders.run_daily_digest(now),
    );

    assert_eq!(due.unwrap().unwrap().delivered, 1);
    assert_eq!(digest.unwrap().unwrap().delivered, 1);

    let mut kinds: Vec<String> = gateway
        .sent()
        .iter()
        .map(|(_, m)| m["data"]["type"].as_str().unwrap().to_string())
        .collect();
    kinds.sort();
    assert_eq!(kinds, ["daily_reminder", "watering_reminder"]);
}

#[tokio::test]
async fn test_test_notification_reaches_every_subscription() {
    let (state, gateway) = setup().await;

    let alice = user(&state, "alice@example.com").await;
    subscribe(&state, alice, "https://push.example.com/laptop").await;
    subscribe(&state, alice, "https://push.example.com/phone").await;

    let reports = state.notification_service.send_test(alice).await.unwrap();
    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| r.is_delivered()));

    let sent = gateway.sent();
    assert!(sent.iter().all(|(_, m)| m["data"]["type"] == "test"));
}
