use chrono::{DateTime, Duration, Utc};
use plantcare::clients::push::DisabledPushGateway;
use plantcare::config::Config;
use plantcare::services::{
    PlantError, PlantInput, PlantUpdate, Registration, WateringError, WateringInput,
};
use plantcare::state::SharedState;
use std::sync::Arc;

async fn setup() -> (SharedState, i32) {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;

    let state = SharedState::with_gateway(config, Arc::new(DisabledPushGateway))
        .await
        .expect("Failed to create state");

    let user_id = state
        .auth_service
        .register(Registration {
            email: "gardener@example.com".to_string(),
            password: "hunter22".to_string(),
            firstname: "Gardener".to_string(),
            lastname: None,
        })
        .await
        .unwrap()
        .user
        .id;

    (state, user_id)
}

async fn plant(state: &SharedState, user_id: i32, frequency: i32) -> i32 {
    state
        .plant_service
        .create_plant(
            user_id,
            PlantInput {
                name: "Peace lily".to_string(),
                species: Some("Spathiphyllum".to_string()),
                purchase_date: None,
                image_url: None,
                notes: None,
                location: None,
                water_amount_ml: 300,
                water_frequency_days: frequency,
            },
        )
        .await
        .unwrap()
        .id
}

async fn water(
    state: &SharedState,
    user_id: i32,
    plant_id: i32,
    at: DateTime<Utc>,
) -> plantcare::services::RecordedWatering {
    state
        .watering_service
        .record_watering(
            user_id,
            WateringInput {
                plant_id,
                amount_ml: 250,
                note: None,
                watered_at: Some(at),
            },
        )
        .await
        .unwrap()
}

fn close(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    (a - b).num_seconds().abs() <= 5
}

#[tokio::test]
async fn test_new_plant_is_due_after_one_interval() {
    let (state, user_id) = setup().await;
    let before = Utc::now();
    let plant_id = plant(&state, user_id, 4).await;

    let detail = state.plant_service.get_plant(user_id, plant_id).await.unwrap();
    assert!(close(detail.plant.next_watering_at, before + Duration::days(4)));
}

#[tokio::test]
async fn test_recording_moves_due_time_forward() {
    let (state, user_id) = setup().await;
    let plant_id = plant(&state, user_id, 3).await;

    let watered_at = Utc::now() - Duration::hours(1);
    let recorded = water(&state, user_id, plant_id, watered_at).await;

    assert!(close(recorded.next_watering_at, watered_at + Duration::days(3)));
}

#[tokio::test]
async fn test_backdated_watering_schedules_from_its_own_time() {
    let (state, user_id) = setup().await;
    let plant_id = plant(&state, user_id, 3).await;

    let latest = Utc::now() - Duration::hours(2);
    water(&state, user_id, plant_id, latest).await;

    let backdated_at = latest - Duration::days(2);
    let backdated = water(&state, user_id, plant_id, backdated_at).await;
    assert!(close(backdated.next_watering_at, backdated_at + Duration::days(3)));

    let detail = state.plant_service.get_plant(user_id, plant_id).await.unwrap();
    assert!(close(detail.plant.next_watering_at, backdated_at + Duration::days(3)));
}

#[tokio::test]
async fn test_future_watering_then_delete_reverts_to_now() {
    let (state, user_id) = setup().await;
    let created_at = Utc::now();
    let plant_id = plant(&state, user_id, 7).await;

    let detail = state.plant_service.get_plant(user_id, plant_id).await.unwrap();
    assert!(close(detail.plant.next_watering_at, created_at + Duration::days(7)));

    let recorded = state
        .watering_service
        .record_watering(
            user_id,
            WateringInput {
                plant_id,
                amount_ml: 200,
                note: None,
                watered_at: Some(created_at + Duration::days(2)),
            },
        )
        .await
        .unwrap();
    assert!(close(recorded.next_watering_at, created_at + Duration::days(9)));

    let deleted = state
        .watering_service
        .delete_watering(user_id, recorded.watering.id)
        .await
        .unwrap();
    assert!(close(deleted.next_watering_at, Utc::now() + Duration::days(7)));
}

#[tokio::test]
async fn test_deleting_latest_watering_falls_back_to_previous() {
    let (state, user_id) = setup().await;
    let plant_id = plant(&state, user_id, 5).await;

    let earlier = Utc::now() - Duration::days(2);
    let later = Utc::now() - Duration::hours(3);
    water(&state, user_id, plant_id, earlier).await;
    let latest = water(&state, user_id, plant_id, later).await;

    let deleted = state
        .watering_service
        .delete_watering(user_id, latest.watering.id)
        .await
        .unwrap();

    assert_eq!(deleted.plant_id, plant_id);
    assert!(close(deleted.next_watering_at, earlier + Duration::days(5)));
}

#[tokio::test]
async fn test_deleting_older_watering_keeps_due_time() {
    let (state, user_id) = setup().await;
    let plant_id = plant(&state, user_id, 4).await;

    let older = water(&state, user_id, plant_id, Utc::now() - Duration::days(3)).await;
    let latest_at = Utc::now() - Duration::hours(1);
    let latest = water(&state, user_id, plant_id, latest_at).await;

    let deleted = state
        .watering_service
        .delete_watering(user_id, older.watering.id)
        .await
        .unwrap();

    assert!(close(deleted.next_watering_at, latest.next_watering_at));
    assert!(close(deleted.next_watering_at, latest_at + Duration::days(4)));

    let detail = state.plant_service.get_plant(user_id, plant_id).await.unwrap();
    assert!(close(detail.plant.next_watering_at, latest_at + Duration::days(4)));
}

#[tokio::test]
async fn test_deleting_only_watering_reschedules_from_now() {
    let (state, user_id) = setup().await;
    let plant_id = plant(&state, user_id, 2).await;

    let recorded = water(&state, user_id, plant_id, Utc::now() - Duration::days(1)).await;
    let deleted = state
        .watering_service
        .delete_watering(user_id, recorded.watering.id)
        .await
        .unwrap();

    assert!(close(deleted.next_watering_at, Utc::now() + Duration::days(2)));
}

#[tokio::test]
async fn test_frequency_change_recomputes_from_latest_watering() {
    let (state, user_id) = setup().await;
    let plant_id = plant(&state, user_id, 7).await;

    let watered_at = Utc::now() - Duration::days(1);
    water(&state, user_id, plant_id, watered_at).await;

    let updated = state
        .plant_service
        .update_plant(
            user_id,
            plant_id,
            PlantUpdate {
                water_frequency_days: Some(2),
                ..PlantUpdate::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.water_frequency_days, 2);
    assert!(close(updated.next_watering_at, watered_at + Duration::days(2)));
}

#[tokio::test]
async fn test_other_field_updates_keep_due_time() {
    let (state, user_id) = setup().await;
    let plant_id = plant(&state, user_id, 7).await;
    let original = state.plant_service.get_plant(user_id, plant_id).await.unwrap();

    let updated = state
        .plant_service
        .update_plant(
            user_id,
            plant_id,
            PlantUpdate {
                notes: Some("Likes shade".to_string()),
                ..PlantUpdate::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.notes.as_deref(), Some("Likes shade"));
    assert!(close(updated.next_watering_at, original.plant.next_watering_at));
}

#[tokio::test]
async fn test_needing_water_reports_overdue_days() {
    let (state, user_id) = setup().await;
    let plant_id = plant(&state, user_id, 1).await;

    water(&state, user_id, plant_id, Utc::now() - Duration::days(4)).await;

    let overdue = state.plant_service.needing_water(user_id).await.unwrap();
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0].plant.id, plant_id);
    assert_eq!(overdue[0].days_overdue, 3);

    let upcoming = state
        .plant_service
        .upcoming_waterings(user_id, 7)
        .await
        .unwrap();
    assert!(upcoming.is_empty());
}

#[tokio::test]
async fn test_watering_foreign_plant_is_not_found() {
    let (state, user_id) = setup().await;
    let plant_id = plant(&state, user_id, 3).await;

    let stranger = state
        .auth_service
        .register(Registration {
            email: "stranger@example.com".to_string(),
            password: "hunter22".to_string(),
            firstname: "Stranger".to_string(),
            lastname: None,
        })
        .await
        .unwrap()
        .user
        .id;

    let err = state
        .watering_service
        .record_watering(
            stranger,
            WateringInput {
                plant_id,
                amount_ml: 100,
                note: None,
                watered_at: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, WateringError::PlantNotFound(id) if id == plant_id));

    let err = state
        .plant_service
        .get_plant(stranger, plant_id)
        .await
        .unwrap_err();
    assert!(matches!(err, PlantError::NotFound(_)));
}

#[tokio::test]
async fn test_deleting_plant_removes_its_waterings() {
    let (state, user_id) = setup().await;
    let plant_id = plant(&state, user_id, 3).await;
    let recorded = water(&state, user_id, plant_id, Utc::now()).await;

    state
        .plant_service
        .delete_plant(user_id, plant_id)
        .await
        .unwrap();

    let err = state
        .watering_service
        .get_watering(user_id, recorded.watering.id)
        .await
        .unwrap_err();
    assert!(matches!(err, WateringError::NotFound(_)));
}

#[tokio::test]
async fn test_stats_average_amount_per_plant() {
    let (state, user_id) = setup().await;
    let fern = plant(&state, user_id, 3).await;
    let cactus = plant(&state, user_id, 30).await;

    for (plant_id, amount_ml) in [(fern, 100), (fern, 301), (cactus, 50)] {
        state
            .watering_service
            .record_watering(
                user_id,
                WateringInput {
                    plant_id,
                    amount_ml,
                    note: None,
                    watered_at: None,
                },
            )
            .await
            .unwrap();
    }

    let all = state.watering_service.stats(user_id, None).await.unwrap();
    assert_eq!(all.total_waterings, 3);
    assert_eq!(all.waterings_last_30_days, 3);
    assert_eq!(all.average_amount_ml, 150);

    let fern_only = state.watering_service.stats(user_id, Some(fern)).await.unwrap();
    assert_eq!(fern_only.total_waterings, 2);
    assert_eq!(fern_only.average_amount_ml, 201);

    let empty = plant(&state, user_id, 5).await;
    let none = state.watering_service.stats(user_id, Some(empty)).await.unwrap();
    assert_eq!(none.total_waterings, 0);
    assert_eq!(none.average_amount_ml, 0);
}
