use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use plantcare::config::Config;
use serde_json::{Value, json};
use tower::ServiceExt;

async fn spawn_app() -> Router {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;

    let state = plantcare::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    plantcare::api::router(state).await
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    api_key: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(key) = api_key {
        builder = builder.header("X-Api-Key", key);
    }

    let request = match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, value)
}

async fn register(app: &Router, email: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "email": email,
            "password": "hunter22",
            "firstname": "Fern",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "register failed: {body}");
    body["data"]["api_key"].as_str().unwrap().to_string()
}

async fn create_plant(app: &Router, key: &str, name: &str, frequency: i32) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/api/plants",
        Some(key),
        Some(json!({
            "name": name,
            "species": "Monstera deliciosa",
            "water_amount_ml": 250,
            "water_frequency_days": frequency,
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "create plant failed: {body}");
    body["data"].clone()
}

#[tokio::test]
async fn test_health_is_public() {
    let app = spawn_app().await;

    let (status, body) = send(&app, "GET", "/api/system/health/live", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "alive");

    let (status, body) = send(&app, "GET", "/api/system/health/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["checks"]["database"], true);
}

#[tokio::test]
async fn test_protected_routes_require_credentials() {
    let app = spawn_app().await;

    let (status, body) = send(&app, "GET", "/api/plants", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = send(&app, "GET", "/api/plants", Some("wrong-key"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let key = register(&app, "fern@example.com").await;
    let (status, body) = send(&app, "GET", "/api/auth/me", Some(&key), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "fern@example.com");
    assert!(body["data"].get("password").is_none());
    assert!(body["data"].get("api_key").is_none());
}

#[tokio::test]
async fn test_register_rejects_duplicate_email() {
    let app = spawn_app().await;
    register(&app, "fern@example.com").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "email": "FERN@example.com",
            "password": "another-pass",
            "firstname": "Other",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_login_with_wrong_password_is_unauthorized() {
    let app = spawn_app().await;
    register(&app, "fern@example.com").await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "fern@example.com", "password": "nope-nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "fern@example.com", "password": "hunter22" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["api_key"].is_string());
}

#[tokio::test]
async fn test_plant_crud() {
    let app = spawn_app().await;
    let key = register(&app, "fern@example.com").await;

    let plant = create_plant(&app, &key, "Monty", 7).await;
    let id = plant["id"].as_i64().unwrap();
    assert_eq!(plant["name"], "Monty");
    assert!(plant["next_watering_at"].is_string());

    let (status, body) = send(&app, "GET", "/api/plants", Some(&key), None).await;
    assert_eq!(status, StatusCode::OK);
    let list = body["data"].as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["total_waterings"], 0);
    assert!(list[0]["last_watering"].is_null());

    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/api/plants/{id}"),
        Some(&key),
        Some(json!({ "location": "Kitchen window" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["location"], "Kitchen window");
    assert_eq!(body["data"]["name"], "Monty");

    let (status, body) = send(&app, "GET", &format!("/api/plants/{id}"), Some(&key), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["recent_waterings"], json!([]));

    let (status, _) = send(&app, "DELETE", &format!("/api/plants/{id}"), Some(&key), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "GET", &format!("/api/plants/{id}"), Some(&key), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_plant_validation() {
    let app = spawn_app().await;
    let key = register(&app, "fern@example.com").await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/plants",
        Some(&key),
        Some(json!({ "name": "  ", "water_amount_ml": 100, "water_frequency_days": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/api/plants",
        Some(&key),
        Some(json!({ "name": "Cactus", "water_amount_ml": 100, "water_frequency_days": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/api/plants",
        Some(&key),
        Some(json!({
            "name": "Cactus",
            "water_amount_ml": 100,
            "water_frequency_days": 3,
            "image_url": "ftp://example.com/cactus.png",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_plants_are_scoped_to_their_owner() {
    let app = spawn_app().await;
    let alice = register(&app, "alice@example.com").await;
    let bob = register(&app, "bob@example.com").await;

    let plant = create_plant(&app, &alice, "Alice's fern", 5).await;
    let id = plant["id"].as_i64().unwrap();

    let (status, _) = send(&app, "GET", &format!("/api/plants/{id}"), Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/api/plants/{id}"),
        Some(&bob),
        Some(json!({ "name": "Stolen" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", &format!("/api/plants/{id}"), Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "POST",
        "/api/waterings",
        Some(&bob),
        Some(json!({ "plant_id": id, "amount_ml": 100 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, "GET", "/api/plants", Some(&bob), None).await;
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn test_watering_flow() {
    let app = spawn_app().await;
    let key = register(&app, "fern@example.com").await;

    let plant = create_plant(&app, &key, "Pothos", 3).await;
    let id = plant["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        "POST",
        "/api/waterings",
        Some(&key),
        Some(json!({ "plant_id": id, "amount_ml": 200, "note": "Morning" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let watering_id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["amount_ml"], 200);
    assert!(body["data"]["next_watering_at"].is_string());

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/waterings?plant_id={id}"),
        Some(&key),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let entries = body["data"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["plant"]["name"], "Pothos");

    let (status, body) = send(&app, "GET", "/api/waterings/stats", Some(&key), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_waterings"], 1);
    assert_eq!(body["data"]["waterings_last_30_days"], 1);
    assert_eq!(body["data"]["average_amount_ml"], 200);

    let (status, body) = send(&app, "GET", "/api/waterings/history?days=7", Some(&key), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_waterings"], 1);
    assert_eq!(body["data"]["history"].as_array().unwrap().len(), 1);

    let (status, _) = send(&app, "GET", "/api/waterings/history?days=0", Some(&key), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, "GET", "/api/users/stats", Some(&key), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_plants"], 1);
    assert_eq!(body["data"]["total_waterings"], 1);

    let (status, body) = send(
        &app,
        "DELETE",
        &format!("/api/waterings/{watering_id}"),
        Some(&key),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["plant_id"], id);

    let (status, _) = send(
        &app,
        "GET",
        &format!("/api/waterings/{watering_id}"),
        Some(&key),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_future_dated_watering_schedules_from_event_time() {
    let app = spawn_app().await;
    let key = register(&app, "fern@example.com").await;
    let plant = create_plant(&app, &key, "Calathea", 2).await;

    let tomorrow = chrono::Utc::now() + chrono::Duration::days(1);
    let (status, body) = send(
        &app,
        "POST",
        "/api/waterings",
        Some(&key),
        Some(json!({
            "plant_id": plant["id"],
            "amount_ml": 50,
            "watered_at": tomorrow.to_rfc3339(),
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let next: chrono::DateTime<chrono::Utc> = body["data"]["next_watering_at"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!((next - (tomorrow + chrono::Duration::days(2))).num_seconds().abs() <= 5);
}

#[tokio::test]
async fn test_push_subscription_lifecycle() {
    let app = spawn_app().await;
    let key = register(&app, "fern@example.com").await;
    let endpoint = "https://push.example.com/send/abc123";

    let subscribe = json!({
        "endpoint": endpoint,
        "keys": { "p256dh": "BPublicKey", "auth": "secret" },
    });

    let (status, _) = send(
        &app,
        "POST",
        "/api/notifications/subscribe",
        Some(&key),
        Some(subscribe.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Re-subscribing the same endpoint refreshes keys in place.
    let (status, _) = send(
        &app,
        "POST",
        "/api/notifications/subscribe",
        Some(&key),
        Some(subscribe),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(
        &app,
        "GET",
        "/api/notifications/subscriptions",
        Some(&key),
        None,
    )
    .await;
    let subs = body["data"].as_array().unwrap();
    assert_eq!(subs.len(), 1);
    assert!(subs[0].get("auth").is_none());

    let encoded: String = url::form_urlencoded::byte_serialize(endpoint.as_bytes()).collect();
    let (status, body) = send(
        &app,
        "DELETE",
        &format!("/api/notifications/unsubscribe/{encoded}"),
        Some(&key),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["message"], "Unsubscribed successfully");

    let (_, body) = send(
        &app,
        "GET",
        "/api/notifications/subscriptions",
        Some(&key),
        None,
    )
    .await;
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn test_delete_account_removes_everything() {
    let app = spawn_app().await;
    let key = register(&app, "fern@example.com").await;
    let plant = create_plant(&app, &key, "Snake plant", 14).await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/waterings",
        Some(&key),
        Some(json!({ "plant_id": plant["id"], "amount_ml": 100 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "DELETE", "/api/users/account", Some(&key), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "GET", "/api/plants", Some(&key), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // The email is free again.
    register(&app, "fern@example.com").await;
}
