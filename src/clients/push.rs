use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::PushConfig;

#[derive(Debug, Error)]
pub enum PushError {
    #[error("Push request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Push payload could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Push relay answered {status}: {body}")]
    Relay { status: u16, body: String },

}

/// Browser subscription as handed out by the push service.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionTarget {
    pub endpoint: String,
    pub keys: SubscriptionKeys,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}

/// Sends a single encrypted push message.
///
/// `Ok(Some(status))` is the status the push service answered with,
/// `Ok(None)` means nothing was sent.
#[async_trait]
pub trait PushGateway: Send + Sync {
    async fn deliver(
        &self,
        target: &SubscriptionTarget,
        payload: &str,
    ) -> Result<Option<u16>, PushError>;
}

#[derive(Serialize)]
struct RelayRequest<'a> {
    subscription: &'a SubscriptionTarget,
    payload: &'a str,
    ttl: u32,
}

/// What the relay reports back for a forwarded message.
#[derive(Debug, Deserialize)]
struct RelayResponse {
    /// Status code the push service answered the relay with.
    status: u16,
}

/// Forwards messages to a web-push relay that handles VAPID signing and
/// payload encryption.
///
/// The relay's own HTTP status only says whether it handled the request.
/// The push service's verdict comes back in the JSON body as `{"status": n}`.
#[derive(Clone)]
pub struct HttpPushGateway {
    client: Client,
    relay_url: String,
    ttl_seconds: u32,
}

impl HttpPushGateway {
    pub fn new(config: &PushConfig) -> Result<Self, PushError> {
        let client = Client::builder()
            .user_agent("PlantCare/1.0")
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            relay_url: config.relay_url.clone(),
            ttl_seconds: config.ttl_seconds,
        })
    }
}

#[async_trait]
impl PushGateway for HttpPushGateway {
    async fn deliver(
        &self,
        target: &SubscriptionTarget,
        payload: &str,
    ) -> Result<Option<u16>, PushError> {
        let request = RelayRequest {
            subscription: target,
            payload,
            ttl: self.ttl_seconds,
        };

        debug!(endpoint = %target.endpoint, "Forwarding push message to relay");

        let response = self
            .client
            .post(&self.relay_url)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(PushError::Relay { status, body });
        }

        let relayed: RelayResponse = response.json().await?;
        debug!(endpoint = %target.endpoint, status = relayed.status, "Relay delivered push message");

        Ok(Some(relayed.status))
    }
}

/// Used when push is turned off in the config.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledPushGateway;

#[async_trait]
impl PushGateway for DisabledPushGateway {
    async fn deliver(
        &self,
        _target: &SubscriptionTarget,
        _payload: &str,
    ) -> Result<Option<u16>, PushError> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};

    fn target() -> SubscriptionTarget {
        SubscriptionTarget {
            endpoint: "https://push.example.com/abc".to_string(),
            keys: SubscriptionKeys {
                p256dh: "key".to_string(),
                auth: "secret".to_string(),
            },
        }
    }

    /// Serves a fake relay on a random local port and returns its base url.
    async fn spawn_relay() -> String {
        let app = Router::new()
            .route(
                "/ok",
                post(|| async { Json(serde_json::json!({ "status": 201 })) }),
            )
            .route(
                "/expired",
                post(|| async { Json(serde_json::json!({ "status": 410 })) }),
            )
            .route(
                "/down",
                post(|| async { (StatusCode::BAD_GATEWAY, "upstream unreachable") }),
            )
            .route("/missing", post(|| async { StatusCode::NOT_FOUND }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{addr}")
    }

    fn gateway(relay_url: String) -> HttpPushGateway {
        HttpPushGateway::new(&PushConfig {
            enabled: true,
            relay_url,
            ..PushConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_relay_body_carries_push_status() {
        let base = spawn_relay().await;

        let status = gateway(format!("{base}/ok")).deliver(&target(), "{}").await.unwrap();
        assert_eq!(status, Some(201));

        let status = gateway(format!("{base}/expired"))
            .deliver(&target(), "{}")
            .await
            .unwrap();
        assert_eq!(status, Some(410));
    }

    #[tokio::test]
    async fn test_relay_failure_is_an_error_not_a_push_status() {
        let base = spawn_relay().await;

        let err = gateway(format!("{base}/down"))
            .deliver(&target(), "{}")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PushError::Relay { status: 502, ref body } if body == "upstream unreachable"
        ));

        let err = gateway(format!("{base}/missing"))
            .deliver(&target(), "{}")
            .await
            .unwrap_err();
        assert!(matches!(err, PushError::Relay { status: 404, .. }));
    }

    #[test]
    fn test_relay_request_shape() {
        let target = target();
        let request = RelayRequest {
            subscription: &target,
            payload: "{\"title\":\"hi\"}",
            ttl: 60,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["subscription"]["endpoint"], "https://push.example.com/abc");
        assert_eq!(json["subscription"]["keys"]["p256dh"], "key");
        assert_eq!(json["subscription"]["keys"]["auth"], "secret");
        assert_eq!(json["ttl"], 60);
    }

    #[tokio::test]
    async fn test_disabled_gateway_sends_nothing() {
        let status = DisabledPushGateway.deliver(&target(), "{}").await.unwrap();
        assert_eq!(status, None);
    }
}
