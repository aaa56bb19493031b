//! # Broker Client
//!
//! Minimal client for the message broker's HTTP management API: publish a
//! JSON message to a queue through the default exchange, and take one message
//! off a queue.
//!
//! ## Endpoints
//!
//! - `POST /api/exchanges/<vhost>/amq.default/publish`
//! - `POST /api/queues/<vhost>/<queue>/get`

use crate::config::{BrokerConfig, TimeoutConfig};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use graphgate_core::GatewayError;
use serde::{Deserialize, Serialize};
use serde_json::json;
use url::form_urlencoded::byte_serialize;

/// Persistent delivery mode of AMQP messages.
const PERSISTENT: u8 = 2;

/// One message taken off a queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerMessage {
    pub body: Vec<u8>,
    pub reply_to: Option<String>,
    pub correlation_id: Option<String>,
}

#[derive(Deserialize)]
struct PublishOutcome {
    routed: bool,
}

#[derive(Deserialize)]
struct FetchedMessage {
    payload: String,
    payload_encoding: String,
    #[serde(default, deserialize_with = "loose_properties")]
    properties: FetchedProperties,
}

/// The management API reports absent properties as `[]`, hence the loose shape.
#[derive(Default, Deserialize)]
#[serde(default)]
struct FetchedProperties {
    reply_to: Option<String>,
    correlation_id: Option<String>,
}

fn loose_properties<'de, D>(deserializer: D) -> Result<FetchedProperties, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

#[derive(Clone)]
pub struct BrokerClient {
    http: reqwest::Client,
    base_url: String,
    user: String,
    password: String,
    vhost: String,
}

impl BrokerClient {
    pub fn new(broker: &BrokerConfig, timeouts: &TimeoutConfig) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .connect_timeout(timeouts.connect())
            .timeout(timeouts.read())
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| GatewayError::Configuration(format!("HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: broker.management_url(),
            user: broker.user.clone(),
            password: broker.password.clone(),
            vhost: byte_serialize(broker.vhost.as_bytes()).collect(),
        })
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .post(format!("{}/api/{}", self.base_url, path))
            .basic_auth(&self.user, Some(&self.password))
    }

    /// Publish `message` as JSON to `queue`.
    ///
    /// A message the broker cannot route is a failure, not a silent drop.
    pub async fn publish<T: Serialize>(
        &self,
        queue: &str,
        message: &T,
        correlation_id: Option<&str>,
    ) -> Result<(), GatewayError> {
        let payload = serde_json::to_string(message).map_err(|e| publish_failure(e.to_string()))?;

        let mut properties = json!({
            "content_type": "application/json",
            "delivery_mode": PERSISTENT,
        });
        if let Some(id) = correlation_id {
            properties["correlation_id"] = json!(id);
        }
        let body = json!({
            "properties": properties,
            "routing_key": queue,
            "payload": payload,
            "payload_encoding": "string",
        });

        let resp = self
            .post(&format!("exchanges/{}/amq.default/publish", self.vhost))
            .json(&body)
            .send()
            .await
            .map_err(|e| publish_failure(format!("broker unreachable: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(publish_failure(format!("broker answered {status}: {text}")));
        }
        let outcome: PublishOutcome = resp
            .json()
            .await
            .map_err(|e| publish_failure(format!("unexpected broker answer: {e}")))?;
        if !outcome.routed {
            return Err(publish_failure(format!("message to '{queue}' was not routed")));
        }
        tracing::debug!("Published message to queue {}", queue);
        Ok(())
    }

    /// Take at most one message off `queue`, acknowledging it.
    pub async fn fetch_one(&self, queue: &str) -> Result<Option<BrokerMessage>, GatewayError> {
        let queue_path: String = byte_serialize(queue.as_bytes()).collect();
        let resp = self
            .post(&format!("queues/{}/{}/get", self.vhost, queue_path))
            .json(&json!({
                "count": 1,
                "ackmode": "ack_requeue_false",
                "encoding": "auto",
            }))
            .send()
            .await
            .map_err(|e| broker_unavailable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(broker_unavailable(format!("answered {status}: {text}")));
        }
        let mut fetched: Vec<FetchedMessage> = resp
            .json()
            .await
            .map_err(|e| broker_unavailable(format!("unexpected answer: {e}")))?;

        let Some(message) = fetched.pop() else {
            return Ok(None);
        };
        let body = match message.payload_encoding.as_str() {
            "base64" => STANDARD
                .decode(message.payload.as_bytes())
                .map_err(|e| broker_unavailable(format!("undecodable payload: {e}")))?,
            _ => message.payload.into_bytes(),
        };
        Ok(Some(BrokerMessage {
            body,
            reply_to: message.properties.reply_to.filter(|q| !q.is_empty()),
            correlation_id: message.properties.correlation_id,
        }))
    }
}

fn broker_unavailable(reason: String) -> GatewayError {
    GatewayError::BrokerUnavailable(reason)
}

fn publish_failure(reason: String) -> GatewayError {
    GatewayError::PublishFailure {
        reason,
        underlying: None,
    }
}
