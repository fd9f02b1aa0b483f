//! Push notification dispatch
//!
//! Confirmations hand a message and a list of device tokens to a
//! [`NotificationDispatcher`]. Delivery problems come back as error
//! receipts and never fail the caller.

use std::sync::Arc;

use async_trait::async_trait;
use mediguard_config::{NotifyConfig, NotifyProvider};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{CareError, Result};

/// Push message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PushMessage {
    /// Notification title
    pub title: String,
    /// Notification body
    pub body: String,
    /// Structured payload for the client
    pub data: serde_json::Value,
}

/// Outcome of delivering to one device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    /// Only logged, not sent
    Logged,
    /// Accepted by the push service
    Ok,
    /// Rejected or not delivered
    Error,
}

/// Per-device delivery receipt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryReceipt {
    /// Device token
    pub token: String,
    /// Outcome
    pub status: DeliveryStatus,
    /// Push service ticket ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<String>,
    /// Error detail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl DeliveryReceipt {
    fn logged(token: &str) -> Self {
        Self {
            token: token.to_string(),
            status: DeliveryStatus::Logged,
            ticket_id: None,
            message: None,
        }
    }

    fn error(token: &str, message: impl Into<String>) -> Self {
        Self {
            token: token.to_string(),
            status: DeliveryStatus::Error,
            ticket_id: None,
            message: Some(message.into()),
        }
    }
}

/// Delivers push notifications to device tokens
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// Deliver `message` to every token, one receipt per token
    async fn dispatch(&self, tokens: &[String], message: &PushMessage)
    -> Result<Vec<DeliveryReceipt>>;
}

/// Build the dispatcher selected by configuration
pub fn dispatcher_from_config(config: &NotifyConfig) -> Result<Arc<dyn NotificationDispatcher>> {
    match config.provider {
        NotifyProvider::Log => Ok(Arc::new(LogDispatcher)),
        NotifyProvider::Expo => Ok(Arc::new(ExpoPushDispatcher::new(config)?)),
    }
}

// =============================================================================
// Log dispatcher
// =============================================================================

/// Logs notifications instead of sending them
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDispatcher;

#[async_trait]
impl NotificationDispatcher for LogDispatcher {
    async fn dispatch(
        &self,
        tokens: &[String],
        message: &PushMessage,
    ) -> Result<Vec<DeliveryReceipt>> {
        info!(
            recipients = tokens.len(),
            title = %message.title,
            body = %message.body,
            "push notification (log only)"
        );
        Ok(tokens.iter().map(|t| DeliveryReceipt::logged(t)).collect())
    }
}

// =============================================================================
// Expo dispatcher
// =============================================================================

#[derive(Debug, Serialize)]
struct ExpoMessage<'a> {
    to: &'a str,
    title: &'a str,
    body: &'a str,
    data: &'a serde_json::Value,
    sound: &'static str,
}

#[derive(Debug, Deserialize)]
struct ExpoResponse {
    #[serde(default)]
    data: Vec<ExpoTicket>,
}

#[derive(Debug, Deserialize)]
struct ExpoTicket {
    status: String,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Sends notifications through the Expo push HTTP API
#[derive(Debug, Clone)]
pub struct ExpoPushDispatcher {
    client: reqwest::Client,
    url: String,
    batch_size: usize,
}

impl ExpoPushDispatcher {
    /// Create a dispatcher from configuration
    pub fn new(config: &NotifyConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CareError::validation(format!("invalid push client settings: {}", e)))?;

        Ok(Self {
            client,
            url: config.expo_url.clone(),
            batch_size: config.batch_size.max(1),
        })
    }

    async fn send_batch(&self, tokens: &[String], message: &PushMessage) -> Vec<DeliveryReceipt> {
        let payload: Vec<ExpoMessage<'_>> = tokens
            .iter()
            .map(|to| ExpoMessage {
                to,
                title: &message.title,
                body: &message.body,
                data: &message.data,
                sound: "default",
            })
            .collect();

        let response = match self.client.post(&self.url).json(&payload).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, batch = tokens.len(), "push request failed");
                return failed(tokens, &e.to_string());
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            warn!(status = %status, batch = tokens.len(), "push service rejected batch");
            return failed(tokens, &format!("push service returned {}", status));
        }

        let body: ExpoResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                warn!(error = %e, "unreadable push service response");
                return failed(tokens, &format!("invalid response: {}", e));
            }
        };

        tokens
            .iter()
            .enumerate()
            .map(|(i, token)| match body.data.get(i) {
                Some(ticket) if ticket.status == "ok" => DeliveryReceipt {
                    token: token.clone(),
                    status: DeliveryStatus::Ok,
                    ticket_id: ticket.id.clone(),
                    message: None,
                },
                Some(ticket) => DeliveryReceipt::error(
                    token,
                    ticket
                        .message
                        .clone()
                        .unwrap_or_else(|| ticket.status.clone()),
                ),
                None => DeliveryReceipt::error(token, "no ticket returned"),
            })
            .collect()
    }
}

fn failed(tokens: &[String], message: &str) -> Vec<DeliveryReceipt> {
    tokens
        .iter()
        .map(|t| DeliveryReceipt::error(t, message))
        .collect()
}

#[async_trait]
impl NotificationDispatcher for ExpoPushDispatcher {
    async fn dispatch(
        &self,
        tokens: &[String],
        message: &PushMessage,
    ) -> Result<Vec<DeliveryReceipt>> {
        let mut receipts = Vec::with_capacity(tokens.len());
        for batch in tokens.chunks(self.batch_size) {
            receipts.extend(self.send_batch(batch, message).await);
        }
        debug!(
            recipients = tokens.len(),
            delivered = receipts.iter().filter(|r| r.status == DeliveryStatus::Ok).count(),
            "push notifications dispatched"
        );
        Ok(receipts)
    }
}
