//! Alert delivery to the OpenClaw gateway
//!
//! Alerts go out through the gateway's `message` tool
//! (`POST /tools/invoke`). When delivery fails the rendered text is written
//! to a fallback file instead.

pub mod message;

use self::message::DecisionMode;
use crate::config::{BridgeConfig, GatewayConfig};
use crate::extractor::AlertRecord;
use crate::RuleAction;
use reqwest::Client;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Why a delivery did not go through
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("gateway request timed out")]
    Timeout,
    #[error("gateway returned HTTP {0}")]
    Status(u16),
    #[error("gateway rejected the message: {0}")]
    Rejected(String),
    #[error("gateway transport error: {0}")]
    Transport(#[source] reqwest::Error),
}

impl From<reqwest::Error> for DeliveryError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            DeliveryError::Timeout
        } else {
            DeliveryError::Transport(e)
        }
    }
}

/// The fallback file could not be written either
#[derive(Debug, thiserror::Error)]
#[error("failed to write fallback file {path}: {source}")]
pub struct FallbackWriteError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Proof of a successful delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    /// Remote id, used to edit the notification later
    pub message_id: Option<String>,
    /// The text that was delivered
    pub message: String,
}

pub struct Forwarder {
    client: Client,
    gateway: GatewayConfig,
    channel: String,
    target: Option<String>,
    mode: DecisionMode,
    fallback_path: PathBuf,
}

impl Forwarder {
    pub fn new(gateway: GatewayConfig, config: &BridgeConfig) -> Self {
        let client = match Client::builder().timeout(config.delivery_timeout()).build() {
            Ok(client) => client,
            Err(e) => {
                warn!("⚠️ Could not build HTTP client with timeout: {}, using defaults", e);
                Client::new()
            }
        };
        let mode = if config.auto_execute {
            DecisionMode::AutoExecute {
                callback_url: config.control_url(),
            }
        } else {
            DecisionMode::Interactive
        };

        Self {
            client,
            gateway,
            channel: config.notify_channel.clone(),
            target: config.notify_target.clone(),
            mode,
            fallback_path: config.fallback_path.clone(),
        }
    }

    pub fn fallback_path(&self) -> &Path {
        &self.fallback_path
    }

    /// Render the notification text for a record
    pub fn render(&self, record: &AlertRecord) -> String {
        message::render(record, &self.mode)
    }

    /// Render and deliver a record
    pub async fn forward(&self, record: &AlertRecord) -> Result<DeliveryReceipt, DeliveryError> {
        let text = self.render(record);
        self.deliver(&text).await
    }

    /// Deliver already rendered text
    pub async fn deliver(&self, text: &str) -> Result<DeliveryReceipt, DeliveryError> {
        let mut args = json!({
            "action": "send",
            "channel": self.channel,
            "message": text,
        });
        if let Some(ref target) = self.target {
            args["target"] = json!(target);
        }
        if self.mode == DecisionMode::Interactive {
            args["buttons"] = message::choice_buttons();
        }

        let body = self.invoke(args).await?;
        let message_id = message_id_of(&body);
        info!(
            "📨 Alert delivered to {} (message id: {})",
            self.channel,
            message_id.as_deref().unwrap_or("none")
        );

        Ok(DeliveryReceipt {
            message_id,
            message: text.to_string(),
        })
    }

    /// Overwrite the fallback file with the undelivered text
    pub fn write_fallback(&self, text: &str) -> Result<(), FallbackWriteError> {
        let wrap = |source: std::io::Error| FallbackWriteError {
            path: self.fallback_path.clone(),
            source,
        };
        if let Some(parent) = self.fallback_path.parent() {
            std::fs::create_dir_all(parent).map_err(wrap)?;
        }
        std::fs::write(&self.fallback_path, text).map_err(wrap)?;
        info!("📝 Alert written to fallback file {}", self.fallback_path.display());
        Ok(())
    }

    /// Append the action outcome to a delivered notification and drop its
    /// buttons. Best-effort: failures are logged and reported as `false`.
    pub async fn edit_message(
        &self,
        message_id: &str,
        original: &str,
        action: RuleAction,
        success: bool,
    ) -> bool {
        let mut args = json!({
            "action": "edit",
            "channel": self.channel,
            "messageId": message_id,
            "message": message::with_outcome(original, action, success),
            "buttons": [],
        });
        if let Some(ref target) = self.target {
            args["target"] = json!(target);
        }

        match self.invoke(args).await {
            Ok(_) => {
                info!("✏️ Edited message {}", message_id);
                true
            }
            Err(e) => {
                warn!("⚠️ Failed to edit message {}: {}", message_id, e);
                false
            }
        }
    }

    async fn invoke(&self, args: Value) -> Result<Value, DeliveryError> {
        let url = format!("{}/tools/invoke", self.gateway.base_url);
        let mut request = self.client.post(&url).json(&json!({
            "tool": "message",
            "args": args,
        }));
        if let Some(ref token) = self.gateway.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Status(status.as_u16()));
        }

        let body: Value = response.json().await?;
        if body.get("ok").and_then(Value::as_bool) != Some(true) {
            return Err(DeliveryError::Rejected(body.to_string()));
        }
        Ok(body)
    }
}

/// `result.details.messageId`, as a string whether the gateway sent a
/// number or a string
fn message_id_of(body: &Value) -> Option<String> {
    match body.pointer("/result/details/messageId")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_id_shapes() {
        let numeric = json!({"ok": true, "result": {"details": {"messageId": 812}}});
        let text = json!({"ok": true, "result": {"details": {"messageId": "abc"}}});
        let missing = json!({"ok": true, "result": {}});
        assert_eq!(message_id_of(&numeric).as_deref(), Some("812"));
        assert_eq!(message_id_of(&text).as_deref(), Some("abc"));
        assert_eq!(message_id_of(&missing), None);
    }

    #[test]
    fn test_fallback_creates_parent_dirs_and_overwrites() {
        let tmp = tempfile::tempdir().unwrap();
        let config = BridgeConfig {
            fallback_path: tmp.path().join("nested/dir/pending.txt"),
            ..Default::default()
        };
        let forwarder = Forwarder::new(GatewayConfig::default(), &config);

        forwarder.write_fallback("first").unwrap();
        forwarder.write_fallback("second").unwrap();
        let content = std::fs::read_to_string(forwarder.fallback_path()).unwrap();
        assert_eq!(content, "second");
    }

    #[test]
    fn test_fallback_error_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        let config = BridgeConfig {
            fallback_path: blocker.join("pending.txt"),
            ..Default::default()
        };
        let forwarder = Forwarder::new(GatewayConfig::default(), &config);
        assert!(forwarder.write_fallback("text").is_err());
    }
}
