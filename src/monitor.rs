//! Shared monitor handle
//!
//! One `Monitor` is shared (behind an `Arc`) by the poll loop and the
//! control surface. Its mutex guards [`MonitorState`] and is held around
//! every UI automation sequence, so a poll scrape and an operator's click
//! replay never interleave.

use crate::bridge::UiBridge;
use crate::extractor::FieldExtractor;
use crate::forwarder::Forwarder;
use crate::player::{self, ActionReport};
use crate::RuleAction;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Text used when a callback arrives for a message we never stored
const FALLBACK_ORIGINAL: &str = "🔥 *LuLu Firewall Alert*";

/// Whether an alert window is currently open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlertPhase {
    #[default]
    Idle,
    AlertActive,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorState {
    pub phase: AlertPhase,
    /// Fingerprint of the last forwarded alert
    pub last_fingerprint: Option<String>,
    /// Remote id of the last delivered notification
    pub last_message_id: Option<String>,
    /// Text of the last delivered notification
    pub last_message_content: Option<String>,
}

/// Result of a `/callback` style action
#[derive(Debug, Clone)]
pub struct CallbackReport {
    pub report: ActionReport,
    pub message_edited: bool,
}

pub struct Monitor {
    pub(crate) bridge: Arc<dyn UiBridge>,
    pub(crate) extractor: FieldExtractor,
    pub(crate) forwarder: Forwarder,
    pub(crate) state: Mutex<MonitorState>,
    started_at: DateTime<Utc>,
}

impl Monitor {
    pub fn new(bridge: Arc<dyn UiBridge>, forwarder: Forwarder) -> Self {
        Self {
            bridge,
            extractor: FieldExtractor::new(),
            forwarder,
            state: Mutex::new(MonitorState::default()),
            started_at: Utc::now(),
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn forwarder(&self) -> &Forwarder {
        &self.forwarder
    }

    /// Copy of the current state
    pub async fn snapshot(&self) -> MonitorState {
        self.state.lock().await.clone()
    }

    /// Replay an action into the open alert window.
    ///
    /// A successful replay clears the last fingerprint so the same alert is
    /// treated as new should its window reopen.
    pub async fn perform_action(&self, action: RuleAction) -> ActionReport {
        let mut state = self.state.lock().await;
        let report = player::perform(self.bridge.as_ref(), action).await;
        if report.success {
            info!("✅ Applied {} to alert", action);
            state.last_fingerprint = None;
        } else {
            warn!("❌ Could not apply {}: {}", action, report.summary());
        }
        report
    }

    /// Replay an action, then close out the remote notification.
    ///
    /// Uses `message_id` when given, otherwise the last delivered one.
    pub async fn callback(&self, action: RuleAction, message_id: Option<String>) -> CallbackReport {
        let report = self.perform_action(action).await;

        let (stored_id, content) = {
            let state = self.state.lock().await;
            (state.last_message_id.clone(), state.last_message_content.clone())
        };
        let target_id = message_id.filter(|id| !id.is_empty()).or(stored_id);

        let message_edited = match target_id {
            Some(id) => {
                let original = content.unwrap_or_else(|| FALLBACK_ORIGINAL.to_string());
                self.forwarder
                    .edit_message(&id, &original, action, report.success)
                    .await
            }
            None => {
                warn!("⚠️ No message id to edit after {}", action);
                false
            }
        };

        CallbackReport {
            report,
            message_edited,
        }
    }
}
