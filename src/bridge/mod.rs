//! UI automation bridges
//!
//! A bridge is the only thing that touches the firewall's windows. It must:
//! 1. Report whether an alert window is open
//! 2. Scrape the alert's text fragments
//! 3. Perform single interactions (clicks, menu picks) on it
//!
//! Bridges are not internally serialized; callers hold the monitor lock
//! around every call.

pub mod osascript;

use crate::{RuleDuration, RuleScope, Verdict};
use async_trait::async_trait;
use std::time::Duration;

/// Failure talking to the UI automation layer
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("ui automation timed out after {0:?}")]
    Timeout(Duration),
    #[error("failed to launch ui automation: {0}")]
    Launch(#[from] std::io::Error),
    #[error("ui automation script failed: {0}")]
    Script(String),
    #[error("control not found: {0}")]
    ControlNotFound(String),
    #[error("unexpected ui automation output: {0}")]
    Output(String),
}

/// One step of an action replay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    /// Open the collapsed details/options section
    ExpandDetails,
    /// Pick the rule scope from its pop-up menu
    ChooseScope(RuleScope),
    /// Pick the rule duration from its menu or radio group
    ChooseDuration(RuleDuration),
    /// Press Allow or Block
    ClickButton(Verdict),
}

impl std::fmt::Display for Interaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Interaction::ExpandDetails => write!(f, "expand details"),
            Interaction::ChooseScope(scope) => write!(f, "scope={:?}", scope),
            Interaction::ChooseDuration(duration) => write!(f, "duration={:?}", duration),
            Interaction::ClickButton(verdict) => write!(f, "click {}", verdict.button_title()),
        }
    }
}

/// Trait for UI automation backends
#[async_trait]
pub trait UiBridge: Send + Sync {
    /// Name of the bridge
    fn name(&self) -> &'static str;

    /// Is an alert window currently open?
    async fn alert_present(&self) -> Result<bool, BridgeError>;

    /// Text values, titles and descriptions of the alert window's elements
    async fn scrape(&self) -> Result<Vec<String>, BridgeError>;

    /// Perform one interaction against the open alert window
    async fn interact(&self, interaction: Interaction) -> Result<(), BridgeError>;
}
