//! LuLu Bridge Library
//!
//! Core components for relaying LuLu firewall alerts to an OpenClaw
//! gateway and playing the chosen verdict back into the alert window.

pub mod bridge;
pub mod config;
pub mod extractor;
pub mod forwarder;
pub mod monitor;
pub mod player;
pub mod poller;
pub mod web;

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A verdict the operator (or an analyzer) can apply to an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleAction {
    /// Allow, always, for this remote endpoint
    Allow,
    /// Block, always, for this remote endpoint
    Block,
    /// Allow for the lifetime of the process
    AllowOnce,
    /// Block for the lifetime of the process
    BlockOnce,
}

/// Which button finally gets clicked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Block,
}

impl Verdict {
    pub fn button_title(&self) -> &'static str {
        match self {
            Verdict::Allow => "Allow",
            Verdict::Block => "Block",
        }
    }
}

/// Whether a rule covers the whole process or only the remote endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleScope {
    Process,
    Endpoint,
}

/// Whether a rule is permanent or lives as long as the process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleDuration {
    Always,
    ProcessLifetime,
}

impl RuleAction {
    pub const ALL: [RuleAction; 4] = [
        RuleAction::Allow,
        RuleAction::AllowOnce,
        RuleAction::Block,
        RuleAction::BlockOnce,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleAction::Allow => "allow",
            RuleAction::Block => "block",
            RuleAction::AllowOnce => "allow-once",
            RuleAction::BlockOnce => "block-once",
        }
    }

    pub fn verdict(&self) -> Verdict {
        match self {
            RuleAction::Allow | RuleAction::AllowOnce => Verdict::Allow,
            RuleAction::Block | RuleAction::BlockOnce => Verdict::Block,
        }
    }

    pub fn scope(&self) -> RuleScope {
        match self {
            RuleAction::Allow | RuleAction::Block => RuleScope::Endpoint,
            RuleAction::AllowOnce | RuleAction::BlockOnce => RuleScope::Process,
        }
    }

    pub fn duration(&self) -> RuleDuration {
        match self {
            RuleAction::Allow | RuleAction::Block => RuleDuration::Always,
            RuleAction::AllowOnce | RuleAction::BlockOnce => RuleDuration::ProcessLifetime,
        }
    }

    /// Label appended to the delivered notification once the action ran
    pub fn label(&self) -> &'static str {
        match self {
            RuleAction::Allow => "Allowed (always)",
            RuleAction::Block => "Blocked (always)",
            RuleAction::AllowOnce => "Allowed (this process only)",
            RuleAction::BlockOnce => "Blocked (this process only)",
        }
    }

    /// Button caption offered to the operator
    pub fn choice_caption(&self) -> &'static str {
        match self {
            RuleAction::Allow => "✅ Always allow",
            RuleAction::AllowOnce => "☑️ Allow once",
            RuleAction::Block => "⛔ Always block",
            RuleAction::BlockOnce => "🚫 Block once",
        }
    }
}

impl std::fmt::Display for RuleAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Raised for any action name outside allow / block / allow-once / block-once
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported action: {0}")]
pub struct UnsupportedAction(pub String);

impl FromStr for RuleAction {
    type Err = UnsupportedAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "allow" => Ok(RuleAction::Allow),
            "block" => Ok(RuleAction::Block),
            "allow-once" => Ok(RuleAction::AllowOnce),
            "block-once" => Ok(RuleAction::BlockOnce),
            _ => Err(UnsupportedAction(s.to_string())),
        }
    }
}
