//! Bridge and gateway configuration
//!
//! Two sources:
//! - the bridge's own JSON config (`~/.lulu-bridge/config.json`)
//! - the OpenClaw gateway config, for host/port/token

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_GATEWAY_HOST: &str = "127.0.0.1";
pub const DEFAULT_GATEWAY_PORT: u16 = 18789;

/// Local feature toggles and tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeConfig {
    /// Let the analyzer decide and call back on its own
    #[serde(default)]
    pub auto_execute: bool,
    #[serde(default = "default_notify_channel")]
    pub notify_channel: String,
    /// Chat / user id the notification goes to
    #[serde(default)]
    pub notify_target: Option<String>,
    /// Name of the firewall's UI process
    #[serde(default = "default_process_name")]
    pub process_name: String,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_control_port")]
    pub control_port: u16,
    #[serde(default = "default_ui_timeout_secs")]
    pub ui_timeout_secs: u64,
    #[serde(default = "default_delivery_timeout_secs")]
    pub delivery_timeout_secs: u64,
    #[serde(default = "default_fallback_path")]
    pub fallback_path: PathBuf,
}

fn default_notify_channel() -> String {
    "telegram".to_string()
}
fn default_process_name() -> String {
    "LuLu".to_string()
}
fn default_poll_interval_ms() -> u64 {
    500
}
fn default_control_port() -> u16 {
    18790
}
fn default_ui_timeout_secs() -> u64 {
    5
}
fn default_delivery_timeout_secs() -> u64 {
    5
}
fn default_fallback_path() -> PathBuf {
    bridge_home().join("pending-alert.txt")
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            auto_execute: false,
            notify_channel: default_notify_channel(),
            notify_target: None,
            process_name: default_process_name(),
            poll_interval_ms: default_poll_interval_ms(),
            control_port: default_control_port(),
            ui_timeout_secs: default_ui_timeout_secs(),
            delivery_timeout_secs: default_delivery_timeout_secs(),
            fallback_path: default_fallback_path(),
        }
    }
}

impl BridgeConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(100))
    }

    pub fn ui_timeout(&self) -> Duration {
        Duration::from_secs(self.ui_timeout_secs.max(1))
    }

    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_secs(self.delivery_timeout_secs.max(1))
    }

    /// Base URL of the control surface as seen from the analyzer
    pub fn control_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.control_port)
    }

    /// Load from an explicit path, or the default location.
    ///
    /// A missing file yields defaults; an unreadable or malformed one is
    /// reported and also yields defaults.
    pub fn load(path: Option<&Path>) -> Self {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| bridge_home().join("config.json"));

        if !path.exists() {
            debug!("No bridge config at {}, using defaults", path.display());
            return Self::default();
        }

        match std::fs::read_to_string(&path)
            .map_err(anyhow::Error::from)
            .and_then(|s| serde_json::from_str::<BridgeConfig>(&s).map_err(anyhow::Error::from))
        {
            Ok(config) => {
                info!("📜 Loaded bridge config from {}", path.display());
                config
            }
            Err(e) => {
                warn!("⚠️ Failed to load {}: {}, using defaults", path.display(), e);
                Self::default()
            }
        }
    }
}

/// Where to reach the OpenClaw gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub base_url: String,
    pub token: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: format!("http://{}:{}", DEFAULT_GATEWAY_HOST, DEFAULT_GATEWAY_PORT),
            token: None,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct GatewayFile {
    #[serde(default)]
    gateway: GatewaySection,
}

#[derive(Debug, Deserialize, Default)]
struct GatewaySection {
    host: Option<String>,
    port: Option<u16>,
    #[serde(default)]
    auth: GatewayAuth,
}

#[derive(Debug, Deserialize, Default)]
struct GatewayAuth {
    token: Option<String>,
}

impl GatewayConfig {
    /// Candidate gateway config files, in lookup order
    pub fn candidate_paths() -> Vec<PathBuf> {
        let home = dirs::home_dir().unwrap_or_default();
        vec![
            home.join(".openclaw/openclaw.json"),
            home.join(".clawdbot/clawdbot.json"),
        ]
    }

    /// Parse a gateway config document
    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        let file: GatewayFile = serde_json::from_str(content)?;
        let host = file
            .gateway
            .host
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| DEFAULT_GATEWAY_HOST.to_string());
        let port = file.gateway.port.unwrap_or(DEFAULT_GATEWAY_PORT);
        Ok(Self {
            base_url: format!("http://{}:{}", host, port),
            token: file.gateway.auth.token.filter(|t| !t.is_empty()),
        })
    }

    /// First readable candidate wins, then environment overrides apply
    pub fn load() -> Self {
        let mut config = Self::candidate_paths()
            .into_iter()
            .filter(|p| p.exists())
            .find_map(|p| {
                let content = std::fs::read_to_string(&p).ok()?;
                match Self::from_json(&content) {
                    Ok(c) => {
                        info!("🔑 Gateway config loaded from {}", p.display());
                        Some(c)
                    }
                    Err(e) => {
                        warn!("⚠️ Ignoring malformed gateway config {}: {}", p.display(), e);
                        None
                    }
                }
            })
            .unwrap_or_default();

        if let Ok(url) = std::env::var("LULU_BRIDGE_GATEWAY_URL") {
            if !url.is_empty() {
                config.base_url = url.trim_end_matches('/').to_string();
            }
        }
        if let Ok(token) = std::env::var("LULU_BRIDGE_GATEWAY_TOKEN") {
            if !token.is_empty() {
                config.token = Some(token);
            }
        }

        if config.token.is_none() {
            warn!("⚠️ No gateway token found, deliveries will be unauthenticated");
        }
        config
    }
}

/// `~/.lulu-bridge`
pub fn bridge_home() -> PathBuf {
    dirs::home_dir().unwrap_or_default().join(".lulu-bridge")
}
