#![allow(dead_code)]

use async_trait::async_trait;
use axum::{extract::State, http::HeaderMap, routing::post, Json, Router};
use lulu_bridge::bridge::{BridgeError, Interaction, UiBridge};
use lulu_bridge::config::{BridgeConfig, GatewayConfig};
use lulu_bridge::forwarder::Forwarder;
use lulu_bridge::monitor::Monitor;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// UI bridge whose window contents are set by the test
#[derive(Default)]
pub struct ScriptedBridge {
    pub present: AtomicBool,
    pub fail_queries: AtomicBool,
    pub fail_scrapes: AtomicBool,
    /// How long every call takes
    pub delay: Mutex<Duration>,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub fragments: Mutex<Vec<String>>,
    pub missing: Mutex<Vec<Interaction>>,
    pub interactions: Mutex<Vec<Interaction>>,
}

impl ScriptedBridge {
    pub fn show(&self, fragments: &[&str]) {
        *self.fragments.lock().unwrap() = fragments.iter().map(|s| s.to_string()).collect();
        self.present.store(true, Ordering::SeqCst);
    }

    pub fn hide(&self) {
        self.present.store(false, Ordering::SeqCst);
    }

    pub fn interactions(&self) -> Vec<Interaction> {
        self.interactions.lock().unwrap().clone()
    }

    /// Count this call as in flight for `delay`
    async fn busy(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        tokio::time::sleep(delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl UiBridge for ScriptedBridge {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn alert_present(&self) -> Result<bool, BridgeError> {
        self.busy().await;
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(BridgeError::Timeout(Duration::from_secs(5)));
        }
        Ok(self.present.load(Ordering::SeqCst))
    }

    async fn scrape(&self) -> Result<Vec<String>, BridgeError> {
        self.busy().await;
        if self.fail_scrapes.load(Ordering::SeqCst) {
            return Err(BridgeError::Output("garbled".to_string()));
        }
        Ok(self.fragments.lock().unwrap().clone())
    }

    async fn interact(&self, interaction: Interaction) -> Result<(), BridgeError> {
        self.busy().await;
        self.interactions.lock().unwrap().push(interaction);
        let window_open = self.present.load(Ordering::SeqCst);
        if !window_open || self.missing.lock().unwrap().contains(&interaction) {
            return Err(BridgeError::ControlNotFound(interaction.to_string()));
        }
        Ok(())
    }
}

/// One request seen by the stub gateway
#[derive(Debug, Clone)]
pub struct GatewayRequest {
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Clone)]
struct StubState {
    delay: Duration,
    requests: Arc<Mutex<Vec<GatewayRequest>>>,
}

/// In-process stand-in for the OpenClaw gateway's `/tools/invoke`
pub struct StubGateway {
    pub url: String,
    pub requests: Arc<Mutex<Vec<GatewayRequest>>>,
}

impl StubGateway {
    pub fn requests(&self) -> Vec<GatewayRequest> {
        self.requests.lock().unwrap().clone()
    }
}

async fn invoke(
    State(state): State<StubState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    state.requests.lock().unwrap().push(GatewayRequest {
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string()),
        body,
    });
    tokio::time::sleep(state.delay).await;
    Json(json!({"ok": true, "result": {"details": {"messageId": 812}}}))
}

pub async fn spawn_gateway(delay: Duration) -> StubGateway {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/tools/invoke", post(invoke))
        .with_state(StubState {
            delay,
            requests: requests.clone(),
        });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    StubGateway {
        url: format!("http://{}", addr),
        requests,
    }
}

pub struct Harness {
    pub bridge: Arc<ScriptedBridge>,
    pub monitor: Arc<Monitor>,
    pub gateway: StubGateway,
    pub fallback: std::path::PathBuf,
    _tmp: tempfile::TempDir,
}

pub async fn harness(gateway_delay: Duration) -> Harness {
    let tmp = tempfile::tempdir().unwrap();
    let fallback = tmp.path().join("alerts/pending.txt");
    let gateway = spawn_gateway(gateway_delay).await;

    let config = BridgeConfig {
        notify_target: Some("42".to_string()),
        delivery_timeout_secs: 1,
        fallback_path: fallback.clone(),
        ..Default::default()
    };
    let forwarder = Forwarder::new(
        GatewayConfig {
            base_url: gateway.url.clone(),
            token: Some("tok".to_string()),
        },
        &config,
    );

    let bridge = Arc::new(ScriptedBridge::default());
    let monitor = Arc::new(Monitor::new(bridge.clone(), forwarder));

    Harness {
        bridge,
        monitor,
        gateway,
        fallback,
        _tmp: tmp,
    }
}

pub const CURL_ALERT: &[&str] = &["443 (TCP)", "8.8.8.8", "curl", "/usr/bin/curl", "12345"];
