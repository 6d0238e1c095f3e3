mod common;

use common::{harness, spawn_gateway, CURL_ALERT};
use lulu_bridge::config::{BridgeConfig, GatewayConfig};
use lulu_bridge::extractor::extract;
use lulu_bridge::forwarder::Forwarder;
use std::time::Duration;

#[tokio::test]
async fn forward_renders_and_delivers_record() {
    let h = harness(Duration::ZERO).await;
    let forwarder = h.monitor.forwarder();
    let record = extract(CURL_ALERT);

    let receipt = forwarder.forward(&record).await.unwrap();
    assert_eq!(receipt.message_id.as_deref(), Some("812"));
    assert_eq!(receipt.message, forwarder.render(&record));

    let requests = h.gateway.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].authorization.as_deref(), Some("Bearer tok"));

    let body = &requests[0].body;
    assert_eq!(body["tool"], "message");
    assert_eq!(body["args"]["action"], "send");
    assert_eq!(body["args"]["target"], "42");
    assert_eq!(body["args"]["message"], receipt.message.as_str());
    assert!(body["args"]["buttons"].is_array());
}

#[tokio::test]
async fn forward_to_unreachable_gateway_is_an_error() {
    // Grab a free port, then close it so nothing is listening there
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let tmp = tempfile::tempdir().unwrap();
    let config = BridgeConfig {
        delivery_timeout_secs: 1,
        fallback_path: tmp.path().join("pending.txt"),
        ..Default::default()
    };
    let forwarder = Forwarder::new(
        GatewayConfig {
            base_url: format!("http://{}", addr),
            token: None,
        },
        &config,
    );

    let record = extract(CURL_ALERT);
    assert!(forwarder.forward(&record).await.is_err());
    assert!(!forwarder.fallback_path().exists());
}

#[tokio::test]
async fn auto_execute_forward_omits_buttons() {
    let gateway = spawn_gateway(Duration::ZERO).await;
    let tmp = tempfile::tempdir().unwrap();
    let config = BridgeConfig {
        auto_execute: true,
        delivery_timeout_secs: 1,
        fallback_path: tmp.path().join("pending.txt"),
        ..Default::default()
    };
    let forwarder = Forwarder::new(
        GatewayConfig {
            base_url: gateway.url.clone(),
            token: None,
        },
        &config,
    );

    let receipt = forwarder.forward(&extract(CURL_ALERT)).await.unwrap();
    assert!(receipt.message.contains("/callback"));

    let requests = gateway.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].authorization.is_none());
    assert!(requests[0].body["args"].get("buttons").is_none());
}
