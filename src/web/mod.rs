//! Loopback control surface
//!
//! Lets the gateway (or an operator) query the bridge and trigger actions
//! against the open alert window.

pub mod routes;

use axum::{
    routing::{get, post},
    Router,
};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::monitor::Monitor;

/// Build the control router
pub fn router(monitor: Arc<Monitor>) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/status", get(routes::get_status))
        .route("/action", post(routes::post_action))
        .route("/callback", post(routes::post_callback))
        .with_state(monitor)
        .layer(TraceLayer::new_for_http())
}

/// Serve the control surface on 127.0.0.1 only
pub async fn start_server(port: u16, monitor: Arc<Monitor>) -> anyhow::Result<()> {
    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("🌐 Control surface listening on http://{}", addr);

    axum::serve(listener, router(monitor)).await?;

    Ok(())
}

/// Run the control surface in the background.
///
/// A bind failure (e.g. another instance holding the port) is logged and
/// the task ends; callers keep polling without a control surface.
pub fn spawn_server(port: u16, monitor: Arc<Monitor>) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = start_server(port, monitor).await {
            error!("Control surface unavailable on port {}: {} (polling continues)", port, e);
        }
    })
}
