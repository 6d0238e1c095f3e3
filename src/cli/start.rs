//! Start command - runs the poll loop and the control surface

use lulu_bridge::bridge::osascript::OsascriptBridge;
use lulu_bridge::config::{BridgeConfig, GatewayConfig};
use lulu_bridge::forwarder::Forwarder;
use lulu_bridge::monitor::Monitor;
use lulu_bridge::{poller, web};
use std::fs;
use std::sync::Arc;
use tracing::{info, warn};

const PID_FILE: &str = "/tmp/lulu-bridge.pid";

/// PID of another live instance, if the pid file points at one
fn running_pid() -> Option<i32> {
    let pid = fs::read_to_string(PID_FILE).ok()?.trim().parse::<i32>().ok()?;
    if pid as u32 == std::process::id() {
        return None;
    }
    let alive = unsafe { libc::kill(pid, 0) == 0 };
    alive.then_some(pid)
}

fn write_pid() -> anyhow::Result<()> {
    let pid = std::process::id();
    fs::write(PID_FILE, pid.to_string())?;
    Ok(())
}

fn remove_pid() {
    let _ = fs::remove_file(PID_FILE);
}

pub async fn run(config: BridgeConfig) -> anyhow::Result<()> {
    if let Some(pid) = running_pid() {
        warn!("⚠️ Another LuLu Bridge appears to be running (PID {})", pid);
    }
    if let Err(e) = write_pid() {
        warn!("⚠️ Could not write {}: {}", PID_FILE, e);
    }

    // Setup cleanup on exit
    let _guard = scopeguard::guard((), |_| {
        remove_pid();
    });

    info!("🛡️ LuLu Bridge starting (PID: {})...", std::process::id());

    if !OsascriptBridge::is_available() {
        warn!("⚠️ osascript not found, every poll will report no alert");
    }

    let gateway = GatewayConfig::load();
    info!("📡 Gateway: {}", gateway.base_url);
    if config.auto_execute {
        info!("🤖 Auto-execute mode: the analyzer decides and calls back");
    }

    let bridge = Arc::new(OsascriptBridge::new(&config.process_name, config.ui_timeout()));
    let forwarder = Forwarder::new(gateway, &config);
    let monitor = Arc::new(Monitor::new(bridge, forwarder));

    // Control surface failures leave the poll loop running
    web::spawn_server(config.control_port, monitor.clone());

    info!("✅ LuLu Bridge started, watching '{}'", config.process_name);

    tokio::select! {
        _ = poller::run(monitor, config.poll_interval()) => {}
        _ = tokio::signal::ctrl_c() => {
            info!("🛑 Shutting down...");
        }
    }

    Ok(())
}
