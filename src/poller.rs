//! Alert poll loop
//!
//! State machine over `Idle` / `AlertActive`:
//! - window appears (or its content changes): extract, forward if the
//!   fingerprint is new
//! - window stays with the same fingerprint: nothing
//! - window disappears, or cannot be queried or read: forget the
//!   fingerprint
//!
//! Ticks never overlap. The next tick is scheduled only after the current
//! one has finished.

use crate::monitor::{AlertPhase, Monitor, MonitorState};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// What a single tick did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// No alert window
    Idle,
    /// The alert window went away
    Dismissed,
    /// Same alert as last time
    Unchanged,
    /// Querying or scraping the window failed; counts as no alert
    ScrapeFailed,
    /// New alert delivered to the gateway
    Forwarded {
        fingerprint: String,
        message_id: Option<String>,
    },
    /// New alert, delivery failed, fallback file attempted
    FallbackWritten { fingerprint: String, written: bool },
}

/// Drop back to `Idle`. Returns whether an alert was active.
fn forget_alert(state: &mut MonitorState) -> bool {
    let was_active = state.phase == AlertPhase::AlertActive;
    state.phase = AlertPhase::Idle;
    state.last_fingerprint = None;
    was_active
}

/// Run one poll cycle
pub async fn tick(monitor: &Monitor) -> TickOutcome {
    let record = {
        let mut state = monitor.state.lock().await;

        let present = match monitor.bridge.alert_present().await {
            Ok(present) => present,
            Err(e) => {
                debug!("Alert window query failed: {}", e);
                forget_alert(&mut state);
                return TickOutcome::ScrapeFailed;
            }
        };

        if !present {
            if forget_alert(&mut state) {
                info!("👋 Alert window dismissed");
                return TickOutcome::Dismissed;
            }
            return TickOutcome::Idle;
        }

        let fragments = match monitor.bridge.scrape().await {
            Ok(fragments) => fragments,
            Err(e) => {
                debug!("Alert scrape failed: {}", e);
                forget_alert(&mut state);
                return TickOutcome::ScrapeFailed;
            }
        };

        state.phase = AlertPhase::AlertActive;
        let record = monitor.extractor.extract(&fragments);
        if state.last_fingerprint.as_deref() == Some(record.fingerprint.as_str()) {
            return TickOutcome::Unchanged;
        }

        info!(
            "🚨 New alert: {} -> {} [{}]",
            record.process_name.as_deref().unwrap_or("unknown"),
            record.remote_endpoint(),
            record.fingerprint
        );
        state.last_fingerprint = Some(record.fingerprint.clone());
        record
    };

    let text = monitor.forwarder.render(&record);
    match monitor.forwarder.deliver(&text).await {
        Ok(receipt) => {
            let mut state = monitor.state.lock().await;
            state.last_message_id = receipt.message_id.clone();
            state.last_message_content = Some(receipt.message);
            TickOutcome::Forwarded {
                fingerprint: record.fingerprint,
                message_id: receipt.message_id,
            }
        }
        Err(e) => {
            warn!("⚠️ Alert delivery failed: {}", e);
            {
                let mut state = monitor.state.lock().await;
                state.last_message_id = None;
                state.last_message_content = None;
            }
            let written = match monitor.forwarder.write_fallback(&text) {
                Ok(()) => true,
                Err(e) => {
                    error!("Failed to write fallback: {}", e);
                    false
                }
            };
            TickOutcome::FallbackWritten {
                fingerprint: record.fingerprint,
                written,
            }
        }
    }
}

/// Poll forever, one tick at a time
pub async fn run(monitor: Arc<Monitor>, interval: Duration) {
    info!("👀 Watching for alerts every {:?}...", interval);
    loop {
        match tick(&monitor).await {
            TickOutcome::Idle | TickOutcome::Unchanged => {}
            outcome => debug!("Tick: {:?}", outcome),
        }
        tokio::time::sleep(interval).await;
    }
}
