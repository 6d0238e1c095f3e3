//! Status command - asks a running daemon for its state

use lulu_bridge::config::BridgeConfig;
use serde_json::Value;
use std::time::Duration;

pub async fn run(config: &BridgeConfig) -> anyhow::Result<()> {
    println!("🛡️ LuLu Bridge Status");
    println!("─────────────────");

    let url = format!("{}/status", config.control_url());
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(3))
        .build()?;

    match client.get(&url).send().await {
        Ok(resp) => {
            let status: Value = resp.json().await?;
            let field = |key: &str| match &status[key] {
                Value::Null => "-".to_string(),
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            println!("Status: 🟢 Running (v{}, up {}s)", field("version"), field("uptimeSeconds"));
            println!("Alert open:    {}", field("hasAlert"));
            println!("Last alert:    {}", field("lastAlertHash"));
            println!("Last message:  {}", field("lastMessageId"));
        }
        Err(_) => {
            println!("Status: 🔴 Not running (nothing on {})", config.control_url());
            println!("\nRun 'lulu-bridge start' to start the daemon");
        }
    }

    Ok(())
}
