//! Scrape command - dumps the open alert and the message it would produce

use lulu_bridge::bridge::{osascript::OsascriptBridge, UiBridge};
use lulu_bridge::config::{BridgeConfig, GatewayConfig};
use lulu_bridge::extractor::FieldExtractor;
use lulu_bridge::forwarder::Forwarder;

pub async fn run(config: &BridgeConfig) -> anyhow::Result<()> {
    let bridge = OsascriptBridge::new(&config.process_name, config.ui_timeout());

    if !bridge.alert_present().await? {
        println!("No {} alert window open.", config.process_name);
        return Ok(());
    }

    let fragments = bridge.scrape().await?;
    let record = FieldExtractor::new().extract(&fragments);

    println!("{}", serde_json::to_string_pretty(&record)?);
    println!("─────────────────");
    let forwarder = Forwarder::new(GatewayConfig::default(), config);
    println!("{}", forwarder.render(&record));

    Ok(())
}
