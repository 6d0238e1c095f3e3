//! Act command - one-shot action against the open alert

use lulu_bridge::bridge::osascript::OsascriptBridge;
use lulu_bridge::config::BridgeConfig;
use lulu_bridge::player;
use lulu_bridge::RuleAction;

pub async fn run(config: &BridgeConfig, action: RuleAction) -> anyhow::Result<()> {
    let bridge = OsascriptBridge::new(&config.process_name, config.ui_timeout());
    let report = player::perform(&bridge, action).await;

    for step in &report.steps {
        println!("  {} → {:?}", step.interaction, step.outcome);
    }

    if report.success {
        println!("✅ {}", action.label());
        Ok(())
    } else {
        anyhow::bail!("could not apply {} (is a {} alert open?)", action, config.process_name)
    }
}
