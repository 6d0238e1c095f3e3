//! LuLu Bridge - firewall alert relay daemon
//!
//! Watches LuLu's alert windows, forwards each new alert to an OpenClaw
//! gateway and clicks the chosen verdict back into the window.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

// Re-export from library
pub use lulu_bridge::*;

mod cli;

/// LuLu Bridge - firewall alert relay
#[derive(Parser)]
#[command(name = "lulu-bridge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Bridge config file (default: ~/.lulu-bridge/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bridge daemon (poller + control surface)
    Start,

    /// Apply an action to the open alert once, then exit
    Act {
        /// allow, block, allow-once or block-once
        #[arg(value_parser = parse_action)]
        action: RuleAction,
    },

    /// Print what would be extracted from the open alert
    Scrape,

    /// Ask a running daemon for its status
    Status,
}

fn parse_action(s: &str) -> Result<RuleAction, String> {
    s.parse::<RuleAction>().map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config = config::BridgeConfig::load(cli.config.as_deref());

    match cli.command {
        Commands::Start => {
            info!("🛡️ Starting LuLu Bridge...");
            cli::start::run(config).await?;
        }
        Commands::Act { action } => {
            cli::act::run(&config, action).await?;
        }
        Commands::Scrape => {
            cli::scrape::run(&config).await?;
        }
        Commands::Status => {
            cli::status::run(&config).await?;
        }
    }

    Ok(())
}
