#![forbid(unsafe_code)]
//! HashLedger node: serves the ledger API and talks to peers over HTTP.

use clap::Parser;
use hashledger::config::{load_config_from, DEFAULT_CONFIG_PATH};
use hashledger::node::Node;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "hashledger-node", version, about = "Run a HashLedger node")]
struct Cli {
    /// Port to listen on (overrides network.api_port)
    #[arg(short, long)]
    port: Option<u16>,

    /// Path to the TOML configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = load_config_from(&cli.config)?;
    if let Some(port) = cli.port {
        config.network.api_port = port;
    }

    let node = Arc::new(Node::from_config(config)?);
    node.run().await
}
