// ABOUTME: Pebble server binary entry point
// ABOUTME: Loads configuration, authorizes the calendar, and serves the HTTP API
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pebble Contributors

//! # Pebble Server
//!
//! ```bash
//! # Serve on the configured address (HOST / HTTP_PORT, default 127.0.0.1:5000)
//! cargo run --bin pebble-server
//!
//! # Override the bind address
//! cargo run --bin pebble-server -- --host 0.0.0.0 --port 8080
//! ```
//!
//! On first start without a usable `token.json`, a browser consent flow runs
//! against a loopback redirect before the listener comes up.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use pebble_server::calendar::CalendarGateway;
use pebble_server::config::ServerConfig;
use pebble_server::llm::OpenAiProvider;
use pebble_server::logging::init_logging;
use pebble_server::resources::ServerResources;
use pebble_server::server::PebbleServer;

#[derive(Parser)]
#[command(
    name = "pebble-server",
    version,
    about = "Pebble study-companion chat server"
)]
struct Args {
    /// Bind host override
    #[arg(long)]
    host: Option<String>,

    /// Bind port override
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    let mut config = ServerConfig::from_env()?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.http_port = port;
    }

    init_logging(&config.logging)?;
    info!(
        "Starting Pebble server v{} (model {})",
        env!("CARGO_PKG_VERSION"),
        config.llm.default_model
    );

    let gateway = Arc::new(CalendarGateway::new(config.calendar.clone()));
    gateway.initialize().await?;

    let provider = Arc::new(OpenAiProvider::new(config.llm.clone()));
    let resources = Arc::new(ServerResources::new(Arc::new(config), provider, gateway));

    PebbleServer::new(resources).run().await?;
    Ok(())
}
