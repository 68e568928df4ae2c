// Copyright 2026 BadCompany
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Stdio entry point: relays a local MCP client to a remote relay server

use clap::Parser;
use std::time::Duration;
use tracing::info;

use mcp_relay::bridge::session::BridgeSession;
use mcp_relay::bridge::Bridge;
use mcp_relay::config::{validate_log_format, validate_log_level};
use mcp_relay::constants::{auth, bridge};
use mcp_relay::utils::logging::{init_tracing, LogSettings, LogTarget};

/// Bridge MCP requests to a remote MCP server
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Remote MCP server URL
    endpoint: String,

    /// Enable debug logging on stderr, including discovered tool names
    #[arg(long)]
    debug: bool,

    /// Timeout for each forwarded request, in seconds
    #[arg(long, default_value_t = bridge::FORWARD_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Shared secret sent as X-API-Key
    #[arg(long, env = "MCP_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[arg(long, env = "LOG_FORMAT", default_value = "text")]
    log_format: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    install_panic_hook();

    let level = if cli.debug { "debug".to_string() } else { cli.log_level.clone() };
    validate_log_level(&level)?;
    validate_log_format(&cli.log_format)?;
    // stdout carries the protocol
    init_tracing(&LogSettings {
        level,
        format: cli.log_format.clone(),
        target: LogTarget::Stderr,
    })?;

    let session = BridgeSession::new(&cli.endpoint, cli.api_key)?;
    info!("Starting MCP Bridge...");
    info!("Endpoint: {}", session.endpoint());
    info!("Server name: {}", session.display_name());
    if session.api_key().is_none() {
        info!("{} not set, forwarding without an API key", auth::ENV_API_KEY);
    }

    let bridge = Bridge::connect(session, Duration::from_secs(cli.timeout_secs), cli.debug)?;
    bridge.serve(tokio::io::stdin(), tokio::io::stdout()).await
}

fn install_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        let location = panic_info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown".to_string());

        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("PANIC: {} at {}", message, location);
    }));
}
