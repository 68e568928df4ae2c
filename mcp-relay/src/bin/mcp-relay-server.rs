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

// HTTP entry point: stateless JSON-RPC endpoint over the built-in tools

use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

use mcp_relay::api::{create_router, AppState};
use mcp_relay::config::Config;
use mcp_relay::tools::builtin_registry;
use mcp_relay::utils::logging::{init_tracing, LogSettings, LogTarget};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&LogSettings {
        level: config.log_level.clone(),
        format: config.log_format.clone(),
        target: LogTarget::Stdout,
    })?;

    info!(
        name = %config.server_name,
        version = %config.server_version,
        "Starting MCP relay server"
    );
    if config.api_key.is_none() {
        info!("MCP_API_KEY not set, access gate disabled");
    }

    let registry = builtin_registry()?;
    info!(tools = ?registry.names(), "Tool registry initialized");

    let addr = config.socket_addr();
    let app_state = AppState::new(config, Arc::new(registry));
    let router = create_router(&app_state).with_state(app_state);

    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
        error!(addr = %addr, error = %e, "Failed to bind listener");
        e
    })?;
    info!(addr = %addr, "Server listening on {}", addr);

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use signal::unix::{signal, SignalKind};
        signal(SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Ctrl+C received, starting graceful shutdown");
        },
        _ = terminate => {
            info!("SIGTERM received, starting graceful shutdown");
        },
    }
}
