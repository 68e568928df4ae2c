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

// Axum web server layer

use axum::{
    error_handling::HandleErrorLayer, http::StatusCode, routing::get, routing::post, BoxError,
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

pub mod handlers;
pub mod responses;

use crate::auth::{auth_middleware::auth_middleware, AccessGate};
use crate::config::Config;
use crate::constants::routes;
use crate::dispatch::Dispatcher;
use crate::protocol::negotiation::ServerInfo;
use crate::registry::ToolProvider;

/// Shared, immutable state handed to every request.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub gate: Arc<AccessGate>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, tools: Arc<dyn ToolProvider>) -> Self {
        let server = ServerInfo::new(config.server_name.clone(), config.server_version.clone());
        Self {
            dispatcher: Arc::new(Dispatcher::new(tools, server)),
            gate: Arc::new(AccessGate::from_config(&config)),
            config: Arc::new(config),
        }
    }
}

/// Create the Axum router with all routes and middleware
///
/// `POST /mcp`, outermost to innermost:
/// - Tracing (tower-http::trace)
/// - Access gate
/// - Body size limit (tower-http::limit)
/// - The handler, which enforces the request timeout itself so a slow
///   dispatch still answers with a JSON-RPC envelope
///
/// The info and script routes share tracing plus a tower timeout, mapped to
/// 408 by `HandleErrorLayer`.
pub fn create_router(app_state: &AppState) -> Router<AppState> {
    let rpc = Router::new()
        .route(
            routes::RPC,
            post(handlers::rpc_handler).layer(RequestBodyLimitLayer::new(
                app_state.config.body_size_limit_bytes,
            )),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            app_state.gate.clone(),
            auth_middleware,
        ));

    let timeout_secs = app_state.config.request_timeout_secs;
    let middleware_stack = ServiceBuilder::new()
        // HandleErrorLayer must come before timeout to catch the timeout error
        .layer(HandleErrorLayer::new(|e: BoxError| async move {
            let status = if e.is::<tower::timeout::error::Elapsed>() {
                StatusCode::REQUEST_TIMEOUT
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (status, e.to_string())
        }))
        .timeout(Duration::from_secs(timeout_secs))
        .into_inner();

    let info = Router::new()
        .route(routes::ROOT, get(handlers::root_handler))
        .route(routes::HEALTH, get(handlers::health_handler))
        .route(routes::BRIDGE_SCRIPT, get(handlers::bridge_script_handler))
        .route(routes::INSTALL_SCRIPT, get(handlers::install_script_handler))
        .layer(middleware_stack);

    rpc.merge(info).layer(TraceLayer::new_for_http())
}
