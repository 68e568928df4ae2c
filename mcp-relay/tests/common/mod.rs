// Shared helpers for the HTTP integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use mcp_relay::api::{create_router, AppState};
use mcp_relay::config::Config;
use mcp_relay::errors::ToolError;
use mcp_relay::registry::{Content, FnTool, Tool, ToolDescriptor, ToolRegistry};
use mcp_relay::tools::register_builtins;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

/// Tool that panics on every call.
pub struct PanickingTool {
    descriptor: ToolDescriptor,
}

impl PanickingTool {
    pub fn new() -> Self {
        Self {
            descriptor: ToolDescriptor::new("explode", "panics", json!({"type": "object"})),
        }
    }
}

#[async_trait]
impl Tool for PanickingTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, _arguments: Value) -> Result<Vec<Content>, ToolError> {
        panic!("tool exploded")
    }
}

/// Tool that answers after `delay`.
pub fn slow_tool(delay: Duration) -> impl Tool {
    FnTool::new(
        ToolDescriptor::new("slow", "sleeps before answering", json!({"type": "object"})),
        move |_args: Value| async move {
            tokio::time::sleep(delay).await;
            Ok(vec![Content::text("done")])
        },
    )
}

pub fn test_registry() -> ToolRegistry {
    register_builtins(ToolRegistry::builder())
        .unwrap()
        .register(PanickingTool::new())
        .unwrap()
        .build()
}

pub fn app_with(config: Config) -> Router {
    app_with_registry(config, test_registry())
}

pub fn app_with_registry(config: Config, registry: ToolRegistry) -> Router {
    let state = AppState::new(config, Arc::new(registry));
    create_router(&state).with_state(state)
}

pub fn app() -> Router {
    app_with(Config::test_config())
}

pub fn rpc_request(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/mcp")
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

pub async fn send_json(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, request).await;
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}
