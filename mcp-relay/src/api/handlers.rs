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

// Request handlers for HTTP endpoints

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
};
use futures_util::FutureExt;
use serde_json::Value;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::api::responses::{HealthResponse, RootResponse, RpcOutcome, ScriptResponse};
use crate::api::AppState;
use crate::constants::scripts;
use crate::errors::RelayError;
use crate::protocol::{JsonRpcRequest, JsonRpcResponse, RequestId};
use crate::utils::time::now_iso8601;

/// POST /mcp
///
/// Request flow:
/// 1. Access gate (route layer, before the body is read)
/// 2. Decode JSON, then the JSON-RPC request shape
/// 3. Dispatch under the request timeout, catching panics raised by tools
/// 4. Map the outcome onto 200 / 202 / 400 / 500
pub async fn rpc_handler(State(app_state): State<AppState>, body: Bytes) -> RpcOutcome {
    let raw: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            debug!(error = %e, "Rejecting unparseable body");
            return error_reply(None, &RelayError::Parse(e.to_string()));
        }
    };

    let request = match decode_request(&raw) {
        Ok(req) => req,
        Err(e) => {
            debug!(error = ?e, "Rejecting invalid JSON-RPC request");
            return error_reply(RequestId::recover(&raw), &e);
        }
    };

    let id = request.id.clone();
    let method = request.method.clone();
    let timeout_secs = app_state.config.request_timeout_secs;
    let dispatched = tokio::time::timeout(
        Duration::from_secs(timeout_secs),
        AssertUnwindSafe(app_state.dispatcher.dispatch(request)).catch_unwind(),
    )
    .await;

    match dispatched {
        Ok(Ok(Ok(Some(response)))) => RpcOutcome::Reply(StatusCode::OK, response),
        Ok(Ok(Ok(None))) => RpcOutcome::Accepted,
        Ok(Ok(Err(e))) => {
            error!(method = %method, error = %e, "Dispatch failed");
            error_reply(id, &e.into_internal())
        }
        Ok(Err(payload)) => {
            let detail = panic_message(payload.as_ref());
            error!(method = %method, panic = %detail, "Handler panicked during dispatch");
            error_reply(id, &RelayError::Internal(detail))
        }
        Err(_) => {
            error!(method = %method, timeout_secs, "Dispatch timed out");
            error_reply(
                id,
                &RelayError::Internal(format!("request timed out after {}s", timeout_secs)),
            )
        }
    }
}

/// Valid JSON must also be a request object.
fn decode_request(raw: &Value) -> Result<JsonRpcRequest, RelayError> {
    if !raw.is_object() {
        return Err(RelayError::InvalidRequest("body is not an object".to_string()));
    }
    serde_json::from_value(raw.clone()).map_err(|e| RelayError::InvalidRequest(e.to_string()))
}

fn error_reply(id: Option<RequestId>, err: &RelayError) -> RpcOutcome {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    RpcOutcome::Reply(status, JsonRpcResponse::from_error(id, err))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}

/// GET /
pub async fn root_handler(State(app_state): State<AppState>) -> Json<RootResponse> {
    let server_name = app_state.dispatcher.server_info().name.clone();
    let available_tools: Vec<String> = app_state
        .dispatcher
        .list_tools()
        .into_iter()
        .map(|t| t.name)
        .collect();

    Json(RootResponse {
        message: format!("{} is running", server_name),
        status: "ok".to_string(),
        server_name,
        tools_count: available_tools.len(),
        available_tools,
    })
}

/// GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: now_iso8601(),
    })
}

/// GET /bridge.py
pub async fn bridge_script_handler(State(app_state): State<AppState>) -> ScriptResponse {
    let path = app_state.config.bridge_script_path.as_deref();
    match load_script(path, scripts::BRIDGE_SOURCE, "Bridge").await {
        Ok(content) => ScriptResponse::attachment(scripts::BRIDGE_FILENAME, content),
        Err(resp) => resp,
    }
}

/// GET /install.py
///
/// The installer learns the server URL from the origin of this request.
pub async fn install_script_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
) -> ScriptResponse {
    let path = app_state.config.install_script_path.as_deref();
    match load_script(path, scripts::INSTALL_SOURCE, "Install").await {
        Ok(content) => {
            let origin = request_origin(&headers, &app_state.config.socket_addr());
            info!(origin = %origin, "Serving installer");
            ScriptResponse::attachment(
                scripts::INSTALL_FILENAME,
                inject_origin(&content, &origin),
            )
        }
        Err(resp) => resp,
    }
}

async fn load_script(
    path: Option<&Path>,
    embedded: &str,
    label: &str,
) -> Result<String, ScriptResponse> {
    let Some(path) = path else {
        return Ok(embedded.to_string());
    };
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "{} script not found", label);
            Err(ScriptResponse::failure(
                StatusCode::NOT_FOUND,
                format!("# {} script not found", label),
            ))
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "Failed to read {} script", label);
            Err(ScriptResponse::failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("# Error loading {} script: {}", label.to_lowercase(), e),
            ))
        }
    }
}

/// `<scheme>://<host>` as seen by the client, honouring reverse-proxy headers.
pub fn request_origin(headers: &HeaderMap, fallback_host: &str) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            // proxies may append a list; the first entry is the client-facing one
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };
    let scheme = header("x-forwarded-proto").unwrap_or("http");
    let host = header("x-forwarded-host")
        .or_else(|| header("host"))
        .unwrap_or(fallback_host);
    format!("{}://{}", scheme, host)
}

pub fn inject_origin(script: &str, origin: &str) -> String {
    script.replace(
        scripts::ORIGIN_PLACEHOLDER,
        &format!("INJECTED_SERVER_URL = '{}'", origin),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde_json::json;

    #[test]
    fn test_decode_request_rejects_non_objects() {
        assert!(matches!(
            decode_request(&json!([1, 2, 3])),
            Err(RelayError::InvalidRequest(_))
        ));
        assert!(matches!(
            decode_request(&json!({"jsonrpc": "2.0", "id": 1})),
            Err(RelayError::InvalidRequest(_))
        ));
        assert!(matches!(
            decode_request(&json!({"jsonrpc": "2.0", "id": {"nested": true}, "method": "ping"})),
            Err(RelayError::InvalidRequest(_))
        ));
        assert!(decode_request(&json!({"jsonrpc": "2.0", "id": 1, "method": "ping"})).is_ok());
    }

    #[test]
    fn test_request_origin() {
        let mut headers = HeaderMap::new();
        assert_eq!(request_origin(&headers, "0.0.0.0:3000"), "http://0.0.0.0:3000");

        headers.insert("host", HeaderValue::from_static("relay.example.com"));
        assert_eq!(request_origin(&headers, "x"), "http://relay.example.com");

        headers.insert("x-forwarded-proto", HeaderValue::from_static("https, http"));
        headers.insert("x-forwarded-host", HeaderValue::from_static("public.example.com"));
        assert_eq!(request_origin(&headers, "x"), "https://public.example.com");
    }

    #[test]
    fn test_inject_origin() {
        let script = "import sys\n# INJECTED_SERVER_URL = None\nprint('hi')\n";
        let out = inject_origin(script, "https://relay.example.com");
        assert!(out.contains("INJECTED_SERVER_URL = 'https://relay.example.com'"));
        assert!(!out.contains("# INJECTED_SERVER_URL = None"));
    }

    #[test]
    fn test_embedded_installer_has_placeholder() {
        assert_eq!(scripts::INSTALL_SOURCE.matches(scripts::ORIGIN_PLACEHOLDER).count(), 1);
        let out = inject_origin(scripts::INSTALL_SOURCE, "http://localhost:3000");
        assert!(out.contains("INJECTED_SERVER_URL = 'http://localhost:3000'"));
    }

    #[tokio::test]
    async fn test_load_script_prefers_override() {
        let embedded = load_script(None, "embedded", "Bridge").await.unwrap();
        assert_eq!(embedded, "embedded");
        let missing = load_script(Some(Path::new("/nonexistent/x.py")), "embedded", "Bridge").await;
        assert!(missing.is_err());
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("kaboom"));
        assert_eq!(panic_message(payload.as_ref()), "kaboom");
        let payload: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(payload.as_ref()), "handler panicked");
    }
}
