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

//! Stdio-to-HTTP bridge.
//!
//! Speaks MCP over a local byte stream and relays `tools/list` and
//! `tools/call` to the remote RPC endpoint. `initialize` and `ping` are
//! answered locally.
//!
//! Task layout: a reader task decodes frames into `DownstreamEvent`s, the
//! coordinator (`Bridge::serve`) spawns one task per request and queues its
//! reply slot, and a writer task drains the queue in arrival order.

pub mod client;
pub mod codec;
pub mod pipeline;
pub mod session;

use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::constants::bridge::{FORWARD_TIMEOUT_SECS, RESPONSE_QUEUE_DEPTH};
use crate::constants::{methods, protocol};
use crate::errors::RelayError;
use crate::protocol::negotiation::{HandshakeManager, ServerInfo};
use crate::protocol::{JsonRpcRequest, JsonRpcResponse};
use crate::registry::{Content, ToolDescriptor, ToolOutput};

use client::{RemoteClient, RemoteForwarder, RemoteReply};
use pipeline::{spawn_downstream_reader, spawn_downstream_writer, DownstreamEvent, PendingReply};
use session::BridgeSession;

#[derive(Clone)]
pub struct Bridge {
    session: Arc<BridgeSession>,
    remote: Arc<dyn RemoteForwarder>,
    debug: bool,
    /// Upper bound on flushing queued replies after the client hangs up
    drain_timeout: Duration,
}

impl Bridge {
    pub fn new(session: BridgeSession, remote: Arc<dyn RemoteForwarder>, debug: bool) -> Self {
        Self {
            session: Arc::new(session),
            remote,
            debug,
            drain_timeout: Duration::from_secs(FORWARD_TIMEOUT_SECS),
        }
    }

    pub fn with_drain_timeout(mut self, drain_timeout: Duration) -> Self {
        self.drain_timeout = drain_timeout;
        self
    }

    /// Bridge backed by an HTTP client for the session's endpoint.
    pub fn connect(session: BridgeSession, timeout: Duration, debug: bool) -> Result<Self, RelayError> {
        let client = RemoteClient::new(&session, timeout)?;
        Ok(Self::new(session, Arc::new(client), debug).with_drain_timeout(timeout))
    }

    pub fn session(&self) -> &BridgeSession {
        &self.session
    }

    /// Answer one request. Notifications are consumed and yield `None`.
    pub async fn handle(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            debug!(method = %request.method, "Consumed notification");
            return None;
        }

        let id = request.id.clone();
        let result = match request.method.as_str() {
            methods::INITIALIZE => Ok(self.initialize(request.params.as_ref())),
            methods::PING => Ok(json!({})),
            methods::TOOLS_LIST => Ok(json!({ "tools": self.list_tools().await })),
            methods::TOOLS_CALL => self.call_tool(request.params).await,
            other => Err(RelayError::MethodNotFound(other.to_string())),
        };

        Some(match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => JsonRpcResponse::from_error(id, &e),
        })
    }

    fn initialize(&self, params: Option<&Value>) -> Value {
        let requested = params
            .and_then(|p| p.get("protocolVersion"))
            .and_then(Value::as_str);
        let version = HandshakeManager::negotiate(requested);
        let server = ServerInfo::new(self.session.display_name(), protocol::BRIDGE_VERSION);
        info!(protocol_version = %version, "Local client initialized");
        HandshakeManager::initialize_result(version, &server)
    }

    /// Remote tool list. Any failure degrades to an empty list.
    pub async fn list_tools(&self) -> Vec<ToolDescriptor> {
        info!("Requesting tools from {}", self.session.rpc_url());

        let tools = match self.remote.forward(methods::TOOLS_LIST, None).await {
            RemoteReply::Envelope(response) => match (response.result(), response.error()) {
                (Some(result), _) => parse_tool_list(result),
                (_, Some(err)) => {
                    warn!(code = err.code, message = %err.message, "Error from endpoint");
                    Vec::new()
                }
                (None, None) => Vec::new(),
            },
            RemoteReply::Opaque { status, body } => {
                warn!(status, body = %body, "Unexpected response format");
                Vec::new()
            }
        };

        info!("Successfully loaded {} tools", tools.len());
        if self.debug {
            for tool in &tools {
                info!(tool = %tool.name, "Discovered tool");
            }
        }
        tools
    }

    async fn call_tool(&self, params: Option<Value>) -> Result<Value, RelayError> {
        let params = params.unwrap_or(Value::Null);
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| RelayError::InvalidParams("Missing tool name".to_string()))?;
        let arguments = params
            .get("arguments")
            .cloned()
            .unwrap_or_else(|| json!({}));

        let forwarded = json!({"name": name, "arguments": arguments});
        let output = match self.remote.forward(methods::TOOLS_CALL, Some(forwarded)).await {
            RemoteReply::Envelope(response) => match (response.result(), response.error()) {
                (Some(result), _) => relay_tool_result(result),
                (_, Some(err)) => ToolOutput::error_text(format!("Error: {}", err.message)),
                (None, None) => ToolOutput::error_text("Unknown response format"),
            },
            RemoteReply::Opaque { status, .. } if !(200..300).contains(&status) => {
                ToolOutput::error_text(format!(
                    "Error: {}",
                    RelayError::Transport(format!("remote endpoint returned HTTP {}", status))
                ))
            }
            RemoteReply::Opaque { .. } => ToolOutput::error_text("Unknown response format"),
        };

        serde_json::to_value(output)
            .map_err(|e| RelayError::Internal(format!("Failed to encode tool result: {}", e)))
    }

    /// Serve the local client until its stream closes.
    ///
    /// Replies leave in request order. On end of input no new requests are
    /// accepted; replies to requests already read are still written, for at
    /// most `drain_timeout`. Whatever is left after that is discarded.
    pub async fn serve<R, W>(self, reader: R, writer: W) -> anyhow::Result<()>
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (event_tx, mut event_rx) = mpsc::channel(RESPONSE_QUEUE_DEPTH);
        let (queue_tx, queue_rx) = mpsc::channel::<PendingReply>(RESPONSE_QUEUE_DEPTH);

        let reader_task = spawn_downstream_reader(reader, event_tx);
        let writer_task = spawn_downstream_writer(writer, queue_rx);

        while let Some(event) = event_rx.recv().await {
            let pending = match event {
                DownstreamEvent::Request(framing, request) => {
                    if request.is_notification() {
                        self.handle(request).await;
                        continue;
                    }
                    let id = request.id.clone();
                    let (tx, rx) = oneshot::channel();
                    let bridge = self.clone();
                    tokio::spawn(async move {
                        let _ = tx.send(bridge.handle(request).await);
                    });
                    PendingReply { framing, id, rx }
                }
                DownstreamEvent::Error { framing, id, error } => {
                    let (tx, rx) = oneshot::channel();
                    let _ = tx.send(Some(JsonRpcResponse::from_error(id.clone(), &error)));
                    PendingReply { framing, id, rx }
                }
                DownstreamEvent::Disconnect => break,
            };
            if queue_tx.send(pending).await.is_err() {
                warn!("Writer stopped, closing bridge");
                break;
            }
        }

        info!("Local client disconnected, flushing pending replies");
        drop(queue_tx);
        reader_task.abort();

        let writer_abort = writer_task.abort_handle();
        match tokio::time::timeout(self.drain_timeout, writer_task).await {
            Ok(_) => info!("Bridge shut down"),
            Err(_) => {
                warn!(
                    timeout_secs = self.drain_timeout.as_secs(),
                    "Pending replies not ready in time, discarding"
                );
                writer_abort.abort();
            }
        }
        Ok(())
    }
}

fn parse_tool_list(result: &Value) -> Vec<ToolDescriptor> {
    let Some(tools) = result.get("tools") else {
        warn!("Unexpected response format: missing 'tools'");
        return Vec::new();
    };
    match serde_json::from_value::<Vec<ToolDescriptor>>(tools.clone()) {
        Ok(tools) => tools,
        Err(e) => {
            warn!(error = %e, "Error listing tools");
            Vec::new()
        }
    }
}

/// Keep text items in order; anything else is dropped.
fn relay_tool_result(result: &Value) -> ToolOutput {
    let content = result
        .get("content")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter(|item| item.get("type").and_then(Value::as_str) == Some("text"))
                .filter_map(|item| item.get("text").and_then(Value::as_str))
                .map(Content::text)
                .collect()
        })
        .unwrap_or_default();
    let is_error = result
        .get("isError")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    ToolOutput { content, is_error }
}
