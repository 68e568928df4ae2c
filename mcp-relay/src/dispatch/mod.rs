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

//! JSON-RPC Method Dispatcher.
//!
//! Maps a decoded request onto the MCP method surface and runs it against a
//! `ToolProvider`. The dispatcher is transport agnostic: it never sees raw
//! bytes, so it never produces a parse error.

use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

use crate::constants::{methods, protocol};
use crate::errors::RelayError;
use crate::protocol::negotiation::{HandshakeManager, ServerInfo};
use crate::protocol::{JsonRpcRequest, JsonRpcResponse};
use crate::registry::{ToolDescriptor, ToolProvider};

/// The closed set of methods the dispatcher understands.
#[derive(Debug, Clone, PartialEq)]
pub enum Method {
    Initialize,
    ToolsList,
    /// Raw `params`; validated only after the method is resolved
    ToolsCall(Option<Value>),
    Ping,
    Unknown(String),
}

impl Method {
    pub fn parse(req: &JsonRpcRequest) -> Self {
        match req.method.as_str() {
            methods::INITIALIZE => Method::Initialize,
            methods::TOOLS_LIST => Method::ToolsList,
            methods::TOOLS_CALL => Method::ToolsCall(req.params.clone()),
            methods::PING => Method::Ping,
            other => Method::Unknown(other.to_string()),
        }
    }
}

pub struct Dispatcher {
    tools: Arc<dyn ToolProvider>,
    server: ServerInfo,
}

impl Dispatcher {
    pub fn new(tools: Arc<dyn ToolProvider>, server: ServerInfo) -> Self {
        Self { tools, server }
    }

    pub fn server_info(&self) -> &ServerInfo {
        &self.server
    }

    pub fn list_tools(&self) -> Vec<ToolDescriptor> {
        self.tools.list_tools()
    }

    /// Handle one request.
    ///
    /// Protocol-level failures are returned as JSON-RPC error envelopes.
    /// `Err` is reserved for failures of the relay itself. Notifications are
    /// processed but yield `Ok(None)`.
    pub async fn dispatch(
        &self,
        req: JsonRpcRequest,
    ) -> Result<Option<JsonRpcResponse>, RelayError> {
        let id = req.id.clone();
        let method = Method::parse(&req);
        debug!(method = %req.method, id = ?id, "Dispatching request");

        let response = match self.run(method).await {
            Ok(result) => JsonRpcResponse::success(id.clone(), result),
            Err(e) if is_protocol_error(&e) => JsonRpcResponse::from_error(id.clone(), &e),
            Err(e) => return Err(e),
        };

        if req.is_notification() {
            debug!(method = %req.method, "Notification processed, no response");
            return Ok(None);
        }
        Ok(Some(response))
    }

    async fn run(&self, method: Method) -> Result<Value, RelayError> {
        match method {
            Method::Initialize => Ok(HandshakeManager::initialize_result(
                protocol::DEFAULT_VERSION,
                &self.server,
            )),
            Method::ToolsList => Ok(json!({ "tools": self.tools.list_tools() })),
            Method::ToolsCall(params) => self.call_tool(params).await,
            Method::Ping => Ok(json!({})),
            Method::Unknown(name) => Err(RelayError::MethodNotFound(name)),
        }
    }

    async fn call_tool(&self, params: Option<Value>) -> Result<Value, RelayError> {
        let params = params.unwrap_or(Value::Null);
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| RelayError::InvalidParams("Missing tool name".to_string()))?;
        let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

        let output = self.tools.invoke(name, arguments).await?;
        serde_json::to_value(output)
            .map_err(|e| RelayError::Internal(format!("Failed to encode tool result: {}", e)))
    }
}

/// Errors that travel inside a JSON-RPC envelope rather than escaping to the
/// transport.
fn is_protocol_error(err: &RelayError) -> bool {
    matches!(
        err,
        RelayError::MethodNotFound(_)
            | RelayError::InvalidParams(_)
            | RelayError::ToolNotFound(_)
            | RelayError::InvocationFailed(_)
    )
}
