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

//! HTTP client forwarding bridge calls to the remote RPC endpoint.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::bridge::session::BridgeSession;
use crate::constants::auth;
use crate::errors::RelayError;
use crate::protocol::{JsonRpcRequest, JsonRpcResponse, RequestId};

/// What came back from the remote endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteReply {
    /// A JSON-RPC envelope, either relayed or synthesized from a transport failure
    Envelope(JsonRpcResponse),
    /// Non-2xx status, or a body that is not a JSON-RPC response
    Opaque { status: u16, body: String },
}

/// Forwards one JSON-RPC call to the remote endpoint.
#[async_trait]
pub trait RemoteForwarder: Send + Sync {
    /// Never fails: transport problems come back as a `-32603` envelope.
    async fn forward(&self, method: &str, params: Option<Value>) -> RemoteReply;
}

pub struct RemoteClient {
    http_client: Client,
    rpc_url: String,
    api_key: Option<SecretString>,
    timeout: Duration,
}

impl RemoteClient {
    pub fn new(session: &BridgeSession, timeout: Duration) -> Result<Self, RelayError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .tcp_nodelay(true)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| {
                RelayError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            http_client,
            rpc_url: session.rpc_url().to_string(),
            api_key: session.api_key().cloned(),
            timeout,
        })
    }

    async fn send(&self, request: &JsonRpcRequest) -> Result<RemoteReply, RelayError> {
        let mut builder = self
            .http_client
            .post(&self.rpc_url)
            .header("Accept", "application/json, text/event-stream")
            .json(request);
        if let Some(key) = &self.api_key {
            builder = builder.header(auth::HEADER_API_KEY, key.expose_secret().as_str());
        }

        let response = builder.send().await.map_err(|e| self.describe(e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| self.describe(e))?;

        if !status.is_success() {
            warn!(status = %status, url = %self.rpc_url, "Remote endpoint returned HTTP error");
            return Ok(RemoteReply::Opaque {
                status: status.as_u16(),
                body,
            });
        }

        match serde_json::from_str::<JsonRpcResponse>(&body) {
            Ok(envelope) => Ok(RemoteReply::Envelope(envelope)),
            Err(e) => {
                debug!(error = %e, "Remote body is not a JSON-RPC response");
                Ok(RemoteReply::Opaque {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }

    fn describe(&self, e: reqwest::Error) -> RelayError {
        if e.is_timeout() {
            RelayError::Transport(format!("Request timeout after {}s", self.timeout.as_secs()))
        } else if e.is_connect() {
            RelayError::Transport(format!("Connection failed: {}", e))
        } else {
            RelayError::Transport(format!("HTTP request failed: {}", e))
        }
    }
}

#[async_trait]
impl RemoteForwarder for RemoteClient {
    async fn forward(&self, method: &str, params: Option<Value>) -> RemoteReply {
        let request_id = RequestId::String(Uuid::new_v4().to_string());
        let request = JsonRpcRequest::new(Some(request_id.clone()), method, params);

        debug!(
            url = %self.rpc_url,
            method = %method,
            request_id = %request_id,
            "Forwarding request to remote endpoint"
        );

        match self.send(&request).await {
            Ok(RemoteReply::Envelope(response)) => {
                if response.id.as_ref() != Some(&request_id) {
                    warn!(
                        expected = %request_id,
                        received = ?response.id,
                        "Remote response id does not match request id"
                    );
                }
                RemoteReply::Envelope(response)
            }
            Ok(opaque) => opaque,
            Err(e) => {
                error!(url = %self.rpc_url, method = %method, error = %e, "Forwarding failed");
                RemoteReply::Envelope(JsonRpcResponse::from_error(Some(request_id), &e))
            }
        }
    }
}
