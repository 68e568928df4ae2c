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

// Response types for HTTP endpoints

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::protocol::JsonRpcResponse;

/// Error body used outside the JSON-RPC contract (access gate).
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

/// `GET /` reflection of the running server.
#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: String,
    pub status: String,
    pub server_name: String,
    pub tools_count: usize,
    pub available_tools: Vec<String>,
}

/// Outcome of one RPC call at the HTTP level.
#[derive(Debug)]
pub enum RpcOutcome {
    Reply(StatusCode, JsonRpcResponse),
    /// Notification: nothing to send back
    Accepted,
}

impl IntoResponse for RpcOutcome {
    fn into_response(self) -> Response {
        match self {
            RpcOutcome::Reply(status, body) => (status, Json(body)).into_response(),
            RpcOutcome::Accepted => StatusCode::ACCEPTED.into_response(),
        }
    }
}

/// Plain-text script download.
#[derive(Debug)]
pub struct ScriptResponse {
    pub status: StatusCode,
    pub body: String,
    /// Set only on success, as an attachment filename
    pub filename: Option<&'static str>,
}

impl ScriptResponse {
    pub fn attachment(filename: &'static str, body: String) -> Self {
        Self {
            status: StatusCode::OK,
            body,
            filename: Some(filename),
        }
    }

    pub fn failure(status: StatusCode, body: String) -> Self {
        Self {
            status,
            body,
            filename: None,
        }
    }
}

impl IntoResponse for ScriptResponse {
    fn into_response(self) -> Response {
        let content_type = (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string());
        match self.filename {
            Some(name) => (
                self.status,
                [
                    content_type,
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename={}", name),
                    ),
                ],
                self.body,
            )
                .into_response(),
            None => (self.status, [content_type], self.body).into_response(),
        }
    }
}
