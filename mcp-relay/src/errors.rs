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

//! Domain error types.
//!
//! Every failure that can reach a client is a `RelayError`, which knows both
//! its JSON-RPC error code and the HTTP status the endpoint should use.

use thiserror::Error;

use crate::constants::jsonrpc;

/// Main error type for the relay
#[derive(Error, Debug)]
pub enum RelayError {
    /// Malformed JSON body or stream frame (-32700). The detail is for logs only.
    #[error("Parse error")]
    Parse(String),

    /// Well-formed JSON that is not a JSON-RPC request (-32600)
    #[error("Invalid Request")]
    InvalidRequest(String),

    /// Unknown JSON-RPC method (-32601)
    #[error("Method '{0}' not found")]
    MethodNotFound(String),

    /// Missing or malformed params (-32602)
    #[error("{0}")]
    InvalidParams(String),

    /// Tool name not registered (-32603)
    #[error("Unknown tool: {0}")]
    ToolNotFound(String),

    /// Tool raised during invocation (-32603)
    #[error("{0}")]
    InvocationFailed(String),

    /// A tool name was registered twice
    #[error("Tool '{0}' is already registered")]
    DuplicateTool(String),

    /// Network or HTTP failure while forwarding (-32603)
    #[error("Bridge error: {0}")]
    Transport(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Unexpected failure inside the relay (-32603)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RelayError {
    /// JSON-RPC error code for this error
    pub fn code(&self) -> i32 {
        match self {
            RelayError::Parse(_) => jsonrpc::ERROR_PARSE,
            RelayError::InvalidRequest(_) => jsonrpc::ERROR_INVALID_REQUEST,
            RelayError::MethodNotFound(_) => jsonrpc::ERROR_METHOD_NOT_FOUND,
            RelayError::InvalidParams(_) => jsonrpc::ERROR_INVALID_PARAMS,
            RelayError::ToolNotFound(_)
            | RelayError::InvocationFailed(_)
            | RelayError::DuplicateTool(_)
            | RelayError::Transport(_)
            | RelayError::Configuration(_)
            | RelayError::Internal(_) => jsonrpc::ERROR_INTERNAL,
        }
    }

    /// HTTP status code the endpoint uses when this error escapes dispatch
    pub fn status_code(&self) -> u16 {
        match self {
            RelayError::Parse(_) | RelayError::InvalidRequest(_) => 400,
            // JSON-RPC level errors travel inside a 200 response
            RelayError::MethodNotFound(_)
            | RelayError::InvalidParams(_)
            | RelayError::ToolNotFound(_)
            | RelayError::InvocationFailed(_) => 200,
            RelayError::DuplicateTool(_)
            | RelayError::Transport(_)
            | RelayError::Configuration(_)
            | RelayError::Internal(_) => 500,
        }
    }
}

impl RelayError {
    /// Rewrap as an `Internal` error, keeping the original message.
    pub fn into_internal(self) -> RelayError {
        match self {
            RelayError::Internal(_) => self,
            other => RelayError::Internal(other.to_string()),
        }
    }
}

/// Failure reported by a tool implementation.
///
/// Only the message crosses the dispatcher boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ToolError {
    pub message: String,
}

impl ToolError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<ToolError> for RelayError {
    fn from(err: ToolError) -> Self {
        RelayError::InvocationFailed(err.message)
    }
}
