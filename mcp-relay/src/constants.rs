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

//! mcp-relay constants - single source of truth for protocol values.
//!
//! Error codes, method names, header names and limits shared by the HTTP
//! endpoint and the bridge live here so both sides agree on the wire.

/// JSON-RPC 2.0 Error Codes
pub mod jsonrpc {
    /// Protocol version tag carried by every envelope
    pub const VERSION: &str = "2.0";
    /// Parse error (standard JSON-RPC)
    pub const ERROR_PARSE: i32 = -32700;
    /// Invalid request (standard JSON-RPC)
    pub const ERROR_INVALID_REQUEST: i32 = -32600;
    /// Method not found (standard JSON-RPC)
    pub const ERROR_METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid params (standard JSON-RPC)
    pub const ERROR_INVALID_PARAMS: i32 = -32602;
    /// Internal error (standard JSON-RPC)
    pub const ERROR_INTERNAL: i32 = -32603;
}

/// MCP Protocol Methods
pub mod methods {
    pub const INITIALIZE: &str = "initialize";
    pub const TOOLS_LIST: &str = "tools/list";
    pub const TOOLS_CALL: &str = "tools/call";
    pub const PING: &str = "ping";
}

/// MCP protocol versions
pub mod protocol {
    /// Version announced by the HTTP endpoint and used as the bridge fallback
    pub const DEFAULT_VERSION: &str = "2024-11-05";
    /// Versions the bridge will echo back to a local client
    pub const SUPPORTED_VERSIONS: &[&str] = &["2024-11-05", "2025-03-26", "2025-06-18"];
    /// Version reported in the bridge's own `serverInfo`
    pub const BRIDGE_VERSION: &str = "0.1.0";
}

/// Access gate headers and environment
pub mod auth {
    pub const ENV_API_KEY: &str = "MCP_API_KEY";
    pub const HEADER_API_KEY: &str = "x-api-key";
    pub const HEADER_AUTHORIZATION: &str = "authorization";
    pub const BEARER_PREFIX: &str = "Bearer ";
    pub const DENIED_MESSAGE: &str = "API key is required";
}

/// HTTP routes exposed by the server
pub mod routes {
    pub const RPC: &str = "/mcp";
    pub const ROOT: &str = "/";
    pub const HEALTH: &str = "/health";
    pub const BRIDGE_SCRIPT: &str = "/bridge.py";
    pub const INSTALL_SCRIPT: &str = "/install.py";
}

/// Companion script serving
pub mod scripts {
    pub const BRIDGE_FILENAME: &str = "bridge.py";
    pub const INSTALL_FILENAME: &str = "install.py";
    /// Line in the installer that is replaced with the server origin
    pub const ORIGIN_PLACEHOLDER: &str = "# INJECTED_SERVER_URL = None";
    /// Served when no override path is configured
    pub const BRIDGE_SOURCE: &str = include_str!("../scripts/bridge.py");
    pub const INSTALL_SOURCE: &str = include_str!("../scripts/install.py");
}

/// Configuration Environment Variables
pub mod config {
    pub const ENV_BIND_ADDRESS: &str = "BIND_ADDRESS";
    pub const ENV_PORT: &str = "PORT";
    pub const ENV_SERVER_NAME: &str = "SERVER_NAME";
    pub const ENV_SERVER_VERSION: &str = "SERVER_VERSION";
    pub const ENV_BRIDGE_SCRIPT_PATH: &str = "BRIDGE_SCRIPT_PATH";
    pub const ENV_INSTALL_SCRIPT_PATH: &str = "INSTALL_SCRIPT_PATH";
    pub const ENV_REQUEST_TIMEOUT_SECS: &str = "REQUEST_TIMEOUT_SECS";
    pub const ENV_BODY_SIZE_LIMIT_BYTES: &str = "BODY_SIZE_LIMIT_BYTES";
    pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
    pub const ENV_LOG_FORMAT: &str = "LOG_FORMAT";
}

/// Bridge forwarding
pub mod bridge {
    /// Per-call timeout for forwarded HTTP requests
    pub const FORWARD_TIMEOUT_SECS: u64 = 30;
    /// Hosting suffix stripped when deriving a display name
    pub const HOSTING_SUFFIX: &str = ".vercel.app";
    /// Depth of the ordered response queue between coordinator and writer
    pub const RESPONSE_QUEUE_DEPTH: usize = 32;
}

/// Transport Limits (DoS Protection)
pub mod limits {
    /// Maximum allowed JSON-RPC message size (10 MB)
    pub const MAX_MESSAGE_SIZE_BYTES: usize = 10 * 1024 * 1024;
    /// Maximum size of a Content-Length header block
    pub const MAX_HEADER_BYTES: usize = 4096;
}
