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

//! Handshake Manager.
//!
//! Builds the `initialize` result and picks the protocol version announced to
//! a client.

use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::constants::protocol;

/// Identity reported in `serverInfo`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

impl ServerInfo {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

pub struct HandshakeManager;

impl HandshakeManager {
    /// Echo the client's version when supported, otherwise fall back to the
    /// default version.
    pub fn negotiate(client_version: Option<&str>) -> &'static str {
        match client_version {
            Some(requested) => {
                match protocol::SUPPORTED_VERSIONS
                    .iter()
                    .find(|v| **v == requested)
                {
                    Some(v) => *v,
                    None => {
                        info!(
                            "Unknown protocol version '{}', answering with {}",
                            requested,
                            protocol::DEFAULT_VERSION
                        );
                        protocol::DEFAULT_VERSION
                    }
                }
            }
            None => protocol::DEFAULT_VERSION,
        }
    }

    /// The `initialize` result body.
    pub fn initialize_result(protocol_version: &str, server: &ServerInfo) -> Value {
        serde_json::json!({
            "protocolVersion": protocol_version,
            "capabilities": {"tools": {"listChanged": true}},
            "serverInfo": server,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negotiate_supported_version_is_echoed() {
        assert_eq!(HandshakeManager::negotiate(Some("2025-03-26")), "2025-03-26");
    }

    #[test]
    fn test_negotiate_unknown_version_falls_back() {
        assert_eq!(HandshakeManager::negotiate(Some("1999-01-01")), "2024-11-05");
        assert_eq!(HandshakeManager::negotiate(None), "2024-11-05");
    }

    #[test]
    fn test_initialize_result_shape() {
        let info = ServerInfo::new("demo", "1.0.0");
        let result = HandshakeManager::initialize_result("2024-11-05", &info);
        assert_eq!(result["protocolVersion"], "2024-11-05");
        assert_eq!(result["capabilities"]["tools"]["listChanged"], true);
        assert_eq!(result["serverInfo"]["name"], "demo");
        assert_eq!(result["serverInfo"]["version"], "1.0.0");
    }
}
