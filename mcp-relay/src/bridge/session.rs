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

//! Bridge session: identity of one bridge process.

use secrecy::SecretString;
use url::{Host, Url};

use crate::constants::{bridge, routes};
use crate::errors::RelayError;

pub struct BridgeSession {
    endpoint: String,
    rpc_url: String,
    display_name: String,
    api_key: Option<SecretString>,
}

impl std::fmt::Debug for BridgeSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeSession")
            .field("endpoint", &self.endpoint)
            .field("display_name", &self.display_name)
            .field("has_api_key", &self.api_key.is_some())
            .finish()
    }
}

impl BridgeSession {
    /// Validate the remote endpoint. Trailing slashes are stripped.
    pub fn new(endpoint: &str, api_key: Option<String>) -> Result<Self, RelayError> {
        let endpoint = endpoint.trim().trim_end_matches('/').to_string();
        let url = Url::parse(&endpoint).map_err(|e| {
            RelayError::Configuration(format!("Invalid endpoint URL '{}': {}", endpoint, e))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(RelayError::Configuration(format!(
                "Endpoint URL '{}' must use http or https",
                endpoint
            )));
        }

        Ok(Self {
            rpc_url: format!("{}{}", endpoint, routes::RPC),
            display_name: display_name_for(&url),
            api_key: api_key.filter(|k| !k.is_empty()).map(SecretString::new),
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn api_key(&self) -> Option<&SecretString> {
        self.api_key.as_ref()
    }
}

/// `<sub>.vercel.app` becomes `<sub>`; any other host has `.` and `-`
/// replaced by `_`.
pub fn display_name_for(url: &Url) -> String {
    let host = match url.host() {
        Some(Host::Domain(domain)) => domain.to_lowercase(),
        Some(Host::Ipv4(addr)) => addr.to_string(),
        Some(Host::Ipv6(addr)) => addr.to_string(),
        None => return "unknown".to_string(),
    };
    match host.strip_suffix(bridge::HOSTING_SUFFIX) {
        Some(sub) if !sub.is_empty() => sub.to_string(),
        _ => host.replace(['.', '-'], "_"),
    }
}
