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

//! Access Gate: a single shared-secret check in front of the RPC route.

pub mod auth_middleware;

use axum::http::HeaderMap;
use secrecy::{ExposeSecret, SecretString};

use crate::config::Config;
use crate::constants::auth;

#[derive(Clone, Default)]
pub struct AccessGate {
    secret: Option<SecretString>,
}

impl std::fmt::Debug for AccessGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGate")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl AccessGate {
    /// An empty secret disables the gate.
    pub fn new(secret: Option<String>) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()).map(SecretString::new),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            secret: config.api_key.clone(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.secret.is_some()
    }

    /// Returns true when the request may proceed.
    ///
    /// The presented key comes from `X-API-Key`, falling back to
    /// `Authorization` with an optional `Bearer ` prefix.
    // TODO: switch to a constant-time comparison
    pub fn check(&self, headers: &HeaderMap) -> bool {
        let Some(secret) = &self.secret else {
            return true;
        };
        match presented_key(headers) {
            Some(key) => key == secret.expose_secret().as_str(),
            None => false,
        }
    }
}

fn presented_key(headers: &HeaderMap) -> Option<&str> {
    let header_value = |name: &'static str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
    };
    let raw = header_value(auth::HEADER_API_KEY)
        .or_else(|| header_value(auth::HEADER_AUTHORIZATION))?;
    Some(raw.strip_prefix(auth::BEARER_PREFIX).unwrap_or(raw))
}
