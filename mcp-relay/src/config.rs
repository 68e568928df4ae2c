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

// Server configuration management

use secrecy::SecretString;
use std::env;
use std::path::PathBuf;

use crate::constants::{auth, config as keys};
use crate::errors::RelayError;

/// HTTP server configuration loaded from environment variables.
///
/// Script paths are optional overrides of the embedded companion scripts.
/// They are not checked at load time; a missing file is reported per request.
#[derive(Debug, Clone)]
pub struct Config {
    // Server configuration
    pub bind_address: String,
    pub port: u16,

    // Identity reported by `initialize` and `GET /`
    pub server_name: String,
    pub server_version: String,

    // Access gate secret; `None` disables the gate
    pub api_key: Option<SecretString>,

    // Companion script overrides; `None` serves the embedded copy
    pub bridge_script_path: Option<PathBuf>,
    pub install_script_path: Option<PathBuf>,

    // Middleware configuration
    pub request_timeout_secs: u64,
    pub body_size_limit_bytes: usize,

    // Logging configuration
    pub log_level: String,
    pub log_format: String, // "json" or "text"
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Supports `.env` file loading in development (via dotenv crate).
    pub fn from_env() -> Result<Self, RelayError> {
        // Skip in test environment to avoid interfering with test environment variables
        #[cfg(not(test))]
        {
            dotenv::dotenv().ok();
        }

        let config = Self {
            bind_address: Self::get_env_or_default(keys::ENV_BIND_ADDRESS, "0.0.0.0"),
            port: Self::parse_port()?,
            server_name: Self::get_env_or_default(keys::ENV_SERVER_NAME, "MCP Relay Server"),
            server_version: Self::get_env_or_default(keys::ENV_SERVER_VERSION, "1.0.0"),
            api_key: Self::get_optional_env(auth::ENV_API_KEY).map(SecretString::new),
            bridge_script_path: Self::get_optional_env(keys::ENV_BRIDGE_SCRIPT_PATH)
                .map(PathBuf::from),
            install_script_path: Self::get_optional_env(keys::ENV_INSTALL_SCRIPT_PATH)
                .map(PathBuf::from),
            request_timeout_secs: Self::parse_u64_or_default(keys::ENV_REQUEST_TIMEOUT_SECS, 30)?,
            body_size_limit_bytes: Self::parse_usize_or_default(
                keys::ENV_BODY_SIZE_LIMIT_BYTES,
                2 * 1024 * 1024,
            )?,
            log_level: Self::get_env_or_default(keys::ENV_LOG_LEVEL, "info"),
            log_format: Self::get_env_or_default(keys::ENV_LOG_FORMAT, "text"),
        };

        config.validate()?;
        Ok(config)
    }

    fn get_env_or_default(key: &str, default: &str) -> String {
        env::var(key).unwrap_or_else(|_| default.to_string())
    }

    /// Empty values count as unset
    fn get_optional_env(key: &str) -> Option<String> {
        match env::var(key) {
            Ok(value) if !value.is_empty() => Some(value),
            _ => None,
        }
    }

    fn parse_port() -> Result<u16, RelayError> {
        let port_str = env::var(keys::ENV_PORT).unwrap_or_else(|_| "3000".to_string());
        let port = port_str.parse::<u16>().map_err(|e| {
            RelayError::Configuration(format!("Invalid PORT value '{}': {}", port_str, e))
        })?;

        if port == 0 {
            return Err(RelayError::Configuration(
                "PORT must be between 1 and 65535".to_string(),
            ));
        }

        Ok(port)
    }

    fn parse_u64_or_default(key: &str, default: u64) -> Result<u64, RelayError> {
        match env::var(key) {
            Ok(value) => {
                let parsed = value.parse::<u64>().map_err(|e| {
                    RelayError::Configuration(format!("Invalid {} value '{}': {}", key, value, e))
                })?;
                if parsed == 0 {
                    return Err(RelayError::Configuration(format!(
                        "{} must be greater than 0",
                        key
                    )));
                }
                Ok(parsed)
            }
            _ => Ok(default),
        }
    }

    fn parse_usize_or_default(key: &str, default: usize) -> Result<usize, RelayError> {
        match env::var(key) {
            Ok(value) => {
                let parsed = value.parse::<usize>().map_err(|e| {
                    RelayError::Configuration(format!("Invalid {} value '{}': {}", key, value, e))
                })?;
                if parsed == 0 {
                    return Err(RelayError::Configuration(format!(
                        "{} must be greater than 0",
                        key
                    )));
                }
                Ok(parsed)
            }
            _ => Ok(default),
        }
    }

    pub fn validate(&self) -> Result<(), RelayError> {
        if self.server_name.trim().is_empty() {
            return Err(RelayError::Configuration(
                "SERVER_NAME must not be empty".to_string(),
            ));
        }
        self.bind_address.parse::<std::net::IpAddr>().map_err(|e| {
            RelayError::Configuration(format!(
                "Invalid BIND_ADDRESS '{}': {}",
                self.bind_address, e
            ))
        })?;
        validate_log_level(&self.log_level)?;
        validate_log_format(&self.log_format)?;
        Ok(())
    }

    /// Socket address the listener binds to.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

pub fn validate_log_level(level: &str) -> Result<(), RelayError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&level.to_lowercase().as_str()) {
        return Err(RelayError::Configuration(format!(
            "Invalid LOG_LEVEL '{}': must be one of {}",
            level,
            valid_levels.join(", ")
        )));
    }
    Ok(())
}

pub fn validate_log_format(format: &str) -> Result<(), RelayError> {
    if format != "json" && format != "text" {
        return Err(RelayError::Configuration(format!(
            "Invalid LOG_FORMAT '{}': must be 'json' or 'text'",
            format
        )));
    }
    Ok(())
}

impl Config {
    /// Configuration for tests. Bypasses environment loading.
    pub fn test_config() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 3000,
            server_name: "Test Relay Server".to_string(),
            server_version: "1.0.0".to_string(),
            api_key: None,
            bridge_script_path: None,
            install_script_path: None,
            request_timeout_secs: 30,
            body_size_limit_bytes: 2 * 1024 * 1024,
            log_level: "info".to_string(),
            log_format: "text".to_string(),
        }
    }
}
