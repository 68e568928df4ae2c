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

//! mcp-relay: JSON-RPC tool serving over stdio and stateless HTTP.
//!
//! The crate ships two processes built from the same library:
//! - `mcp-relay-server`, a stateless HTTP endpoint that dispatches JSON-RPC
//!   requests against an in-process tool registry;
//! - `mcp-relay-bridge`, a local stdio MCP server that forwards every request
//!   to a remote `mcp-relay-server` and relays the answers back.

pub mod api;
pub mod auth;
pub mod bridge;
pub mod config;
pub mod constants;
pub mod dispatch;
pub mod errors;
pub mod protocol;
pub mod registry;
pub mod tools;
pub mod utils;
