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

// Axum access-gate middleware

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{Json, Response},
};
use std::sync::Arc;
use tracing::warn;

use crate::api::responses::ErrorResponse;
use crate::auth::AccessGate;
use crate::constants::auth;

/// Rejects requests that fail the gate with 403 before the body is read.
pub async fn auth_middleware(
    State(gate): State<Arc<AccessGate>>,
    request: Request,
    next: Next,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    if !gate.check(request.headers()) {
        warn!(
            path = %request.uri().path(),
            client_ip = ?extract_ip_address(&request),
            "Rejected request without a valid API key"
        );
        return Err((
            StatusCode::FORBIDDEN,
            Json(ErrorResponse::new(auth::DENIED_MESSAGE)),
        ));
    }
    Ok(next.run(request).await)
}

/// Checks `X-Forwarded-For` first (for proxied requests), then `X-Real-IP`.
fn extract_ip_address(request: &Request) -> Option<String> {
    request
        .headers()
        .get("X-Forwarded-For")
        .or_else(|| request.headers().get("X-Real-IP"))
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}
