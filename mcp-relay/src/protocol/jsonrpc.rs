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

//! JSON-RPC 2.0 envelopes.
//!
//! A response carries exactly one of `result` or `error`. The choice is a
//! `ResponsePayload` variant flattened into the envelope, so an envelope with
//! both members cannot be built.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::jsonrpc;
use crate::errors::RelayError;

/// Request ID can be a number or string.
///
/// Numbers are kept as JSON numbers, so floats and ids past `i64` are echoed
/// back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Number(serde_json::Number),
    String(String),
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        RequestId::Number(n.into())
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        RequestId::String(s.to_string())
    }
}

impl RequestId {
    /// Best-effort extraction of an id from a raw message that failed to
    /// deserialize as a whole.
    pub fn recover(raw: &Value) -> Option<Self> {
        raw.get("id")
            .and_then(|id| serde_json::from_value::<RequestId>(id.clone()).ok())
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestId::Number(n) => write!(f, "{}", n),
            RequestId::String(s) => write!(f, "{}", s),
        }
    }
}

fn default_version() -> String {
    jsonrpc::VERSION.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default = "default_version")]
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// `None` (absent or `null`) marks a notification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
}

impl JsonRpcRequest {
    pub fn new(id: Option<RequestId>, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: default_version(),
            method: method.into(),
            params,
            id,
        }
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

impl From<&RelayError> for JsonRpcError {
    fn from(err: &RelayError) -> Self {
        JsonRpcError::new(err.code(), err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponsePayload {
    Result(Value),
    Error(JsonRpcError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    /// Serialized as `null` when the request id could not be recovered.
    pub id: Option<RequestId>,
    #[serde(flatten)]
    pub payload: ResponsePayload,
}

impl JsonRpcResponse {
    pub fn success(id: Option<RequestId>, result: Value) -> Self {
        Self {
            jsonrpc: default_version(),
            id,
            payload: ResponsePayload::Result(result),
        }
    }

    pub fn failure(id: Option<RequestId>, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: default_version(),
            id,
            payload: ResponsePayload::Error(error),
        }
    }

    pub fn from_error(id: Option<RequestId>, err: &RelayError) -> Self {
        Self::failure(id, JsonRpcError::from(err))
    }

    pub fn result(&self) -> Option<&Value> {
        match &self.payload {
            ResponsePayload::Result(v) => Some(v),
            ResponsePayload::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&JsonRpcError> {
        match &self.payload {
            ResponsePayload::Result(_) => None,
            ResponsePayload::Error(e) => Some(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_serializes_without_error_member() {
        let resp = JsonRpcResponse::success(Some(RequestId::from(1)), json!({}));
        let v = serde_json::to_value(&resp).unwrap();
        assert_eq!(v, json!({"jsonrpc": "2.0", "id": 1, "result": {}}));
    }

    #[test]
    fn test_failure_with_null_id() {
        let resp = JsonRpcResponse::failure(None, JsonRpcError::new(-32700, "Parse error"));
        let v = serde_json::to_value(&resp).unwrap();
        assert_eq!(
            v,
            json!({"jsonrpc": "2.0", "id": null, "error": {"code": -32700, "message": "Parse error"}})
        );
    }

    #[test]
    fn test_request_null_id_is_notification() {
        let req: JsonRpcRequest =
            serde_json::from_value(json!({"jsonrpc": "2.0", "id": null, "method": "ping"})).unwrap();
        assert!(req.is_notification());

        let req: JsonRpcRequest =
            serde_json::from_value(json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
                .unwrap();
        assert!(req.is_notification());
    }

    #[test]
    fn test_request_string_and_number_ids() {
        let req: JsonRpcRequest =
            serde_json::from_value(json!({"jsonrpc": "2.0", "id": "abc", "method": "ping"})).unwrap();
        assert_eq!(req.id, Some(RequestId::String("abc".to_string())));

        let req: JsonRpcRequest =
            serde_json::from_value(json!({"jsonrpc": "2.0", "id": 7, "method": "ping"})).unwrap();
        assert_eq!(req.id, Some(RequestId::from(7)));
    }

    #[test]
    fn test_recover_id_from_invalid_request() {
        let raw = json!({"id": 42, "method": 17});
        assert!(serde_json::from_value::<JsonRpcRequest>(raw.clone()).is_err());
        assert_eq!(RequestId::recover(&raw), Some(RequestId::from(42)));
        assert_eq!(RequestId::recover(&json!([1, 2])), None);
    }

    #[test]
    fn test_wide_and_fractional_ids_roundtrip() {
        for id in [json!(1.5), json!(u64::MAX), json!(-0.25)] {
            let req: JsonRpcRequest =
                serde_json::from_value(json!({"jsonrpc": "2.0", "id": id.clone(), "method": "ping"}))
                    .unwrap();
            let resp = JsonRpcResponse::success(req.id, json!({}));
            assert_eq!(serde_json::to_value(&resp).unwrap()["id"], id);
        }
    }

    #[test]
    fn test_response_roundtrip_keeps_payload_variant() {
        let raw = json!({"jsonrpc": "2.0", "id": "x", "error": {"code": -32601, "message": "nope"}});
        let resp: JsonRpcResponse = serde_json::from_value(raw).unwrap();
        assert!(resp.result().is_none());
        assert_eq!(resp.error().map(|e| e.code), Some(-32601));
    }
}
