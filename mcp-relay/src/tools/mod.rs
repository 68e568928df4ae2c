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

//! Built-in tools shipped with the server binary.

use serde_json::{json, Value};

use crate::errors::{RelayError, ToolError};
use crate::utils::time::now_iso8601;
use crate::registry::{
    Content, FnTool, Tool, ToolDescriptor, ToolRegistry, ToolRegistryBuilder,
};

/// Returns `arguments.message` unchanged.
pub fn echo() -> impl Tool {
    let descriptor = ToolDescriptor::new(
        "echo",
        "Echo back the provided message",
        json!({
            "type": "object",
            "properties": {"message": {"type": "string"}},
            "required": ["message"]
        }),
    );
    FnTool::new(descriptor, |args: Value| {
        std::future::ready(match args.get("message").and_then(Value::as_str) {
            Some(message) => Ok(vec![Content::text(message)]),
            None => Err(ToolError::new("Missing required argument 'message'")),
        })
    })
}

/// Current UTC time as an ISO-8601 timestamp.
pub fn get_time() -> impl Tool {
    let descriptor = ToolDescriptor::new(
        "get_time",
        "Get the current server time (UTC, ISO-8601)",
        json!({"type": "object", "properties": {}}),
    );
    FnTool::new(descriptor, |_args: Value| {
        std::future::ready(Ok(vec![Content::text(now_iso8601())]))
    })
}

pub fn add_numbers() -> impl Tool {
    let descriptor = ToolDescriptor::new(
        "add_numbers",
        "Add two numbers",
        json!({
            "type": "object",
            "properties": {"a": {"type": "number"}, "b": {"type": "number"}},
            "required": ["a", "b"]
        }),
    );
    FnTool::new(descriptor, |args: Value| {
        std::future::ready(add(&args).map(|sum| vec![Content::text(sum)]))
    })
}

fn add(args: &Value) -> Result<String, ToolError> {
    let operand = |key: &str| {
        args.get(key)
            .ok_or_else(|| ToolError::new(format!("Missing required argument '{}'", key)))
    };
    let (a, b) = (operand("a")?, operand("b")?);

    // Integer inputs keep an integer result
    if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
        return a
            .checked_add(b)
            .map(|s| s.to_string())
            .ok_or_else(|| ToolError::new("Integer overflow"));
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(a), Some(b)) => Ok((a + b).to_string()),
        _ => Err(ToolError::new("Arguments 'a' and 'b' must be numbers")),
    }
}

/// Register every built-in tool, in listing order.
pub fn register_builtins(builder: ToolRegistryBuilder) -> Result<ToolRegistryBuilder, RelayError> {
    builder.register(echo())?.register(get_time())?.register(add_numbers())
}

pub fn builtin_registry() -> Result<ToolRegistry, RelayError> {
    Ok(register_builtins(ToolRegistry::builder())?.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ToolProvider;

    #[tokio::test]
    async fn test_builtin_order() {
        let registry = builtin_registry().unwrap();
        assert_eq!(registry.names(), vec!["echo", "get_time", "add_numbers"]);
    }

    #[tokio::test]
    async fn test_echo_returns_message() {
        let registry = builtin_registry().unwrap();
        let out = registry
            .invoke("echo", json!({"message": "hi"}))
            .await
            .unwrap();
        assert_eq!(out.content, vec![Content::text("hi")]);
    }

    #[tokio::test]
    async fn test_echo_without_message_fails() {
        let registry = builtin_registry().unwrap();
        let err = registry.invoke("echo", json!({})).await.unwrap_err();
        assert!(matches!(err, RelayError::InvocationFailed(_)));
    }

    #[tokio::test]
    async fn test_get_time_is_rfc3339() {
        let registry = builtin_registry().unwrap();
        let out = registry.invoke("get_time", Value::Null).await.unwrap();
        let Content::Text { text } = &out.content[0];
        assert!(chrono::DateTime::parse_from_rfc3339(text).is_ok());
    }

    #[test]
    fn test_add_integers_and_floats() {
        assert_eq!(add(&json!({"a": 42, "b": 8})).unwrap(), "50");
        assert_eq!(add(&json!({"a": 1.5, "b": 2})).unwrap(), "3.5");
        assert!(add(&json!({"a": "x", "b": 2})).is_err());
        assert!(add(&json!({"a": 1})).is_err());
    }
}
