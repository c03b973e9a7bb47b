use crate::errors::{GatewayError, GatewayResult};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

/// Fetch a required string argument, mapping absence or a wrong type to
/// `InvalidParams`.
pub fn required_str_arg(params: &Value, key: &str) -> GatewayResult<String> {
    params
        .get(key)
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .ok_or_else(|| {
            GatewayError::InvalidParams(format!("Missing or invalid '{}' argument", key))
        })
}

/// Fetch an optional string argument; present-but-mistyped is `InvalidParams`.
pub fn optional_str_arg(params: &Value, key: &str) -> GatewayResult<Option<String>> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(GatewayError::InvalidParams(format!(
            "'{}' must be a string",
            key
        ))),
    }
}

#[derive(Debug, Clone)]
pub struct ToolResult {
    pub content: String,
    pub is_error: bool,
    /// Structured side-channel for the transport (`exitCode`,
    /// `workingDirectory`).
    pub metadata: HashMap<String, Value>,
}

impl ToolResult {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
            metadata: HashMap::new(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }
}

impl std::fmt::Display for ToolResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.content)
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters(&self) -> Value; // JSON Schema

    async fn execute(&self, params: Value) -> GatewayResult<ToolResult>;

    fn to_schema(&self) -> Value {
        serde_json::json!({
            "name": self.name(),
            "description": self.description(),
            "inputSchema": self.parameters(),
        })
    }
}
