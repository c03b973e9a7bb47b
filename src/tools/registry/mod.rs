use crate::errors::{GatewayError, GatewayResult};
use crate::tools::base::{Tool, ToolResult};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Middleware hooks around tool execution for cross-cutting concerns.
/// The gateway only carries logging; command results must never be cached.
#[async_trait]
pub trait ToolMiddleware: Send + Sync {
    async fn before_execute(&self, _name: &str, _params: &Value) {}
    async fn after_execute(&self, _name: &str, _result: &ToolResult) {}
}

pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    middleware: Vec<Arc<dyn ToolMiddleware>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            middleware: vec![Arc::new(LoggingMiddleware)],
        }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if name.is_empty() || name.len() > 256 || name.chars().any(char::is_control) {
            warn!(
                "tool registry: rejecting tool with invalid name (len={}, has_control_chars={})",
                name.len(),
                name.chars().any(char::is_control)
            );
            return;
        }
        if self.tools.contains_key(&name) {
            warn!("tool registry: overwriting duplicate tool '{}'", name);
        }
        self.tools.insert(name, tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Returns a sorted list of all registered tool names.
    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// JSON schema of every registered tool, sorted by name.
    pub fn schemas(&self) -> Vec<Value> {
        let mut schemas: Vec<Value> = self.tools.values().map(|t| t.to_schema()).collect();
        schemas.sort_by(|a, b| {
            a["name"]
                .as_str()
                .unwrap_or("")
                .cmp(b["name"].as_str().unwrap_or(""))
        });
        schemas
    }

    /// Dispatch one tool call through the middleware chain. An unknown name
    /// is `MethodNotFound`; everything else is the tool's own verdict.
    pub async fn execute(&self, name: &str, params: Value) -> GatewayResult<ToolResult> {
        let tool = self
            .tools
            .get(name)
            .cloned()
            .ok_or_else(|| GatewayError::MethodNotFound(name.to_string()))?;

        for mw in &self.middleware {
            mw.before_execute(name, &params).await;
        }
        let result = tool.execute(params).await?;
        for mw in &self.middleware {
            mw.after_execute(name, &result).await;
        }
        Ok(result)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Logging middleware — logs tool execution and results.
pub struct LoggingMiddleware;

#[async_trait]
impl ToolMiddleware for LoggingMiddleware {
    async fn before_execute(&self, name: &str, params: &Value) {
        debug!("Executing tool: {} with arguments: {}", name, params);
    }

    async fn after_execute(&self, name: &str, result: &ToolResult) {
        if result.is_error {
            warn!("Tool '{}' returned error: {}", name, result.content);
        } else {
            info!("Tool '{}' completed ({} chars)", name, result.content.len());
        }
    }
}

#[cfg(test)]
mod tests;
