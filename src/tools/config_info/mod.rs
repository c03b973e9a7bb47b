use crate::errors::GatewayResult;
use crate::server::ServerState;
use crate::tools::base::{Tool, ToolResult};
use anyhow::Context;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;

/// The `get_config` tool: the loaded configuration plus the per-shell
/// resolved summaries, as pretty JSON.
pub struct GetConfigTool {
    state: Arc<ServerState>,
}

impl GetConfigTool {
    pub fn new(state: Arc<ServerState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Tool for GetConfigTool {
    fn name(&self) -> &str {
        "get_config"
    }

    fn description(&self) -> &str {
        "Show the loaded configuration and the resolved per-shell settings"
    }

    fn parameters(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _params: Value) -> GatewayResult<ToolResult> {
        let resolved: serde_json::Map<String, Value> = self
            .state
            .resolved()
            .iter()
            .map(|(name, config)| (name.clone(), config.summary()))
            .collect();
        let value = json!({
            "configuration": self.state.config(),
            "resolvedShells": Value::Object(resolved),
        });
        let text =
            serde_json::to_string_pretty(&value).context("Failed to serialize configuration")?;
        Ok(ToolResult::new(text))
    }
}
