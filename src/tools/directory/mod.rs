use crate::errors::GatewayResult;
use crate::paths;
use crate::server::ServerState;
use crate::tools::base::{Tool, ToolResult, required_str_arg};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;

/// The `get_current_directory` tool: the server's active working directory,
/// falling back to the host process cwd.
pub struct GetCurrentDirectoryTool {
    state: Arc<ServerState>,
}

impl GetCurrentDirectoryTool {
    pub fn new(state: Arc<ServerState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Tool for GetCurrentDirectoryTool {
    fn name(&self) -> &str {
        "get_current_directory"
    }

    fn description(&self) -> &str {
        "Show the server's active working directory"
    }

    fn parameters(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _params: Value) -> GatewayResult<ToolResult> {
        Ok(ToolResult::new(
            self.state
                .active_cwd()
                .unwrap_or_else(ServerState::process_cwd),
        ))
    }
}

/// The `set_current_directory` tool: validate against the global allowed
/// paths, then move both the host process and the server's active directory.
pub struct SetCurrentDirectoryTool {
    state: Arc<ServerState>,
}

impl SetCurrentDirectoryTool {
    pub fn new(state: Arc<ServerState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Tool for SetCurrentDirectoryTool {
    fn name(&self) -> &str {
        "set_current_directory"
    }

    fn description(&self) -> &str {
        "Change the server's active working directory"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "Absolute path to change to" }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, params: Value) -> GatewayResult<ToolResult> {
        let path = required_str_arg(&params, "path")?;
        let normalized = paths::normalize_path(&path);
        self.state.validate_global_dir(&normalized, None)?;

        if let Err(e) = std::env::set_current_dir(&normalized) {
            return Ok(ToolResult::error(format!(
                "Failed to change directory: {}",
                e
            )));
        }
        self.state.set_active_cwd(normalized.clone());
        info!("active working directory changed to {}", normalized);
        Ok(
            ToolResult::new(format!("Current directory changed to {}", normalized))
                .with_metadata("workingDirectory", json!(normalized)),
        )
    }
}
