use crate::config::schema::ShellKind;
use crate::errors::GatewayResult;
use crate::exec;
use crate::paths;
use crate::server::ServerState;
use crate::tools::base::{Tool, ToolResult, optional_str_arg, required_str_arg};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;

/// The `execute_command` tool: full validation pipeline, then one child
/// process under the shell's timeout.
pub struct ExecuteCommandTool {
    state: Arc<ServerState>,
}

impl ExecuteCommandTool {
    pub fn new(state: Arc<ServerState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Tool for ExecuteCommandTool {
    fn name(&self) -> &str {
        "execute_command"
    }

    fn description(&self) -> &str {
        "Execute a command in one of the configured shells after layered security validation"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "shell": {
                    "type": "string",
                    "enum": self.state.shell_names(),
                    "description": "Shell to run the command in"
                },
                "command": {
                    "type": "string",
                    "description": "The command to execute"
                },
                "workingDir": {
                    "type": "string",
                    "description": "Working directory (optional, defaults to the server's active directory)"
                }
            },
            "required": ["shell", "command"]
        })
    }

    async fn execute(&self, params: Value) -> GatewayResult<ToolResult> {
        let shell = required_str_arg(&params, "shell")?;
        let command = required_str_arg(&params, "command")?;
        let working_dir_arg = optional_str_arg(&params, "workingDir")?;

        let ctx = self.state.context_for(&shell)?;

        let mut dir = working_dir_arg
            .or_else(|| self.state.active_cwd())
            .unwrap_or_else(ServerState::process_cwd);

        // WSL path mapping: a Windows-form directory is translated into its
        // mount form before any confinement check sees it
        if ctx.kind() == ShellKind::Wsl
            && ctx.config.maps_windows_paths()
            && paths::is_windows_form(&paths::normalize_path(&dir))
            && let Some(mapped) = paths::windows_to_wsl(&dir, ctx.config.mount_point())
        {
            dir = mapped;
        }

        // chain validation only walks cd steps; the chosen directory itself
        // must also satisfy the global allowed set
        let mount = (ctx.kind() == ShellKind::Wsl).then(|| ctx.config.mount_point().to_string());
        self.state.validate_global_dir(&dir, mount.as_deref())?;

        let outcome = exec::execute(&ctx, &command, &dir).await?;
        let rendered = outcome.render();
        let result = if outcome.exit_code == 0 {
            ToolResult::new(rendered)
        } else {
            ToolResult::error(rendered)
        };
        Ok(result
            .with_metadata("exitCode", json!(outcome.exit_code))
            .with_metadata("workingDirectory", json!(outcome.working_directory)))
    }
}
