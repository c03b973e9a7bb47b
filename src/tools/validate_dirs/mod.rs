use crate::errors::{GatewayError, GatewayResult};
use crate::server::ServerState;
use crate::tools::base::{Tool, ToolResult, optional_str_arg};
use crate::validation;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;

/// The `validate_directories` tool: checks a batch of paths against the
/// global allowed set, or a specific shell's when `shell` is given.
pub struct ValidateDirectoriesTool {
    state: Arc<ServerState>,
}

impl ValidateDirectoriesTool {
    pub fn new(state: Arc<ServerState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Tool for ValidateDirectoriesTool {
    fn name(&self) -> &str {
        "validate_directories"
    }

    fn description(&self) -> &str {
        "Check whether directories fall within the allowed paths"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "directories": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Directories to check"
                },
                "shell": {
                    "type": "string",
                    "enum": self.state.shell_names(),
                    "description": "Validate against this shell's allowed paths instead of the global set"
                }
            },
            "required": ["directories"]
        })
    }

    async fn execute(&self, params: Value) -> GatewayResult<ToolResult> {
        let Some(list) = params.get("directories").and_then(Value::as_array) else {
            return Err(GatewayError::InvalidParams(
                "Missing or invalid 'directories' argument".to_string(),
            ));
        };
        let mut directories = Vec::with_capacity(list.len());
        for item in list {
            match item.as_str() {
                Some(dir) => directories.push(dir.to_string()),
                None => {
                    return Err(GatewayError::InvalidParams(
                        "'directories' must be an array of strings".to_string(),
                    ));
                }
            }
        }
        let shell = optional_str_arg(&params, "shell")?;

        let mut invalid = Vec::new();
        match shell {
            Some(name) => {
                let ctx = self.state.context_for(&name)?;
                for dir in &directories {
                    if validation::validate_working_directory(dir, &ctx).is_err() {
                        invalid.push(dir.clone());
                    }
                }
            }
            None => {
                for dir in &directories {
                    if self.state.validate_global_dir(dir, None).is_err() {
                        invalid.push(dir.clone());
                    }
                }
            }
        }

        if invalid.is_empty() {
            Ok(ToolResult::new("All directories are within allowed paths"))
        } else {
            Ok(ToolResult::error(format!(
                "The following directories are outside allowed paths: {}",
                invalid.join(", ")
            )))
        }
    }
}
