//! Execution supervisor: spawns the validated command in its shell, enforces
//! the per-shell timeout, and captures output. Every exit path (clean exit,
//! spawn failure, timeout) releases the child handle and its pipes.

use crate::errors::{GatewayError, GatewayResult};
use crate::validation::{self, ValidationContext};
use serde::Serialize;
use std::process::Stdio;
use std::time::Duration;
use tracing::{debug, warn};

/// Maximum combined stdout+stderr size before truncation.
const MAX_OUTPUT_BYTES: usize = 1024 * 1024; // 1 MB

#[derive(Debug, Clone, Serialize)]
pub struct ExecutionOutcome {
    pub stdout: String,
    pub stderr: String,
    #[serde(rename = "exitCode")]
    pub exit_code: i32,
    #[serde(rename = "workingDirectory")]
    pub working_directory: String,
    /// Set when output was cut at [`MAX_OUTPUT_BYTES`].
    #[serde(skip)]
    pub truncated: bool,
}

/// Validate and run one command in the context's shell.
///
/// The user command is appended as a single argument after the shell's
/// configured invocation args (`cmd.exe /c "<cmd>"`, `powershell.exe
/// -Command "<cmd>"`, `wsl.exe -e "<cmd>"`); no extra interpretation flags
/// are injected. A non-zero exit is a result, not an error.
pub async fn execute(
    ctx: &ValidationContext,
    command: &str,
    working_dir: &str,
) -> GatewayResult<ExecutionOutcome> {
    validation::validate_command(ctx, command, working_dir)?;
    validation::validate_working_directory(working_dir, ctx)?;

    let config = &ctx.config;
    let timeout_secs = config.security.command_timeout;

    let mut child = tokio::process::Command::new(&config.executable.command);
    child
        .args(&config.executable.args)
        .arg(command)
        .current_dir(working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!(
        shell = %ctx.shell_name,
        dir = %working_dir,
        "spawning shell child"
    );

    let output = match tokio::time::timeout(Duration::from_secs_f64(timeout_secs), child.output())
        .await
    {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            warn!(shell = %ctx.shell_name, error = %e, "shell child failed");
            return Err(GatewayError::Spawn(e.to_string()));
        }
        // the elapsed timer wins over any late exit; kill_on_drop reaps the child
        Err(_) => {
            warn!(
                shell = %ctx.shell_name,
                timeout = timeout_secs,
                "shell child timed out"
            );
            return Err(GatewayError::Timeout {
                seconds: timeout_secs,
                shell: ctx.shell_name.clone(),
            });
        }
    };

    let combined_len = output.stdout.len() + output.stderr.len();
    let truncated = combined_len > MAX_OUTPUT_BYTES;

    // Truncate raw bytes before UTF-8 conversion to bound memory.
    // Reserve at least 25% for stderr so error messages aren't lost.
    let stderr_reserve = MAX_OUTPUT_BYTES / 4;
    let stdout_max = MAX_OUTPUT_BYTES - stderr_reserve.min(output.stderr.len());
    let stdout_bytes = if output.stdout.len() > stdout_max {
        truncate_at_utf8_boundary(&output.stdout, stdout_max)
    } else {
        &output.stdout
    };
    let remaining = MAX_OUTPUT_BYTES.saturating_sub(stdout_bytes.len());
    let stderr_bytes = if output.stderr.len() > remaining {
        truncate_at_utf8_boundary(&output.stderr, remaining)
    } else {
        &output.stderr
    };

    Ok(ExecutionOutcome {
        stdout: String::from_utf8_lossy(stdout_bytes).into_owned(),
        stderr: String::from_utf8_lossy(stderr_bytes).into_owned(),
        exit_code: output.status.code().unwrap_or(-1),
        working_directory: working_dir.to_string(),
        truncated,
    })
}

impl ExecutionOutcome {
    /// Render stdout and stderr as one text block for the tool result.
    pub fn render(&self) -> String {
        let mut text = String::new();
        if !self.stdout.is_empty() {
            text.push_str(&self.stdout);
        }
        if !self.stderr.is_empty() {
            if !text.is_empty() {
                text.push_str("\n--- stderr ---\n");
            }
            text.push_str(&self.stderr);
        }
        if self.truncated {
            text.push_str("\n[output truncated at 1MB]");
        }
        if text.is_empty() {
            text.push_str("(no output)");
        }
        text
    }
}

/// Truncate a byte slice at a UTF-8 character boundary, never splitting
/// a multi-byte character.
fn truncate_at_utf8_boundary(data: &[u8], max: usize) -> &[u8] {
    if max >= data.len() {
        return data;
    }
    // Walk backwards from max to find a valid UTF-8 start byte
    let mut end = max;
    while end > 0 && (data[end] & 0xC0) == 0x80 {
        end -= 1;
    }
    &data[..end]
}
