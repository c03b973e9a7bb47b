//! The validation pipeline every request passes before a child process is
//! spawned: command parsing, operator/command/argument blocking, length
//! limits, and working-directory confinement, all parameterized by an
//! immutable per-shell [`ValidationContext`].

use crate::config::resolve::ResolvedShellConfig;
use crate::config::schema::ShellKind;
use crate::errors::{GatewayError, GatewayResult};
use crate::paths;
use std::sync::Arc;
use tracing::debug;

/// Per-shell bundle handed to every validator, so validators stay stateless
/// functions. Built once per enabled shell at server construction.
#[derive(Debug, Clone)]
pub struct ValidationContext {
    pub shell_name: String,
    pub config: Arc<ResolvedShellConfig>,
}

impl ValidationContext {
    pub fn new(shell_name: impl Into<String>, config: Arc<ResolvedShellConfig>) -> Self {
        Self {
            shell_name: shell_name.into(),
            config,
        }
    }

    pub fn kind(&self) -> ShellKind {
        self.config.kind
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub command: String,
    pub args: Vec<String>,
}

/// Split a command string into executable + arguments. A token is either a
/// `"..."` run (quotes stripped, inner whitespace kept) or a run of
/// non-whitespace characters; no escape sequences are interpreted.
/// `--author="John Doe"` therefore yields the single token `--author=John Doe`.
pub fn parse_command(input: &str) -> ParsedCommand {
    let mut tokens: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut started = false;

    for ch in input.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                started = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if started {
                    tokens.push(std::mem::take(&mut current));
                    started = false;
                }
            }
            c => {
                current.push(c);
                started = true;
            }
        }
    }
    if started {
        tokens.push(current);
    }

    let mut iter = tokens.into_iter();
    ParsedCommand {
        command: iter.next().unwrap_or_default(),
        args: iter.collect(),
    }
}

/// Bare lowercase command name of an executable reference: directory prefix
/// stripped, a `.exe`/`.cmd`/`.bat` extension removed.
pub fn extract_command_name(executable: &str) -> String {
    let base = executable
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(executable);
    let lower = base.to_lowercase();
    for ext in [".exe", ".cmd", ".bat"] {
        if let Some(stripped) = lower.strip_suffix(ext) {
            return stripped.to_string();
        }
    }
    lower
}

// ---------------------------------------------------------------------------
// Single-step validators
// ---------------------------------------------------------------------------

/// Literal-substring scan for the shell's blocked operators. A no-op when
/// injection protection is off.
pub fn validate_shell_operators(command: &str, ctx: &ValidationContext) -> GatewayResult<()> {
    if !ctx.config.security.enable_injection_protection {
        return Ok(());
    }
    for operator in &ctx.config.restrictions.blocked_operators {
        if !operator.is_empty() && command.contains(operator.as_str()) {
            debug!(shell = %ctx.shell_name, operator = %operator, "operator rejected");
            return Err(GatewayError::InvalidRequest(format!(
                "blocked operator for {}: {}",
                ctx.shell_name, operator
            )));
        }
    }
    Ok(())
}

pub fn is_command_blocked(executable: &str, ctx: &ValidationContext) -> bool {
    let name = extract_command_name(executable);
    ctx.config
        .restrictions
        .blocked_commands
        .iter()
        .any(|blocked| blocked.eq_ignore_ascii_case(&name))
}

/// Full-string, case-insensitive match of each argument against the blocked
/// list. Never a substring or prefix match.
pub fn is_argument_blocked(args: &[String], ctx: &ValidationContext) -> bool {
    args.iter().any(|arg| {
        ctx.config
            .restrictions
            .blocked_arguments
            .iter()
            .any(|blocked| blocked.eq_ignore_ascii_case(arg))
    })
}

/// Inclusive length limit: `len == max` passes, `len == max + 1` fails.
pub fn validate_command_length(command: &str, ctx: &ValidationContext) -> GatewayResult<()> {
    let max = ctx.config.security.max_command_length as usize;
    if command.len() > max {
        return Err(GatewayError::InvalidRequest(format!(
            "Command exceeds maximum length of {}",
            max
        )));
    }
    Ok(())
}

/// Confine a working directory to the shell's allowed paths, using the
/// shell's path dialect.
pub fn validate_working_directory(dir: &str, ctx: &ValidationContext) -> GatewayResult<()> {
    if !ctx.config.security.restrict_working_directory {
        return Ok(());
    }
    let allowed = &ctx.config.paths.allowed_paths;
    if allowed.is_empty() {
        return Err(GatewayError::InvalidRequest(
            "No allowed paths configured".to_string(),
        ));
    }

    if ctx.kind() == ShellKind::Wsl {
        if !dir.starts_with('/') {
            return Err(GatewayError::InvalidRequest(
                "WSL working directory must be an absolute path".to_string(),
            ));
        }
        let normalized = paths::normalize_path(dir);
        if !allowed.iter().any(|entry| paths::is_within(&normalized, entry)) {
            return Err(GatewayError::InvalidRequest(format!(
                "WSL working directory must be within allowed paths: {}",
                allowed.join(", ")
            )));
        }
        return Ok(());
    }

    if !paths::is_absolute_input(dir) {
        return Err(GatewayError::InvalidRequest(format!(
            "Working directory must be within allowed paths: {}",
            allowed.join(", ")
        )));
    }
    let normalized = paths::normalize_path(dir);
    if !allowed.iter().any(|entry| paths::is_within(&normalized, entry)) {
        return Err(GatewayError::InvalidRequest(format!(
            "Working directory must be within allowed paths: {}",
            allowed.join(", ")
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Chain-aware validation
// ---------------------------------------------------------------------------

/// Validate a full command line, `&&`-chain aware.
///
/// Each step runs the single-step validators; `cd`/`chdir` steps additionally
/// move a running current directory (resolved per the shell's dialect) that
/// is re-confined against the allowed paths, so a chain cannot escape by
/// stepping out after an innocuous first hop.
pub fn validate_command(
    ctx: &ValidationContext,
    command: &str,
    working_dir: &str,
) -> GatewayResult<()> {
    validate_command_length(command, ctx)?;

    let mut current_dir = working_dir.to_string();
    for raw_step in command.split("&&") {
        let step = raw_step.trim();
        if step.is_empty() {
            continue;
        }
        let parsed = validate_single_step(step, ctx)?;

        let name = extract_command_name(&parsed.command);
        if (name == "cd" || name == "chdir") && !parsed.args.is_empty() {
            let target = &parsed.args[0];
            let next_dir = resolve_cd_target(ctx.kind(), &current_dir, target);
            if ctx.config.security.restrict_working_directory {
                validate_working_directory(&next_dir, ctx)?;
            }
            current_dir = next_dir;
        }
    }
    Ok(())
}

fn validate_single_step(step: &str, ctx: &ValidationContext) -> GatewayResult<ParsedCommand> {
    validate_shell_operators(step, ctx)?;
    let parsed = parse_command(step);
    if is_command_blocked(&parsed.command, ctx) {
        return Err(GatewayError::InvalidRequest(format!(
            "Command is blocked: \"{}\"",
            extract_command_name(&parsed.command)
        )));
    }
    if is_argument_blocked(&parsed.args, ctx) {
        return Err(GatewayError::InvalidRequest(
            "One or more arguments are blocked. Check configuration for blockedArguments."
                .to_string(),
        ));
    }
    validate_command_length(step, ctx)?;
    Ok(parsed)
}

/// Where a `cd` step would land, resolved lexically in the shell's dialect.
/// `..` at a filesystem root stays at the root.
fn resolve_cd_target(kind: ShellKind, current_dir: &str, target: &str) -> String {
    if kind == ShellKind::Wsl {
        return if target.starts_with('/') {
            paths::normalize_path(target)
        } else {
            paths::normalize_path(&paths::join_posix(current_dir, target))
        };
    }

    if paths::is_absolute_input(target) {
        return paths::normalize_path(target);
    }
    let base = paths::normalize_path(current_dir);
    let joined = if base.starts_with('/') {
        paths::join_posix(&base, target)
    } else {
        paths::join_windows(&base, target)
    };
    paths::normalize_path(&joined)
}
