use crate::config::schema::{
    Config, GlobalConfig, PathsConfig, RestrictionsConfig, SecurityConfig, ShellConfig,
    ShellExecutable, ShellKind, WslConfig,
};
use crate::paths;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// The fully materialized configuration a validator sees for one shell:
/// global baseline merged with the shell's overrides, allowed paths already
/// normalized into the shell's dialect. Immutable after construction.
#[derive(Debug, Clone)]
pub struct ResolvedShellConfig {
    pub kind: ShellKind,
    pub executable: ShellExecutable,
    pub security: SecurityConfig,
    pub restrictions: RestrictionsConfig,
    pub paths: PathsConfig,
    pub wsl: Option<WslConfig>,
}

impl ResolvedShellConfig {
    pub fn mount_point(&self) -> &str {
        self.wsl.as_ref().map_or("/mnt/", |w| w.mount_point.as_str())
    }

    /// Whether a Windows-form working directory should be translated into
    /// the mount form before validation and spawning.
    pub fn maps_windows_paths(&self) -> bool {
        self.wsl
            .as_ref()
            .and_then(|w| w.path_mapping.as_ref())
            .is_some_and(|m| m.enabled && m.windows_to_wsl)
    }

    /// Reporting shape for `get_config` and the per-shell resource URI.
    pub fn summary(&self) -> Value {
        let mut summary = json!({
            "shell": self.kind.name(),
            "executable": {
                "command": self.executable.command,
                "args": self.executable.args,
            },
            "security": {
                "maxCommandLength": self.security.max_command_length,
                "commandTimeout": self.security.command_timeout,
                "enableInjectionProtection": self.security.enable_injection_protection,
                "restrictWorkingDirectory": self.security.restrict_working_directory,
            },
            "restrictions": {
                "blockedCommands": self.restrictions.blocked_commands,
                "blockedArguments": self.restrictions.blocked_arguments,
                "blockedOperators": self.restrictions.blocked_operators,
            },
            "paths": {
                "allowedPaths": self.paths.allowed_paths,
                "initialDir": self.paths.initial_dir,
            },
        });
        if let Some(wsl) = &self.wsl {
            summary["wslConfig"] = json!(wsl);
        }
        summary
    }
}

/// Merge the global baseline with one shell's overrides.
///
/// Replace/concatenate rules: every present `security` field replaces;
/// `blockedCommands`/`blockedArguments` concatenate onto the global lists;
/// `blockedOperators` and (non-WSL) `allowedPaths` replace; WSL allowed
/// paths concatenate with the translated global list when
/// `inheritGlobalPaths` is set.
pub fn resolve_shell(
    global: &GlobalConfig,
    kind: ShellKind,
    shell: &ShellConfig,
) -> ResolvedShellConfig {
    let mut security = global.security.clone();
    let mut restrictions = global.restrictions.clone();
    let mut initial_dir = global.paths.initial_dir.clone();

    if let Some(overrides) = &shell.overrides {
        if let Some(sec) = &overrides.security {
            if let Some(v) = sec.max_command_length {
                security.max_command_length = v;
            }
            if let Some(v) = sec.command_timeout {
                security.command_timeout = v;
            }
            if let Some(v) = sec.enable_injection_protection {
                security.enable_injection_protection = v;
            }
            if let Some(v) = sec.restrict_working_directory {
                security.restrict_working_directory = v;
            }
        }
        if let Some(res) = &overrides.restrictions {
            if let Some(commands) = &res.blocked_commands {
                restrictions.blocked_commands.extend(commands.iter().cloned());
            }
            if let Some(arguments) = &res.blocked_arguments {
                restrictions
                    .blocked_arguments
                    .extend(arguments.iter().cloned());
            }
            if let Some(operators) = &res.blocked_operators {
                restrictions.blocked_operators = operators.clone();
            }
        }
        if let Some(path_overrides) = &overrides.paths
            && let Some(dir) = &path_overrides.initial_dir
        {
            initial_dir = Some(dir.clone());
        }
    }

    let allowed_paths = resolve_allowed_paths(global, kind, shell);

    ResolvedShellConfig {
        kind,
        executable: shell.executable.clone(),
        security,
        restrictions,
        paths: PathsConfig {
            allowed_paths,
            initial_dir,
        },
        wsl: shell.wsl.clone(),
    }
}

fn resolve_allowed_paths(global: &GlobalConfig, kind: ShellKind, shell: &ShellConfig) -> Vec<String> {
    let override_paths = shell
        .overrides
        .as_ref()
        .and_then(|o| o.paths.as_ref())
        .and_then(|p| p.allowed_paths.as_ref());

    if kind != ShellKind::Wsl {
        let raw = override_paths.unwrap_or(&global.paths.allowed_paths);
        return paths::normalize_allowed_paths(raw);
    }

    // WSL: translate everything into mount form, honoring inheritance
    let mount = shell
        .wsl
        .as_ref()
        .map_or("/mnt/", |w| w.mount_point.as_str());
    let inherit = shell.wsl.as_ref().is_none_or(|w| w.inherit_global_paths);

    let mut raw: Vec<String> = Vec::new();
    if inherit {
        raw.extend(global.paths.allowed_paths.iter().cloned());
    }
    if let Some(own) = override_paths {
        raw.extend(own.iter().cloned());
    }

    let translated: Vec<String> = raw
        .iter()
        .filter_map(|entry| paths::wsl_allowed_form(entry, mount))
        .collect();
    paths::normalize_allowed_paths(&translated)
}

/// Build the immutable per-shell config map the server dispatches against.
/// Disabled shells are absent from the result.
pub fn resolve_enabled_shells(config: &Config) -> BTreeMap<String, Arc<ResolvedShellConfig>> {
    let mut resolved = BTreeMap::new();
    for (kind, shell) in config.shells.iter() {
        if !shell.enabled {
            continue;
        }
        let shell_config = resolve_shell(&config.global, kind, shell);
        debug!(
            shell = kind.name(),
            allowed_paths = shell_config.paths.allowed_paths.len(),
            "resolved shell configuration"
        );
        resolved.insert(kind.name().to_string(), Arc::new(shell_config));
    }
    resolved
}
