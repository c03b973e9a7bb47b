//! Server state and the tool dispatcher: an immutable map of resolved shell
//! configurations, the single mutable active working directory, and the thin
//! router that hands tool calls to the registry.

use crate::config::resolve::{ResolvedShellConfig, resolve_enabled_shells};
use crate::config::schema::Config;
use crate::errors::{GatewayError, GatewayResult};
use crate::paths;
use crate::tools::base::ToolResult;
use crate::tools::config_info::GetConfigTool;
use crate::tools::directory::{GetCurrentDirectoryTool, SetCurrentDirectoryTool};
use crate::tools::execute::ExecuteCommandTool;
use crate::tools::registry::ToolRegistry;
use crate::tools::validate_dirs::ValidateDirectoriesTool;
use crate::validation::ValidationContext;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{info, warn};

pub struct ServerState {
    config: Config,
    resolved: BTreeMap<String, Arc<ResolvedShellConfig>>,
    /// Global allowed paths in validator form, fixed at construction.
    global_allowed: Vec<String>,
    /// The only runtime-mutable state: written by `set_current_directory`,
    /// snapshotted by readers.
    active_cwd: RwLock<Option<String>>,
}

impl ServerState {
    pub fn new(config: Config) -> Self {
        let resolved = resolve_enabled_shells(&config);
        let global_allowed = paths::normalize_allowed_paths(&config.global.paths.allowed_paths);
        info!(
            shells = ?resolved.keys().collect::<Vec<_>>(),
            allowed_paths = global_allowed.len(),
            "gateway state constructed"
        );
        let state = Self {
            config,
            resolved,
            global_allowed,
            active_cwd: RwLock::new(None),
        };
        state.seed_initial_dir();
        state
    }

    /// Adopt `paths.initialDir` as the active working directory when it
    /// passes the global confinement check; otherwise start without one.
    fn seed_initial_dir(&self) {
        let Some(dir) = self.config.global.paths.initial_dir.clone() else {
            return;
        };
        let normalized = paths::normalize_path(&dir);
        if let Err(e) = self.validate_global_dir(&normalized, None) {
            warn!(
                "ignoring initialDir {}: {}; starting without an active directory",
                dir, e
            );
            return;
        }
        if let Err(e) = std::env::set_current_dir(&normalized) {
            warn!("could not chdir to initialDir {}: {}", normalized, e);
        }
        self.set_active_cwd(normalized);
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn resolved(&self) -> &BTreeMap<String, Arc<ResolvedShellConfig>> {
        &self.resolved
    }

    /// Names of the enabled shells, sorted.
    pub fn shell_names(&self) -> Vec<String> {
        self.resolved.keys().cloned().collect()
    }

    pub fn context_for(&self, shell: &str) -> GatewayResult<ValidationContext> {
        self.resolved
            .get(shell)
            .map(|config| ValidationContext::new(shell, Arc::clone(config)))
            .ok_or_else(|| {
                GatewayError::InvalidRequest(format!(
                    "Shell is not enabled or not configured: {}",
                    shell
                ))
            })
    }

    pub fn active_cwd(&self) -> Option<String> {
        self.active_cwd
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_active_cwd(&self, dir: String) {
        *self
            .active_cwd
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(dir);
    }

    pub fn process_cwd() -> String {
        std::env::current_dir()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|_| ".".to_string())
    }

    /// Confine a directory to the *global* allowed paths, independent of any
    /// shell override. With `wsl_mount` set, the global entries are compared
    /// in their WSL mount form.
    pub fn validate_global_dir(&self, dir: &str, wsl_mount: Option<&str>) -> GatewayResult<()> {
        if !self.config.global.security.restrict_working_directory {
            return Ok(());
        }
        if self.global_allowed.is_empty() {
            return Err(GatewayError::InvalidRequest(
                "No allowed paths configured".to_string(),
            ));
        }
        let normalized = paths::normalize_path(dir);
        let candidates: Vec<String> = match wsl_mount {
            Some(mount) => self
                .global_allowed
                .iter()
                .filter_map(|entry| paths::wsl_allowed_form(entry, mount))
                .collect(),
            None => self.global_allowed.clone(),
        };
        if !candidates
            .iter()
            .any(|entry| paths::is_within(&normalized, entry))
        {
            return Err(GatewayError::InvalidRequest(format!(
                "Directory must be within allowed paths: {}",
                candidates.join(", ")
            )));
        }
        Ok(())
    }
}

/// The gateway: immutable state plus the tool registry routing the five
/// recognized tools.
pub struct GatewayServer {
    state: Arc<ServerState>,
    registry: ToolRegistry,
}

impl GatewayServer {
    pub fn new(config: Config) -> Self {
        let state = Arc::new(ServerState::new(config));
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(ExecuteCommandTool::new(Arc::clone(&state))));
        registry.register(Arc::new(GetConfigTool::new(Arc::clone(&state))));
        registry.register(Arc::new(GetCurrentDirectoryTool::new(Arc::clone(&state))));
        registry.register(Arc::new(SetCurrentDirectoryTool::new(Arc::clone(&state))));
        registry.register(Arc::new(ValidateDirectoriesTool::new(Arc::clone(&state))));
        Self { state, registry }
    }

    pub fn state(&self) -> &Arc<ServerState> {
        &self.state
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub async fn handle_call(&self, name: &str, arguments: Value) -> GatewayResult<ToolResult> {
        self.registry.execute(name, arguments).await
    }

    pub fn list_resources(&self) -> Vec<Value> {
        let mut resources = vec![
            json!({ "uri": "cli://config", "name": "CLI Server Configuration" }),
            json!({ "uri": "cli://config/global", "name": "Global Configuration" }),
            json!({ "uri": "cli://info/security", "name": "Security Posture" }),
        ];
        for name in self.state.shell_names() {
            resources.push(json!({
                "uri": format!("cli://config/shells/{}", name),
                "name": format!("Resolved configuration for {}", name),
            }));
        }
        resources
    }

    pub fn read_resource(&self, uri: &str) -> GatewayResult<Value> {
        match uri {
            "cli://config" => Ok(json!({ "configuration": self.state.config() })),
            "cli://config/global" => Ok(json!(self.state.config().global)),
            "cli://info/security" => Ok(self.security_summary()),
            _ => {
                if let Some(shell) = uri.strip_prefix("cli://config/shells/") {
                    return self
                        .state
                        .resolved()
                        .get(shell)
                        .map(|config| config.summary())
                        .ok_or_else(|| {
                            GatewayError::InvalidRequest(format!(
                                "Shell is disabled or unknown: {}",
                                shell
                            ))
                        });
                }
                Err(GatewayError::InvalidRequest(format!(
                    "Unknown resource URI: {}",
                    uri
                )))
            }
        }
    }

    fn security_summary(&self) -> Value {
        let global = &self.state.config().global;
        json!({
            "enableInjectionProtection": global.security.enable_injection_protection,
            "restrictWorkingDirectory": global.security.restrict_working_directory,
            "maxCommandLength": global.security.max_command_length,
            "commandTimeout": global.security.command_timeout,
            "globalAllowedPaths": self.state.global_allowed,
            "enabledShells": self.state.shell_names(),
            "blockedCommandCount": global.restrictions.blocked_commands.len(),
            "blockedArgumentCount": global.restrictions.blocked_arguments.len(),
            "blockedOperators": global.restrictions.blocked_operators,
        })
    }
}

#[cfg(test)]
mod tests;
