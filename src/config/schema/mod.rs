use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fmt;

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Shell kinds
// ---------------------------------------------------------------------------

/// The closed set of shells the gateway can front. The kind decides which
/// path dialect validators apply and which default invocation is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShellKind {
    Cmd,
    Powershell,
    Gitbash,
    Wsl,
}

impl ShellKind {
    pub const ALL: [ShellKind; 4] = [
        ShellKind::Cmd,
        ShellKind::Powershell,
        ShellKind::Gitbash,
        ShellKind::Wsl,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ShellKind::Cmd => "cmd",
            ShellKind::Powershell => "powershell",
            ShellKind::Gitbash => "gitbash",
            ShellKind::Wsl => "wsl",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
    }

    /// WSL validates POSIX paths; every other shell speaks the Windows
    /// dialect (Git Bash inputs are rewritten to drive form first).
    pub fn uses_windows_paths(self) -> bool {
        !matches!(self, ShellKind::Wsl)
    }
}

impl fmt::Display for ShellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Global blocks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Inclusive upper bound on the raw command string length.
    #[serde(default = "default_max_command_length", rename = "maxCommandLength")]
    pub max_command_length: u32,
    /// Per-request child-process timeout, in (possibly fractional) seconds.
    #[serde(default = "default_command_timeout", rename = "commandTimeout")]
    pub command_timeout: f64,
    #[serde(default = "default_true", rename = "enableInjectionProtection")]
    pub enable_injection_protection: bool,
    #[serde(default = "default_true", rename = "restrictWorkingDirectory")]
    pub restrict_working_directory: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_command_length: default_max_command_length(),
            command_timeout: default_command_timeout(),
            enable_injection_protection: true,
            restrict_working_directory: true,
        }
    }
}

fn default_max_command_length() -> u32 {
    2000
}

fn default_command_timeout() -> f64 {
    30.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestrictionsConfig {
    #[serde(default = "default_blocked_commands", rename = "blockedCommands")]
    pub blocked_commands: Vec<String>,
    #[serde(default = "default_blocked_arguments", rename = "blockedArguments")]
    pub blocked_arguments: Vec<String>,
    #[serde(default = "default_blocked_operators", rename = "blockedOperators")]
    pub blocked_operators: Vec<String>,
}

impl Default for RestrictionsConfig {
    fn default() -> Self {
        Self {
            blocked_commands: default_blocked_commands(),
            blocked_arguments: default_blocked_arguments(),
            blocked_operators: default_blocked_operators(),
        }
    }
}

fn default_blocked_commands() -> Vec<String> {
    [
        "rm", "del", "rmdir", "format", "shutdown", "restart", "reg", "regedit", "net", "netsh",
        "takeown", "icacls",
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}

fn default_blocked_arguments() -> Vec<String> {
    [
        "--exec",
        "-e",
        "/c",
        "-enc",
        "-encodedcommand",
        "-command",
        "--interactive",
        "-i",
        "--login",
        "--system",
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}

// `&&` stays off this list: it is the chain separator, and operator checks
// run on the already-split steps.
fn default_blocked_operators() -> Vec<String> {
    ["&", "|", ";", "`"].iter().map(ToString::to_string).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_allowed_paths", rename = "allowedPaths")]
    pub allowed_paths: Vec<String>,
    #[serde(
        default,
        rename = "initialDir",
        skip_serializing_if = "Option::is_none"
    )]
    pub initial_dir: Option<String>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            allowed_paths: default_allowed_paths(),
            initial_dir: None,
        }
    }
}

fn default_allowed_paths() -> Vec<String> {
    let mut paths = Vec::new();
    if let Some(home) = dirs::home_dir() {
        paths.push(home.to_string_lossy().into_owned());
    }
    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.to_string_lossy().into_owned());
    }
    paths
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GlobalConfig {
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub restrictions: RestrictionsConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

// ---------------------------------------------------------------------------
// Per-shell configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShellExecutable {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Partial copies of the global blocks. A present field replaces the global
/// value; the list fields `blockedCommands`/`blockedArguments` concatenate
/// instead (see the resolver).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SecurityOverrides {
    #[serde(
        default,
        rename = "maxCommandLength",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_command_length: Option<u32>,
    #[serde(
        default,
        rename = "commandTimeout",
        skip_serializing_if = "Option::is_none"
    )]
    pub command_timeout: Option<f64>,
    #[serde(
        default,
        rename = "enableInjectionProtection",
        skip_serializing_if = "Option::is_none"
    )]
    pub enable_injection_protection: Option<bool>,
    #[serde(
        default,
        rename = "restrictWorkingDirectory",
        skip_serializing_if = "Option::is_none"
    )]
    pub restrict_working_directory: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RestrictionsOverrides {
    #[serde(
        default,
        rename = "blockedCommands",
        skip_serializing_if = "Option::is_none"
    )]
    pub blocked_commands: Option<Vec<String>>,
    #[serde(
        default,
        rename = "blockedArguments",
        skip_serializing_if = "Option::is_none"
    )]
    pub blocked_arguments: Option<Vec<String>>,
    #[serde(
        default,
        rename = "blockedOperators",
        skip_serializing_if = "Option::is_none"
    )]
    pub blocked_operators: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PathsOverrides {
    #[serde(
        default,
        rename = "allowedPaths",
        skip_serializing_if = "Option::is_none"
    )]
    pub allowed_paths: Option<Vec<String>>,
    #[serde(
        default,
        rename = "initialDir",
        skip_serializing_if = "Option::is_none"
    )]
    pub initial_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ShellOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<SecurityOverrides>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restrictions: Option<RestrictionsOverrides>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paths: Option<PathsOverrides>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathMappingConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_true", rename = "windowsToWsl")]
    pub windows_to_wsl: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WslConfig {
    /// Where Windows drives appear inside WSL. Must start and end with `/`.
    #[serde(default = "default_mount_point", rename = "mountPoint")]
    pub mount_point: String,
    /// Whether the global allowed paths (translated through the mount
    /// point) also confine this shell.
    #[serde(default = "default_true", rename = "inheritGlobalPaths")]
    pub inherit_global_paths: bool,
    #[serde(
        default,
        rename = "pathMapping",
        skip_serializing_if = "Option::is_none"
    )]
    pub path_mapping: Option<PathMappingConfig>,
}

impl Default for WslConfig {
    fn default() -> Self {
        Self {
            mount_point: default_mount_point(),
            inherit_global_paths: true,
            path_mapping: None,
        }
    }
}

fn default_mount_point() -> String {
    "/mnt/".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShellConfig {
    #[serde(default)]
    pub enabled: bool,
    pub executable: ShellExecutable,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overrides: Option<ShellOverrides>,
    #[serde(default, rename = "wslConfig", skip_serializing_if = "Option::is_none")]
    pub wsl: Option<WslConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShellsConfig {
    #[serde(default = "default_cmd_shell", skip_serializing_if = "Option::is_none")]
    pub cmd: Option<ShellConfig>,
    #[serde(
        default = "default_powershell_shell",
        skip_serializing_if = "Option::is_none"
    )]
    pub powershell: Option<ShellConfig>,
    #[serde(
        default = "default_gitbash_shell",
        skip_serializing_if = "Option::is_none"
    )]
    pub gitbash: Option<ShellConfig>,
    #[serde(default = "default_wsl_shell", skip_serializing_if = "Option::is_none")]
    pub wsl: Option<ShellConfig>,
}

impl Default for ShellsConfig {
    fn default() -> Self {
        Self {
            cmd: default_cmd_shell(),
            powershell: default_powershell_shell(),
            gitbash: default_gitbash_shell(),
            wsl: default_wsl_shell(),
        }
    }
}

impl ShellsConfig {
    pub fn get(&self, kind: ShellKind) -> Option<&ShellConfig> {
        match kind {
            ShellKind::Cmd => self.cmd.as_ref(),
            ShellKind::Powershell => self.powershell.as_ref(),
            ShellKind::Gitbash => self.gitbash.as_ref(),
            ShellKind::Wsl => self.wsl.as_ref(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ShellKind, &ShellConfig)> {
        ShellKind::ALL
            .into_iter()
            .filter_map(|kind| self.get(kind).map(|shell| (kind, shell)))
    }
}

fn default_cmd_shell() -> Option<ShellConfig> {
    Some(ShellConfig {
        enabled: true,
        executable: ShellExecutable {
            command: "cmd.exe".to_string(),
            args: vec!["/c".to_string()],
        },
        overrides: None,
        wsl: None,
    })
}

fn default_powershell_shell() -> Option<ShellConfig> {
    Some(ShellConfig {
        enabled: true,
        executable: ShellExecutable {
            command: "powershell.exe".to_string(),
            args: vec![
                "-NoProfile".to_string(),
                "-NonInteractive".to_string(),
                "-Command".to_string(),
            ],
        },
        overrides: None,
        wsl: None,
    })
}

fn default_gitbash_shell() -> Option<ShellConfig> {
    Some(ShellConfig {
        enabled: true,
        executable: ShellExecutable {
            command: r"C:\Program Files\Git\bin\bash.exe".to_string(),
            args: vec!["-c".to_string()],
        },
        overrides: None,
        wsl: None,
    })
}

fn default_wsl_shell() -> Option<ShellConfig> {
    Some(ShellConfig {
        enabled: false,
        executable: ShellExecutable {
            command: "wsl.exe".to_string(),
            args: vec!["-e".to_string()],
        },
        overrides: None,
        wsl: Some(WslConfig::default()),
    })
}

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub global: GlobalConfig,
    #[serde(default)]
    pub shells: ShellsConfig,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        let security = &self.global.security;
        if security.command_timeout <= 0.0 {
            bail!(
                "security.commandTimeout must be positive, got {}",
                security.command_timeout
            );
        }
        if security.max_command_length == 0 {
            bail!("security.maxCommandLength must be at least 1");
        }

        for (kind, shell) in self.shells.iter() {
            if !shell.enabled {
                continue;
            }
            if shell.executable.command.is_empty() {
                bail!("shells.{}.executable.command must not be empty", kind);
            }
            if let Some(overrides) = &shell.overrides
                && let Some(sec) = &overrides.security
                && let Some(timeout) = sec.command_timeout
                && timeout <= 0.0
            {
                bail!(
                    "shells.{}.overrides.security.commandTimeout must be positive",
                    kind
                );
            }
            if let Some(wsl) = &shell.wsl {
                validate_mount_point(&wsl.mount_point)
                    .with_context(|| format!("shells.{}.wslConfig.mountPoint", kind))?;
            }
        }
        Ok(())
    }
}

fn validate_mount_point(mount_point: &str) -> Result<()> {
    if !mount_point.starts_with('/') || !mount_point.ends_with('/') {
        bail!(
            "mount point must start and end with '/', got {:?}",
            mount_point
        );
    }
    Ok(())
}
