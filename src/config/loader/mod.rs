use crate::config::schema::Config;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Root directory for gateway state: `$SHELLGATE_HOME` when set, otherwise
/// `~/.shellgate`.
pub fn get_gateway_home() -> Result<PathBuf> {
    if let Some(home) = std::env::var_os("SHELLGATE_HOME") {
        return Ok(PathBuf::from(home));
    }
    Ok(dirs::home_dir()
        .context("Could not determine home directory")?
        .join(".shellgate"))
}

pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_gateway_home()?.join("config.json"))
}

/// Load the gateway configuration. Any load failure (missing file, bad
/// JSON, invalid values) falls back to the documented defaults with a
/// warning, so the gateway always starts in a conservative posture.
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let default_path = get_config_path().unwrap_or_else(|_| PathBuf::from("config.json"));
    let path = config_path.unwrap_or(default_path.as_path());

    if path.exists() {
        match read_config(path) {
            Ok(config) => return Ok(config),
            Err(e) => {
                warn!(
                    "failed to load config from {}: {:#}; falling back to defaults",
                    path.display(),
                    e
                );
            }
        }
    } else {
        info!("no config file at {}, using defaults", path.display());
    }

    let default_config = Config::default();
    default_config
        .validate()
        .with_context(|| "Default configuration validation failed")?;
    Ok(default_config)
}

fn read_config(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    let config: Config = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config JSON from {}", path.display()))?;
    config
        .validate()
        .with_context(|| "Configuration validation failed")?;
    Ok(config)
}

#[cfg(test)]
mod tests;
