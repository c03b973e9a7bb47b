pub mod loader;
pub mod resolve;
pub mod schema;

pub use loader::{get_config_path, load_config};
pub use resolve::{ResolvedShellConfig, resolve_enabled_shells, resolve_shell};
pub use schema::{
    Config, GlobalConfig, PathsConfig, RestrictionsConfig, SecurityConfig, ShellConfig,
    ShellExecutable, ShellKind, ShellsConfig, WslConfig,
};
