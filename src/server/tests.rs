use super::*;
use crate::config::schema::{PathsConfig, ShellConfig, ShellExecutable, WslConfig};

fn test_config() -> Config {
    let mut config = Config::default();
    config.global.paths = PathsConfig {
        allowed_paths: vec![r"C:\win-cli-test".to_string(), "/tmp".to_string()],
        initial_dir: None,
    };
    config.shells.cmd = Some(ShellConfig {
        enabled: true,
        executable: ShellExecutable {
            command: "cmd.exe".to_string(),
            args: vec!["/c".to_string()],
        },
        overrides: None,
        wsl: None,
    });
    config.shells.powershell = None;
    config.shells.gitbash = None;
    config.shells.wsl = Some(ShellConfig {
        enabled: true,
        executable: ShellExecutable {
            command: "wsl.exe".to_string(),
            args: vec!["-e".to_string()],
        },
        overrides: None,
        wsl: Some(WslConfig::default()),
    });
    config
}

fn server() -> GatewayServer {
    GatewayServer::new(test_config())
}

#[test]
fn only_enabled_shells_are_resolved() {
    let server = server();
    assert_eq!(server.state().shell_names(), vec!["cmd", "wsl"]);
    assert!(server.state().context_for("cmd").is_ok());
    assert!(server.state().context_for("gitbash").is_err());
}

#[test]
fn context_for_unknown_shell_is_invalid_request() {
    let server = server();
    let err = server.state().context_for("zsh").unwrap_err();
    assert!(matches!(err, GatewayError::InvalidRequest(_)));
    assert!(err.to_string().contains("not enabled"));
}

#[tokio::test]
async fn unknown_tool_is_method_not_found() {
    let server = server();
    let err = server
        .handle_call("no_such_tool", json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::MethodNotFound(_)));
}

#[tokio::test]
async fn execute_command_requires_shell_and_command() {
    let server = server();
    let err = server.handle_call("execute_command", json!({})).await.unwrap_err();
    assert!(matches!(err, GatewayError::InvalidParams(_)));
    assert!(err.to_string().contains("'shell'"));

    let err = server
        .handle_call("execute_command", json!({ "shell": "cmd" }))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("'command'"));
}

#[tokio::test]
async fn execute_command_rejects_wrongly_typed_working_dir() {
    let server = server();
    let err = server
        .handle_call(
            "execute_command",
            json!({ "shell": "cmd", "command": "echo hi", "workingDir": 7 }),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::InvalidParams(_)));
}

#[tokio::test]
async fn blocked_command_is_rejected_before_any_spawn() {
    // cmd.exe does not exist on this host; reaching the spawn would error
    // differently, so an InvalidRequest here proves validation ran first
    let server = server();
    let err = server
        .handle_call(
            "execute_command",
            json!({ "shell": "cmd", "command": "rm file.txt", "workingDir": r"C:\win-cli-test" }),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::InvalidRequest(_)));
    assert!(err.to_string().to_lowercase().contains("blocked"));
}

#[tokio::test]
async fn operator_injection_is_rejected() {
    let server = server();
    let err = server
        .handle_call(
            "execute_command",
            json!({ "shell": "cmd", "command": "echo hi ; dir", "workingDir": r"C:\win-cli-test" }),
        )
        .await
        .unwrap_err();
    assert!(err.to_string().contains("blocked operator for cmd: ;"));
}

#[tokio::test]
async fn chain_escape_is_rejected() {
    let server = server();
    let err = server
        .handle_call(
            "execute_command",
            json!({
                "shell": "cmd",
                "command": r"cd C:\Windows && echo hi",
                "workingDir": r"C:\win-cli-test"
            }),
        )
        .await
        .unwrap_err();
    assert!(
        err.to_string()
            .contains("Working directory must be within allowed paths")
    );
}

#[tokio::test]
async fn working_dir_outside_global_paths_is_rejected() {
    let server = server();
    let err = server
        .handle_call(
            "execute_command",
            json!({ "shell": "cmd", "command": "echo hi", "workingDir": r"D:\elsewhere" }),
        )
        .await
        .unwrap_err();
    assert!(err.to_string().contains("allowed paths"));
}

#[tokio::test]
async fn get_config_reports_resolved_shells() {
    let server = server();
    let result = server.handle_call("get_config", json!({})).await.unwrap();
    assert!(!result.is_error);
    let value: Value = serde_json::from_str(&result.content).unwrap();
    assert!(value["configuration"]["global"]["security"]["restrictWorkingDirectory"].is_boolean());
    assert_eq!(value["resolvedShells"]["cmd"]["shell"], "cmd");
    assert_eq!(value["resolvedShells"]["wsl"]["shell"], "wsl");
}

#[tokio::test]
async fn validate_directories_lists_only_offenders() {
    let server = server();
    let result = server
        .handle_call(
            "validate_directories",
            json!({ "directories": [r"C:\win-cli-test\sub", r"C:\Windows"] }),
        )
        .await
        .unwrap();
    assert!(result.is_error);
    assert!(result.content.contains(r"C:\Windows"));
    assert!(!result.content.contains("sub"));
}

#[tokio::test]
async fn validate_directories_all_valid() {
    let server = server();
    let result = server
        .handle_call(
            "validate_directories",
            json!({ "directories": [r"C:\win-cli-test", "/tmp/anything"] }),
        )
        .await
        .unwrap();
    assert!(!result.is_error);
    assert_eq!(result.content, "All directories are within allowed paths");
}

#[tokio::test]
async fn validate_directories_against_wsl_shell_uses_mount_form() {
    let server = server();
    let result = server
        .handle_call(
            "validate_directories",
            json!({ "directories": ["/mnt/c/win-cli-test", "/etc"], "shell": "wsl" }),
        )
        .await
        .unwrap();
    assert!(result.is_error);
    assert!(result.content.contains("/etc"));
    assert!(!result.content.contains("/mnt/c/win-cli-test"));
}

#[tokio::test]
async fn validate_directories_requires_array() {
    let server = server();
    let err = server
        .handle_call("validate_directories", json!({ "directories": "not-a-list" }))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::InvalidParams(_)));
}

#[tokio::test]
async fn get_current_directory_falls_back_to_process_cwd() {
    let server = server();
    let result = server
        .handle_call("get_current_directory", json!({}))
        .await
        .unwrap();
    assert!(!result.is_error);
    assert!(!result.content.is_empty());
}

#[test]
fn initial_dir_outside_allowed_paths_is_ignored() {
    let mut config = test_config();
    config.global.paths.initial_dir = Some(r"D:\outside".to_string());
    let state = ServerState::new(config);
    assert_eq!(state.active_cwd(), None);
}

#[cfg(unix)]
#[test]
fn valid_initial_dir_seeds_the_active_cwd() {
    let mut config = test_config();
    config.global.paths.initial_dir = Some("/tmp".to_string());
    let state = ServerState::new(config);
    assert_eq!(state.active_cwd().as_deref(), Some("/tmp"));
}

#[test]
fn resources_cover_config_and_shells() {
    let server = server();
    let uris: Vec<String> = server
        .list_resources()
        .into_iter()
        .map(|r| r["uri"].as_str().unwrap().to_string())
        .collect();
    assert!(uris.contains(&"cli://config".to_string()));
    assert!(uris.contains(&"cli://config/shells/cmd".to_string()));
    assert!(uris.contains(&"cli://info/security".to_string()));
}

#[test]
fn read_resource_shell_summary_and_unknown() {
    let server = server();
    let summary = server.read_resource("cli://config/shells/wsl").unwrap();
    assert_eq!(summary["shell"], "wsl");

    let err = server
        .read_resource("cli://config/shells/gitbash")
        .unwrap_err();
    assert!(err.to_string().contains("disabled or unknown"));

    let err = server.read_resource("cli://bogus").unwrap_err();
    assert!(err.to_string().contains("Unknown resource URI"));
}

#[test]
fn security_resource_reports_posture() {
    let server = server();
    let posture = server.read_resource("cli://info/security").unwrap();
    assert_eq!(posture["restrictWorkingDirectory"], true);
    assert_eq!(posture["enabledShells"][0], "cmd");
    assert!(posture["blockedCommandCount"].as_u64().unwrap() > 0);
}
