use super::*;

#[test]
fn invalid_request_display_is_bare_message() {
    let err = GatewayError::InvalidRequest("Command is blocked: \"rm\"".into());
    assert_eq!(err.to_string(), "Command is blocked: \"rm\"");
    assert_eq!(err.code(), -32600);
    assert!(err.is_caller_error());
}

#[test]
fn method_not_found_display() {
    let err = GatewayError::MethodNotFound("frobnicate".into());
    assert_eq!(err.to_string(), "Unknown tool: frobnicate");
    assert_eq!(err.code(), -32601);
}

#[test]
fn timeout_display_keeps_fractional_seconds() {
    let err = GatewayError::Timeout {
        seconds: 0.1,
        shell: "wsl".into(),
    };
    assert_eq!(err.to_string(), "Command timed out after 0.1 seconds (wsl)");
    assert_eq!(err.code(), -32603);
    assert!(!err.is_caller_error());
}

#[test]
fn timeout_display_drops_trailing_zero_on_whole_seconds() {
    let err = GatewayError::Timeout {
        seconds: 30.0,
        shell: "cmd".into(),
    };
    assert_eq!(err.to_string(), "Command timed out after 30 seconds (cmd)");
}

#[test]
fn spawn_error_carries_os_message() {
    let err = GatewayError::Spawn("No such file or directory (os error 2)".into());
    assert!(err.to_string().starts_with("Shell process error: "));
    assert_eq!(err.code(), -32603);
}

#[test]
fn internal_from_anyhow() {
    let anyhow_err = anyhow::anyhow!("something broke");
    let err: GatewayError = anyhow_err.into();
    assert!(matches!(err, GatewayError::Internal(_)));
    assert_eq!(err.code(), -32603);
}
