use super::*;

struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echo the input back"
    }

    fn parameters(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": { "text": { "type": "string" } },
            "required": ["text"]
        })
    }

    async fn execute(&self, params: Value) -> GatewayResult<ToolResult> {
        let text = params["text"].as_str().unwrap_or_default();
        Ok(ToolResult::new(text))
    }
}

struct BadNameTool;

#[async_trait]
impl Tool for BadNameTool {
    fn name(&self) -> &str {
        ""
    }

    fn description(&self) -> &str {
        "unregisterable"
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "type": "object" })
    }

    async fn execute(&self, _params: Value) -> GatewayResult<ToolResult> {
        Ok(ToolResult::new("never"))
    }
}

#[tokio::test]
async fn dispatches_registered_tool() {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(EchoTool));
    let result = registry
        .execute("echo", serde_json::json!({ "text": "hi" }))
        .await
        .unwrap();
    assert_eq!(result.content, "hi");
    assert!(!result.is_error);
}

#[tokio::test]
async fn unknown_tool_is_method_not_found() {
    let registry = ToolRegistry::new();
    let err = registry
        .execute("nope", serde_json::json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::MethodNotFound(_)));
    assert_eq!(err.to_string(), "Unknown tool: nope");
}

#[test]
fn invalid_names_are_rejected_at_registration() {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(BadNameTool));
    assert!(registry.tool_names().is_empty());
}

#[test]
fn tool_names_are_sorted() {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(EchoTool));
    assert_eq!(registry.tool_names(), vec!["echo"]);
    let schemas = registry.schemas();
    assert_eq!(schemas[0]["name"], "echo");
    assert!(schemas[0]["inputSchema"]["properties"]["text"].is_object());
}
