use thiserror::Error;

/// Typed error hierarchy for the gateway.
///
/// Use at module boundaries (validation, dispatch, execution). Internal/leaf
/// functions can continue using `anyhow::Result` — the `Internal` variant
/// allows seamless conversion via the `?` operator.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// A request rejected by the validation pipeline: blocked command,
    /// argument or operator, a working directory outside the allowed set,
    /// or a command over the length limit.
    #[error("{0}")]
    InvalidRequest(String),

    /// Missing or wrongly-typed tool arguments.
    #[error("{0}")]
    InvalidParams(String),

    /// Unknown tool name.
    #[error("Unknown tool: {0}")]
    MethodNotFound(String),

    /// The child process outlived its per-shell timeout and was killed.
    #[error("Command timed out after {seconds} seconds ({shell})")]
    Timeout { seconds: f64, shell: String },

    /// The shell process failed to spawn or broke mid-flight.
    #[error("Shell process error: {0}")]
    Spawn(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Convenience alias for results using GatewayError.
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

impl GatewayError {
    /// JSON-RPC-style error code exposed to the transport.
    pub fn code(&self) -> i32 {
        match self {
            Self::InvalidRequest(_) => -32600,
            Self::MethodNotFound(_) => -32601,
            Self::InvalidParams(_) => -32602,
            Self::Timeout { .. } | Self::Spawn(_) | Self::Internal(_) => -32603,
        }
    }

    /// Whether this error was caused by the caller's input rather than the
    /// host (caller errors are never worth retrying verbatim).
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidRequest(_) | Self::InvalidParams(_) | Self::MethodNotFound(_)
        )
    }
}

#[cfg(test)]
mod tests;
