//! Unified error type for tool calls.

use thiserror::Error;

/// Error type returned by tool handlers, middleware and dispatch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// Input could not be decoded into the tool's declared shape.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No tool with this name is registered (or it was disabled).
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// Configuration problem discovered at call time.
    #[error("configuration error: {0}")]
    Config(String),

    /// Caller is not allowed to run this tool.
    #[error("permission denied: {0}")]
    Permission(String),

    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Non-2xx response from the target service.
    #[error("upstream returned {status} ({kind}): {body}")]
    Upstream {
        status: u16,
        kind: String,
        body: String,
    },

    /// Error from an external service that carried no usable status.
    #[error("external service error: {0}")]
    External(String),

    /// Type mismatch or panic inside the generic dispatch chain.
    #[error("dispatch error: {0}")]
    Dispatch(String),

    /// Internal error during tool execution.
    #[error("internal error: {0}")]
    Internal(String),

    /// The call was cancelled by its caller.
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// The call ran past its deadline.
    #[error("deadline exceeded: {0}")]
    DeadlineExceeded(String),
}

impl ToolError {
    /// Create an invalid input error.
    pub fn invalid_input<S: ToString>(s: S) -> Self {
        Self::InvalidInput(s.to_string())
    }

    /// Create a call-time configuration error.
    pub fn config<S: ToString>(s: S) -> Self {
        Self::Config(s.to_string())
    }

    /// Create a dispatch error.
    pub fn dispatch<S: ToString>(s: S) -> Self {
        Self::Dispatch(s.to_string())
    }

    /// Create an internal error.
    pub fn internal<S: ToString>(s: S) -> Self {
        Self::Internal(s.to_string())
    }

    /// Create an external service error.
    pub fn external<S: ToString>(s: S) -> Self {
        Self::External(s.to_string())
    }

    /// Create a not found error.
    pub fn not_found<S: ToString>(s: S) -> Self {
        Self::NotFound(s.to_string())
    }

    /// Create a permission denied error.
    pub fn permission<S: ToString>(s: S) -> Self {
        Self::Permission(s.to_string())
    }

    /// True for caller-side aborts (cancellation or deadline), as opposed to failures.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled(_) | Self::DeadlineExceeded(_))
    }

    /// Upstream HTTP status, if this error carries one.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_kinds() {
        assert!(ToolError::Cancelled("x".into()).is_cancellation());
        assert!(ToolError::DeadlineExceeded("x".into()).is_cancellation());
        assert!(!ToolError::internal("x").is_cancellation());
    }

    #[test]
    fn upstream_display_includes_status_and_body() {
        let e = ToolError::Upstream {
            status: 503,
            kind: "server_error".into(),
            body: "maintenance".into(),
        };
        assert_eq!(e.upstream_status(), Some(503));
        let msg = e.to_string();
        assert!(msg.contains("503"));
        assert!(msg.contains("maintenance"));
    }
}
