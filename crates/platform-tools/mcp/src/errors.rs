//! Mapping of tool errors onto MCP responses.
//!
//! Protocol-level failures (bad arguments, unknown tool, aborted calls,
//! server faults) become JSON-RPC errors. Failures the tool observed in the
//! target service become a successful response flagged `is_error`, so the
//! model sees the message.

use platform_tools_core::ToolError;
use rmcp::model as m;

/// JSON-RPC code for a request aborted by cancellation or deadline.
pub const REQUEST_CANCELLED: i32 = -32800;

/// Map a failed dispatch to either a tool-level error result or a protocol error.
pub fn to_call_result(err: &ToolError) -> Result<m::CallToolResult, m::ErrorData> {
    match err {
        ToolError::InvalidInput(_) | ToolError::UnknownTool(_) => {
            Err(m::ErrorData::invalid_params(err.to_string(), None))
        }
        ToolError::Cancelled(_) | ToolError::DeadlineExceeded(_) => Err(m::ErrorData::new(
            m::ErrorCode(REQUEST_CANCELLED),
            err.to_string(),
            None,
        )),
        ToolError::Dispatch(_) | ToolError::Internal(_) | ToolError::Config(_) => {
            Err(m::ErrorData::internal_error(err.to_string(), None))
        }
        ToolError::Upstream { status, .. } => Ok(m::CallToolResult {
            content: vec![m::Content::text(err.to_string())],
            structured_content: Some(serde_json::json!({ "error": err.to_string(), "status": status })),
            is_error: Some(true),
            meta: None,
        }),
        ToolError::External(_) | ToolError::Permission(_) | ToolError::NotFound(_) => {
            Ok(m::CallToolResult::error(vec![m::Content::text(err.to_string())]))
        }
    }
}
