//! Outbound HTTP for platform-mcp tools.
//!
//! [`PlatformClient`] carries the caller's identity, session and a fresh
//! trace context to the target service on every request.

pub mod status;
pub mod traceparent;
pub mod transport;

pub use status::{HttpKind, MAX_ERROR_BODY_CHARS, classify_status, upstream_error};
pub use traceparent::{TRACEPARENT_HEADER, TraceParent};
pub use transport::{
    BasicCredentials, PLACEHOLDER_BASE_URL, PLATFORM_USER_AGENT, PlatformClient, SESSION_HEADER,
    TOOL_NAME_HEADER, TransportError, TransportOptions, check_status,
};

pub use reqwest::Method;
