//! MCP server integration for platform-mcp.
//!
//! [`RegistryServer`] exposes a [`ToolRegistry`](platform_tools_core::ToolRegistry)
//! over rmcp, building a [`CallContext`](platform_tools_core::CallContext)
//! from each inbound request.

mod errors;
mod server;

pub use errors::{REQUEST_CANCELLED, to_call_result};
pub use server::{MCP_SESSION_HEADER, RegistryServer};

pub use rmcp::transport::stdio;
pub use rmcp::transport::streamable_http_server::{
    StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
};
pub use rmcp::{ServerHandler, service::ServiceExt};
