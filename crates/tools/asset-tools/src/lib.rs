//! Asset lookup tools for platform-mcp.
//!
//! Each tool is a thin mapping from typed input to one platform API call
//! made through [`PlatformClient`](platform_tools_http::PlatformClient).

pub mod models;
pub mod tools;

pub use tools::{
    GetAssetInput, GetAssetTool, SearchAssetsInput, SearchAssetsTool, TOOL_NAMES, WhoAmITool,
    build_registry,
};
