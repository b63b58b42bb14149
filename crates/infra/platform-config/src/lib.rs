//! Process configuration for the platform-mcp server.
//!
//! This crate provides:
//! - [`PlatformConfig`]: The root configuration type (target service, tool
//!   enablement, logging)
//! - [`load_merged`]: Layered config loading (global + local/explicit file) with env overrides
//! - [`validation`]: Fatal checks plus advisory warnings
//!
//! # Configuration Precedence (lowest to highest)
//! 1. Default values
//! 2. Global config (`~/.config/platform-mcp/platform.json`)
//! 3. Local config (`./platform.json`) or an explicit `--config` file
//! 4. Environment variables
//!
//! # Environment Variables
//! - `PLATFORM_BASE_URL`: Target service base URL
//! - `PLATFORM_USERNAME` / `PLATFORM_PASSWORD`: Static service credentials (password is env-only)
//! - `PLATFORM_INSECURE_SKIP_VERIFY`: Disable TLS verification ("true" or "1")
//! - `PLATFORM_PROXY_URL`: Outbound proxy
//! - `PLATFORM_ENABLED_TOOLS` / `PLATFORM_DISABLED_TOOLS`: Comma-separated tool names
//! - `PLATFORM_LOG_LEVEL`: Override log level
//! - `PLATFORM_LOG_JSON`: Enable JSON logging ("true" or "1")

pub mod loader;
pub mod merge;
pub mod types;
pub mod validation;

/// Test support utilities (for use in tests)
#[doc(hidden)]
pub mod test_support;

pub use loader::{LoadedPlatformConfig, load_merged};
pub use types::{LoggingConfig, PlatformConfig, ServiceConfig, TimeoutConfig, ToolsConfig};
pub use validation::{AdvisoryWarning, ConfigError, validate};
