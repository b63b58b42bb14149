//! Command-line arguments and their effect on the loaded config.

use clap::{Parser, ValueEnum};
use platform_config::PlatformConfig;
use platform_config::loader::split_names;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Transport {
    Stdio,
    Http,
}

#[derive(Parser, Debug)]
#[command(name = "platform-mcp")]
#[command(about = "MCP server exposing platform tools", version)]
pub struct Args {
    /// Transport to serve MCP on
    #[arg(long, value_enum, default_value_t = Transport::Stdio)]
    pub transport: Transport,

    /// Listen address for the HTTP transport (endpoint: /mcp)
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub bind: SocketAddr,

    /// JSON config file path (replaces ./platform.json)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Target service base URL
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Comma-separated tools to enable (case-insensitive); all others are off
    #[arg(long, value_name = "NAMES")]
    pub enable: Option<String>,

    /// Comma-separated tools to disable (case-insensitive)
    #[arg(long, value_name = "NAMES")]
    pub disable: Option<String>,

    /// Skip TLS certificate verification for outbound calls
    #[arg(long)]
    pub insecure: bool,

    /// Outbound proxy URL
    #[arg(long, value_name = "URL")]
    pub proxy: Option<String>,

    /// Per-call deadline in seconds
    #[arg(long, value_name = "SECS")]
    pub call_timeout: Option<u64>,

    /// List enabled tools and exit
    #[arg(long)]
    pub list_tools: bool,
}

impl Args {
    /// Apply flags on top of the file/env layer.
    ///
    /// A tool list given on the command line replaces both configured lists.
    pub fn apply(&self, cfg: &mut PlatformConfig) {
        if let Some(url) = &self.base_url {
            cfg.service.base_url.clone_from(url);
        }
        if self.enable.is_some() || self.disable.is_some() {
            cfg.tools.enabled = self.enable.as_deref().map(split_names).unwrap_or_default();
            cfg.tools.disabled = self.disable.as_deref().map(split_names).unwrap_or_default();
        }
        if self.insecure {
            cfg.service.insecure_skip_verify = true;
        }
        if let Some(proxy) = &self.proxy {
            cfg.service.proxy_url = Some(proxy.clone());
        }
    }
}
