//! MCP server exposing platform tools.
//!
//! Serves over stdio by default, or streamable HTTP at `/mcp` with
//! `--transport http`. Inbound HTTP headers (Authorization, base URL
//! override, granted scopes) flow into every tool call.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Args, Transport};
use platform_config::{LoggingConfig, PlatformConfig, load_merged, validate};
use platform_tools_core::{ObservabilityMiddleware, ScopeMiddleware, ToolFilter, ToolRegistry};
use platform_tools_http::PlatformClient;
use platform_tools_mcp::{
    LocalSessionManager, RegistryServer, ServiceExt, StreamableHttpServerConfig,
    StreamableHttpService, stdio,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let cwd = std::env::current_dir().context("Failed to resolve working directory")?;
    let loaded = load_merged(&cwd, args.config.as_deref())?;
    let mut cfg = loaded.config;
    args.apply(&mut cfg);

    init_logging(&cfg.logging);

    // Install the rustls CryptoProvider before any HTTP clients are created.
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let registry = build_registry(&cfg)?;

    if args.list_tools {
        let names = registry.list_names();
        eprintln!("Available tools ({}):", names.len());
        for n in names {
            eprintln!("  - {n}");
        }
        return Ok(());
    }

    for w in validate(&cfg).context("Invalid configuration")? {
        tracing::warn!(code = w.code, path = w.path, "{}", w.message);
    }

    tracing::info!(
        tools = registry.len(),
        transport = ?args.transport,
        global_config = ?loaded.paths.global,
        local_config = %loaded.paths.local.display(),
        "starting platform-mcp"
    );

    let mut server = RegistryServer::new(Arc::new(registry), Arc::new(cfg))
        .with_info("platform-mcp", env!("CARGO_PKG_VERSION"));
    if let Some(secs) = args.call_timeout {
        server = server.with_call_timeout(Duration::from_secs(secs));
    }

    match args.transport {
        Transport::Stdio => {
            let service = server.serve(stdio()).await?;
            service.waiting().await?;
        }
        Transport::Http => serve_http(server, args.bind).await?,
    }

    Ok(())
}

fn init_logging(cfg: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if cfg.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn build_registry(cfg: &PlatformConfig) -> Result<ToolRegistry> {
    let filter = ToolFilter::from_config(&cfg.tools)?;
    let client = PlatformClient::from_config(&cfg.service).context("Failed to build HTTP client")?;

    let mut builder = ToolRegistry::builder()
        .filter(filter)
        .layer(ObservabilityMiddleware::tracing());
    if cfg.tools.enforce_scopes {
        builder = builder.layer(ScopeMiddleware::new());
    }

    let registry = asset_tools::build_registry(builder, Arc::new(client)).finish()?;
    Ok(registry)
}

async fn serve_http(server: RegistryServer, bind: SocketAddr) -> Result<()> {
    let service = StreamableHttpService::new(
        move || Ok(server.clone()),
        LocalSessionManager::default().into(),
        StreamableHttpServerConfig::default(),
    );
    let router = axum::Router::new().nest_service("/mcp", service);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    tracing::info!(%bind, "serving MCP over streamable HTTP at /mcp");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}
