//! Configuration loader with file layering and env overrides.
//!
//! The loading process:
//! 1. Read global config from `~/.config/platform-mcp/platform.json`
//! 2. Read the explicit `--config` file, or `./platform.json`
//! 3. Deep merge at JSON Value level (RFC 7396)
//! 4. Deserialize once into typed PlatformConfig
//! 5. Apply env var overrides (highest precedence)
//!
//! Validation is left to the caller so command-line overrides can be
//! applied first.

use crate::{merge::merge_patch, types::PlatformConfig};
use anyhow::{Context, Result};
use secrecy::SecretString;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Filename for local config.
pub const LOCAL_FILE: &str = "platform.json";

/// Directory name under config_dir for global config.
pub const GLOBAL_DIR: &str = "platform-mcp";

/// Filename for global config.
pub const GLOBAL_FILE: &str = "platform.json";

/// Resolved paths for config files.
#[derive(Debug, Clone)]
pub struct PlatformConfigPaths {
    /// Path to the local or explicit config.
    pub local: PathBuf,

    /// Path to the global config, if a config dir exists on this platform.
    pub global: Option<PathBuf>,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct LoadedPlatformConfig {
    /// The loaded and merged configuration.
    pub config: PlatformConfig,

    /// Resolved config file paths.
    pub paths: PlatformConfigPaths,
}

/// Get the global config file path.
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join(GLOBAL_DIR).join(GLOBAL_FILE))
}

/// Load and merge configuration.
///
/// `explicit` replaces the `./platform.json` lookup and must exist.
pub fn load_merged(local_dir: &Path, explicit: Option<&Path>) -> Result<LoadedPlatformConfig> {
    let global_path = global_config_path();
    let local_path = explicit.map_or_else(|| local_dir.join(LOCAL_FILE), Path::to_path_buf);

    if let Some(path) = explicit
        && !path.exists()
    {
        anyhow::bail!("Config file not found: {}", path.display());
    }

    let global_v = match &global_path {
        Some(p) => read_json_object_or_empty(p)?,
        None => Value::Object(serde_json::Map::new()),
    };
    let local_v = read_json_object_or_empty(&local_path)?;

    let merged = merge_patch(global_v, local_v);
    let mut cfg: PlatformConfig =
        serde_json::from_value(merged).context("Failed to deserialize merged platform config")?;

    apply_env_overrides(&mut cfg);

    Ok(LoadedPlatformConfig {
        config: cfg,
        paths: PlatformConfigPaths {
            local: local_path,
            global: global_path,
        },
    })
}

/// Apply environment variable overrides to the config.
pub fn apply_env_overrides(cfg: &mut PlatformConfig) {
    if let Some(v) = env_trimmed("PLATFORM_BASE_URL") {
        cfg.service.base_url = v;
    }
    if let Some(v) = env_trimmed("PLATFORM_USERNAME") {
        cfg.service.username = Some(v);
    }
    // Password is env-only.
    if let Some(v) = env_trimmed("PLATFORM_PASSWORD") {
        cfg.service.password = Some(SecretString::from(v));
    }
    if let Some(v) = env_trimmed("PLATFORM_INSECURE_SKIP_VERIFY") {
        cfg.service.insecure_skip_verify = is_truthy(&v);
    }
    if let Some(v) = env_trimmed("PLATFORM_PROXY_URL") {
        cfg.service.proxy_url = Some(v);
    }

    if let Some(v) = env_trimmed("PLATFORM_ENABLED_TOOLS") {
        cfg.tools.enabled = split_names(&v);
    }
    if let Some(v) = env_trimmed("PLATFORM_DISABLED_TOOLS") {
        cfg.tools.disabled = split_names(&v);
    }

    if let Some(v) = env_trimmed("PLATFORM_LOG_LEVEL") {
        cfg.logging.level = v;
    }
    if let Some(v) = env_trimmed("PLATFORM_LOG_JSON") {
        cfg.logging.json = is_truthy(&v);
    }
}

/// Split a comma-separated tool list, dropping blanks.
pub fn split_names(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn is_truthy(v: &str) -> bool {
    v.eq_ignore_ascii_case("true") || v == "1"
}

/// Helper to read and normalize an env var (trim + filter empty).
fn env_trimmed(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read a JSON file as a Value, returning empty object if file doesn't exist.
fn read_json_object_or_empty(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Ok(Value::Object(serde_json::Map::new()));
    }

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    let v: Value = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid JSON in {}", path.display()))?;

    match v {
        Value::Object(_) => Ok(v),
        _ => anyhow::bail!("Config root must be a JSON object: {}", path.display()),
    }
}
