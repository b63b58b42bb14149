//! Startup validation for PlatformConfig.
//!
//! Two tiers: [`ConfigError`] stops the process before any tool is
//! registered; [`AdvisoryWarning`]s are logged and the process continues.

use crate::types::PlatformConfig;
use thiserror::Error;
use url::Url;

/// A configuration problem that prevents startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("service.base_url is required")]
    MissingBaseUrl,

    #[error("service.base_url is invalid ({url}): {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("service.proxy_url is invalid ({url}): {reason}")]
    InvalidProxyUrl { url: String, reason: String },

    #[error("service.username and the PLATFORM_PASSWORD secret must be configured together")]
    IncompleteCredentials,

    #[error("tools.enabled and tools.disabled are mutually exclusive")]
    ConflictingToolLists,
}

/// An advisory warning about a configuration choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvisoryWarning {
    /// Machine-readable warning code.
    pub code: &'static str,

    /// Human-readable warning message.
    pub message: String,

    /// JSON path to the config field.
    pub path: &'static str,
}

impl std::fmt::Display for AdvisoryWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.path, self.message)
    }
}

/// Validate a configuration.
///
/// Returns the first fatal problem found, otherwise the advisory warnings.
pub fn validate(cfg: &PlatformConfig) -> Result<Vec<AdvisoryWarning>, ConfigError> {
    let svc = &cfg.service;

    let base = svc.normalized_base_url().ok_or(ConfigError::MissingBaseUrl)?;
    check_http_url(base).map_err(|reason| ConfigError::InvalidBaseUrl {
        url: base.to_string(),
        reason,
    })?;

    if let Some(proxy) = svc.proxy_url.as_deref().filter(|p| !p.trim().is_empty()) {
        check_http_url(proxy).map_err(|reason| ConfigError::InvalidProxyUrl {
            url: proxy.to_string(),
            reason,
        })?;
    }

    let has_user = svc.username.as_deref().is_some_and(|u| !u.is_empty());
    if has_user != svc.password.is_some() {
        return Err(ConfigError::IncompleteCredentials);
    }

    let has_names = |names: &[String]| names.iter().any(|n| !n.trim().is_empty());
    if has_names(&cfg.tools.enabled) && has_names(&cfg.tools.disabled) {
        return Err(ConfigError::ConflictingToolLists);
    }

    let mut warnings = vec![];

    if svc.insecure_skip_verify {
        warnings.push(AdvisoryWarning {
            code: "service.tls.verification_disabled",
            path: "service.insecure_skip_verify",
            message: "TLS certificate verification is disabled for outbound calls".into(),
        });
    }

    if svc.has_static_credentials() {
        warnings.push(AdvisoryWarning {
            code: "service.credentials.static",
            path: "service.username",
            message: "static credentials are configured; every outbound call is attributed to this one account".into(),
        });
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&cfg.logging.level.to_lowercase().as_str()) {
        warnings.push(AdvisoryWarning {
            code: "logging.level.invalid",
            path: "logging.level",
            message: format!(
                "Unknown log level '{}'. Expected one of: {}",
                cfg.logging.level,
                valid_levels.join(", ")
            ),
        });
    }

    Ok(warnings)
}

fn check_http_url(raw: &str) -> Result<(), String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(format!("unsupported scheme '{other}'")),
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err("missing host".into());
    }
    Ok(())
}
