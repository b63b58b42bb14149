//! Configuration types.
//!
//! The root type is [`PlatformConfig`]. Every struct uses `#[serde(default)]`
//! so partial files deserialize; the password is never read from or written
//! to files.

use schemars::JsonSchema;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the server process.
///
/// Built once at startup and shared read-only (behind an `Arc`) with every call.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PlatformConfig {
    /// Target service and outbound transport settings.
    pub service: ServiceConfig,

    /// Tool enablement and access control.
    pub tools: ToolsConfig,

    /// Logging and diagnostics.
    pub logging: LoggingConfig,
}

/// Remote platform the tools talk to.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL of the platform API (scheme, host and optional path prefix).
    pub base_url: String,

    /// Static service account username. When set together with the password,
    /// every outbound call uses basic auth with these credentials.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Static service account password (env-only, never serialized to config files).
    #[serde(skip)]
    #[schemars(skip)]
    pub password: Option<SecretString>,

    /// Skip TLS certificate verification for outbound calls.
    pub insecure_skip_verify: bool,

    /// Outbound HTTP(S) proxy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_url: Option<String>,

    /// Connection pool timeouts.
    pub timeouts: TimeoutConfig,

    /// Upper bound on idle pooled connections kept per host.
    pub max_idle_per_host: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            username: None,
            password: None,
            insecure_skip_verify: false,
            proxy_url: None,
            timeouts: TimeoutConfig::default(),
            max_idle_per_host: 100,
        }
    }
}

impl ServiceConfig {
    /// Base URL with trailing slashes removed, or `None` when blank.
    pub fn normalized_base_url(&self) -> Option<&str> {
        let trimmed = self.base_url.trim().trim_end_matches('/');
        (!trimmed.is_empty()).then_some(trimmed)
    }

    /// Whether both halves of the static credentials are present.
    pub fn has_static_credentials(&self) -> bool {
        self.username.as_deref().is_some_and(|u| !u.is_empty()) && self.password.is_some()
    }
}

/// Per-connection timeouts for the pooled outbound client.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct TimeoutConfig {
    /// TCP connect timeout, in seconds.
    pub connect_secs: u64,

    /// How long an idle pooled connection is kept, in seconds.
    pub idle_secs: u64,

    /// TCP keepalive interval, in seconds.
    pub keepalive_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 10,
            idle_secs: 90,
            keepalive_secs: 30,
        }
    }
}

impl TimeoutConfig {
    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }

    pub fn idle(&self) -> Duration {
        Duration::from_secs(self.idle_secs)
    }

    pub fn keepalive(&self) -> Duration {
        Duration::from_secs(self.keepalive_secs)
    }
}

/// Which tools are exposed, and whether declared scopes are enforced.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ToolsConfig {
    /// Allowlist of tool names. Empty = all tools.
    pub enabled: Vec<String>,

    /// Denylist of tool names. Mutually exclusive with `enabled`.
    pub disabled: Vec<String>,

    /// Reject calls whose caller lacks the tool's required scopes.
    pub enforce_scopes: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,

    /// Whether to emit JSON-formatted logs.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_fills_defaults() {
        let json = r#"{"service": {"base_url": "https://platform.example.com/api/"}}"#;
        let config: PlatformConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.service.base_url, "https://platform.example.com/api/");
        assert_eq!(config.service.timeouts.connect_secs, 10);
        assert_eq!(config.service.max_idle_per_host, 100);
        assert!(config.tools.enabled.is_empty());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn password_never_serialized() {
        let mut config = PlatformConfig::default();
        config.service.username = Some("svc".into());
        config.service.password = Some(SecretString::from("hunter2".to_string()));

        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("svc"));
        assert!(!json.contains("hunter2"));
    }

    #[test]
    fn password_in_file_is_ignored() {
        let json = r#"{"service": {"username": "svc", "password": "from-file"}}"#;
        let config: PlatformConfig = serde_json::from_str(json).unwrap();
        assert!(config.service.password.is_none());
    }

    #[test]
    fn normalized_base_url_strips_trailing_slashes() {
        let svc = ServiceConfig {
            base_url: "https://platform.example.com/api//".into(),
            ..Default::default()
        };
        assert_eq!(
            svc.normalized_base_url(),
            Some("https://platform.example.com/api")
        );

        let blank = ServiceConfig {
            base_url: "  /".into(),
            ..Default::default()
        };
        assert_eq!(blank.normalized_base_url(), None);
    }

    #[test]
    fn static_credentials_need_both_halves() {
        let mut svc = ServiceConfig {
            username: Some("svc".into()),
            ..Default::default()
        };
        assert!(!svc.has_static_credentials());
        svc.password = Some(SecretString::from("pw".to_string()));
        assert!(svc.has_static_credentials());
    }
}
