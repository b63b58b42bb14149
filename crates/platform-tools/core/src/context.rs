//! Per-call execution context.
//!
//! A [`CallContext`] is built once at the protocol boundary and is read-only
//! afterwards. It is a cheap `Arc` handle, so the same facts reach every
//! middleware link, the handler, and each outbound request the handler makes.

use http::HeaderMap;
use platform_config::PlatformConfig;
use std::future::Future;
use std::sync::Arc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::ToolError;

/// Per-request override for the target service base URL.
pub const TARGET_URL_HEADER: &str = "x-platform-base-url";

/// Immutable facts about one tool invocation.
#[derive(Clone, Debug)]
pub struct CallContext {
    inner: Arc<Inner>,
}

#[derive(Clone, Debug)]
struct Inner {
    inbound_headers: Option<HeaderMap>,
    session_id: String,
    tool_name: Option<String>,
    required_scopes: &'static [&'static str],
    target_base_url: Option<String>,
    config: Arc<PlatformConfig>,
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    /// Start building a context backed by the process-wide config.
    pub fn builder(config: Arc<PlatformConfig>) -> CallContextBuilder {
        CallContextBuilder {
            config,
            inbound_headers: None,
            session_id: None,
            cancel: None,
            deadline: None,
        }
    }

    /// Return a new context with the invoked tool bound.
    ///
    /// `self` is left untouched; contexts are never mutated in place.
    #[must_use]
    pub fn with_tool(&self, name: &str, required_scopes: &'static [&'static str]) -> Self {
        let mut inner = (*self.inner).clone();
        inner.tool_name = Some(name.to_string());
        inner.required_scopes = required_scopes;
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Headers of the inbound call. `None` for headerless transports (stdio).
    pub fn inbound_headers(&self) -> Option<&HeaderMap> {
        self.inner.inbound_headers.as_ref()
    }

    /// First value of an inbound header, if present and valid UTF-8.
    pub fn inbound_header(&self, name: &str) -> Option<&str> {
        self.inbound_headers()?.get(name)?.to_str().ok()
    }

    /// All values of an inbound header, in arrival order.
    pub fn inbound_header_values(&self, name: &str) -> Vec<&str> {
        self.inbound_headers()
            .map(|h| {
                h.get_all(name)
                    .iter()
                    .filter_map(|v| v.to_str().ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn session_id(&self) -> &str {
        &self.inner.session_id
    }

    /// Name of the tool being invoked; set by dispatch before middleware runs.
    pub fn tool_name(&self) -> Option<&str> {
        self.inner.tool_name.as_deref()
    }

    /// Scopes the bound tool declares as required.
    pub fn required_scopes(&self) -> &'static [&'static str] {
        self.inner.required_scopes
    }

    /// Resolved target base URL without trailing slash.
    pub fn target_base_url(&self) -> Option<&str> {
        self.inner.target_base_url.as_deref()
    }

    /// Target base URL, or a configuration error when none could be resolved.
    pub fn require_target_base_url(&self) -> Result<&str, ToolError> {
        self.target_base_url().ok_or_else(|| {
            ToolError::config(format!(
                "no target base URL: set service.base_url or send the {TARGET_URL_HEADER} header"
            ))
        })
    }

    pub fn config(&self) -> &PlatformConfig {
        &self.inner.config
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.inner.cancel
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    /// Drive `fut` until it completes, the call is cancelled, or the deadline passes.
    ///
    /// Dropping `fut` on cancellation aborts any in-flight I/O it owns.
    pub async fn run<F, T>(&self, fut: F) -> Result<T, ToolError>
    where
        F: Future<Output = Result<T, ToolError>>,
    {
        let deadline = async {
            match self.inner.deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            () = self.inner.cancel.cancelled() => Err(ToolError::Cancelled(self.describe())),
            () = deadline => Err(ToolError::DeadlineExceeded(self.describe())),
            res = fut => res,
        }
    }

    fn describe(&self) -> String {
        format!(
            "tool {} (session {})",
            self.tool_name().unwrap_or("<unbound>"),
            self.session_id()
        )
    }
}

/// Builder for [`CallContext`].
pub struct CallContextBuilder {
    config: Arc<PlatformConfig>,
    inbound_headers: Option<HeaderMap>,
    session_id: Option<String>,
    cancel: Option<CancellationToken>,
    deadline: Option<Instant>,
}

impl CallContextBuilder {
    /// Headers delivered with the inbound call.
    #[must_use]
    pub fn inbound_headers(mut self, headers: HeaderMap) -> Self {
        self.inbound_headers = Some(headers);
        self
    }

    /// Caller session supplied by the transport. Blank values are ignored.
    #[must_use]
    pub fn session_id(mut self, id: impl Into<String>) -> Self {
        let id = id.into();
        if !id.trim().is_empty() {
            self.session_id = Some(id);
        }
        self
    }

    /// Token the transport cancels when the caller aborts.
    #[must_use]
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    #[must_use]
    pub fn deadline(mut self, at: Instant) -> Self {
        self.deadline = Some(at);
        self
    }

    pub fn build(self) -> CallContext {
        let target_base_url = resolve_target_base_url(self.inbound_headers.as_ref(), &self.config);
        CallContext {
            inner: Arc::new(Inner {
                session_id: self
                    .session_id
                    .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
                inbound_headers: self.inbound_headers,
                tool_name: None,
                required_scopes: &[],
                target_base_url,
                config: self.config,
                cancel: self.cancel.unwrap_or_default(),
                deadline: self.deadline,
            }),
        }
    }
}

/// Resolve the base URL for outbound calls.
///
/// Priority: the per-request override header, then static config.
/// Trailing slashes are stripped; blank values resolve to `None`.
pub fn resolve_target_base_url(
    headers: Option<&HeaderMap>,
    config: &PlatformConfig,
) -> Option<String> {
    let from_header = headers
        .and_then(|h| h.get(TARGET_URL_HEADER))
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().trim_end_matches('/'))
        .filter(|v| !v.is_empty());

    from_header
        .or_else(|| config.service.normalized_base_url())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use std::time::Duration;

    fn config(base: &str) -> Arc<PlatformConfig> {
        let mut cfg = PlatformConfig::default();
        cfg.service.base_url = base.into();
        Arc::new(cfg)
    }

    #[test]
    fn session_id_generated_when_missing() {
        let a = CallContext::builder(config("https://p")).build();
        let b = CallContext::builder(config("https://p")).session_id("  ").build();
        assert!(uuid::Uuid::parse_str(a.session_id()).is_ok());
        assert!(uuid::Uuid::parse_str(b.session_id()).is_ok());
        assert_ne!(a.session_id(), b.session_id());
    }

    #[test]
    fn session_id_kept_when_supplied() {
        let ctx = CallContext::builder(config("https://p"))
            .session_id("sess-1")
            .build();
        assert_eq!(ctx.session_id(), "sess-1");
    }

    #[test]
    fn header_override_beats_config() {
        let mut headers = HeaderMap::new();
        headers.insert(
            TARGET_URL_HEADER,
            HeaderValue::from_static("https://override.example.com/v2/"),
        );
        let ctx = CallContext::builder(config("https://static.example.com"))
            .inbound_headers(headers)
            .build();
        assert_eq!(
            ctx.target_base_url(),
            Some("https://override.example.com/v2")
        );
    }

    #[test]
    fn config_used_and_trailing_slash_stripped() {
        let ctx = CallContext::builder(config("https://static.example.com/api/")).build();
        assert_eq!(ctx.target_base_url(), Some("https://static.example.com/api"));
    }

    #[test]
    fn unresolvable_target_is_config_error() {
        let ctx = CallContext::builder(config("")).build();
        assert!(matches!(
            ctx.require_target_base_url(),
            Err(ToolError::Config(_))
        ));
    }

    #[test]
    fn with_tool_leaves_original_unbound() {
        let ctx = CallContext::builder(config("https://p")).build();
        let bound = ctx.with_tool("get_asset", &["assets:read"]);
        assert_eq!(ctx.tool_name(), None);
        assert_eq!(bound.tool_name(), Some("get_asset"));
        assert_eq!(bound.required_scopes(), &["assets:read"]);
        assert_eq!(bound.session_id(), ctx.session_id());
    }

    #[test]
    fn multi_valued_headers_keep_order() {
        let mut headers = HeaderMap::new();
        headers.append("x-multi", HeaderValue::from_static("one"));
        headers.append("x-multi", HeaderValue::from_static("two"));
        let ctx = CallContext::builder(config("https://p"))
            .inbound_headers(headers)
            .build();
        assert_eq!(ctx.inbound_header_values("x-multi"), vec!["one", "two"]);
        assert_eq!(ctx.inbound_header("x-multi"), Some("one"));
        assert!(ctx.inbound_header_values("x-absent").is_empty());
    }

    #[tokio::test]
    async fn run_reports_cancellation() {
        let token = CancellationToken::new();
        let ctx = CallContext::builder(config("https://p"))
            .cancellation(token.clone())
            .build();
        token.cancel();
        let res: Result<(), _> = ctx.run(std::future::pending()).await;
        assert!(matches!(res, Err(ToolError::Cancelled(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn run_reports_deadline() {
        let ctx = CallContext::builder(config("https://p"))
            .deadline(Instant::now() + Duration::from_millis(50))
            .build();
        let res: Result<(), _> = ctx.run(std::future::pending()).await;
        assert!(matches!(res, Err(ToolError::DeadlineExceeded(_))));
    }

    #[tokio::test]
    async fn run_passes_through_result() {
        let ctx = CallContext::builder(config("https://p")).build();
        assert_eq!(ctx.run(async { Ok::<_, ToolError>(7) }).await, Ok(7));
    }
}
