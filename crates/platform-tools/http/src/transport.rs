//! Authenticating outbound transport.
//!
//! [`PlatformClient`] wraps a pooled `reqwest::Client`. Tools build requests
//! against a placeholder origin with [`PlatformClient::request`]; every send
//! goes through [`PlatformClient::prepare`], which clones the request and
//! rewrites it for the current call:
//!
//! - scheme, host and path prefix come from the call's target base URL
//! - `Authorization` is basic auth from static credentials when configured,
//!   otherwise the inbound caller's header is forwarded verbatim
//! - `X-Session-ID` carries the call's session id and `X-MCP-Tool-Name`
//!   the invoked tool
//! - a fresh `traceparent` is generated per request
//! - `Content-Type` defaults to `application/json`, `User-Agent` is fixed
//!
//! While static credentials are configured, requests may only go to the
//! origin of `service.base_url`; an override pointing elsewhere is refused.
//!
//! The caller's request is never mutated.

use crate::status::{transport_error, upstream_error};
use crate::traceparent::{TRACEPARENT_HEADER, TraceParent};
use http::HeaderValue;
use http::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use platform_config::ServiceConfig;
use platform_tools_core::{CallContext, ToolError};
use reqwest::{Method, Request, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Header carrying the caller session id to the target service.
pub const SESSION_HEADER: &str = "x-session-id";

/// Header naming the tool that issued the request.
pub const TOOL_NAME_HEADER: &str = "x-mcp-tool-name";

/// Origin used for requests before they are bound to a target.
pub const PLACEHOLDER_BASE_URL: &str = "http://platform.invalid";

pub const PLATFORM_USER_AGENT: &str = concat!("platform-mcp/", env!("CARGO_PKG_VERSION"));

const JSON: &str = "application/json";

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid proxy URL {url}: {source}")]
    InvalidProxy {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
}

/// Connection pool and timeout settings for the shared client.
#[derive(Debug, Clone)]
pub struct TransportOptions {
    pub connect_timeout: Duration,
    pub idle_timeout: Duration,
    pub keepalive: Duration,
    pub max_idle_per_host: usize,
    pub insecure_skip_verify: bool,
    pub proxy_url: Option<String>,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self::from(&ServiceConfig::default())
    }
}

impl From<&ServiceConfig> for TransportOptions {
    fn from(cfg: &ServiceConfig) -> Self {
        Self {
            connect_timeout: cfg.timeouts.connect(),
            idle_timeout: cfg.timeouts.idle(),
            keepalive: cfg.timeouts.keepalive(),
            max_idle_per_host: cfg.max_idle_per_host,
            insecure_skip_verify: cfg.insecure_skip_verify,
            proxy_url: cfg.proxy_url.clone().filter(|u| !u.trim().is_empty()),
        }
    }
}

/// Static service account used instead of caller credentials.
#[derive(Debug, Clone)]
pub struct BasicCredentials {
    username: String,
    password: SecretString,
}

impl BasicCredentials {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }

    /// Credentials from config, when both username and password are set.
    pub fn from_config(cfg: &ServiceConfig) -> Option<Self> {
        match (&cfg.username, &cfg.password) {
            (Some(user), Some(pass)) if !user.is_empty() => {
                Some(Self::new(user.clone(), pass.clone()))
            }
            _ => None,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

/// Outbound HTTP client shared by all tools.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct PlatformClient {
    http: reqwest::Client,
    credentials: Option<Arc<BasicCredentials>>,
}

impl PlatformClient {
    pub fn new(
        opts: &TransportOptions,
        credentials: Option<BasicCredentials>,
    ) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(opts.connect_timeout)
            .pool_idle_timeout(opts.idle_timeout)
            .pool_max_idle_per_host(opts.max_idle_per_host)
            .tcp_keepalive(opts.keepalive);

        if let Some(url) = &opts.proxy_url {
            let proxy = reqwest::Proxy::all(url).map_err(|source| TransportError::InvalidProxy {
                url: url.clone(),
                source,
            })?;
            builder = builder.proxy(proxy);
        }

        if opts.insecure_skip_verify {
            builder = builder.danger_accept_invalid_certs(true);
        }

        Ok(Self {
            http: builder.build().map_err(TransportError::Build)?,
            credentials: credentials.map(Arc::new),
        })
    }

    /// Client configured from the `service` section of the config.
    pub fn from_config(cfg: &ServiceConfig) -> Result<Self, TransportError> {
        Self::new(&TransportOptions::from(cfg), BasicCredentials::from_config(cfg))
    }

    pub fn has_static_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    /// Start a request for `path` on the placeholder origin.
    ///
    /// The real origin is filled in by [`prepare`](Self::prepare).
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let path = path.trim_start_matches('/');
        self.http.request(method, format!("{PLACEHOLDER_BASE_URL}/{path}"))
    }

    /// Clone `req` and bind it to the call described by `ctx`.
    pub fn prepare(&self, req: &Request, ctx: &CallContext) -> Result<Request, ToolError> {
        let target = parse_target(ctx.require_target_base_url()?)?;
        if self.credentials.is_some() {
            check_credential_origin(&target, ctx)?;
        }
        let mut out = req
            .try_clone()
            .ok_or_else(|| ToolError::internal("request body is a stream and cannot be cloned"))?;

        let mut url = target.clone();
        url.set_path(&join_paths(target.path(), req.url().path()));
        url.set_query(req.url().query());
        *out.url_mut() = url;

        if let Some(creds) = &self.credentials {
            out.headers_mut().remove(AUTHORIZATION);
            out = RequestBuilder::from_parts(self.http.clone(), out)
                .basic_auth(creds.username(), Some(creds.password.expose_secret()))
                .build()
                .map_err(|e| ToolError::internal(format!("failed to set credentials: {e}")))?;
        } else if let Some(auth) = ctx.inbound_headers().and_then(|h| h.get(AUTHORIZATION)) {
            let mut auth = auth.clone();
            auth.set_sensitive(true);
            out.headers_mut().insert(AUTHORIZATION, auth);
        }

        let headers = out.headers_mut();
        headers.insert(SESSION_HEADER, header_value(SESSION_HEADER, ctx.session_id())?);
        if let Some(tool) = ctx.tool_name() {
            headers.insert(TOOL_NAME_HEADER, header_value(TOOL_NAME_HEADER, tool)?);
        }
        let traceparent = TraceParent::generate().to_string();
        headers.insert(
            TRACEPARENT_HEADER,
            header_value(TRACEPARENT_HEADER, &traceparent)?,
        );
        if !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON));
        }
        headers.insert(USER_AGENT, HeaderValue::from_static(PLATFORM_USER_AGENT));

        Ok(out)
    }

    /// Prepare and send `req`, returning the raw response.
    ///
    /// Non-success statuses are returned as-is; see [`check_status`].
    pub async fn execute(&self, req: &Request, ctx: &CallContext) -> Result<Response, ToolError> {
        let prepared = self.prepare(req, ctx)?;
        ctx.run(self.send(prepared)).await
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        ctx: &CallContext,
    ) -> Result<T, ToolError> {
        let req = build(self.request(Method::GET, path))?;
        self.fetch_json(&req, ctx).await
    }

    pub async fn post_json<B, T>(
        &self,
        path: &str,
        body: &B,
        ctx: &CallContext,
    ) -> Result<T, ToolError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let req = build(self.request(Method::POST, path).json(body))?;
        self.fetch_json(&req, ctx).await
    }

    /// POST a GraphQL operation to `/graphql` and return its `data`.
    ///
    /// Any entry in `errors` fails the call.
    pub async fn graphql<V, T>(
        &self,
        query: &str,
        variables: &V,
        ctx: &CallContext,
    ) -> Result<T, ToolError>
    where
        V: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::json!({ "query": query, "variables": variables });
        let resp: GraphQlResponse<T> = self.post_json("/graphql", &body, ctx).await?;
        resp.into_data()
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        req: &Request,
        ctx: &CallContext,
    ) -> Result<T, ToolError> {
        let prepared = self.prepare(req, ctx)?;
        ctx.run(async {
            let resp = check_status(self.send(prepared).await?).await?;
            let bytes = resp.bytes().await.map_err(|e| transport_error(&e))?;
            serde_json::from_slice(&bytes).map_err(|e| {
                let snippet = String::from_utf8_lossy(&bytes[..bytes.len().min(400)]).into_owned();
                ToolError::external(format!("invalid response body: {e}: {snippet}"))
            })
        })
        .await
    }

    async fn send(&self, req: Request) -> Result<Response, ToolError> {
        tracing::debug!(method = %req.method(), url = %req.url(), "outbound request");
        self.http.execute(req).await.map_err(|e| transport_error(&e))
    }
}

/// Pass 2xx responses through; turn anything else into [`ToolError::Upstream`].
pub async fn check_status(resp: Response) -> Result<Response, ToolError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    match resp.bytes().await {
        Ok(body) => Err(upstream_error(status, &body)),
        Err(e) => Err(unreadable_body_error(status, &e)),
    }
}

fn unreadable_body_error(status: http::StatusCode, err: &dyn std::fmt::Display) -> ToolError {
    upstream_error(
        status,
        format!("<failed to read response body: {err}>").as_bytes(),
    )
}

fn build(builder: RequestBuilder) -> Result<Request, ToolError> {
    builder
        .build()
        .map_err(|e| ToolError::internal(format!("failed to build request: {e}")))
}

fn parse_target(base: &str) -> Result<Url, ToolError> {
    let url = Url::parse(base)
        .map_err(|e| ToolError::config(format!("invalid target base URL {base:?}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ToolError::config(format!(
            "target base URL must be an absolute http(s) URL: {base:?}"
        )));
    }
    Ok(url)
}

/// Join a base path prefix and a request path, collapsing every run of `/`.
fn join_paths(prefix: &str, path: &str) -> String {
    let segments: Vec<&str> = prefix
        .split('/')
        .chain(path.split('/'))
        .filter(|s| !s.is_empty())
        .collect();
    format!("/{}", segments.join("/"))
}

/// Refuse to send service credentials anywhere but the configured origin.
fn check_credential_origin(target: &Url, ctx: &CallContext) -> Result<(), ToolError> {
    let configured = ctx
        .config()
        .service
        .normalized_base_url()
        .and_then(|base| Url::parse(base).ok());
    match configured {
        Some(base) if base.origin() == target.origin() => Ok(()),
        _ => Err(ToolError::config(format!(
            "target base URL {} is not the configured service origin; \
             static credentials are only sent to service.base_url",
            target.origin().ascii_serialization()
        ))),
    }
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, ToolError> {
    HeaderValue::from_str(value)
        .map_err(|e| ToolError::internal(format!("invalid {name} header value {value:?}: {e}")))
}

#[derive(serde::Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(serde::Deserialize)]
struct GraphQlError {
    message: String,
    #[serde(default)]
    path: Vec<serde_json::Value>,
}

impl<T> GraphQlResponse<T> {
    fn into_data(self) -> Result<T, ToolError> {
        if !self.errors.is_empty() {
            let parts: Vec<String> = self
                .errors
                .into_iter()
                .map(|e| {
                    if e.path.is_empty() {
                        e.message
                    } else {
                        let path: Vec<String> = e
                            .path
                            .iter()
                            .map(|p| p.as_str().map_or_else(|| p.to_string(), String::from))
                            .collect();
                        format!("{} (path: {})", e.message, path.join("."))
                    }
                })
                .collect();
            return Err(ToolError::external(format!(
                "GraphQL errors:\n- {}",
                parts.join("\n- ")
            )));
        }
        self.data
            .ok_or_else(|| ToolError::external("no data returned from GraphQL endpoint"))
    }
}
