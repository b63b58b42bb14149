//! MCP server handler backed by a [`ToolRegistry`].

use crate::errors::to_call_result;
use http::HeaderMap;
use platform_config::PlatformConfig;
use platform_tools_core::{CallContext, ToolRegistry};
use rmcp::model as m;
use rmcp::service::RequestContext;
use rmcp::{RoleServer, ServerHandler};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Session header assigned by the streamable HTTP transport.
pub const MCP_SESSION_HEADER: &str = "mcp-session-id";

/// MCP server handler exposing every tool in a registry.
///
/// The registry is already filtered, so listing and calling see the same set.
/// Each call gets a fresh [`CallContext`] carrying the inbound HTTP headers
/// (absent on stdio), the transport session id and the request's
/// cancellation token.
///
/// ```ignore
/// let server = RegistryServer::new(Arc::new(registry), Arc::new(config))
///     .with_info("platform-mcp", env!("CARGO_PKG_VERSION"));
/// server.serve(stdio()).await?.waiting().await?;
/// ```
#[derive(Clone)]
pub struct RegistryServer {
    registry: Arc<ToolRegistry>,
    config: Arc<PlatformConfig>,
    call_timeout: Option<Duration>,
    name: String,
    version: String,
}

impl RegistryServer {
    pub fn new(registry: Arc<ToolRegistry>, config: Arc<PlatformConfig>) -> Self {
        Self {
            registry,
            config,
            call_timeout: None,
            name: "platform-mcp".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Set the server name and version reported at initialize.
    #[must_use]
    pub fn with_info(mut self, name: &str, version: &str) -> Self {
        self.name = name.to_string();
        self.version = version.to_string();
        self
    }

    /// Bound every call with a deadline measured from its arrival.
    #[must_use]
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Build the context for one call.
    pub fn call_context(
        &self,
        headers: Option<HeaderMap>,
        cancel: CancellationToken,
    ) -> CallContext {
        let mut builder = CallContext::builder(Arc::clone(&self.config)).cancellation(cancel);
        if let Some(headers) = headers {
            if let Some(session) = headers.get(MCP_SESSION_HEADER).and_then(|v| v.to_str().ok()) {
                builder = builder.session_id(session);
            }
            builder = builder.inbound_headers(headers);
        }
        if let Some(timeout) = self.call_timeout {
            builder = builder.deadline(tokio::time::Instant::now() + timeout);
        }
        builder.build()
    }

    /// Tool descriptors in name order.
    pub fn tool_descriptors(&self) -> Vec<m::Tool> {
        self.registry
            .iter()
            .map(|erased| {
                let input_schema = serde_json::to_value(erased.input_schema())
                    .ok()
                    .and_then(|v| v.as_object().cloned())
                    .unwrap_or_else(|| {
                        let mut obj = serde_json::Map::new();
                        obj.insert("type".into(), "object".into());
                        obj
                    });
                let output_schema = erased.output_schema().and_then(|s| {
                    serde_json::to_value(s)
                        .ok()
                        .and_then(|v| v.as_object().cloned())
                        .map(Arc::new)
                });

                m::Tool {
                    name: erased.name().into(),
                    title: Some(erased.name().into()),
                    description: Some(erased.description().into()),
                    input_schema: Arc::new(input_schema),
                    annotations: None,
                    output_schema,
                    icons: None,
                    meta: None,
                }
            })
            .collect()
    }

    /// Dispatch one call and shape the MCP result.
    pub async fn call(
        &self,
        name: &str,
        arguments: Option<serde_json::Map<String, serde_json::Value>>,
        ctx: &CallContext,
    ) -> Result<m::CallToolResult, m::ErrorData> {
        let args = serde_json::Value::Object(arguments.unwrap_or_default());
        match self.registry.dispatch_json(name, args, ctx).await {
            Ok(out) => {
                let has_schema = self
                    .registry
                    .get(name)
                    .and_then(|t| t.output_schema())
                    .is_some();
                Ok(m::CallToolResult {
                    content: vec![m::Content::text(out.text)],
                    structured_content: has_schema.then_some(out.data),
                    is_error: Some(false),
                    meta: None,
                })
            }
            Err(e) => {
                tracing::debug!(tool = name, error = %e, "tool call returned error");
                to_call_result(&e)
            }
        }
    }
}

fn inbound_headers(ctx: &RequestContext<RoleServer>) -> Option<HeaderMap> {
    ctx.extensions
        .get::<http::request::Parts>()
        .map(|parts| parts.headers.clone())
}

#[allow(clippy::manual_async_fn)]
impl ServerHandler for RegistryServer {
    fn get_info(&self) -> m::ServerInfo {
        m::ServerInfo {
            server_info: m::Implementation {
                name: self.name.clone(),
                title: Some(self.name.clone()),
                version: self.version.clone(),
                website_url: None,
                icons: None,
            },
            capabilities: m::ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    fn initialize(
        &self,
        _params: m::InitializeRequestParam,
        _ctx: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<m::InitializeResult, m::ErrorData>> + Send + '_
    {
        async move { Ok(self.get_info()) }
    }

    fn list_tools(
        &self,
        _req: Option<m::PaginatedRequestParam>,
        _ctx: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<m::ListToolsResult, m::ErrorData>> + Send + '_
    {
        async move {
            Ok(m::ListToolsResult {
                tools: self.tool_descriptors(),
                next_cursor: None,
                meta: None,
            })
        }
    }

    fn call_tool(
        &self,
        req: m::CallToolRequestParam,
        ctx: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<m::CallToolResult, m::ErrorData>> + Send + '_
    {
        async move {
            let call_ctx = self.call_context(inbound_headers(&ctx), ctx.ct.clone());
            self.call(&req.name, req.arguments, &call_ctx).await
        }
    }

    fn ping(
        &self,
        _ctx: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<(), m::ErrorData>> + Send + '_ {
        async { Ok(()) }
    }

    fn complete(
        &self,
        _req: m::CompleteRequestParam,
        _ctx: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<m::CompleteResult, m::ErrorData>> + Send + '_
    {
        async { Err(not_implemented()) }
    }

    fn set_level(
        &self,
        _req: m::SetLevelRequestParam,
        _ctx: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<(), m::ErrorData>> + Send + '_ {
        async { Ok(()) }
    }

    fn list_prompts(
        &self,
        _req: Option<m::PaginatedRequestParam>,
        _ctx: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<m::ListPromptsResult, m::ErrorData>> + Send + '_
    {
        async {
            Ok(m::ListPromptsResult {
                prompts: vec![],
                next_cursor: None,
                meta: None,
            })
        }
    }

    fn list_resources(
        &self,
        _req: Option<m::PaginatedRequestParam>,
        _ctx: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<m::ListResourcesResult, m::ErrorData>> + Send + '_
    {
        async {
            Ok(m::ListResourcesResult {
                resources: vec![],
                next_cursor: None,
                meta: None,
            })
        }
    }

    fn read_resource(
        &self,
        _req: m::ReadResourceRequestParam,
        _ctx: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<m::ReadResourceResult, m::ErrorData>> + Send + '_
    {
        async { Err(not_implemented()) }
    }
}

fn not_implemented() -> m::ErrorData {
    m::ErrorData::invalid_request("Method not implemented", None)
}
