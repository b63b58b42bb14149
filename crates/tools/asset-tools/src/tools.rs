//! Tool wrappers over the platform REST and GraphQL APIs.

use crate::models::{AssetSummary, GetAssetResult, Identity, SearchAssetsResult};
use futures::future::BoxFuture;
use platform_tools_core::{CallContext, Tool, ToolError, ToolRegistryBuilder};
use platform_tools_http::PlatformClient;
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;

const DEFAULT_SEARCH_LIMIT: u32 = 20;
const MAX_SEARCH_LIMIT: u32 = 100;

// ============================================================================
// GetAsset Tool
// ============================================================================

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetAssetInput {
    /// Asset ID (UUID)
    #[serde(default)]
    pub asset_id: String,
}

#[derive(Clone)]
pub struct GetAssetTool {
    client: Arc<PlatformClient>,
}

impl GetAssetTool {
    pub fn new(client: Arc<PlatformClient>) -> Self {
        Self { client }
    }
}

impl Tool for GetAssetTool {
    type Input = GetAssetInput;
    type Output = GetAssetResult;
    const NAME: &'static str = "get_asset";
    const DESCRIPTION: &'static str = "Fetch a single asset by its UUID";
    const REQUIRED_SCOPES: &'static [&'static str] = &["assets:read"];

    fn call(
        &self,
        input: Self::Input,
        ctx: &CallContext,
    ) -> BoxFuture<'static, Result<Self::Output, ToolError>> {
        let client = Arc::clone(&self.client);
        let ctx = ctx.clone();
        Box::pin(async move {
            let raw = input.asset_id.trim();
            if raw.is_empty() {
                return Ok(GetAssetResult::missing("asset_id is required"));
            }
            let id = match uuid::Uuid::parse_str(raw) {
                Ok(id) => id,
                Err(e) => {
                    return Ok(GetAssetResult::missing(format!("Invalid asset ID format: {e}")));
                }
            };

            match client.get_json(&format!("/api/v1/assets/{id}"), &ctx).await {
                Ok(asset) => Ok(GetAssetResult::found(asset)),
                Err(e) if e.upstream_status() == Some(404) => {
                    Ok(GetAssetResult::missing(format!("Asset {id} not found")))
                }
                Err(e) => Err(e),
            }
        })
    }
}

// ============================================================================
// SearchAssets Tool
// ============================================================================

const SEARCH_ASSETS_QUERY: &str = "\
query SearchAssets($query: String!, $limit: Int!) {
  searchAssets(query: $query, limit: $limit) {
    total
    nodes { id name kind }
  }
}";

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchAssetsInput {
    /// Full-text search term
    #[serde(default)]
    pub query: String,
    /// Maximum results (default 20, max 100)
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchAssetsData {
    search_assets: SearchAssetsConnection,
}

#[derive(Deserialize)]
struct SearchAssetsConnection {
    #[serde(default)]
    total: Option<u64>,
    nodes: Vec<AssetSummary>,
}

#[derive(Clone)]
pub struct SearchAssetsTool {
    client: Arc<PlatformClient>,
}

impl SearchAssetsTool {
    pub fn new(client: Arc<PlatformClient>) -> Self {
        Self { client }
    }
}

impl Tool for SearchAssetsTool {
    type Input = SearchAssetsInput;
    type Output = SearchAssetsResult;
    const NAME: &'static str = "search_assets";
    const DESCRIPTION: &'static str = "Search assets by name, kind or tag";
    const REQUIRED_SCOPES: &'static [&'static str] = &["assets:read"];

    fn call(
        &self,
        input: Self::Input,
        ctx: &CallContext,
    ) -> BoxFuture<'static, Result<Self::Output, ToolError>> {
        let client = Arc::clone(&self.client);
        let ctx = ctx.clone();
        Box::pin(async move {
            let query = input.query.trim().to_string();
            if query.is_empty() {
                return Ok(SearchAssetsResult {
                    success: false,
                    assets: vec![],
                    total: None,
                    error: Some("query is required".into()),
                });
            }
            let limit = input
                .limit
                .unwrap_or(DEFAULT_SEARCH_LIMIT)
                .clamp(1, MAX_SEARCH_LIMIT);

            let variables = serde_json::json!({ "query": query, "limit": limit });
            let data: SearchAssetsData = client
                .graphql(SEARCH_ASSETS_QUERY, &variables, &ctx)
                .await?;

            tracing::debug!(
                returned = data.search_assets.nodes.len(),
                total = ?data.search_assets.total,
                "asset search finished"
            );
            Ok(SearchAssetsResult {
                success: true,
                assets: data.search_assets.nodes,
                total: data.search_assets.total,
                error: None,
            })
        })
    }
}

// ============================================================================
// WhoAmI Tool
// ============================================================================

/// Takes no arguments; any fields the caller sends are ignored.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct WhoAmIInput {}

#[derive(Clone)]
pub struct WhoAmITool {
    client: Arc<PlatformClient>,
}

impl WhoAmITool {
    pub fn new(client: Arc<PlatformClient>) -> Self {
        Self { client }
    }
}

impl Tool for WhoAmITool {
    type Input = WhoAmIInput;
    type Output = Identity;
    const NAME: &'static str = "whoami";
    const DESCRIPTION: &'static str = "Show the identity the platform attributes this call to";

    fn call(
        &self,
        _input: WhoAmIInput,
        ctx: &CallContext,
    ) -> BoxFuture<'static, Result<Self::Output, ToolError>> {
        let client = Arc::clone(&self.client);
        let ctx = ctx.clone();
        Box::pin(async move { client.get_json("/api/v1/me", &ctx).await })
    }
}

// ============================================================================
// Registry builder
// ============================================================================

/// Register every asset tool on `builder`.
pub fn build_registry(
    builder: ToolRegistryBuilder,
    client: Arc<PlatformClient>,
) -> ToolRegistryBuilder {
    builder
        .register(GetAssetTool::new(Arc::clone(&client)))
        .register(SearchAssetsTool::new(Arc::clone(&client)))
        .register(WhoAmITool::new(client))
}

/// Names of the tools [`build_registry`] registers.
pub const TOOL_NAMES: &[&str] = &[GetAssetTool::NAME, SearchAssetsTool::NAME, WhoAmITool::NAME];
