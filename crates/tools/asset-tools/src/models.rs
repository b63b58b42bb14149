use platform_tools_core::TextFormat;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

// ============================================================================
// Asset models
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct AssetSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub kind: Option<String>,
}

/// Result of `get_asset`. Lookup failures the caller can act on are reported
/// in `error` rather than as a failed call.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct GetAssetResult {
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset: Option<Asset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GetAssetResult {
    pub fn found(asset: Asset) -> Self {
        Self {
            found: true,
            asset: Some(asset),
            error: None,
        }
    }

    pub fn missing(error: impl Into<String>) -> Self {
        Self {
            found: false,
            asset: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct SearchAssetsResult {
    pub success: bool,
    pub assets: Vec<AssetSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
}

// ============================================================================
// Text formatting
// ============================================================================

impl TextFormat for GetAssetResult {
    fn fmt_text(&self) -> String {
        match (&self.asset, &self.error) {
            (Some(a), _) => {
                let mut out = format!("{} ({})", a.name, a.id);
                if let Some(kind) = &a.kind {
                    let _ = write!(out, "\nKind: {kind}");
                }
                if let Some(owner) = &a.owner {
                    let _ = write!(out, "\nOwner: {owner}");
                }
                if !a.tags.is_empty() {
                    let _ = write!(out, "\nTags: {}", a.tags.join(", "));
                }
                if let Some(updated) = a.updated_at.as_ref().or(a.created_at.as_ref()) {
                    let _ = write!(out, "\nUpdated: {updated}");
                }
                out
            }
            (None, Some(err)) => err.clone(),
            (None, None) => "Asset not found".to_string(),
        }
    }
}

impl TextFormat for SearchAssetsResult {
    fn fmt_text(&self) -> String {
        if let Some(err) = &self.error {
            return format!("Search failed: {err}");
        }
        if self.assets.is_empty() {
            return "No assets found.".to_string();
        }
        let mut out = String::new();
        for a in &self.assets {
            let _ = write!(out, "{}  {}", a.id, a.name);
            if let Some(kind) = &a.kind {
                let _ = write!(out, " [{kind}]");
            }
            out.push('\n');
        }
        if let Some(total) = self.total
            && total > self.assets.len() as u64
        {
            let _ = write!(out, "... {} of {total} shown", self.assets.len());
        }
        out.trim_end().to_string()
    }
}

impl TextFormat for Identity {
    fn fmt_text(&self) -> String {
        let mut out = format!(
            "{} ({})",
            self.display_name.as_deref().unwrap_or(&self.username),
            self.id
        );
        if let Some(email) = &self.email {
            let _ = write!(out, "\nEmail: {email}");
        }
        if !self.scopes.is_empty() {
            let _ = write!(out, "\nScopes: {}", self.scopes.join(" "));
        }
        out
    }
}
