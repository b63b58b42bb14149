//! Scope check run before a tool's handler.

use super::{ErasedHandler, Middleware};
use crate::error::ToolError;
use std::collections::HashSet;
use std::sync::Arc;

/// Inbound header listing the scopes granted to the caller.
///
/// Values are separated by spaces or commas; repeated headers accumulate.
pub const GRANTED_SCOPES_HEADER: &str = "x-granted-scopes";

/// Rejects calls whose caller lacks any of the tool's required scopes.
///
/// Calls without inbound headers (stdio) are trusted and pass unchecked.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScopeMiddleware;

impl ScopeMiddleware {
    pub fn new() -> Self {
        Self
    }
}

impl Middleware for ScopeMiddleware {
    fn wrap(&self, next: ErasedHandler) -> ErasedHandler {
        Arc::new(move |ctx, input| {
            let required = ctx.required_scopes();
            if required.is_empty() || ctx.inbound_headers().is_none() {
                return next(ctx, input);
            }

            let granted: HashSet<&str> = ctx
                .inbound_header_values(GRANTED_SCOPES_HEADER)
                .into_iter()
                .flat_map(|v| v.split([' ', ',']))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect();

            let missing: Vec<&str> = required
                .iter()
                .copied()
                .filter(|s| !granted.contains(s))
                .collect();

            if missing.is_empty() {
                next(ctx, input)
            } else {
                let msg = format!(
                    "tool {} requires scope(s): {}",
                    ctx.tool_name().unwrap_or_default(),
                    missing.join(", ")
                );
                Box::pin(async move { Err(ToolError::permission(msg)) })
            }
        })
    }
}
