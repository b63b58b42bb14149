//! The typed tool contract.

use crate::context::CallContext;
use crate::error::ToolError;
use crate::fmt::TextFormat;
use futures::future::BoxFuture;
use schemars::JsonSchema;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// A named unit of business logic with a declared input and output shape.
///
/// Handlers see only typed values and the [`CallContext`]; decoding,
/// middleware, and result encoding happen in the registry.
///
/// # Example
///
/// ```ignore
/// use platform_tools_core::{CallContext, Tool, ToolError};
/// use futures::future::BoxFuture;
///
/// #[derive(Clone)]
/// struct Ping;
///
/// impl Tool for Ping {
///     type Input = ();
///     type Output = String;
///     const NAME: &'static str = "ping";
///     const DESCRIPTION: &'static str = "Answer with pong";
///
///     fn call(&self, _input: (), _ctx: &CallContext)
///         -> BoxFuture<'static, Result<String, ToolError>>
///     {
///         Box::pin(async { Ok("pong".to_string()) })
///     }
/// }
/// ```
pub trait Tool: Send + Sync + 'static {
    /// Input arguments. Unknown fields in the payload are ignored.
    type Input: DeserializeOwned + JsonSchema + Send + 'static;

    /// Output value, serialized into the structured result.
    type Output: Serialize + JsonSchema + TextFormat + Send + 'static;

    /// Unique name identifying the tool.
    const NAME: &'static str;

    /// Human-readable description of what the tool does.
    const DESCRIPTION: &'static str;

    /// Permission scopes a caller must hold to run this tool.
    const REQUIRED_SCOPES: &'static [&'static str] = &[];

    /// Execute the tool with the given input and context.
    fn call(
        &self,
        input: Self::Input,
        ctx: &CallContext,
    ) -> BoxFuture<'static, Result<Self::Output, ToolError>>;
}
