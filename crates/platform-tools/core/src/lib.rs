//! Core building blocks for platform-mcp tools.
//!
//! - [`CallContext`]: immutable per-call facts (inbound headers, session,
//!   target base URL, cancellation) handed to every middleware and handler
//! - [`Tool`]: typed handler contract
//! - [`ToolRegistry`]: type-erased storage and JSON dispatch
//! - [`Middleware`]: wrappers composed around every handler
//! - [`ToolFilter`]: enabled/disabled tool selection

pub mod context;
pub mod error;
pub mod filter;
pub mod fmt;
pub mod middleware;
pub mod registry;
pub mod schema;
pub mod tool;

pub use context::{CallContext, CallContextBuilder, TARGET_URL_HEADER, resolve_target_base_url};
pub use error::ToolError;
pub use filter::{FilterError, ToolFilter};
pub use fmt::TextFormat;
pub use middleware::{
    CallObserver, ErasedHandler, ErasedValue, GRANTED_SCOPES_HEADER, Middleware, NoopObserver,
    ObservabilityMiddleware, ScopeMiddleware, TracingObserver, compose, middleware_fn,
};
pub use registry::{DispatchOutput, ErasedTool, RegistryError, ToolRegistry, ToolRegistryBuilder};
pub use tool::Tool;

pub use futures::future::BoxFuture;
