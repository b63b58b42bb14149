//! Middleware chain around tool handlers.
//!
//! A [`Middleware`] turns a handler into a replacement handler with the same
//! type-erased signature. The registry folds the configured layers around
//! every tool once, when the registry is finished:
//!
//! ```text
//! layers [M1, M2]  =>  M1 -> M2 -> handler -> M2 -> M1
//! ```
//!
//! A layer decides whether to call `next`; returning without calling it
//! short-circuits the chain and the handler never runs. Layers must not
//! re-invoke `next` to retry a failed call.

mod observe;
mod scopes;

pub use observe::{CallObserver, NoopObserver, ObservabilityMiddleware, TracingObserver};
pub use scopes::{GRANTED_SCOPES_HEADER, ScopeMiddleware};

use crate::context::CallContext;
use crate::error::ToolError;
use futures::future::BoxFuture;
use std::any::Any;
use std::sync::Arc;

/// A tool input or output with its concrete type erased.
pub type ErasedValue = Box<dyn Any + Send>;

/// Future returned by an [`ErasedHandler`].
pub type ErasedFuture = BoxFuture<'static, Result<ErasedValue, ToolError>>;

/// Uniform handler shape shared by every tool and middleware link.
pub type ErasedHandler = Arc<dyn Fn(CallContext, ErasedValue) -> ErasedFuture + Send + Sync>;

/// Cross-cutting wrapper applied around every tool invocation.
pub trait Middleware: Send + Sync {
    /// Wrap `next`, returning the handler that runs in its place.
    fn wrap(&self, next: ErasedHandler) -> ErasedHandler;
}

struct MiddlewareFn<F> {
    f: Arc<F>,
}

impl<F> Middleware for MiddlewareFn<F>
where
    F: Fn(CallContext, ErasedValue, ErasedHandler) -> ErasedFuture + Send + Sync + 'static,
{
    fn wrap(&self, next: ErasedHandler) -> ErasedHandler {
        let f = Arc::clone(&self.f);
        Arc::new(move |ctx, input| f(ctx, input, Arc::clone(&next)))
    }
}

/// Create middleware from a closure.
///
/// The closure receives the context, the erased input and the next handler,
/// and must return a boxed future.
///
/// ```ignore
/// let audit = middleware_fn(|ctx, input, next| {
///     Box::pin(async move {
///         tracing::info!(tool = ?ctx.tool_name(), "before");
///         let out = next(ctx, input).await;
///         tracing::info!("after");
///         out
///     })
/// });
/// ```
#[must_use]
pub fn middleware_fn<F>(f: F) -> impl Middleware
where
    F: Fn(CallContext, ErasedValue, ErasedHandler) -> ErasedFuture + Send + Sync + 'static,
{
    MiddlewareFn { f: Arc::new(f) }
}

/// Fold `layers` around `inner` so that `layers[0]` runs outermost.
pub fn compose(layers: &[Arc<dyn Middleware>], inner: ErasedHandler) -> ErasedHandler {
    layers
        .iter()
        .rev()
        .fold(inner, |next, layer| layer.wrap(next))
}
