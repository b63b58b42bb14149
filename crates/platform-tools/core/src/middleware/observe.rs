//! Call observation: timing and outcome reporting around every tool call.

use super::{ErasedHandler, Middleware};
use crate::context::CallContext;
use crate::error::ToolError;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Receives start and finish events for tool calls.
///
/// Both methods default to no-ops so an implementation can hook only what it needs.
pub trait CallObserver: Send + Sync {
    fn call_started(&self, _ctx: &CallContext) {}

    fn call_finished(
        &self,
        _ctx: &CallContext,
        _elapsed: Duration,
        _outcome: Result<(), &ToolError>,
    ) {
    }
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl CallObserver for NoopObserver {}

/// Observer that emits `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl CallObserver for TracingObserver {
    fn call_started(&self, ctx: &CallContext) {
        tracing::debug!(
            tool = ctx.tool_name().unwrap_or_default(),
            session_id = ctx.session_id(),
            "tool call started"
        );
    }

    fn call_finished(
        &self,
        ctx: &CallContext,
        elapsed: Duration,
        outcome: Result<(), &ToolError>,
    ) {
        let tool = ctx.tool_name().unwrap_or_default();
        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        match outcome {
            Ok(()) => tracing::info!(
                tool,
                session_id = ctx.session_id(),
                elapsed_ms,
                "tool call completed"
            ),
            Err(e) if e.is_cancellation() => tracing::info!(
                tool,
                session_id = ctx.session_id(),
                elapsed_ms,
                reason = %e,
                "tool call aborted"
            ),
            Err(e) => tracing::warn!(
                tool,
                session_id = ctx.session_id(),
                elapsed_ms,
                error = %e,
                "tool call failed"
            ),
        }
    }
}

/// Middleware that reports each call to a [`CallObserver`].
///
/// Never alters the result.
#[derive(Clone)]
pub struct ObservabilityMiddleware {
    observer: Arc<dyn CallObserver>,
}

impl ObservabilityMiddleware {
    pub fn new(observer: Arc<dyn CallObserver>) -> Self {
        Self { observer }
    }

    /// Middleware backed by [`TracingObserver`].
    pub fn tracing() -> Self {
        Self::new(Arc::new(TracingObserver))
    }
}

impl Middleware for ObservabilityMiddleware {
    fn wrap(&self, next: ErasedHandler) -> ErasedHandler {
        let observer = Arc::clone(&self.observer);
        Arc::new(move |ctx, input| {
            let observer = Arc::clone(&observer);
            let next = Arc::clone(&next);
            Box::pin(async move {
                observer.call_started(&ctx);
                let started = Instant::now();
                let out = next(ctx.clone(), input).await;
                observer.call_finished(&ctx, started.elapsed(), out.as_ref().map(|_| ()));
                out
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::compose;
    use platform_config::PlatformConfig;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl CallObserver for Recorder {
        fn call_started(&self, ctx: &CallContext) {
            self.events
                .lock()
                .unwrap()
                .push(format!("start:{}", ctx.tool_name().unwrap_or_default()));
        }

        fn call_finished(
            &self,
            _ctx: &CallContext,
            _elapsed: Duration,
            outcome: Result<(), &ToolError>,
        ) {
            let tag = match outcome {
                Ok(()) => "ok".to_string(),
                Err(e) => format!("err:{e}"),
            };
            self.events.lock().unwrap().push(tag);
        }
    }

    fn ctx() -> CallContext {
        CallContext::builder(Arc::new(PlatformConfig::default()))
            .build()
            .with_tool("whoami", &[])
    }

    #[tokio::test]
    async fn reports_success_and_passes_value_through() {
        let recorder = Arc::new(Recorder::default());
        let observer: Arc<dyn CallObserver> = Arc::clone(&recorder) as _;
        let mw: Arc<dyn Middleware> = Arc::new(ObservabilityMiddleware::new(observer));
        let inner: ErasedHandler = Arc::new(|_ctx, input| Box::pin(async move { Ok(input) }));

        let out = compose(&[mw], inner)(ctx(), Box::new(7_i32)).await.unwrap();

        assert_eq!(*out.downcast::<i32>().unwrap(), 7);
        assert_eq!(*recorder.events.lock().unwrap(), vec!["start:whoami", "ok"]);
    }

    #[tokio::test]
    async fn reports_failure_without_changing_it() {
        let recorder = Arc::new(Recorder::default());
        let observer: Arc<dyn CallObserver> = Arc::clone(&recorder) as _;
        let mw: Arc<dyn Middleware> = Arc::new(ObservabilityMiddleware::new(observer));
        let inner: ErasedHandler =
            Arc::new(|_ctx, _input| Box::pin(async { Err(ToolError::internal("boom")) }));

        let res = compose(&[mw], inner)(ctx(), Box::new(())).await;

        assert_eq!(res.err(), Some(ToolError::internal("boom")));
        assert_eq!(
            *recorder.events.lock().unwrap(),
            vec!["start:whoami", "err:internal error: boom"]
        );
    }

    #[tokio::test]
    async fn tracing_observer_is_silent_without_subscriber() {
        let mw: Arc<dyn Middleware> = Arc::new(ObservabilityMiddleware::tracing());
        let inner: ErasedHandler = Arc::new(|_ctx, input| Box::pin(async move { Ok(input) }));
        assert!(compose(&[mw], inner)(ctx(), Box::new(())).await.is_ok());
    }
}
