//! Tool registry: type-erased storage with typed dispatch.
//!
//! Each registered tool is stored behind [`ErasedTool`] so tools with
//! different input and output types share one map. Dispatch decodes JSON
//! arguments into the tool's declared input type, runs the middleware chain
//! and handler, and encodes the typed output back to JSON.

use crate::context::CallContext;
use crate::error::ToolError;
use crate::filter::ToolFilter;
use crate::fmt::TextFormat;
use crate::middleware::{ErasedHandler, ErasedValue, Middleware, compose};
use crate::schema::{input_schema_for, output_schema_for};
use crate::tool::Tool;
use futures::FutureExt;
use futures::future::BoxFuture;
use schemars::Schema;
use serde_json::Value;
use std::any::{Any, type_name};
use std::collections::{BTreeMap, BTreeSet};
use std::marker::PhantomData;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use thiserror::Error;

/// Dispatch result carrying both structured data and rendered text.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutput {
    pub data: Value,
    pub text: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("tool registered twice: {0}")]
    DuplicateTool(String),
}

/// Type-erased tool entry.
pub trait ErasedTool: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn input_schema(&self) -> &Schema;

    /// Output schema, when the output type has an object root.
    fn output_schema(&self) -> Option<&Schema>;

    fn required_scopes(&self) -> &'static [&'static str];

    /// Decode `args`, run the middleware chain and handler, encode the result.
    fn call_json(
        &self,
        args: Value,
        ctx: &CallContext,
    ) -> BoxFuture<'static, Result<DispatchOutput, ToolError>>;
}

/// Immutable set of tools, built once at startup.
pub struct ToolRegistry {
    map: BTreeMap<&'static str, Arc<dyn ErasedTool>>,
}

impl ToolRegistry {
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::default()
    }

    /// Registered tool names, sorted.
    pub fn list_names(&self) -> Vec<&'static str> {
        self.map.keys().copied().collect()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn ErasedTool>> {
        self.map.get(name)
    }

    /// All entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ErasedTool>> {
        self.map.values()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Dispatch a call by tool name with JSON arguments.
    ///
    /// Disabled and unregistered names both yield [`ToolError::UnknownTool`].
    pub async fn dispatch_json(
        &self,
        name: &str,
        args: Value,
        ctx: &CallContext,
    ) -> Result<DispatchOutput, ToolError> {
        let entry = self
            .map
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        entry.call_json(args, ctx).await
    }
}

type Pending = Box<dyn FnOnce(&[Arc<dyn Middleware>]) -> Arc<dyn ErasedTool>>;

/// Builder for [`ToolRegistry`].
///
/// Layers apply to every tool regardless of registration order; the chain is
/// composed once per tool in [`finish`](Self::finish).
#[derive(Default)]
pub struct ToolRegistryBuilder {
    filter: ToolFilter,
    layers: Vec<Arc<dyn Middleware>>,
    seen: BTreeSet<&'static str>,
    duplicate: Option<&'static str>,
    pending: Vec<(&'static str, Pending)>,
}

impl ToolRegistryBuilder {
    /// Only tools the filter enables end up in the registry.
    #[must_use]
    pub fn filter(mut self, filter: ToolFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Append a middleware layer. The first layer added runs outermost.
    #[must_use]
    pub fn layer<M: Middleware + 'static>(self, layer: M) -> Self {
        self.layer_arc(Arc::new(layer))
    }

    #[must_use]
    pub fn layer_arc(mut self, layer: Arc<dyn Middleware>) -> Self {
        self.layers.push(layer);
        self
    }

    /// Register a tool.
    #[must_use]
    pub fn register<T: Tool>(mut self, tool: T) -> Self {
        if !self.seen.insert(T::NAME) && self.duplicate.is_none() {
            self.duplicate = Some(T::NAME);
        }
        let tool = Arc::new(tool);
        self.pending.push((
            T::NAME,
            Box::new(move |layers| {
                Arc::new(Entry::<T> {
                    handler: compose(layers, typed_handler(tool)),
                    input_schema: input_schema_for::<T::Input>(),
                    output_schema: output_schema_for::<T::Output>(),
                    _tool: PhantomData,
                })
            }),
        ));
        self
    }

    /// Build the registry.
    ///
    /// Fails if two tools share a name, whether or not either is enabled.
    pub fn finish(self) -> Result<ToolRegistry, RegistryError> {
        if let Some(name) = self.duplicate {
            return Err(RegistryError::DuplicateTool(name.to_string()));
        }

        let mut map = BTreeMap::new();
        for (name, build) in self.pending {
            if !self.filter.is_enabled(name) {
                tracing::debug!(tool = name, "tool disabled by filter");
                continue;
            }
            map.insert(name, build(&self.layers));
        }

        let known: Vec<&str> = self.seen.iter().copied().collect();
        for name in self.filter.unknown_enabled(&known) {
            tracing::warn!(tool = name, "enabled tool list names an unknown tool");
        }

        Ok(ToolRegistry { map })
    }
}

/// Innermost link of a tool's chain: recover the typed input and call the tool.
fn typed_handler<T: Tool>(tool: Arc<T>) -> ErasedHandler {
    Arc::new(move |ctx, input: ErasedValue| match input.downcast::<T::Input>() {
        Ok(input) => {
            let fut = tool.call(*input, &ctx);
            Box::pin(async move { fut.await.map(|out| Box::new(out) as ErasedValue) })
        }
        Err(_) => {
            let msg = format!(
                "{} received input that is not {}",
                T::NAME,
                type_name::<T::Input>()
            );
            Box::pin(async move { Err(ToolError::dispatch(msg)) })
        }
    })
}

struct Entry<T: Tool> {
    handler: ErasedHandler,
    input_schema: Schema,
    output_schema: Option<Schema>,
    _tool: PhantomData<fn() -> T>,
}

impl<T: Tool> ErasedTool for Entry<T> {
    fn name(&self) -> &'static str {
        T::NAME
    }

    fn description(&self) -> &'static str {
        T::DESCRIPTION
    }

    fn input_schema(&self) -> &Schema {
        &self.input_schema
    }

    fn output_schema(&self) -> Option<&Schema> {
        self.output_schema.as_ref()
    }

    fn required_scopes(&self) -> &'static [&'static str] {
        T::REQUIRED_SCOPES
    }

    fn call_json(
        &self,
        args: Value,
        ctx: &CallContext,
    ) -> BoxFuture<'static, Result<DispatchOutput, ToolError>> {
        let input = match decode_input::<T::Input>(args) {
            Ok(input) => input,
            Err(e) => return Box::pin(async move { Err(e) }),
        };

        let ctx = ctx.with_tool(T::NAME, T::REQUIRED_SCOPES);
        let handler = Arc::clone(&self.handler);

        Box::pin(async move {
            let started = std::panic::catch_unwind(AssertUnwindSafe(|| {
                handler(ctx.clone(), Box::new(input))
            }));
            let fut = started.map_err(|p| panic_error(T::NAME, p.as_ref()))?;

            let out = ctx
                .run(async move {
                    AssertUnwindSafe(fut)
                        .catch_unwind()
                        .await
                        .unwrap_or_else(|p| Err(panic_error(T::NAME, p.as_ref())))
                })
                .await?;

            let out = out.downcast::<T::Output>().map_err(|_| {
                ToolError::dispatch(format!(
                    "{} produced output that is not {}",
                    T::NAME,
                    type_name::<T::Output>()
                ))
            })?;

            let data = serde_json::to_value(&*out).map_err(|e| ToolError::internal(e.to_string()))?;
            let text = out.fmt_text();
            Ok(DispatchOutput { data, text })
        })
    }
}

/// Decode arguments, ignoring fields the input type does not declare.
///
/// Unit inputs accept any object, and an absent payload (`null` or `{}`)
/// also decodes for empty-struct inputs.
fn decode_input<I: serde::de::DeserializeOwned>(args: Value) -> Result<I, ToolError> {
    let absent = args.is_null() || args.as_object().is_some_and(serde_json::Map::is_empty);
    let object = args.is_object();
    let err = match serde_json::from_value(args) {
        Ok(v) => return Ok(v),
        Err(e) => ToolError::invalid_input(e.to_string()),
    };
    if (absent || object)
        && let Ok(v) = serde_json::from_value(Value::Null)
    {
        return Ok(v);
    }
    if absent && let Ok(v) = serde_json::from_value(Value::Object(serde_json::Map::new())) {
        return Ok(v);
    }
    Err(err)
}

fn panic_error(tool: &str, payload: &(dyn Any + Send)) -> ToolError {
    let msg = payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());
    ToolError::dispatch(format!("{tool} panicked: {msg}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform_config::PlatformConfig;
    use schemars::JsonSchema;
    use serde::{Deserialize, Serialize};

    #[derive(Deserialize, JsonSchema)]
    struct Args {
        n: i64,
    }

    #[derive(Serialize, JsonSchema)]
    struct Doubled {
        value: i64,
    }

    impl TextFormat for Doubled {
        fn fmt_text(&self) -> String {
            format!("= {}", self.value)
        }
    }

    struct Double;

    impl Tool for Double {
        type Input = Args;
        type Output = Doubled;
        const NAME: &'static str = "double";
        const DESCRIPTION: &'static str = "Double a number";

        fn call(
            &self,
            input: Args,
            _ctx: &CallContext,
        ) -> BoxFuture<'static, Result<Doubled, ToolError>> {
            Box::pin(async move { Ok(Doubled { value: input.n * 2 }) })
        }
    }

    fn ctx() -> CallContext {
        CallContext::builder(Arc::new(PlatformConfig::default())).build()
    }

    #[tokio::test]
    async fn dispatch_decodes_and_renders() {
        let reg = ToolRegistry::builder().register(Double).finish().unwrap();
        let out = reg
            .dispatch_json("double", serde_json::json!({"n": 21}), &ctx())
            .await
            .unwrap();
        assert_eq!(out.data, serde_json::json!({"value": 42}));
        assert_eq!(out.text, "= 42");
    }

    #[tokio::test]
    async fn bad_args_are_invalid_input() {
        let reg = ToolRegistry::builder().register(Double).finish().unwrap();
        let err = reg
            .dispatch_json("double", serde_json::json!({"n": "x"}), &ctx())
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
    }

    #[test]
    fn schemas_are_precomputed() {
        let reg = ToolRegistry::builder().register(Double).finish().unwrap();
        let entry = reg.get("double").unwrap();
        let input = serde_json::to_value(entry.input_schema()).unwrap();
        assert!(input["properties"].get("n").is_some());
        assert!(entry.output_schema().is_some());
        assert!(entry.required_scopes().is_empty());
    }

    #[test]
    fn absent_args_decode_for_unit_and_empty_structs() {
        #[derive(Deserialize, Debug, PartialEq)]
        struct NoArgs {}
        assert_eq!(decode_input::<NoArgs>(Value::Null).unwrap(), NoArgs {});
        decode_input::<()>(serde_json::json!({})).unwrap();
        decode_input::<()>(Value::Null).unwrap();
        assert!(matches!(
            decode_input::<Args>(Value::Null),
            Err(ToolError::InvalidInput(_))
        ));
        decode_input::<()>(serde_json::json!({"tool_reasoning": "x"})).unwrap();
        assert!(decode_input::<()>(serde_json::json!("text")).is_err());
        assert!(matches!(
            decode_input::<Args>(serde_json::json!({"other": 1})),
            Err(ToolError::InvalidInput(msg)) if msg.contains("missing field `n`")
        ));
    }

    #[test]
    fn panic_payloads_are_described() {
        let e = panic_error("t", &"static msg");
        assert_eq!(e, ToolError::dispatch("t panicked: static msg"));
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(
            panic_error("t", owned.as_ref()),
            ToolError::dispatch("t panicked: owned")
        );
    }
}
