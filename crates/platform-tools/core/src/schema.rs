//! JSON Schema generation for tool inputs and outputs.
//!
//! Schemas use Draft 2020-12 with `AddNullable` for `Option<T>` fields, the
//! dialect MCP clients expect. They are generated once per tool when the
//! registry is finished.

use schemars::generate::SchemaSettings;
use schemars::transform::{AddNullable, RestrictFormats};
use schemars::{JsonSchema, Schema};

fn settings() -> SchemaSettings {
    SchemaSettings::draft2020_12()
        .with_transform(AddNullable::default())
        .with_transform(RestrictFormats::default())
}

/// Schema describing a tool's input arguments.
pub fn input_schema_for<T: JsonSchema>() -> Schema {
    settings().into_generator().into_root_schema_for::<T>()
}

/// Schema describing a tool's output, if it has an object root.
///
/// MCP only accepts object-rooted output schemas; anything else is omitted
/// from tool listings.
pub fn output_schema_for<T: JsonSchema>() -> Option<Schema> {
    let schema = input_schema_for::<T>();
    let json = serde_json::to_value(&schema).ok()?;
    let object_root = match json.get("type") {
        Some(serde_json::Value::String(t)) => t == "object",
        None => json.get("properties").is_some(),
        Some(_) => false,
    };
    object_root.then_some(schema)
}
