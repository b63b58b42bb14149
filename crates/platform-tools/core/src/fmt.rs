//! Human-readable text rendering for tool outputs.
//!
//! MCP results carry a text block next to the structured JSON. Output types
//! opt into custom text by overriding [`TextFormat::fmt_text`]; the default
//! is pretty-printed JSON.

use serde::Serialize;
use serde_json::Value as JsonValue;

/// Text formatting for tool outputs.
pub trait TextFormat: Serialize {
    fn fmt_text(&self) -> String {
        match serde_json::to_value(self) {
            Ok(v) => fallback_text_from_json(&v),
            Err(e) => format!("<unrenderable output: {e}>"),
        }
    }
}

/// Pretty JSON, or compact JSON if pretty-printing fails.
pub fn fallback_text_from_json(v: &JsonValue) -> String {
    serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
}

impl TextFormat for () {}

impl TextFormat for String {
    fn fmt_text(&self) -> String {
        self.clone()
    }
}
