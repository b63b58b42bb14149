//! RFC 7396 JSON Merge Patch used to layer config files.

use serde_json::Value;

/// Layer `patch` over `base`.
///
/// Objects merge key by key, a `null` in the patch removes the key, and any
/// other patch value (arrays included) replaces what was there.
pub fn merge_patch(base: Value, patch: Value) -> Value {
    let Value::Object(patch_map) = patch else {
        return patch;
    };
    let mut base_map = match base {
        Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };
    for (key, value) in patch_map {
        if value.is_null() {
            base_map.remove(&key);
        } else {
            let current = base_map.remove(&key).unwrap_or(Value::Null);
            base_map.insert(key, merge_patch(current, value));
        }
    }
    Value::Object(base_map)
}
