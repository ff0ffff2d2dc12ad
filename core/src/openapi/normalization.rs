#![deny(missing_docs)]

//! # OpenAPI Normalization
//!
//! Rewrites known compatibility gaps in `components` before it is handed to
//! the `utoipa` model: boolean schemas and OAS 3.0 `nullable` flags.

use serde_json::{json, Map, Value};

/// Normalizes a `components` object in place.
pub(crate) fn normalize_components(components: &mut Value) {
    if let Some(schemas) = components
        .get_mut("schemas")
        .and_then(|s| s.as_object_mut())
    {
        for schema in schemas.values_mut() {
            normalize_schema_node(schema);
        }
    }
    normalize_nullable_schemas(components);
}

/// Rewrites `nullable` / `x-nullable` flags into `type` unions, or an `anyOf`
/// with `null` when no `type` is present.
fn normalize_nullable_schemas(value: &mut Value) {
    if let Value::Object(map) = value {
        if let Some(replacement) = apply_nullable_flag(map) {
            *value = replacement;
        }
    }

    match value {
        Value::Object(map) => {
            for v in map.values_mut() {
                normalize_nullable_schemas(v);
            }
        }
        Value::Array(items) => {
            for v in items.iter_mut() {
                normalize_nullable_schemas(v);
            }
        }
        _ => {}
    }
}

fn normalize_schema_node(value: &mut Value) {
    match value {
        Value::Bool(flag) => *value = bool_schema_replacement(*flag),
        Value::Object(map) => {
            if let Some(props) = map.get_mut("properties").and_then(|v| v.as_object_mut()) {
                for v in props.values_mut() {
                    normalize_schema_node(v);
                }
            }
            for key in ["items", "not", "additionalProperties"] {
                if let Some(child) = map.get_mut(key) {
                    if key != "additionalProperties" || !child.is_boolean() {
                        normalize_schema_node(child);
                    }
                }
            }
            for key in ["allOf", "anyOf", "oneOf"] {
                if let Some(list) = map.get_mut(key).and_then(|v| v.as_array_mut()) {
                    for v in list.iter_mut() {
                        normalize_schema_node(v);
                    }
                }
            }
        }
        _ => {}
    }
}

fn bool_schema_replacement(flag: bool) -> Value {
    if flag {
        Value::Object(Map::new())
    } else {
        json!({
            "type": "object",
            "additionalProperties": false,
            "required": ["__never__"]
        })
    }
}

fn apply_nullable_flag(map: &mut Map<String, Value>) -> Option<Value> {
    let nullable = ["nullable", "x-nullable"]
        .iter()
        .any(|key| map.get(*key).and_then(Value::as_bool).unwrap_or(false));
    if !nullable {
        return None;
    }

    map.remove("nullable");
    map.remove("x-nullable");

    match map.get_mut("type") {
        Some(type_val @ Value::String(_)) => {
            if type_val.as_str() != Some("null") {
                let ty = type_val.clone();
                *type_val = json!([ty, "null"]);
            }
            None
        }
        Some(Value::Array(arr)) => {
            if !arr.iter().any(|v| v.as_str() == Some("null")) {
                arr.push(Value::String("null".into()));
            }
            None
        }
        _ => Some(json!({
            "anyOf": [Value::Object(map.clone()), { "type": "null" }]
        })),
    }
}
