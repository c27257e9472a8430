//! JSON rendering of resolved values.
//!
//! Any [`Value`] can be rendered by walking the reflection of the object it
//! wraps:
//!
//! - **Structs** become objects keyed by field name, in declaration order
//! - **Maps** become objects keyed by the key text
//! - **Sequences** become arrays
//! - **Nil** and nil pointers become `null`
//! - **Opaque** values become their `Debug` text
//!
//! # Examples
//!
//! ```
//! use objpath::Value;
//! use objpath::output::{to_json, to_json_pretty};
//!
//! let value = Value::new(vec![1_i64, 2]);
//!
//! assert_eq!(to_json(&value), serde_json::json!([1, 2]));
//! assert_eq!(to_json_pretty(&Value::new(42_u8)), "42");
//! ```
use serde_json::{Map as JsonMap, Number as JsonNumber, Value as Json};

use crate::{
    number::Number,
    object::{Object, Reflect, Scalar},
    value::Value,
};

/// Renders a resolved value as JSON.
pub fn to_json(value: &Value<'_>) -> Json {
    value.object().map(object_to_json).unwrap_or(Json::Null)
}

/// Renders a resolved value as indented JSON text.
pub fn to_json_pretty(value: &Value<'_>) -> String {
    let json = to_json(value);
    serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string())
}

/// Renders any object as JSON.
pub fn object_to_json(obj: &dyn Object) -> Json {
    if let Some(json) = obj.as_any().downcast_ref::<Json>() {
        return json.clone();
    }

    match obj.reflect() {
        Reflect::Nil | Reflect::Pointer(None) => Json::Null,
        Reflect::Pointer(Some(inner)) => object_to_json(inner),
        Reflect::Scalar(scalar) => scalar_to_json(scalar),
        Reflect::Struct(fields) => {
            let mut out = JsonMap::new();
            for name in fields.field_names() {
                if let Some(field) = fields.field(name) {
                    out.insert(name.to_string(), object_to_json(field));
                }
            }
            Json::Object(out)
        }
        Reflect::Map(map) => {
            let mut keys = map.keys();
            keys.sort();
            let mut out = JsonMap::new();
            for key in keys {
                if let Some(entry) = map.get(&key) {
                    out.insert(key.to_string(), object_to_json(entry));
                }
            }
            Json::Object(out)
        }
        Reflect::Sequence(seq) => Json::Array(
            (0..seq.len())
                .filter_map(|i| seq.get(i))
                .map(object_to_json)
                .collect(),
        ),
        Reflect::Opaque => match obj.as_any().downcast_ref::<Number>() {
            Some(number) => number
                .as_str()
                .parse::<JsonNumber>()
                .map(Json::Number)
                .unwrap_or_else(|_| Json::String(number.to_string())),
            None => Json::String(format!("{:?}", obj)),
        },
    }
}

fn scalar_to_json(scalar: Scalar<'_>) -> Json {
    match scalar {
        Scalar::Bool(b) => Json::Bool(b),
        Scalar::Int(n) => Json::Number(n.into()),
        Scalar::Uint(n) => Json::Number(n.into()),
        Scalar::Float(f) => JsonNumber::from_f64(f)
            .map(Json::Number)
            .unwrap_or(Json::Null),
        Scalar::Str(s) => Json::String(s.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde_json::json;

    use super::*;

    #[test]
    fn test_nil_renders_null() {
        assert_eq!(to_json(&Value::nil()), Json::Null);
        assert_eq!(to_json(&Value::new(None::<Box<i64>>)), Json::Null);
    }

    #[test]
    fn test_nan_renders_null() {
        assert_eq!(to_json(&Value::new(f64::NAN)), Json::Null);
    }

    #[test]
    fn test_map_keys_are_text() {
        let mut map = BTreeMap::new();
        map.insert(2_u8, "b".to_string());
        map.insert(1_u8, "a".to_string());
        assert_eq!(to_json(&Value::new(map)), json!({"1": "a", "2": "b"}));
    }

    #[test]
    fn test_number_carrier() {
        assert_eq!(to_json(&Value::new(Number::new("12"))), json!(12));
    }
}
