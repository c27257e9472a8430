use std::any::TypeId;

use serde_json::Value as Json;

use super::{Key, Map, Object, Reflect, ReflectMut, Scalar};
use crate::lexer::normalize_identifier;

/// JSON documents are graphs too: `null` is nil, arrays are sequences and
/// objects are maps keyed by string.
impl Object for Json {
    fn reflect(&self) -> Reflect<'_> {
        match self {
            Json::Null => Reflect::Nil,
            Json::Bool(b) => Reflect::Scalar(Scalar::Bool(*b)),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Reflect::Scalar(Scalar::Int(i))
                } else if let Some(u) = n.as_u64() {
                    Reflect::Scalar(Scalar::Uint(u))
                } else if let Some(f) = n.as_f64() {
                    Reflect::Scalar(Scalar::Float(f))
                } else {
                    Reflect::Opaque
                }
            }
            Json::String(s) => Reflect::Scalar(Scalar::Str(s)),
            Json::Array(items) => Reflect::Sequence(items),
            Json::Object(map) => Reflect::Map(map),
        }
    }

    fn reflect_mut(&mut self) -> ReflectMut<'_> {
        match self {
            Json::Array(items) => ReflectMut::Sequence(items),
            Json::Object(map) => ReflectMut::Map(map),
            _ => ReflectMut::Leaf,
        }
    }
}

impl Object for serde_json::Map<String, Json> {
    fn reflect(&self) -> Reflect<'_> {
        Reflect::Map(self)
    }

    fn reflect_mut(&mut self) -> ReflectMut<'_> {
        ReflectMut::Map(self)
    }
}

impl Map for serde_json::Map<String, Json> {
    fn len(&self) -> usize {
        serde_json::Map::len(self)
    }

    fn keys(&self) -> Vec<Key> {
        serde_json::Map::keys(self)
            .map(|k| Key::Text(k.clone()))
            .collect()
    }

    /// Identifiers in a path are normalized (`name` reads as `Name`), so a key
    /// that only matches after normalization is used when no exact key exists.
    fn coerce_key(&self, key: &Key) -> Option<Key> {
        let text = key.to_string();
        if self.contains_key(&text) {
            return Some(Key::Text(text));
        }
        let matched = serde_json::Map::keys(self).find(|k| normalize_identifier(k) == text);
        Some(Key::Text(matched.cloned().unwrap_or(text)))
    }

    fn get(&self, key: &Key) -> Option<&dyn Object> {
        serde_json::Map::get(self, &key.to_string()).map(|v| v as &dyn Object)
    }

    fn get_mut(&mut self, key: &Key) -> Option<&mut dyn Object> {
        serde_json::Map::get_mut(self, &key.to_string()).map(|v| v as &mut dyn Object)
    }

    fn insert(&mut self, key: Key, value: Box<dyn Object>) -> Result<(), Box<dyn Object>> {
        let value = into_json(value)?;
        serde_json::Map::insert(self, key.to_string(), value);
        Ok(())
    }

    fn value_type(&self) -> (TypeId, &'static str) {
        (TypeId::of::<Json>(), std::any::type_name::<Json>())
    }
}

fn into_json(value: Box<dyn Object>) -> Result<Json, Box<dyn Object>> {
    if value.as_ref().as_any().type_id() != TypeId::of::<Json>() {
        return Err(value);
    }
    match value.into_any().downcast::<Json>() {
        Ok(v) => Ok(*v),
        Err(_) => Err(Box::new(())),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::object::Kind;

    #[test]
    fn test_json_kinds() {
        assert_eq!(json!(null).kind(), Kind::Nil);
        assert_eq!(json!(-1).kind(), Kind::Int);
        assert_eq!(json!(u64::MAX).kind(), Kind::Uint);
        assert_eq!(json!(1.5).kind(), Kind::Float);
        assert_eq!(json!([1]).kind(), Kind::Sequence);
        assert_eq!(json!({"a": 1}).kind(), Kind::Map);
    }

    #[test]
    fn test_object_key_falls_back_to_normalized_match() {
        let doc = json!({"title": "x", "Other": 1});
        let Json::Object(map) = doc else { unreachable!() };
        assert_eq!(
            Map::coerce_key(&map, &Key::Text("Title".to_string())),
            Some(Key::Text("title".to_string()))
        );
        assert_eq!(
            Map::coerce_key(&map, &Key::Text("Missing".to_string())),
            Some(Key::Text("Missing".to_string()))
        );
    }
}
