use std::fmt;

use thiserror::Error;

use crate::{
    lexer::normalize_identifier,
    number::{Number, NumberError},
    object::{Key, Map, Object, Reflect, Scalar, Sequence, pointee, pointee_mut},
};

/// A failed write through [`Value::set_value`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    #[error("Can not use value of type {found} to patch {field} of type {expected}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{field} is not settable")]
    NotSettable { field: String },

    #[error("Can not use number {literal} to patch {field} of type {target}: {reason}")]
    Number {
        field: String,
        literal: String,
        target: &'static str,
        reason: NumberError,
    },
}

/// Deferred write of a map entry.
///
/// Map entries are not addressable on their own, so the write goes through the
/// owning map.
pub struct KeySetter<'a> {
    map: &'a mut dyn Map,
    key: Key,
}

impl KeySetter<'_> {
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// The entry currently stored under the key, if any.
    pub fn current(&self) -> Option<&dyn Object> {
        self.map.get(&self.key)
    }
}

impl fmt::Debug for KeySetter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeySetter").field("key", &self.key).finish()
    }
}

/// Deferred write past the end of a growable sequence.
pub struct IndexSetter<'a> {
    sequence: &'a mut dyn Sequence,
    index: usize,
}

enum Slot<'a> {
    Nil,
    /// Addressable location inside the root graph
    Borrowed(&'a mut dyn Object),
    /// Computed value, read-only
    Owned(Box<dyn Object>),
    Entry(KeySetter<'a>),
    Pending(IndexSetter<'a>),
}

/// The result of evaluating an expression.
///
/// A value is one of: an addressable location inside the root (writable), a
/// map entry written through its map, a deferred sequence slot, a computed
/// read-only value, or nil. The lifetime ties writable values to the root they
/// were resolved from.
pub struct Value<'a> {
    slot: Slot<'a>,
    path: String,
}

impl<'a> Value<'a> {
    pub fn nil() -> Self {
        Value {
            slot: Slot::Nil,
            path: String::new(),
        }
    }

    /// Wraps a host value as a computed (read-only) value.
    pub fn new<T: Object + Clone>(value: T) -> Self {
        Value::from_boxed(Box::new(value))
    }

    pub fn from_boxed(value: Box<dyn Object>) -> Self {
        Value {
            slot: Slot::Owned(value),
            path: String::new(),
        }
    }

    pub(crate) fn borrowed(obj: &'a mut dyn Object) -> Self {
        Value {
            slot: Slot::Borrowed(obj),
            path: String::new(),
        }
    }

    pub(crate) fn entry(map: &'a mut dyn Map, key: Key) -> Self {
        Value {
            slot: Slot::Entry(KeySetter { map, key }),
            path: String::new(),
        }
    }

    pub(crate) fn pending(sequence: &'a mut dyn Sequence, index: usize) -> Self {
        Value {
            slot: Slot::Pending(IndexSetter { sequence, index }),
            path: String::new(),
        }
    }

    pub(crate) fn at(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// The expression this value was resolved from, used in error messages.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The wrapped object before pointer dereferencing, if there is one.
    pub fn object(&self) -> Option<&dyn Object> {
        match &self.slot {
            Slot::Nil | Slot::Pending(_) => None,
            Slot::Borrowed(obj) => Some(&**obj),
            Slot::Owned(obj) => Some(obj.as_ref()),
            Slot::Entry(setter) => setter.current(),
        }
    }

    /// Downcasts the wrapped object to its concrete type.
    pub fn downcast_ref<T: Object + Clone>(&self) -> Option<&T> {
        self.object()?.as_any().downcast_ref::<T>()
    }

    /// Owned copy of the wrapped object.
    pub fn to_owned_object(&self) -> Option<Box<dyn Object>> {
        self.object().map(|obj| obj.clone_object())
    }

    pub fn type_name(&self) -> &'static str {
        self.object().map(|obj| obj.type_name()).unwrap_or("nil")
    }

    fn resolved(&self) -> Reflect<'_> {
        self.object()
            .and_then(pointee)
            .map(|obj| obj.reflect())
            .unwrap_or(Reflect::Nil)
    }

    fn scalar(&self) -> Option<Scalar<'_>> {
        match self.resolved() {
            Reflect::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_key_setter(&self) -> bool {
        matches!(self.slot, Slot::Entry(_))
    }

    /// Whether [`Value::set_value`] can write through this value at all.
    pub fn is_settable(&self) -> bool {
        matches!(
            self.slot,
            Slot::Borrowed(_) | Slot::Entry(_) | Slot::Pending(_)
        )
    }

    pub fn is_string(&self) -> bool {
        matches!(self.scalar(), Some(Scalar::Str(_)))
    }

    pub fn is_bool(&self) -> bool {
        matches!(self.scalar(), Some(Scalar::Bool(_)))
    }

    pub fn is_float(&self) -> bool {
        matches!(self.scalar(), Some(Scalar::Float(_)))
    }

    pub fn is_integer(&self) -> bool {
        matches!(self.scalar(), Some(Scalar::Int(_) | Scalar::Uint(_)))
    }

    pub fn is_number(&self) -> bool {
        self.is_integer() || self.is_float()
    }

    pub fn is_nil(&self) -> bool {
        matches!(self.resolved(), Reflect::Nil)
    }

    /// Integer view of the value. Strings are parsed as floats and truncated;
    /// anything unconvertible is 0.
    pub fn as_integer(&self) -> i64 {
        match self.scalar() {
            Some(Scalar::Int(n)) => n,
            Some(Scalar::Uint(n)) => n as i64,
            Some(Scalar::Float(f)) => f as i64,
            Some(Scalar::Str(s)) => s.trim().parse::<f64>().map(|f| f as i64).unwrap_or(0),
            _ => 0,
        }
    }

    pub fn as_float(&self) -> f64 {
        match self.scalar() {
            Some(Scalar::Int(n)) => n as f64,
            Some(Scalar::Uint(n)) => n as f64,
            Some(Scalar::Float(f)) => f,
            Some(Scalar::Str(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
            _ => 0.0,
        }
    }

    pub fn as_bool(&self) -> bool {
        matches!(self.scalar(), Some(Scalar::Bool(true)))
    }

    /// Same as the `Display` rendering.
    pub fn as_string(&self) -> String {
        self.to_string()
    }

    pub fn is_true(&self) -> bool {
        match self.resolved() {
            Reflect::Scalar(Scalar::Bool(b)) => b,
            Reflect::Scalar(Scalar::Int(n)) => n != 0,
            Reflect::Scalar(Scalar::Uint(n)) => n != 0,
            Reflect::Scalar(Scalar::Float(f)) => f != 0.0,
            Reflect::Scalar(Scalar::Str(s)) => !s.is_empty(),
            Reflect::Map(map) => !map.is_empty(),
            Reflect::Sequence(seq) => !seq.is_empty(),
            Reflect::Struct(_) => true,
            Reflect::Nil | Reflect::Pointer(_) | Reflect::Opaque => false,
        }
    }

    /// Logical negation as a fresh computed value.
    pub fn negate(&self) -> Value<'static> {
        match self.resolved() {
            Reflect::Scalar(Scalar::Int(_) | Scalar::Uint(_)) => {
                Value::new(if self.as_integer() != 0 { 0_i64 } else { 1 })
            }
            Reflect::Scalar(Scalar::Float(f)) => Value::new(if f != 0.0 { 0.0_f64 } else { 1.0 }),
            Reflect::Scalar(Scalar::Bool(b)) => Value::new(!b),
            Reflect::Scalar(Scalar::Str(_)) | Reflect::Map(_) | Reflect::Sequence(_) => {
                Value::new(self.len() == 0)
            }
            _ => Value::new(true),
        }
    }

    /// Element count of containers, code point count of strings, 0 otherwise.
    pub fn len(&self) -> usize {
        match self.resolved() {
            Reflect::Scalar(Scalar::Str(s)) => s.chars().count(),
            Reflect::Map(map) => map.len(),
            Reflect::Sequence(seq) => seq.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn can_slice(&self) -> bool {
        matches!(
            self.resolved(),
            Reflect::Sequence(_) | Reflect::Scalar(Scalar::Str(_))
        )
    }

    /// Element `index` as a computed value.
    ///
    /// Unlike indexing inside a path this never fails: a sequence index past
    /// the end is nil and a string index past the end is the empty string.
    pub fn index(&self, index: usize) -> Value<'static> {
        match self.resolved() {
            Reflect::Sequence(seq) => seq
                .get(index)
                .map(|item| Value::from_boxed(item.clone_object()))
                .unwrap_or_else(Value::nil),
            Reflect::Scalar(Scalar::Str(s)) => Value::new(
                s.chars()
                    .nth(index)
                    .map(String::from)
                    .unwrap_or_default(),
            ),
            _ => Value::nil(),
        }
    }

    /// Elements `start..end` as a computed value, nil for an invalid range.
    pub fn slice(&self, start: usize, end: usize) -> Value<'static> {
        match self.resolved() {
            Reflect::Sequence(seq) => seq
                .slice(start, end)
                .map(Value::from_boxed)
                .unwrap_or_else(Value::nil),
            Reflect::Scalar(Scalar::Str(s)) => {
                let chars: Vec<char> = s.chars().collect();
                match chars.get(start..end) {
                    Some(part) => Value::new(part.iter().collect::<String>()),
                    None => Value::nil(),
                }
            }
            _ => Value::nil(),
        }
    }

    /// Field membership for structs, key membership for maps, substring for
    /// strings and element equality for sequences.
    pub fn contains(&self, other: &Value<'_>) -> bool {
        match self.resolved() {
            Reflect::Struct(fields) => {
                let name = normalize_identifier(&other.to_string());
                fields.field_names().contains(&name.as_str())
            }
            Reflect::Map(map) => match other.scalar() {
                Some(Scalar::Int(n)) => has_key(map, Key::Int(n as i128)),
                Some(Scalar::Uint(n)) => has_key(map, Key::Int(n as i128)),
                Some(Scalar::Str(s)) => has_key(map, Key::Text(s.to_string())),
                Some(Scalar::Bool(b)) => has_key(map, Key::Bool(b)),
                _ => false,
            },
            Reflect::Scalar(Scalar::Str(s)) => s.contains(other.to_string().as_str()),
            Reflect::Sequence(seq) => {
                let needle = other.resolved();
                (0..seq.len()).any(|i| {
                    seq.get(i)
                        .is_some_and(|item| reflect_equal(&needle, &resolve(item)))
                })
            }
            _ => false,
        }
    }

    /// Integers compare by numeric value whatever their width or signedness;
    /// everything else compares structurally.
    pub fn equal_value_to(&self, other: &Value<'_>) -> bool {
        if self.is_integer() && other.is_integer() {
            return integer_of(self.scalar()) == integer_of(other.scalar());
        }
        reflect_equal(&self.resolved(), &other.resolved())
    }

    /// Writes `value` into the location this value refers to.
    ///
    /// A [`Number`] is converted to the numeric type of the slot first. Map
    /// entries are written through their map. Any other value must have
    /// exactly the type of the slot (or of the value it points to).
    pub fn set_value<T: Object + Clone>(&mut self, value: T) -> Result<(), MutationError> {
        self.set_boxed(Box::new(value))
    }

    pub fn set_boxed(&mut self, value: Box<dyn Object>) -> Result<(), MutationError> {
        let field = self.path.clone();
        let number = value.as_ref().as_any().downcast_ref::<Number>().cloned();

        match &mut self.slot {
            Slot::Entry(setter) => {
                let (type_id, expected) = setter.map.value_type();
                let value = match number {
                    Some(number) => coerce(&number, type_id, expected, &field)?,
                    None => value,
                };
                setter
                    .map
                    .insert(setter.key.clone(), value)
                    .map_err(|rejected| MutationError::TypeMismatch {
                        field,
                        expected,
                        found: rejected.as_ref().type_name(),
                    })
            }
            Slot::Pending(setter) => {
                // The sequence is left untouched unless the write is accepted.
                let Some(mut element) = setter.sequence.new_element() else {
                    return Err(MutationError::NotSettable { field });
                };
                write(&mut *element, value, number, &field)?;
                if !setter.sequence.grow(setter.index.saturating_add(1)) {
                    return Err(MutationError::NotSettable { field });
                }
                match setter.sequence.get_mut(setter.index) {
                    Some(target) => write(target, element, None, &field),
                    None => Err(MutationError::NotSettable { field }),
                }
            }
            Slot::Borrowed(target) => write(&mut **target, value, number, &field),
            Slot::Owned(_) | Slot::Nil => Err(MutationError::NotSettable { field }),
        }
    }
}

/// Writes into an addressable slot: the slot's own type first, then the type it
/// points to.
fn write(
    target: &mut dyn Object,
    value: Box<dyn Object>,
    number: Option<Number>,
    field: &str,
) -> Result<(), MutationError> {
    if let Some(number) = number {
        let Some(target) = pointee_mut(target) else {
            return Err(MutationError::NotSettable {
                field: field.to_string(),
            });
        };
        let converted = coerce(
            &number,
            target.as_any().type_id(),
            target.type_name(),
            field,
        )?;
        let expected = target.type_name();
        return target
            .assign(converted)
            .map_err(|rejected| MutationError::TypeMismatch {
                field: field.to_string(),
                expected,
                found: rejected.as_ref().type_name(),
            });
    }

    let expected = target.type_name();
    let value = match target.assign(value) {
        Ok(()) => return Ok(()),
        Err(value) => value,
    };
    let found = value.as_ref().type_name();
    match pointee_mut(target) {
        Some(inner) => inner
            .assign(value)
            .map_err(|_| MutationError::TypeMismatch {
                field: field.to_string(),
                expected,
                found,
            }),
        None => Err(MutationError::TypeMismatch {
            field: field.to_string(),
            expected,
            found,
        }),
    }
}

fn coerce(
    number: &Number,
    type_id: std::any::TypeId,
    target: &'static str,
    field: &str,
) -> Result<Box<dyn Object>, MutationError> {
    number
        .coerce(type_id)
        .map_err(|reason| MutationError::Number {
            field: field.to_string(),
            literal: number.to_string(),
            target,
            reason,
        })
}

fn has_key(map: &dyn Map, key: Key) -> bool {
    map.coerce_key(&key)
        .is_some_and(|key| map.get(&key).is_some())
}

fn resolve(obj: &dyn Object) -> Reflect<'_> {
    pointee(obj).map(|o| o.reflect()).unwrap_or(Reflect::Nil)
}

fn integer_of(scalar: Option<Scalar<'_>>) -> Option<i128> {
    match scalar {
        Some(Scalar::Int(n)) => Some(n as i128),
        Some(Scalar::Uint(n)) => Some(n as i128),
        _ => None,
    }
}

fn scalar_equal(a: &Scalar<'_>, b: &Scalar<'_>) -> bool {
    match (a, b) {
        (Scalar::Bool(x), Scalar::Bool(y)) => x == y,
        (Scalar::Float(x), Scalar::Float(y)) => x == y,
        (Scalar::Str(x), Scalar::Str(y)) => x == y,
        _ => match (integer_of(Some(*a)), integer_of(Some(*b))) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
    }
}

/// Structural equality over reflected values, pointers compared by pointee.
fn reflect_equal(a: &Reflect<'_>, b: &Reflect<'_>) -> bool {
    match (a, b) {
        (Reflect::Nil, Reflect::Nil) => true,
        (Reflect::Scalar(x), Reflect::Scalar(y)) => scalar_equal(x, y),
        (Reflect::Struct(x), Reflect::Struct(y)) => {
            x.field_names() == y.field_names()
                && x.field_names().iter().all(|name| {
                    match (x.field(name), y.field(name)) {
                        (Some(fx), Some(fy)) => reflect_equal(&resolve(fx), &resolve(fy)),
                        _ => false,
                    }
                })
        }
        (Reflect::Map(x), Reflect::Map(y)) => {
            x.len() == y.len()
                && x.keys().into_iter().all(|key| {
                    match (x.get(&key), y.get(&key)) {
                        (Some(vx), Some(vy)) => reflect_equal(&resolve(vx), &resolve(vy)),
                        _ => false,
                    }
                })
        }
        (Reflect::Sequence(x), Reflect::Sequence(y)) => {
            x.len() == y.len()
                && (0..x.len()).all(|i| match (x.get(i), y.get(i)) {
                    (Some(ix), Some(iy)) => reflect_equal(&resolve(ix), &resolve(iy)),
                    _ => false,
                })
        }
        _ => false,
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.resolved() {
            Reflect::Nil => Ok(()),
            Reflect::Scalar(Scalar::Str(s)) => f.write_str(s),
            Reflect::Scalar(Scalar::Int(n)) => write!(f, "{}", n),
            Reflect::Scalar(Scalar::Uint(n)) => write!(f, "{}", n),
            Reflect::Scalar(Scalar::Float(x)) => write!(f, "{:.6}", x),
            Reflect::Scalar(Scalar::Bool(true)) => f.write_str("True"),
            Reflect::Scalar(Scalar::Bool(false)) => f.write_str("False"),
            _ => match self.object().and_then(pointee) {
                Some(obj) => write!(f, "{:?}", obj),
                None => Ok(()),
            },
        }
    }
}

impl fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = match &self.slot {
            Slot::Nil => "nil",
            Slot::Borrowed(_) => "borrowed",
            Slot::Owned(_) => "owned",
            Slot::Entry(_) => "entry",
            Slot::Pending(_) => "pending",
        };
        f.debug_struct("Value")
            .field("path", &self.path)
            .field("slot", &slot)
            .field("object", &self.object())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_display_formats() {
        assert_eq!(Value::new(1.5_f64).to_string(), "1.500000");
        assert_eq!(Value::new(true).to_string(), "True");
        assert_eq!(Value::new(-3_i8).to_string(), "-3");
        assert_eq!(Value::nil().to_string(), "");
    }

    #[test]
    fn test_pointer_is_dereferenced_for_inspection() {
        let v = Value::new(Some(Box::new(5_u16)));
        assert!(v.is_integer());
        assert_eq!(v.as_integer(), 5);

        let nil = Value::new(None::<Box<u16>>);
        assert!(nil.is_nil());
    }

    #[test]
    fn test_owned_values_are_not_settable() {
        let mut v = Value::new(1_i64);
        assert!(matches!(
            v.set_value(2_i64),
            Err(MutationError::NotSettable { .. })
        ));
    }

    #[test]
    fn test_borrowed_slot_requires_exact_type() {
        let mut slot = 1_i64;
        {
            let mut v = Value::borrowed(&mut slot).at("Slot");
            assert!(matches!(
                v.set_value(2_i32),
                Err(MutationError::TypeMismatch { .. })
            ));
            v.set_value(2_i64).unwrap();
        }
        assert_eq!(slot, 2);
    }

    #[test]
    fn test_boxed_slot_accepts_pointee_type() {
        let mut slot = Box::new("a".to_string());
        Value::borrowed(&mut slot)
            .set_value("b".to_string())
            .unwrap();
        assert_eq!(*slot, "b");
    }

    #[test]
    fn test_entry_converts_number_to_value_type() {
        let mut map: HashMap<String, u8> = HashMap::new();
        Value::entry(&mut map, Key::Text("a".to_string()))
            .set_value(Number::new("7"))
            .unwrap();
        assert_eq!(map["a"], 7);

        let err = Value::entry(&mut map, Key::Text("b".to_string()))
            .set_value(Number::new("700"))
            .unwrap_err();
        assert!(matches!(
            err,
            MutationError::Number {
                reason: NumberError::Overflow,
                ..
            }
        ));
    }

    #[test]
    fn test_pending_grows_sequence() {
        let mut list = vec![1_i64];
        Value::pending(&mut list, 3).set_value(4_i64).unwrap();
        assert_eq!(list, vec![1, 0, 0, 4]);
    }

    #[test]
    fn test_rejected_pending_write_leaves_sequence_alone() {
        let mut list = vec![1_i64];
        let err = Value::pending(&mut list, 3)
            .set_value("4".to_string())
            .unwrap_err();
        assert!(matches!(err, MutationError::TypeMismatch { expected: "i64", .. }));

        let err = Value::pending(&mut list, 3)
            .set_value(Number::new("4.5"))
            .unwrap_err();
        assert!(matches!(
            err,
            MutationError::Number {
                reason: NumberError::NotIntegral,
                ..
            }
        ));
        assert_eq!(list, vec![1]);
    }

    #[test]
    fn test_pending_write_past_addressable_memory() {
        let mut list = vec![1_i64];
        let err = Value::pending(&mut list, usize::MAX - 1)
            .set_value(2_i64)
            .unwrap_err();
        assert!(matches!(err, MutationError::NotSettable { .. }));
        assert_eq!(list, vec![1]);
    }
}
