//! Untyped numeric literals and their conversion to concrete numeric slots.
//!
//! A [`Number`] carries the decimal text of a number whose target type is not
//! known yet (for example a number decoded from a JSON patch document). When it
//! is written into a slot it is converted to the slot's own numeric type, with
//! range checks.
use std::{any::TypeId, fmt, str::FromStr};

use rust_decimal::{Decimal, prelude::ToPrimitive};
use thiserror::Error;

use crate::object::{Object, Reflect, ReflectMut};

/// Why a [`Number`] could not be converted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NumberError {
    #[error("not a valid number")]
    Invalid,

    #[error("value out of range")]
    Overflow,

    #[error("not an integer")]
    NotIntegral,

    #[error("not a numeric type")]
    Unsupported,
}

/// A numeric literal in decimal text form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Number(String);

impl Number {
    pub fn new(text: impl Into<String>) -> Self {
        Number(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Converts the literal into a value of the type identified by `type_id`.
    ///
    /// Supported targets are the primitive integer and float types and
    /// `serde_json::Value`.
    pub fn coerce(&self, type_id: TypeId) -> Result<Box<dyn Object>, NumberError> {
        if type_id == TypeId::of::<serde_json::Value>() {
            let number = serde_json::Number::from_str(self.0.trim()).map_err(|_| NumberError::Invalid)?;
            return Ok(Box::new(serde_json::Value::Number(number)));
        }
        let kind = NumberKind::of_type_id(type_id).ok_or(NumberError::Unsupported)?;
        kind.convert(self.0.trim())
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<serde_json::Number> for Number {
    fn from(n: serde_json::Number) -> Self {
        Number(n.to_string())
    }
}

impl FromStr for Number {
    type Err = NumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<f64>().map_err(|_| NumberError::Invalid)?;
        Ok(Number(s.trim().to_string()))
    }
}

/// The carrier itself is opaque; it only becomes a number once written.
impl Object for Number {
    fn reflect(&self) -> Reflect<'_> {
        Reflect::Opaque
    }

    fn reflect_mut(&mut self) -> ReflectMut<'_> {
        ReflectMut::Leaf
    }
}

/// Numeric primitive a [`Number`] can be converted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberKind {
    I8,
    I16,
    I32,
    I64,
    Isize,
    U8,
    U16,
    U32,
    U64,
    Usize,
    F32,
    F64,
}

const KINDS: &[NumberKind] = &[
    NumberKind::I8,
    NumberKind::I16,
    NumberKind::I32,
    NumberKind::I64,
    NumberKind::Isize,
    NumberKind::U8,
    NumberKind::U16,
    NumberKind::U32,
    NumberKind::U64,
    NumberKind::Usize,
    NumberKind::F32,
    NumberKind::F64,
];

impl NumberKind {
    pub fn of_type_id(type_id: TypeId) -> Option<Self> {
        KINDS.iter().copied().find(|k| k.target_type_id() == type_id)
    }

    pub fn target_type_id(&self) -> TypeId {
        match self {
            NumberKind::I8 => TypeId::of::<i8>(),
            NumberKind::I16 => TypeId::of::<i16>(),
            NumberKind::I32 => TypeId::of::<i32>(),
            NumberKind::I64 => TypeId::of::<i64>(),
            NumberKind::Isize => TypeId::of::<isize>(),
            NumberKind::U8 => TypeId::of::<u8>(),
            NumberKind::U16 => TypeId::of::<u16>(),
            NumberKind::U32 => TypeId::of::<u32>(),
            NumberKind::U64 => TypeId::of::<u64>(),
            NumberKind::Usize => TypeId::of::<usize>(),
            NumberKind::F32 => TypeId::of::<f32>(),
            NumberKind::F64 => TypeId::of::<f64>(),
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, NumberKind::F32 | NumberKind::F64)
    }

    fn convert(&self, text: &str) -> Result<Box<dyn Object>, NumberError> {
        if self.is_float() {
            return self.convert_float(text);
        }

        let decimal = Decimal::from_str_exact(text).map_err(|_| NumberError::Invalid)?;
        if !decimal.is_integer() {
            return Err(NumberError::NotIntegral);
        }

        fn boxed<T: Object + Clone>(value: Option<T>) -> Result<Box<dyn Object>, NumberError> {
            value
                .map(|v| Box::new(v) as Box<dyn Object>)
                .ok_or(NumberError::Overflow)
        }

        match self {
            NumberKind::I8 => boxed(decimal.to_i8()),
            NumberKind::I16 => boxed(decimal.to_i16()),
            NumberKind::I32 => boxed(decimal.to_i32()),
            NumberKind::I64 => boxed(decimal.to_i64()),
            NumberKind::Isize => boxed(decimal.to_isize()),
            NumberKind::U8 => boxed(decimal.to_u8()),
            NumberKind::U16 => boxed(decimal.to_u16()),
            NumberKind::U32 => boxed(decimal.to_u32()),
            NumberKind::U64 => boxed(decimal.to_u64()),
            NumberKind::Usize => boxed(decimal.to_usize()),
            NumberKind::F32 | NumberKind::F64 => Err(NumberError::Unsupported),
        }
    }

    fn convert_float(&self, text: &str) -> Result<Box<dyn Object>, NumberError> {
        let value = text.parse::<f64>().map_err(|_| NumberError::Invalid)?;
        if !value.is_finite() {
            return Err(NumberError::Overflow);
        }
        match self {
            NumberKind::F32 if value.abs() > f32::MAX as f64 => Err(NumberError::Overflow),
            NumberKind::F32 => Ok(Box::new(value as f32)),
            _ => Ok(Box::new(value)),
        }
    }
}

impl fmt::Display for NumberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NumberKind::I8 => "i8",
            NumberKind::I16 => "i16",
            NumberKind::I32 => "i32",
            NumberKind::I64 => "i64",
            NumberKind::Isize => "isize",
            NumberKind::U8 => "u8",
            NumberKind::U16 => "u16",
            NumberKind::U32 => "u32",
            NumberKind::U64 => "u64",
            NumberKind::Usize => "usize",
            NumberKind::F32 => "f32",
            NumberKind::F64 => "f64",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coerce<T: Object + Clone + Copy>(text: &str) -> Result<T, NumberError> {
        let boxed = Number::new(text).coerce(TypeId::of::<T>())?;
        Ok(*boxed.as_ref().as_any().downcast_ref::<T>().unwrap())
    }

    #[test]
    fn test_integer_targets() {
        assert_eq!(coerce::<i64>("42"), Ok(42));
        assert_eq!(coerce::<i8>("-128"), Ok(-128));
        assert_eq!(coerce::<u32>("4000000000"), Ok(4_000_000_000));
    }

    #[test]
    fn test_integer_overflow() {
        assert_eq!(coerce::<u8>("300"), Err(NumberError::Overflow));
        assert_eq!(coerce::<u16>("-1"), Err(NumberError::Overflow));
        assert_eq!(coerce::<i8>("128"), Err(NumberError::Overflow));
    }

    #[test]
    fn test_fraction_into_integer() {
        assert_eq!(coerce::<i32>("1.5"), Err(NumberError::NotIntegral));
        assert_eq!(coerce::<i32>("2.0"), Ok(2));
    }

    #[test]
    fn test_float_targets() {
        assert_eq!(coerce::<f64>("1.25"), Ok(1.25));
        assert_eq!(coerce::<f32>("0.5"), Ok(0.5));
        assert_eq!(coerce::<f32>("1e39"), Err(NumberError::Overflow));
        assert_eq!(coerce::<f64>("abc"), Err(NumberError::Invalid));
    }

    #[test]
    fn test_unsupported_target() {
        assert!(matches!(
            Number::new("1").coerce(TypeId::of::<String>()),
            Err(NumberError::Unsupported)
        ));
    }

    #[test]
    fn test_json_target() {
        let boxed = Number::new("7").coerce(TypeId::of::<serde_json::Value>()).unwrap();
        let json = boxed.as_ref().as_any().downcast_ref::<serde_json::Value>().unwrap();
        assert_eq!(json, &serde_json::json!(7));
    }
}
