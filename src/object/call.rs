use std::{any::TypeId, fmt};

use thiserror::Error;

use super::{Kind, Object, Reflect, Scalar};

/// Failure raised by a host method, or while unpacking its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    #[error("no method named '{0}'")]
    NoSuchMethod(String),

    #[error("argument {index} is missing")]
    MissingArgument { index: usize },

    #[error("argument {index} must be of type {expected} (not {found})")]
    ArgumentType {
        index: usize,
        expected: String,
        found: &'static str,
    },

    #[error("{0}")]
    Failed(String),
}

/// Accepted type of one method parameter.
#[derive(Clone)]
pub enum Param {
    /// Exactly this type
    Exact {
        type_id: TypeId,
        type_name: &'static str,
    },

    /// Any value at all
    Any,

    /// Any value passing `check`, described by `name`
    Satisfies {
        name: &'static str,
        check: fn(&dyn Object) -> bool,
    },
}

impl Param {
    pub fn of<T: Object + Clone>() -> Self {
        Param::Exact {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Any signed or unsigned integer type.
    pub fn integer() -> Self {
        Param::Satisfies {
            name: "integer",
            check: |arg| matches!(arg.kind(), Kind::Int | Kind::Uint),
        }
    }

    pub fn accepts(&self, arg: &dyn Object) -> bool {
        match self {
            Param::Exact { type_id, .. } => arg.as_any().type_id() == *type_id,
            Param::Any => true,
            Param::Satisfies { check, .. } => check(arg),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Param::Exact { type_name, .. } => type_name.to_string(),
            Param::Any => "any".to_string(),
            Param::Satisfies { name, .. } => name.to_string(),
        }
    }
}

impl fmt::Debug for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Param({})", self.describe())
    }
}

/// Shape of a callable method: parameter types, variadic flag and result count.
///
/// The last parameter of a variadic signature types every trailing argument.
/// Only signatures with exactly one result can be used inside a path.
#[derive(Debug, Clone)]
pub struct Signature {
    pub params: Vec<Param>,
    pub variadic: bool,
    pub results: usize,
}

impl Signature {
    pub fn new(params: impl IntoIterator<Item = Param>) -> Self {
        Signature {
            params: params.into_iter().collect(),
            variadic: false,
            results: 1,
        }
    }

    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    pub fn results(mut self, results: usize) -> Self {
        self.results = results;
        self
    }

    /// Whether `count` arguments fit this signature.
    pub fn accepts_count(&self, count: usize) -> bool {
        let arity = self.params.len();
        count == arity || (self.variadic && count + 1 >= arity)
    }

    /// Parameter type for argument `index`.
    pub fn param(&self, index: usize) -> Option<&Param> {
        match self.params.len() {
            0 => None,
            n if self.variadic && index >= n - 1 => self.params.last(),
            _ => self.params.get(index),
        }
    }
}

/// Evaluated call arguments, handed to [`Object::call`].
#[derive(Debug, Default)]
pub struct Args {
    values: Vec<Option<Box<dyn Object>>>,
}

impl Args {
    pub fn new(values: Vec<Box<dyn Object>>) -> Self {
        Args {
            values: values.into_iter().map(Some).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&dyn Object> {
        self.values.get(index).and_then(|v| v.as_deref())
    }

    /// Moves argument `index` out as a boxed object.
    pub fn take_object(&mut self, index: usize) -> Result<Box<dyn Object>, CallError> {
        self.values
            .get_mut(index)
            .and_then(Option::take)
            .ok_or(CallError::MissingArgument { index })
    }

    /// Moves argument `index` out as a `T`.
    pub fn take<T: Object + Clone>(&mut self, index: usize) -> Result<T, CallError> {
        let value = self.take_object(index)?;
        let found = value.as_ref().type_name();
        value
            .into_any()
            .downcast::<T>()
            .map(|v| *v)
            .map_err(|_| CallError::ArgumentType {
                index,
                expected: std::any::type_name::<T>().to_string(),
                found,
            })
    }

    /// Reads argument `index` as an integer of any width.
    pub fn integer(&self, index: usize) -> Result<i128, CallError> {
        let arg = self.get(index).ok_or(CallError::MissingArgument { index })?;
        match arg.reflect() {
            Reflect::Scalar(Scalar::Int(n)) => Ok(n as i128),
            Reflect::Scalar(Scalar::Uint(n)) => Ok(n as i128),
            _ => Err(CallError::ArgumentType {
                index,
                expected: "integer".to_string(),
                found: arg.type_name(),
            }),
        }
    }

    /// Moves every argument from `start` on out as a `T`.
    pub fn rest<T: Object + Clone>(&mut self, start: usize) -> Result<Vec<T>, CallError> {
        (start..self.len()).map(|i| self.take(i)).collect()
    }
}

/// Result of a method call.
pub enum Returned<'a> {
    /// A location inside the receiver; stays writable
    Borrowed(&'a mut dyn Object),

    /// A computed value; readable only
    Owned(Box<dyn Object>),

    Nil,
}

impl Returned<'_> {
    pub fn owned<T: Object + Clone>(value: T) -> Self {
        Returned::Owned(Box::new(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variadic_arity() {
        let sig = Signature::new([Param::of::<String>(), Param::Any]).variadic();
        assert!(sig.accepts_count(1));
        assert!(sig.accepts_count(4));
        assert!(!sig.accepts_count(0));
        assert_eq!(sig.param(3).map(Param::describe), Some("any".to_string()));
    }

    #[test]
    fn test_fixed_arity() {
        let sig = Signature::new([Param::of::<i64>()]);
        assert!(sig.accepts_count(1));
        assert!(!sig.accepts_count(2));
        assert!(sig.param(1).is_none());
    }

    #[test]
    fn test_take_with_wrong_type() {
        let mut args = Args::new(vec![Box::new(3_i32)]);
        assert!(matches!(
            args.take::<i64>(0),
            Err(CallError::ArgumentType { index: 0, .. })
        ));
        assert_eq!(args.take::<i64>(0), Err(CallError::MissingArgument { index: 0 }));
    }

    #[test]
    fn test_integer_capability() {
        let args = Args::new(vec![Box::new(7_u8), Box::new("x".to_string())]);
        assert!(Param::integer().accepts(args.get(0).unwrap()));
        assert_eq!(args.integer(0), Ok(7));
        assert!(args.integer(1).is_err());
    }
}
