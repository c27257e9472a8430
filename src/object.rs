//! Accessor layer over host object graphs.
//!
//! The engine never inspects host types directly. Every type that can appear in a
//! patched graph implements [`Object`], which exposes a tagged capability view:
//!
//! - **[`Reflect`]** - shared view used for reading and inspection
//! - **[`ReflectMut`]** - mutable view used while walking towards a writable slot
//!
//! Capabilities are a small closed set: scalar, [`Struct`], [`Map`], [`Sequence`],
//! pointer (`Box`/`Option`), plus the callable capability provided by
//! [`Object::method`] and [`Object::call`].
//!
//! Implementations are provided for primitives, `String`, `Box`, `Option`, `Vec`,
//! arrays, `HashMap`, `BTreeMap` and `serde_json::Value`. Host structs usually only
//! need [`impl_struct!`](crate::impl_struct).
//!
//! # Examples
//!
//! ```
//! use objpath::impl_struct;
//!
//! #[derive(Debug, Clone, Default)]
//! struct Image {
//!     content: String,
//! }
//!
//! impl_struct!(Image { "Content" => content });
//! ```
use std::{
    any::{Any, TypeId},
    fmt,
};

mod call;
mod containers;
mod json;
mod primitives;

pub use call::{Args, CallError, Param, Returned, Signature};
pub use containers::MapKey;

/// Runtime kind of a reflected value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Nil,
    Bool,
    Int,
    Uint,
    Float,
    String,
    Struct,
    Map,
    Sequence,
    Pointer,
    Opaque,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Nil => "nil",
            Kind::Bool => "bool",
            Kind::Int => "int",
            Kind::Uint => "uint",
            Kind::Float => "float",
            Kind::String => "string",
            Kind::Struct => "struct",
            Kind::Map => "map",
            Kind::Sequence => "sequence",
            Kind::Pointer => "pointer",
            Kind::Opaque => "opaque",
        };
        f.write_str(name)
    }
}

/// A scalar read out of an object.
///
/// Integer widths are widened; the exact type of the slot stays available through
/// [`Erased::type_name`] and [`Erased::as_any`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar<'a> {
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Str(&'a str),
}

impl Scalar<'_> {
    pub fn kind(&self) -> Kind {
        match self {
            Scalar::Bool(_) => Kind::Bool,
            Scalar::Int(_) => Kind::Int,
            Scalar::Uint(_) => Kind::Uint,
            Scalar::Float(_) => Kind::Float,
            Scalar::Str(_) => Kind::String,
        }
    }
}

/// Shared capability view of an object.
pub enum Reflect<'a> {
    Nil,
    Scalar(Scalar<'a>),
    Struct(&'a dyn Struct),
    Map(&'a dyn Map),
    Sequence(&'a dyn Sequence),
    /// `None` is a nil pointer
    Pointer(Option<&'a dyn Object>),
    Opaque,
}

impl Reflect<'_> {
    pub fn kind(&self) -> Kind {
        match self {
            Reflect::Nil => Kind::Nil,
            Reflect::Scalar(s) => s.kind(),
            Reflect::Struct(_) => Kind::Struct,
            Reflect::Map(_) => Kind::Map,
            Reflect::Sequence(_) => Kind::Sequence,
            Reflect::Pointer(_) => Kind::Pointer,
            Reflect::Opaque => Kind::Opaque,
        }
    }
}

/// Mutable capability view of an object.
///
/// Scalars, nil and opaque values are leaves: they are only ever replaced as a
/// whole through [`Erased::assign`].
pub enum ReflectMut<'a> {
    Leaf,
    Struct(&'a mut dyn Struct),
    Map(&'a mut dyn Map),
    Sequence(&'a mut dyn Sequence),
    Pointer(Option<&'a mut dyn Object>),
}

/// A value that can take part in path resolution.
pub trait Object: Erased + fmt::Debug {
    fn reflect(&self) -> Reflect<'_>;

    /// Must report the same capability as [`Object::reflect`].
    fn reflect_mut(&mut self) -> ReflectMut<'_>;

    /// Signature of the method called `name`, if the type exposes one.
    ///
    /// Consulted before pointers are dereferenced.
    fn method(&self, name: &str) -> Option<Signature> {
        let _ = name;
        None
    }

    /// Invokes a method previously advertised by [`Object::method`].
    ///
    /// Arguments are already checked against the signature.
    fn call(&mut self, name: &str, args: Args) -> Result<Returned<'_>, CallError> {
        let _ = args;
        Err(CallError::NoSuchMethod(name.to_string()))
    }

    fn kind(&self) -> Kind {
        self.reflect().kind()
    }
}

/// Type-erased operations, implemented for every `Object + Clone`.
pub trait Erased: Any {
    fn type_name(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    fn clone_object(&self) -> Box<dyn Object>;

    /// Replaces `self` with `value` if both have exactly the same type.
    ///
    /// On mismatch the value is handed back untouched.
    fn assign(&mut self, value: Box<dyn Object>) -> Result<(), Box<dyn Object>>;
}

impl<T: Object + Clone> Erased for T {
    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn clone_object(&self) -> Box<dyn Object> {
        Box::new(self.clone())
    }

    fn assign(&mut self, value: Box<dyn Object>) -> Result<(), Box<dyn Object>> {
        if value.as_ref().as_any().type_id() != TypeId::of::<T>() {
            return Err(value);
        }
        if let Ok(value) = value.into_any().downcast::<T>() {
            *self = *value;
        }
        Ok(())
    }
}

/// Struct-like capability: named fields.
///
/// Names are the normalized identifiers of the path language (first letter
/// upper-cased).
pub trait Struct {
    fn field_names(&self) -> &'static [&'static str];

    fn field(&self, name: &str) -> Option<&dyn Object>;

    fn field_mut(&mut self, name: &str) -> Option<&mut dyn Object>;
}

/// Key of a map entry as seen by the engine.
///
/// Each map converts incoming keys to its declared key type with
/// [`Map::coerce_key`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Text(String),
    Int(i128),
    Bool(bool),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Text(s) => f.write_str(s),
            Key::Int(n) => write!(f, "{}", n),
            Key::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// Map-like capability: keyed entries that are written through the map.
pub trait Map {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn keys(&self) -> Vec<Key>;

    /// Converts `key` to the map's declared key type, or `None` if impossible.
    fn coerce_key(&self, key: &Key) -> Option<Key>;

    fn get(&self, key: &Key) -> Option<&dyn Object>;

    fn get_mut(&mut self, key: &Key) -> Option<&mut dyn Object>;

    /// Inserts or replaces an entry. A value of the wrong type is handed back.
    fn insert(&mut self, key: Key, value: Box<dyn Object>) -> Result<(), Box<dyn Object>>;

    /// Identity and name of the declared value type.
    fn value_type(&self) -> (TypeId, &'static str);
}

/// Sequence-like capability: indexed elements.
pub trait Sequence {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, index: usize) -> Option<&dyn Object>;

    fn get_mut(&mut self, index: usize) -> Option<&mut dyn Object>;

    /// Owned copy of `start..end`, or `None` for an invalid range.
    fn slice(&self, start: usize, end: usize) -> Option<Box<dyn Object>>;

    /// A default element, detached from the sequence. `None` for fixed-size
    /// sequences.
    fn new_element(&self) -> Option<Box<dyn Object>> {
        None
    }

    /// Grows the sequence to at least `len` default elements.
    ///
    /// Returns false for fixed-size sequences or when the memory can't be
    /// reserved.
    fn grow(&mut self, len: usize) -> bool {
        let _ = len;
        false
    }
}

/// Follows pointers until a non-pointer value, or `None` at a nil pointer.
pub fn pointee(mut obj: &dyn Object) -> Option<&dyn Object> {
    loop {
        match obj.reflect() {
            Reflect::Pointer(Some(inner)) => obj = inner,
            Reflect::Pointer(None) => return None,
            _ => return Some(obj),
        }
    }
}

/// Mutable counterpart of [`pointee`].
pub fn pointee_mut(mut obj: &mut dyn Object) -> Option<&mut dyn Object> {
    while obj.kind() == Kind::Pointer {
        match obj.reflect_mut() {
            ReflectMut::Pointer(Some(inner)) => obj = inner,
            _ => return None,
        }
    }
    Some(obj)
}

/// Implements [`Struct`] (and by default [`Object`]) for a struct by mapping
/// normalized field names to fields.
///
/// Use the `fields` form when the type provides its own [`Object`] impl, e.g. to
/// expose methods.
///
/// ```
/// use objpath::impl_struct;
/// use objpath::object::{Object, Reflect, ReflectMut};
///
/// #[derive(Debug, Clone, Default)]
/// struct Comment {
///     nick_name: String,
/// }
///
/// impl_struct!(fields Comment { "NickName" => nick_name });
///
/// impl Object for Comment {
///     fn reflect(&self) -> Reflect<'_> {
///         Reflect::Struct(self)
///     }
///
///     fn reflect_mut(&mut self) -> ReflectMut<'_> {
///         ReflectMut::Struct(self)
///     }
/// }
/// ```
#[macro_export]
macro_rules! impl_struct {
    (fields $ty:ty { $($name:literal => $field:ident),* $(,)? }) => {
        impl $crate::object::Struct for $ty {
            fn field_names(&self) -> &'static [&'static str] {
                &[$($name),*]
            }

            #[allow(unreachable_patterns)]
            fn field(&self, name: &str) -> Option<&dyn $crate::object::Object> {
                match name {
                    $($name => Some(&self.$field),)*
                    _ => None,
                }
            }

            #[allow(unreachable_patterns)]
            fn field_mut(&mut self, name: &str) -> Option<&mut dyn $crate::object::Object> {
                match name {
                    $($name => Some(&mut self.$field),)*
                    _ => None,
                }
            }
        }
    };
    ($ty:ty { $($name:literal => $field:ident),* $(,)? }) => {
        $crate::impl_struct!(fields $ty { $($name => $field),* });

        impl $crate::object::Object for $ty {
            fn reflect(&self) -> $crate::object::Reflect<'_> {
                $crate::object::Reflect::Struct(self)
            }

            fn reflect_mut(&mut self) -> $crate::object::ReflectMut<'_> {
                $crate::object::ReflectMut::Struct(self)
            }
        }
    };
}
