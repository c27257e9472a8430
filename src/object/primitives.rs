use super::{Object, Reflect, ReflectMut, Scalar};

macro_rules! scalar_object {
    ($variant:ident as $wide:ty => $($ty:ty),+) => {
        $(
            impl Object for $ty {
                fn reflect(&self) -> Reflect<'_> {
                    Reflect::Scalar(Scalar::$variant(*self as $wide))
                }

                fn reflect_mut(&mut self) -> ReflectMut<'_> {
                    ReflectMut::Leaf
                }
            }
        )+
    };
}

scalar_object!(Int as i64 => i8, i16, i32, i64, isize);
scalar_object!(Uint as u64 => u8, u16, u32, u64, usize);
scalar_object!(Float as f64 => f32, f64);

impl Object for bool {
    fn reflect(&self) -> Reflect<'_> {
        Reflect::Scalar(Scalar::Bool(*self))
    }

    fn reflect_mut(&mut self) -> ReflectMut<'_> {
        ReflectMut::Leaf
    }
}

impl Object for String {
    fn reflect(&self) -> Reflect<'_> {
        Reflect::Scalar(Scalar::Str(self))
    }

    fn reflect_mut(&mut self) -> ReflectMut<'_> {
        ReflectMut::Leaf
    }
}

impl Object for () {
    fn reflect(&self) -> Reflect<'_> {
        Reflect::Nil
    }

    fn reflect_mut(&mut self) -> ReflectMut<'_> {
        ReflectMut::Leaf
    }
}

// Pointers forward methods to their pointee, the way a method set of a pointer
// includes the methods of the value it points to.

impl<T: Object + Clone> Object for Box<T> {
    fn reflect(&self) -> Reflect<'_> {
        Reflect::Pointer(Some(self.as_ref()))
    }

    fn reflect_mut(&mut self) -> ReflectMut<'_> {
        ReflectMut::Pointer(Some(self.as_mut()))
    }

    fn method(&self, name: &str) -> Option<super::Signature> {
        self.as_ref().method(name)
    }

    fn call(&mut self, name: &str, args: super::Args) -> Result<super::Returned<'_>, super::CallError> {
        self.as_mut().call(name, args)
    }
}

impl<T: Object + Clone> Object for Option<T> {
    fn reflect(&self) -> Reflect<'_> {
        Reflect::Pointer(self.as_ref().map(|v| v as &dyn Object))
    }

    fn reflect_mut(&mut self) -> ReflectMut<'_> {
        ReflectMut::Pointer(self.as_mut().map(|v| v as &mut dyn Object))
    }

    fn method(&self, name: &str) -> Option<super::Signature> {
        self.as_ref().and_then(|v| v.method(name))
    }

    fn call(&mut self, name: &str, args: super::Args) -> Result<super::Returned<'_>, super::CallError> {
        match self {
            Some(v) => v.call(name, args),
            None => Err(super::CallError::NoSuchMethod(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{Erased, Kind, pointee};

    #[test]
    fn test_scalar_kinds() {
        assert_eq!(3_u8.kind(), Kind::Uint);
        assert_eq!((-3_i16).kind(), Kind::Int);
        assert_eq!(1.5_f32.kind(), Kind::Float);
        assert_eq!("x".to_string().kind(), Kind::String);
    }

    #[test]
    fn test_assign_requires_exact_type() {
        let mut slot = 5_i64;
        assert!(slot.assign(Box::new(7_i32)).is_err());
        assert!(slot.assign(Box::new(7_i64)).is_ok());
        assert_eq!(slot, 7);
    }

    #[test]
    fn test_pointee_follows_nested_pointers() {
        let value: Option<Box<String>> = Some(Box::new("inner".to_string()));
        let target = pointee(&value).unwrap();
        assert_eq!(target.type_name(), "alloc::string::String");

        let nil: Option<Box<String>> = None;
        assert!(pointee(&nil).is_none());
    }
}
