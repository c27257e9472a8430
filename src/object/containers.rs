use std::{
    any::TypeId,
    collections::{BTreeMap, HashMap},
    fmt,
    hash::Hash,
};

use super::{Key, Map, Object, Reflect, ReflectMut, Sequence};

/// A type usable as the key of a reflected map.
///
/// `from_key` converts an engine [`Key`] into the declared key type; it returns
/// `None` when no sensible conversion exists.
pub trait MapKey: Sized {
    fn from_key(key: &Key) -> Option<Self>;

    fn to_key(&self) -> Key;
}

impl MapKey for String {
    fn from_key(key: &Key) -> Option<Self> {
        Some(key.to_string())
    }

    fn to_key(&self) -> Key {
        Key::Text(self.clone())
    }
}

impl MapKey for bool {
    fn from_key(key: &Key) -> Option<Self> {
        match key {
            Key::Bool(b) => Some(*b),
            Key::Text(s) => s.parse().ok(),
            Key::Int(_) => None,
        }
    }

    fn to_key(&self) -> Key {
        Key::Bool(*self)
    }
}

macro_rules! integer_key {
    ($($ty:ty),+) => {
        $(
            impl MapKey for $ty {
                fn from_key(key: &Key) -> Option<Self> {
                    match key {
                        Key::Int(n) => <$ty>::try_from(*n).ok(),
                        Key::Text(s) => s.trim().parse().ok(),
                        Key::Bool(_) => None,
                    }
                }

                fn to_key(&self) -> Key {
                    Key::Int(*self as i128)
                }
            }
        )+
    };
}

integer_key!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

// `T: Default` is only needed to pad the vector on `IndexPolicy::Extend` writes.
impl<T: Object + Clone + Default> Object for Vec<T> {
    fn reflect(&self) -> Reflect<'_> {
        Reflect::Sequence(self)
    }

    fn reflect_mut(&mut self) -> ReflectMut<'_> {
        ReflectMut::Sequence(self)
    }
}

impl<T: Object + Clone + Default> Sequence for Vec<T> {
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn get(&self, index: usize) -> Option<&dyn Object> {
        self.as_slice().get(index).map(|v| v as &dyn Object)
    }

    fn get_mut(&mut self, index: usize) -> Option<&mut dyn Object> {
        self.as_mut_slice()
            .get_mut(index)
            .map(|v| v as &mut dyn Object)
    }

    fn slice(&self, start: usize, end: usize) -> Option<Box<dyn Object>> {
        let part = self.as_slice().get(start..end)?;
        Some(Box::new(part.to_vec()))
    }

    fn new_element(&self) -> Option<Box<dyn Object>> {
        Some(Box::new(T::default()))
    }

    fn grow(&mut self, len: usize) -> bool {
        let missing = len.saturating_sub(self.as_slice().len());
        if missing > 0 {
            if self.try_reserve_exact(missing).is_err() {
                return false;
            }
            self.resize_with(len, T::default);
        }
        true
    }
}

impl<T: Object + Clone, const N: usize> Object for [T; N] {
    fn reflect(&self) -> Reflect<'_> {
        Reflect::Sequence(self)
    }

    fn reflect_mut(&mut self) -> ReflectMut<'_> {
        ReflectMut::Sequence(self)
    }
}

impl<T: Object + Clone, const N: usize> Sequence for [T; N] {
    fn len(&self) -> usize {
        N
    }

    fn get(&self, index: usize) -> Option<&dyn Object> {
        self.as_slice().get(index).map(|v| v as &dyn Object)
    }

    fn get_mut(&mut self, index: usize) -> Option<&mut dyn Object> {
        self.as_mut_slice()
            .get_mut(index)
            .map(|v| v as &mut dyn Object)
    }

    fn slice(&self, start: usize, end: usize) -> Option<Box<dyn Object>> {
        let part = self.as_slice().get(start..end)?;
        Some(Box::new(part.to_vec()))
    }
}

impl<K, V> Object for HashMap<K, V>
where
    K: MapKey + Eq + Hash + Clone + fmt::Debug + 'static,
    V: Object + Clone,
{
    fn reflect(&self) -> Reflect<'_> {
        Reflect::Map(self)
    }

    fn reflect_mut(&mut self) -> ReflectMut<'_> {
        ReflectMut::Map(self)
    }
}

impl<K, V> Map for HashMap<K, V>
where
    K: MapKey + Eq + Hash + Clone + fmt::Debug + 'static,
    V: Object + Clone,
{
    fn len(&self) -> usize {
        HashMap::len(self)
    }

    fn keys(&self) -> Vec<Key> {
        HashMap::keys(self).map(MapKey::to_key).collect()
    }

    fn coerce_key(&self, key: &Key) -> Option<Key> {
        K::from_key(key).map(|k| k.to_key())
    }

    fn get(&self, key: &Key) -> Option<&dyn Object> {
        let key = K::from_key(key)?;
        HashMap::get(self, &key).map(|v| v as &dyn Object)
    }

    fn get_mut(&mut self, key: &Key) -> Option<&mut dyn Object> {
        let key = K::from_key(key)?;
        HashMap::get_mut(self, &key).map(|v| v as &mut dyn Object)
    }

    fn insert(&mut self, key: Key, value: Box<dyn Object>) -> Result<(), Box<dyn Object>> {
        let Some(key) = K::from_key(&key) else {
            return Err(value);
        };
        let value = downcast_value::<V>(value)?;
        HashMap::insert(self, key, value);
        Ok(())
    }

    fn value_type(&self) -> (TypeId, &'static str) {
        (TypeId::of::<V>(), std::any::type_name::<V>())
    }
}

impl<K, V> Object for BTreeMap<K, V>
where
    K: MapKey + Ord + Clone + fmt::Debug + 'static,
    V: Object + Clone,
{
    fn reflect(&self) -> Reflect<'_> {
        Reflect::Map(self)
    }

    fn reflect_mut(&mut self) -> ReflectMut<'_> {
        ReflectMut::Map(self)
    }
}

impl<K, V> Map for BTreeMap<K, V>
where
    K: MapKey + Ord + Clone + fmt::Debug + 'static,
    V: Object + Clone,
{
    fn len(&self) -> usize {
        BTreeMap::len(self)
    }

    fn keys(&self) -> Vec<Key> {
        BTreeMap::keys(self).map(MapKey::to_key).collect()
    }

    fn coerce_key(&self, key: &Key) -> Option<Key> {
        K::from_key(key).map(|k| k.to_key())
    }

    fn get(&self, key: &Key) -> Option<&dyn Object> {
        let key = K::from_key(key)?;
        BTreeMap::get(self, &key).map(|v| v as &dyn Object)
    }

    fn get_mut(&mut self, key: &Key) -> Option<&mut dyn Object> {
        let key = K::from_key(key)?;
        BTreeMap::get_mut(self, &key).map(|v| v as &mut dyn Object)
    }

    fn insert(&mut self, key: Key, value: Box<dyn Object>) -> Result<(), Box<dyn Object>> {
        let Some(key) = K::from_key(&key) else {
            return Err(value);
        };
        let value = downcast_value::<V>(value)?;
        BTreeMap::insert(self, key, value);
        Ok(())
    }

    fn value_type(&self) -> (TypeId, &'static str) {
        (TypeId::of::<V>(), std::any::type_name::<V>())
    }
}

fn downcast_value<V: Object>(value: Box<dyn Object>) -> Result<V, Box<dyn Object>> {
    if value.as_ref().as_any().type_id() != TypeId::of::<V>() {
        return Err(value);
    }
    match value.into_any().downcast::<V>() {
        Ok(v) => Ok(*v),
        // unreachable: the type id was checked above
        Err(_) => Err(Box::new(())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_map_accepts_integer_keys() {
        let mut map: HashMap<String, i64> = HashMap::new();
        let key = Map::coerce_key(&map, &Key::Int(3)).unwrap();
        assert_eq!(key, Key::Text("3".to_string()));
        Map::insert(&mut map, key, Box::new(9_i64)).unwrap();
        assert_eq!(map["3"], 9);
    }

    #[test]
    fn test_integer_map_rejects_text_keys() {
        let map: BTreeMap<u8, String> = BTreeMap::new();
        assert_eq!(Map::coerce_key(&map, &Key::Text("12".to_string())), Some(Key::Int(12)));
        assert_eq!(Map::coerce_key(&map, &Key::Text("abc".to_string())), None);
        assert_eq!(Map::coerce_key(&map, &Key::Int(300)), None);
    }

    #[test]
    fn test_insert_rejects_wrong_value_type() {
        let mut map: HashMap<String, i64> = HashMap::new();
        let rejected = Map::insert(&mut map, Key::Text("a".to_string()), Box::new(1_i32));
        assert!(rejected.is_err());
        assert!(map.is_empty());
    }

    #[test]
    fn test_vec_grows_with_defaults() {
        let mut list = vec![1_i64];
        assert!(Sequence::grow(&mut list, 3));
        assert_eq!(list, vec![1, 0, 0]);

        let mut fixed = [1_i64, 2];
        assert!(!Sequence::grow(&mut fixed, 3));
    }

    #[test]
    fn test_vec_growth_beyond_memory_fails() {
        let mut list = vec![1_i64];
        assert!(!Sequence::grow(&mut list, usize::MAX));
        assert_eq!(list, vec![1]);
    }

    #[derive(Debug, Clone)]
    struct Tag {
        name: String,
    }

    crate::impl_struct!(Tag { "Name" => name });

    #[test]
    fn test_array_of_non_default_elements() {
        let tags = [Tag {
            name: "a".to_string(),
        }];
        assert_eq!(Sequence::len(&tags), 1);
        assert!(Sequence::new_element(&tags).is_none());
        assert!(Sequence::new_element(&vec![1_i64]).is_some());
    }

    #[test]
    fn test_slice_bounds() {
        let list = vec![1_i64, 2, 3];
        assert!(Sequence::slice(&list, 1, 3).is_some());
        assert!(Sequence::slice(&list, 2, 5).is_none());
    }
}
