use std::any::Any;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use xxhash_rust::xxh3;

/// Represents a hash function for a given key type.
pub struct HashFunction<K> {
    _marker: PhantomData<K>,
}

impl<K> HashFunction<K> {
    /// Creates a new `HashFunction`.
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<K> Default for HashFunction<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> HashFunction<K>
where
    K: Any + Hash + 'static,
{
    /// Returns the 64-bit hash value of the given key. Plain integer keys
    /// feed the hasher directly; everything else goes through its `Hash`
    /// implementation.
    pub fn get_hash(&self, key: &K) -> u64 {
        let mut hasher = xxh3::Xxh3::new();

        match key as &dyn Any {
            key if key.is::<i32>() => hasher.write_i32(*key.downcast_ref::<i32>().unwrap()),
            key if key.is::<u32>() => hasher.write_u32(*key.downcast_ref::<u32>().unwrap()),
            key if key.is::<i64>() => hasher.write_i64(*key.downcast_ref::<i64>().unwrap()),
            _ => {
                key.hash(&mut hasher);
            }
        }

        hasher.finish()
    }
}
