pub mod codec;
pub mod generic_key;
pub mod int_comparator;

use std::cmp::Ordering;

/// Three-way key comparison used by index pages and the hash table. The
/// comparator travels with the index instance so opaque key types can carry
/// collation state if they need it.
pub trait Comparator<K>: Clone + Send + Sync {
    fn compare(&self, lhs: &K, rhs: &K) -> Ordering;
}
