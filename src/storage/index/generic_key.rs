use std::cmp::Ordering;

use crate::storage::index::codec::FixedCodec;
use crate::storage::index::Comparator;

/// A generic index key holding opaque, fixed-width data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GenericKey<const N: usize> {
    /// The fixed-size array holding the key data.
    data: [u8; N],
}

impl<const N: usize> GenericKey<N> {
    /// Creates a new `GenericKey` with zeroed data.
    pub fn new() -> Self {
        Self { data: [0; N] }
    }

    /// Sets the key data from a slice of bytes. Input longer than the key is
    /// truncated; shorter input leaves the tail zeroed.
    ///
    /// # Arguments
    ///
    /// * `bytes` - The slice of bytes to set the key from.
    pub fn set_from_bytes(&mut self, bytes: &[u8]) {
        let len = bytes.len().min(N);
        self.data[..len].copy_from_slice(&bytes[..len]);
    }

    /// Sets the key data from an integer, little-endian, truncating to the
    /// key width when `N < 8`.
    pub fn set_from_integer(&mut self, value: i64) {
        self.data = [0; N];
        let bytes = value.to_le_bytes();
        let len = bytes.len().min(N);
        self.data[..len].copy_from_slice(&bytes[..len]);
    }

    /// Returns a reference to the key's byte data.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl<const N: usize> Default for GenericKey<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> FixedCodec for GenericKey<N> {
    const ENCODED_LEN: usize = N;

    fn encode_to(&self, buf: &mut [u8]) {
        buf[..N].copy_from_slice(&self.data);
    }

    fn decode_from(buf: &[u8]) -> Self {
        let mut key = Self::new();
        key.data.copy_from_slice(&buf[..N]);
        key
    }
}

/// Comparator for `GenericKey`, ordering by raw bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericComparator<const N: usize>;

impl<const N: usize> GenericComparator<N> {
    pub fn new() -> Self {
        Self
    }
}

impl<const N: usize> Comparator<GenericKey<N>> for GenericComparator<N> {
    fn compare(&self, lhs: &GenericKey<N>, rhs: &GenericKey<N>) -> Ordering {
        lhs.data.cmp(&rhs.data)
    }
}
