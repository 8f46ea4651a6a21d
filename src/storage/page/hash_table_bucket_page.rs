use std::cmp::Ordering;
use std::marker::PhantomData;

use crate::storage::index::codec::FixedCodec;
use crate::storage::index::Comparator;
use crate::storage::page::hash_table_page_defs::{bucket_array_size, MappingType};

/**
 * Store indexed key and value together within a bucket page. Supports
 * non-unique keys.
 *
 * Bucket page format (sizes in bytes):
 *  ---------------------------------------------------------------------
 * | OCCUPIED(⌈B/8⌉) | READABLE(⌈B/8⌉) | KEY(1)+VALUE(1) | ... | KEY(B)+VALUE(B)
 *  ---------------------------------------------------------------------
 *
 * Bitmap bits are MSB-first within each byte: the bit for slot i is
 * `1 << (7 - i % 8)` of byte `i / 8`. A slot with occupied set but readable
 * cleared is a tombstone; scans must keep looking past it.
 *
 * The page is accessed through two zero-copy views over the page bytes:
 * [`HashTableBucketPage`] under the shared page latch and
 * [`HashTableBucketPageMut`] under the exclusive latch.
 */
pub struct HashTableBucketPage<'a, KeyType, ValueType> {
    data: &'a [u8],
    _marker: PhantomData<(KeyType, ValueType)>,
}

/// Exclusive-latch counterpart of [`HashTableBucketPage`].
pub struct HashTableBucketPageMut<'a, KeyType, ValueType> {
    data: &'a mut [u8],
    _marker: PhantomData<(KeyType, ValueType)>,
}

const fn bitmap_bytes(capacity: usize) -> usize {
    (capacity - 1) / 8 + 1
}

fn bit_is_set(bitmap: &[u8], idx: usize) -> bool {
    bitmap[idx / 8] & (0x01 << (7 - (idx % 8))) != 0
}

fn bit_set(bitmap: &mut [u8], idx: usize) {
    bitmap[idx / 8] |= 0x01 << (7 - (idx % 8));
}

fn bit_clear(bitmap: &mut [u8], idx: usize) {
    bitmap[idx / 8] &= !(0x01 << (7 - (idx % 8)));
}

impl<'a, KeyType, ValueType> HashTableBucketPage<'a, KeyType, ValueType>
where
    KeyType: FixedCodec,
    ValueType: FixedCodec + PartialEq,
{
    const CAPACITY: usize = bucket_array_size::<KeyType, ValueType>();
    const PAIR_LEN: usize = KeyType::ENCODED_LEN + ValueType::ENCODED_LEN;
    const ARRAY_OFFSET: usize = 2 * bitmap_bytes(Self::CAPACITY);

    /// Interprets `data` (at least one page) as a bucket page.
    pub fn view(data: &'a [u8]) -> Self {
        Self {
            data,
            _marker: PhantomData,
        }
    }

    /// Number of (key, value) slots in this bucket.
    pub const fn capacity() -> usize {
        Self::CAPACITY
    }

    fn occupied_bitmap(&self) -> &[u8] {
        &self.data[..bitmap_bytes(Self::CAPACITY)]
    }

    fn readable_bitmap(&self) -> &[u8] {
        &self.data[bitmap_bytes(Self::CAPACITY)..2 * bitmap_bytes(Self::CAPACITY)]
    }

    fn pair_slice(&self, bucket_idx: usize) -> &[u8] {
        let start = Self::ARRAY_OFFSET + bucket_idx * Self::PAIR_LEN;
        &self.data[start..start + Self::PAIR_LEN]
    }

    /// Scans the bucket and collects values that have the matching key.
    ///
    /// # Returns
    ///
    /// `true` if at least one key matched, `false` otherwise.
    pub fn get_value<C: Comparator<KeyType>>(
        &self,
        key: &KeyType,
        cmp: &C,
        result: &mut Vec<ValueType>,
    ) -> bool {
        let before = result.len();
        for i in 0..Self::CAPACITY {
            if self.is_readable(i) && cmp.compare(key, &self.key_at(i)) == Ordering::Equal {
                result.push(self.value_at(i));
            }
        }
        result.len() > before
    }

    /// Gets the key at an index in the bucket.
    pub fn key_at(&self, bucket_idx: usize) -> KeyType {
        KeyType::decode_from(&self.pair_slice(bucket_idx)[..KeyType::ENCODED_LEN])
    }

    /// Gets the value at an index in the bucket.
    pub fn value_at(&self, bucket_idx: usize) -> ValueType {
        ValueType::decode_from(&self.pair_slice(bucket_idx)[KeyType::ENCODED_LEN..])
    }

    /// Returns whether an index was ever written (live pair or tombstone).
    pub fn is_occupied(&self, bucket_idx: usize) -> bool {
        bit_is_set(self.occupied_bitmap(), bucket_idx)
    }

    /// Returns whether an index holds a live key/value pair.
    pub fn is_readable(&self, bucket_idx: usize) -> bool {
        bit_is_set(self.readable_bitmap(), bucket_idx)
    }

    /// Returns the number of live pairs, i.e. the current size.
    pub fn num_readable(&self) -> u32 {
        self.readable_bitmap()
            .iter()
            .map(|byte| byte.count_ones())
            .sum()
    }

    /// Returns whether every slot in the capacity range holds a live pair.
    pub fn is_full(&self) -> bool {
        self.num_readable() as usize == Self::CAPACITY
    }

    /// Returns whether the bucket holds no live pairs.
    pub fn is_empty(&self) -> bool {
        self.readable_bitmap().iter().all(|&byte| byte == 0)
    }

    /// Copies out all live pairs, in slot order.
    pub fn get_array_copy(&self) -> Vec<MappingType<KeyType, ValueType>> {
        let mut copy = Vec::with_capacity(self.num_readable() as usize);
        for i in 0..Self::CAPACITY {
            if self.is_readable(i) {
                copy.push((self.key_at(i), self.value_at(i)));
            }
        }
        copy
    }
}

impl<'a, KeyType, ValueType> HashTableBucketPageMut<'a, KeyType, ValueType>
where
    KeyType: FixedCodec,
    ValueType: FixedCodec + PartialEq,
{
    const CAPACITY: usize = bucket_array_size::<KeyType, ValueType>();
    const PAIR_LEN: usize = KeyType::ENCODED_LEN + ValueType::ENCODED_LEN;
    const ARRAY_OFFSET: usize = 2 * bitmap_bytes(Self::CAPACITY);

    /// Interprets `data` (at least one page) as a mutable bucket page.
    pub fn view(data: &'a mut [u8]) -> Self {
        Self {
            data,
            _marker: PhantomData,
        }
    }

    /// Shared view over the same bytes, for the read-side accessors.
    pub fn as_read(&self) -> HashTableBucketPage<'_, KeyType, ValueType> {
        HashTableBucketPage::view(&*self.data)
    }

    fn occupied_bitmap_mut(&mut self) -> &mut [u8] {
        &mut self.data[..bitmap_bytes(Self::CAPACITY)]
    }

    fn readable_bitmap_mut(&mut self) -> &mut [u8] {
        &mut self.data[bitmap_bytes(Self::CAPACITY)..2 * bitmap_bytes(Self::CAPACITY)]
    }

    fn write_pair(&mut self, bucket_idx: usize, key: &KeyType, value: &ValueType) {
        let start = Self::ARRAY_OFFSET + bucket_idx * Self::PAIR_LEN;
        let pair = &mut self.data[start..start + Self::PAIR_LEN];
        key.encode_to(&mut pair[..KeyType::ENCODED_LEN]);
        value.encode_to(&mut pair[KeyType::ENCODED_LEN..]);
    }

    /// Attempts to insert a key and value into the bucket.
    ///
    /// The scan runs until it either proves the pair is a duplicate or
    /// reaches the first never-occupied slot (nothing was ever written past
    /// it). The first non-readable slot seen along the way is remembered as
    /// the insertion candidate, so tombstones are reused.
    ///
    /// # Returns
    ///
    /// `true` if inserted, `false` on duplicate (key, value) pair or when the
    /// bucket is full.
    pub fn insert<C: Comparator<KeyType>>(
        &mut self,
        key: &KeyType,
        value: &ValueType,
        cmp: &C,
    ) -> bool {
        let mut slot = None;
        {
            let view = self.as_read();
            for i in 0..Self::CAPACITY {
                if !view.is_occupied(i) {
                    if slot.is_none() {
                        slot = Some(i);
                    }
                    break;
                }
                if view.is_readable(i) {
                    if cmp.compare(key, &view.key_at(i)) == Ordering::Equal
                        && *value == view.value_at(i)
                    {
                        return false;
                    }
                } else if slot.is_none() {
                    slot = Some(i);
                }
            }
        }

        let Some(slot) = slot else {
            return false;
        };

        self.write_pair(slot, key, value);
        self.set_occupied(slot);
        self.set_readable(slot);
        true
    }

    /// Removes a matching (key, value) pair, leaving a tombstone.
    ///
    /// # Returns
    ///
    /// `true` if removed, `false` if not found.
    pub fn remove<C: Comparator<KeyType>>(
        &mut self,
        key: &KeyType,
        value: &ValueType,
        cmp: &C,
    ) -> bool {
        let mut found = None;
        {
            let view = self.as_read();
            for i in 0..Self::CAPACITY {
                if !view.is_occupied(i) {
                    return false;
                }
                if view.is_readable(i)
                    && cmp.compare(key, &view.key_at(i)) == Ordering::Equal
                    && *value == view.value_at(i)
                {
                    found = Some(i);
                    break;
                }
            }
        }

        match found {
            Some(i) => {
                self.remove_at(i);
                true
            }
            None => false,
        }
    }

    /// Removes the pair at `bucket_idx`; the slot stays occupied.
    pub fn remove_at(&mut self, bucket_idx: usize) {
        bit_clear(self.readable_bitmap_mut(), bucket_idx);
    }

    /// Marks the entry at `bucket_idx` as occupied.
    pub fn set_occupied(&mut self, bucket_idx: usize) {
        bit_set(self.occupied_bitmap_mut(), bucket_idx);
    }

    /// Marks the entry at `bucket_idx` as readable.
    pub fn set_readable(&mut self, bucket_idx: usize) {
        bit_set(self.readable_bitmap_mut(), bucket_idx);
    }

    /// Resets both bitmaps; the pair array is left as-is, all slots become
    /// never-occupied.
    pub fn clear(&mut self) {
        let bitmap_end = 2 * bitmap_bytes(Self::CAPACITY);
        self.data[..bitmap_end].fill(0);
    }

    pub fn is_full(&self) -> bool {
        self.as_read().is_full()
    }

    pub fn is_empty(&self) -> bool {
        self.as_read().is_empty()
    }

    pub fn num_readable(&self) -> u32 {
        self.as_read().num_readable()
    }

    pub fn get_array_copy(&self) -> Vec<MappingType<KeyType, ValueType>> {
        self.as_read().get_array_copy()
    }
}
