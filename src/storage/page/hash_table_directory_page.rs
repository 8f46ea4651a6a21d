use std::collections::HashMap;

use crate::common::config::{Lsn, PageId};
use crate::storage::page::hash_table_page_defs::DIRECTORY_ARRAY_SIZE;

/**
 * Directory page for the extendible hash table.
 *
 * Directory format (sizes in bytes, little-endian):
 * ---------------------------------------------------------------------------------------------
 * | PageId (4) | LSN (4) | GlobalDepth (4) | LocalDepths (512) | BucketPageIds (2048) | Free (1524)
 * ---------------------------------------------------------------------------------------------
 *
 * The first 2^global_depth entries of each array are significant. Accessed
 * through zero-copy views over the page bytes: [`HashTableDirectoryPage`]
 * for reads, [`HashTableDirectoryPageMut`] for mutation under the exclusive
 * table lock.
 */
pub struct HashTableDirectoryPage<'a> {
    data: &'a [u8],
}

/// Exclusive counterpart of [`HashTableDirectoryPage`].
pub struct HashTableDirectoryPageMut<'a> {
    data: &'a mut [u8],
}

const OFFSET_PAGE_ID: usize = 0;
const OFFSET_LSN: usize = 4;
const OFFSET_GLOBAL_DEPTH: usize = 8;
const OFFSET_LOCAL_DEPTHS: usize = 12;
const OFFSET_BUCKET_PAGE_IDS: usize = OFFSET_LOCAL_DEPTHS + DIRECTORY_ARRAY_SIZE;

fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(data[offset..offset + 4].try_into().unwrap())
}

fn write_u32(data: &mut [u8], offset: usize, value: u32) {
    data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

impl<'a> HashTableDirectoryPage<'a> {
    /// Interprets `data` (at least one page) as a directory page.
    pub fn view(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Returns the page ID of this page.
    pub fn get_page_id(&self) -> PageId {
        read_u32(self.data, OFFSET_PAGE_ID)
    }

    /// Returns the log sequence number of this page.
    pub fn get_lsn(&self) -> Lsn {
        read_u32(self.data, OFFSET_LSN)
    }

    /// Returns the global depth of the hash table directory.
    pub fn get_global_depth(&self) -> u32 {
        read_u32(self.data, OFFSET_GLOBAL_DEPTH)
    }

    /// Returns a mask of global_depth 1's and the rest 0's.
    pub fn get_global_depth_mask(&self) -> u32 {
        (1 << self.get_global_depth()) - 1
    }

    /// Returns a mask of local_depth 1's and the rest 0's for the bucket at
    /// `bucket_idx`.
    pub fn get_local_depth_mask(&self, bucket_idx: u32) -> u32 {
        (1 << self.get_local_depth(bucket_idx)) - 1
    }

    /// Returns the current directory size, `2^global_depth`.
    pub fn size(&self) -> u32 {
        1 << self.get_global_depth()
    }

    /// Looks up a bucket page id using a directory index.
    pub fn get_bucket_page_id(&self, bucket_idx: u32) -> PageId {
        read_u32(
            self.data,
            OFFSET_BUCKET_PAGE_IDS + bucket_idx as usize * 4,
        )
    }

    /// Gets the local depth of the bucket at `bucket_idx`.
    pub fn get_local_depth(&self, bucket_idx: u32) -> u32 {
        self.data[OFFSET_LOCAL_DEPTHS + bucket_idx as usize] as u32
    }

    /// Gets the split image of an index: the sibling index that differs only
    /// in the highest in-use bit. Undefined when the local depth is 0.
    pub fn get_split_image_index(&self, bucket_idx: u32) -> u32 {
        bucket_idx ^ (1 << (self.get_local_depth(bucket_idx) - 1))
    }

    /// Gets the high bit corresponding to the bucket's local depth.
    pub fn get_local_high_bit(&self, bucket_idx: u32) -> u32 {
        1 << (self.get_local_depth(bucket_idx) - 1)
    }

    /// Returns `true` if the directory can be halved: every active index's
    /// local depth is strictly less than the global depth.
    pub fn can_shrink(&self) -> bool {
        let global_depth = self.get_global_depth();
        if global_depth == 0 {
            return false;
        }
        (0..self.size()).all(|i| self.get_local_depth(i) < global_depth)
    }

    /// Verifies the integrity of the directory:
    ///
    /// - every active local depth is at most the global depth;
    /// - each bucket page is referenced by exactly
    ///   `2^(global_depth - local_depth)` directory slots;
    /// - the local depth is the same at every index sharing a bucket page id,
    ///   and those indices agree in their low `local_depth` bits.
    ///
    /// # Panics
    ///
    /// Panics on the first violation found.
    pub fn verify_integrity(&self) {
        // page id -> (reference count, local depth, canonical index)
        let mut seen: HashMap<PageId, (u32, u32, u32)> = HashMap::new();
        let global_depth = self.get_global_depth();

        for i in 0..self.size() {
            let local_depth = self.get_local_depth(i);
            assert!(
                local_depth <= global_depth,
                "local depth {} at index {} exceeds global depth {}",
                local_depth,
                i,
                global_depth
            );

            let page_id = self.get_bucket_page_id(i);
            let entry = seen.entry(page_id).or_insert((0, local_depth, i));
            entry.0 += 1;
            assert_eq!(
                entry.1, local_depth,
                "bucket page {} has inconsistent local depths ({} at index {}, {} at index {})",
                page_id, entry.1, entry.2, local_depth, i
            );
            let mask = (1u32 << local_depth) - 1;
            assert_eq!(
                entry.2 & mask,
                i & mask,
                "indices {} and {} share bucket page {} but disagree in their low {} bits",
                entry.2,
                i,
                page_id,
                local_depth
            );
        }

        for (page_id, (count, local_depth, _)) in seen {
            let expected = 1u32 << (global_depth - local_depth);
            assert_eq!(
                count, expected,
                "bucket page {} with local depth {} is referenced by {} slots, expected {}",
                page_id, local_depth, count, expected
            );
        }
    }
}

impl<'a> HashTableDirectoryPageMut<'a> {
    /// Interprets `data` (at least one page) as a mutable directory page.
    pub fn view(data: &'a mut [u8]) -> Self {
        Self { data }
    }

    /// Shared view over the same bytes, for the read-side accessors.
    pub fn as_read(&self) -> HashTableDirectoryPage<'_> {
        HashTableDirectoryPage::view(&*self.data)
    }

    /// Initialises a freshly allocated directory page: depth 0, both arrays
    /// zeroed.
    pub fn init(&mut self, page_id: PageId) {
        self.data[..OFFSET_BUCKET_PAGE_IDS + DIRECTORY_ARRAY_SIZE * 4].fill(0);
        self.set_page_id(page_id);
    }

    /// Sets the page ID of this page.
    pub fn set_page_id(&mut self, page_id: PageId) {
        write_u32(self.data, OFFSET_PAGE_ID, page_id);
    }

    /// Sets the log sequence number of this page.
    pub fn set_lsn(&mut self, lsn: Lsn) {
        write_u32(self.data, OFFSET_LSN, lsn);
    }

    /// Updates the directory index with a bucket page id.
    pub fn set_bucket_page_id(&mut self, bucket_idx: u32, bucket_page_id: PageId) {
        write_u32(
            self.data,
            OFFSET_BUCKET_PAGE_IDS + bucket_idx as usize * 4,
            bucket_page_id,
        );
    }

    /// Sets the local depth of the bucket at `bucket_idx`.
    pub fn set_local_depth(&mut self, bucket_idx: u32, local_depth: u32) {
        debug_assert!(local_depth <= u8::MAX as u32);
        self.data[OFFSET_LOCAL_DEPTHS + bucket_idx as usize] = local_depth as u8;
    }

    /// Increments the local depth of the bucket at `bucket_idx`.
    pub fn incr_local_depth(&mut self, bucket_idx: u32) {
        self.data[OFFSET_LOCAL_DEPTHS + bucket_idx as usize] += 1;
    }

    /// Decrements the local depth of the bucket at `bucket_idx`.
    pub fn decr_local_depth(&mut self, bucket_idx: u32) {
        self.data[OFFSET_LOCAL_DEPTHS + bucket_idx as usize] -= 1;
    }

    /// Increments the global depth, doubling the directory: every existing
    /// entry is copied into its new high-bit twin so sibling indices keep
    /// resolving to the same bucket.
    pub fn incr_global_depth(&mut self) {
        let old_size = self.as_read().size();
        for i in 0..old_size {
            let page_id = self.as_read().get_bucket_page_id(i);
            let local_depth = self.as_read().get_local_depth(i);
            self.set_bucket_page_id(old_size + i, page_id);
            self.set_local_depth(old_size + i, local_depth);
        }
        let global_depth = self.as_read().get_global_depth();
        write_u32(self.data, OFFSET_GLOBAL_DEPTH, global_depth + 1);
    }

    /// Decrements the global depth, halving the directory.
    pub fn decr_global_depth(&mut self) {
        let global_depth = self.as_read().get_global_depth();
        debug_assert!(global_depth > 0);
        write_u32(self.data, OFFSET_GLOBAL_DEPTH, global_depth - 1);
    }
}
