use std::any::Any;
use std::collections::HashSet;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use log::debug;
use parking_lot::{Mutex, RwLock};

use crate::buffer::BufferPool;
use crate::common::config::{PageId, INVALID_PAGE_ID};
use crate::common::exception::HashTableError;
use crate::concurrency::transaction::Transaction;
use crate::container::hash_function::HashFunction;
use crate::storage::index::codec::FixedCodec;
use crate::storage::index::Comparator;
use crate::storage::page::hash_table_bucket_page::{
    HashTableBucketPage, HashTableBucketPageMut,
};
use crate::storage::page::hash_table_directory_page::{
    HashTableDirectoryPage, HashTableDirectoryPageMut,
};
use crate::storage::page::hash_table_page_defs::HASH_TABLE_MAX_DEPTH;
use crate::storage::page::page_guard::PageGuard;

type Result<T> = std::result::Result<T, HashTableError>;

/**
 * Implementation of an extendible hash table backed by a buffer pool.
 * Supports non-unique keys (duplicate values per key, distinct (key, value)
 * pairs). Supports insert and delete; the directory grows and shrinks as
 * buckets become full or empty.
 *
 * Locking protocol: the table lock protects the directory's shape and is
 * taken shared by `get_value` and the fast paths of `insert`/`remove`,
 * exclusive by split and merge. Bucket contents are protected by the
 * per-page latch, always acquired after the table lock. Every fetched page
 * travels in a [`PageGuard`] so it is unpinned on every exit path.
 */
pub struct ExtendibleHashTable<K, V, C> {
    index_name: String,
    bpm: Arc<dyn BufferPool>,
    comparator: C,
    hash_fn: HashFunction<K>,
    directory_page_id: AtomicU32,
    table_latch: RwLock<()>,
    directory_init_lock: Mutex<()>,
    _marker: PhantomData<(K, V)>,
}

impl<K, V, C> ExtendibleHashTable<K, V, C>
where
    K: FixedCodec + Hash + Any,
    V: FixedCodec + PartialEq,
    C: Comparator<K>,
{
    /// Creates a hash table over `bpm`. The directory page is allocated
    /// lazily on first access.
    pub fn new(
        name: impl Into<String>,
        bpm: Arc<dyn BufferPool>,
        comparator: C,
        hash_fn: HashFunction<K>,
    ) -> Self {
        Self {
            index_name: name.into(),
            bpm,
            comparator,
            hash_fn,
            directory_page_id: AtomicU32::new(INVALID_PAGE_ID),
            table_latch: RwLock::new(()),
            directory_init_lock: Mutex::new(()),
            _marker: PhantomData,
        }
    }

    pub fn get_index_name(&self) -> &str {
        &self.index_name
    }

    /// Downcasts the 64-bit hash to 32 bits for directory indexing.
    fn hash(&self, key: &K) -> u32 {
        self.hash_fn.get_hash(key) as u32
    }

    /// Fetches the directory page pinned, creating it (with a single empty
    /// bucket of local depth 0 at index 0) on first access. Creation is
    /// double-checked behind a dedicated mutex so it happens exactly once.
    fn fetch_directory(&self) -> Result<PageGuard> {
        if self.directory_page_id.load(Ordering::SeqCst) == INVALID_PAGE_ID {
            let _init = self.directory_init_lock.lock();
            if self.directory_page_id.load(Ordering::SeqCst) == INVALID_PAGE_ID {
                let dir_guard = PageGuard::new(Arc::clone(&self.bpm), self.bpm.new_page()?);
                let bucket_guard = PageGuard::new(Arc::clone(&self.bpm), self.bpm.new_page()?);
                {
                    let mut data = dir_guard.write();
                    let mut dir = HashTableDirectoryPageMut::view(&mut data[..]);
                    dir.init(dir_guard.get_page_id());
                    dir.set_bucket_page_id(0, bucket_guard.get_page_id());
                }
                dir_guard.mark_dirty();
                bucket_guard.mark_dirty();
                debug!(
                    "{}: created directory page {} with initial bucket page {}",
                    self.index_name,
                    dir_guard.get_page_id(),
                    bucket_guard.get_page_id()
                );
                self.directory_page_id
                    .store(dir_guard.get_page_id(), Ordering::SeqCst);
            }
        }

        let page = self
            .bpm
            .fetch_page(self.directory_page_id.load(Ordering::SeqCst))?;
        Ok(PageGuard::new(Arc::clone(&self.bpm), page))
    }

    fn fetch_bucket(&self, bucket_page_id: PageId) -> Result<PageGuard> {
        let page = self.bpm.fetch_page(bucket_page_id)?;
        Ok(PageGuard::new(Arc::clone(&self.bpm), page))
    }

    /// Performs a point lookup, appending every value stored under `key` to
    /// `result`.
    ///
    /// # Returns
    ///
    /// `true` if at least one value was found.
    pub fn get_value(
        &self,
        _transaction: Option<&Transaction>,
        key: &K,
        result: &mut Vec<V>,
    ) -> Result<bool> {
        let _table = self.table_latch.read();
        let dir_guard = self.fetch_directory()?;

        let bucket_page_id = {
            let data = dir_guard.read();
            let dir = HashTableDirectoryPage::view(&data[..]);
            let bucket_idx = self.hash(key) & dir.get_global_depth_mask();
            dir.get_bucket_page_id(bucket_idx)
        };

        let bucket_guard = self.fetch_bucket(bucket_page_id)?;
        let found = {
            let data = bucket_guard.read();
            let bucket = HashTableBucketPage::<K, V>::view(&data[..]);
            bucket.get_value(key, &self.comparator, result)
        };
        Ok(found)
    }

    /// Inserts a (key, value) pair.
    ///
    /// # Returns
    ///
    /// `Ok(false)` if the exact pair is already present, or if the target
    /// bucket is full and its local depth has reached the maximum. Buffer
    /// pool failures surface as `Err` after all pins and latches are
    /// released.
    pub fn insert(
        &self,
        transaction: Option<&Transaction>,
        key: &K,
        value: &V,
    ) -> Result<bool> {
        {
            let _table = self.table_latch.read();
            let dir_guard = self.fetch_directory()?;

            let bucket_page_id = {
                let data = dir_guard.read();
                let dir = HashTableDirectoryPage::view(&data[..]);
                let bucket_idx = self.hash(key) & dir.get_global_depth_mask();
                dir.get_bucket_page_id(bucket_idx)
            };

            let bucket_guard = self.fetch_bucket(bucket_page_id)?;
            let mut data = bucket_guard.write();
            let mut bucket = HashTableBucketPageMut::<K, V>::view(&mut data[..]);
            if !bucket.is_full() {
                let inserted = bucket.insert(key, value, &self.comparator);
                if inserted {
                    bucket_guard.mark_dirty();
                }
                return Ok(inserted);
            }
            // bucket is full: release the latch, the pins and the shared
            // table lock before escalating
        }
        self.split_insert(transaction, key, value)
    }

    /// Slow insert path: splits the overflowing bucket under the exclusive
    /// table lock, then retries the insert from the top. The retry may split
    /// again when every rehashed entry lands on the same side.
    fn split_insert(
        &self,
        transaction: Option<&Transaction>,
        key: &K,
        value: &V,
    ) -> Result<bool> {
        let table = self.table_latch.write();
        let dir_guard = self.fetch_directory()?;
        let mut dir_data = dir_guard.write();
        let mut dir = HashTableDirectoryPageMut::view(&mut dir_data[..]);

        let bucket_idx = self.hash(key) & dir.as_read().get_global_depth_mask();
        let local_depth = dir.as_read().get_local_depth(bucket_idx);
        if local_depth >= HASH_TABLE_MAX_DEPTH {
            debug!(
                "{}: bucket {} already at max depth {}, rejecting insert",
                self.index_name, bucket_idx, HASH_TABLE_MAX_DEPTH
            );
            return Ok(false);
        }

        let origin_page_id = dir.as_read().get_bucket_page_id(bucket_idx);
        let origin_guard = self.fetch_bucket(origin_page_id)?;

        let still_full = {
            let data = origin_guard.read();
            HashTableBucketPage::<K, V>::view(&data[..]).is_full()
        };
        if !still_full {
            // another thread split this bucket while we waited for the
            // exclusive lock; restart as a normal insert
            drop(origin_guard);
            drop(dir);
            drop(dir_data);
            drop(dir_guard);
            drop(table);
            return self.insert(transaction, key, value);
        }

        // allocate the sibling page before mutating the directory so that an
        // exhausted pool leaves the directory shape untouched
        let split_guard = PageGuard::new(Arc::clone(&self.bpm), self.bpm.new_page()?);
        let split_page_id = split_guard.get_page_id();

        dir.incr_local_depth(bucket_idx);
        let new_local_depth = local_depth + 1;
        if new_local_depth > dir.as_read().get_global_depth() {
            dir.incr_global_depth();
        }
        let split_idx = dir.as_read().get_split_image_index(bucket_idx);

        debug!(
            "{}: splitting bucket idx {} (page {}) into idx {} (page {}), new local depth {}",
            self.index_name, bucket_idx, origin_page_id, split_idx, split_page_id, new_local_depth
        );

        // every index agreeing with bucket_idx in its low new_local_depth
        // bits keeps the origin page; every index agreeing with split_idx
        // gets the new page; both cosets move to the new local depth
        let local_mask = (1u32 << new_local_depth) - 1;
        for i in 0..dir.as_read().size() {
            if i & local_mask == bucket_idx & local_mask {
                dir.set_bucket_page_id(i, origin_page_id);
                dir.set_local_depth(i, new_local_depth);
            } else if i & local_mask == split_idx & local_mask {
                dir.set_bucket_page_id(i, split_page_id);
                dir.set_local_depth(i, new_local_depth);
            }
        }

        // rehash the origin's live entries across the two pages
        {
            let mut origin_data = origin_guard.write();
            let mut split_data = split_guard.write();
            let mut origin = HashTableBucketPageMut::<K, V>::view(&mut origin_data[..]);
            let mut split = HashTableBucketPageMut::<K, V>::view(&mut split_data[..]);

            let entries = origin.get_array_copy();
            origin.clear();
            for (k, v) in &entries {
                let idx = self.hash(k) & dir.as_read().get_global_depth_mask();
                let target = if idx & local_mask == bucket_idx & local_mask {
                    &mut origin
                } else {
                    &mut split
                };
                let inserted = target.insert(k, v, &self.comparator);
                debug_assert!(inserted, "rehash insert into freshly split bucket failed");
            }
        }
        dir_guard.mark_dirty();
        origin_guard.mark_dirty();
        split_guard.mark_dirty();

        // unpin everything and release the exclusive lock before retrying
        drop(split_guard);
        drop(origin_guard);
        drop(dir);
        drop(dir_data);
        drop(dir_guard);
        drop(table);
        self.insert(transaction, key, value)
    }

    /// Removes one live (key, value) pair, leaving a tombstone in its slot.
    /// A remove that empties its bucket triggers a merge attempt for that
    /// key's directory slot.
    ///
    /// # Returns
    ///
    /// `Ok(false)` if no such pair exists.
    pub fn remove(
        &self,
        transaction: Option<&Transaction>,
        key: &K,
        value: &V,
    ) -> Result<bool> {
        let (removed, emptied) = {
            let _table = self.table_latch.read();
            let dir_guard = self.fetch_directory()?;

            let bucket_page_id = {
                let data = dir_guard.read();
                let dir = HashTableDirectoryPage::view(&data[..]);
                let bucket_idx = self.hash(key) & dir.get_global_depth_mask();
                dir.get_bucket_page_id(bucket_idx)
            };

            let bucket_guard = self.fetch_bucket(bucket_page_id)?;
            let (removed, emptied) = {
                let mut data = bucket_guard.write();
                let mut bucket = HashTableBucketPageMut::<K, V>::view(&mut data[..]);
                let removed = bucket.remove(key, value, &self.comparator);
                (removed, removed && bucket.is_empty())
            };
            if removed {
                bucket_guard.mark_dirty();
            }
            (removed, emptied)
            // latch, pins and shared lock released here
        };

        if emptied {
            self.merge(transaction, key)?;
        }
        Ok(removed)
    }

    /// Folds an empty bucket back into its split image when both halves sit
    /// at the same local depth, then shrinks the directory while possible.
    /// Runs at most once per triggering remove; later empties are cleaned by
    /// later removes.
    fn merge(&self, _transaction: Option<&Transaction>, key: &K) -> Result<()> {
        let _table = self.table_latch.write();
        let dir_guard = self.fetch_directory()?;
        let mut dir_data = dir_guard.write();
        let mut dir = HashTableDirectoryPageMut::view(&mut dir_data[..]);

        let cur_idx = self.hash(key) & dir.as_read().get_global_depth_mask();
        if cur_idx >= dir.as_read().size() {
            return Ok(());
        }
        let cur_depth = dir.as_read().get_local_depth(cur_idx);
        if cur_depth == 0 {
            return Ok(());
        }
        let split_idx = dir.as_read().get_split_image_index(cur_idx);
        if dir.as_read().get_local_depth(split_idx) != cur_depth {
            // the sibling has been split further; merging would break the
            // shared-bucket invariant
            return Ok(());
        }

        let cur_page_id = dir.as_read().get_bucket_page_id(cur_idx);
        let bucket_guard = self.fetch_bucket(cur_page_id)?;
        let still_empty = {
            let data = bucket_guard.read();
            HashTableBucketPage::<K, V>::view(&data[..]).is_empty()
        };
        drop(bucket_guard);
        if !still_empty {
            // another thread reinserted before we got the exclusive lock
            return Ok(());
        }

        if !self.bpm.delete_page(cur_page_id) {
            debug!(
                "{}: empty bucket page {} still pinned, leaving it to eviction",
                self.index_name, cur_page_id
            );
        }

        let split_page_id = dir.as_read().get_bucket_page_id(split_idx);
        debug!(
            "{}: merging bucket idx {} (page {}) into idx {} (page {}), new local depth {}",
            self.index_name,
            cur_idx,
            cur_page_id,
            split_idx,
            split_page_id,
            cur_depth - 1
        );

        let local_mask = (1u32 << cur_depth) - 1;
        for i in 0..dir.as_read().size() {
            if i & local_mask == cur_idx & local_mask {
                dir.set_bucket_page_id(i, split_page_id);
                dir.set_local_depth(i, cur_depth - 1);
            } else if i & local_mask == split_idx & local_mask {
                dir.set_local_depth(i, cur_depth - 1);
            }
        }

        while dir.as_read().can_shrink() {
            dir.decr_global_depth();
        }
        dir_guard.mark_dirty();
        Ok(())
    }

    /// Returns the directory's current global depth.
    pub fn get_global_depth(&self) -> Result<u32> {
        let _table = self.table_latch.read();
        let dir_guard = self.fetch_directory()?;
        let data = dir_guard.read();
        Ok(HashTableDirectoryPage::view(&data[..]).get_global_depth())
    }

    /// Returns the number of live (key, value) pairs in the table.
    pub fn size(&self) -> Result<u32> {
        let _table = self.table_latch.read();
        let dir_guard = self.fetch_directory()?;

        let bucket_page_ids: HashSet<PageId> = {
            let data = dir_guard.read();
            let dir = HashTableDirectoryPage::view(&data[..]);
            (0..dir.size()).map(|i| dir.get_bucket_page_id(i)).collect()
        };

        let mut total = 0;
        for bucket_page_id in bucket_page_ids {
            let bucket_guard = self.fetch_bucket(bucket_page_id)?;
            let data = bucket_guard.read();
            total += HashTableBucketPage::<K, V>::view(&data[..]).num_readable();
        }
        Ok(total)
    }

    /// Checks the directory invariants; panics on violation.
    pub fn verify_integrity(&self) -> Result<()> {
        let _table = self.table_latch.read();
        let dir_guard = self.fetch_directory()?;
        let data = dir_guard.read();
        HashTableDirectoryPage::view(&data[..]).verify_integrity();
        Ok(())
    }
}
