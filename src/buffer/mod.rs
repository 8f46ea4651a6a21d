pub mod buffer_pool_manager;
pub mod lru_replacer;
pub mod parallel_buffer_pool_manager;

use std::sync::Arc;

use crate::common::config::PageId;
use crate::common::exception::BufferPoolError;
use crate::storage::page::page::Page;

/// The contract the index layer assumes from a buffer pool.
///
/// `new_page` and `fetch_page` return the page pinned; every such call must
/// be paired with an `unpin_page` on every exit path of the caller, with
/// `is_dirty = true` iff the caller mutated the page.
pub trait BufferPool: Send + Sync {
    /// Allocates a fresh zeroed page and returns it pinned with pin count 1.
    fn new_page(&self) -> Result<Arc<Page>, BufferPoolError>;

    /// Returns the requested page pinned, loading it from disk if it is not
    /// resident. Fails with [`BufferPoolError::NoFreeFrame`] when every frame
    /// is pinned.
    fn fetch_page(&self, page_id: PageId) -> Result<Arc<Page>, BufferPoolError>;

    /// Decrements the pin count; at zero the frame becomes eligible for
    /// replacement. `is_dirty = true` sets the sticky dirty flag.
    fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> bool;

    /// Writes the page back to disk and clears its dirty flag.
    fn flush_page(&self, page_id: PageId) -> bool;

    /// Drops the page from the pool. Requires pin count 0; returns `false`
    /// otherwise. Deleting a non-resident page succeeds trivially.
    fn delete_page(&self, page_id: PageId) -> bool;

    /// Flushes every dirty resident page.
    fn flush_all_pages(&self);

    /// Total number of frames managed by this pool.
    fn pool_size(&self) -> usize;
}
