use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{RwLockReadGuard, RwLockWriteGuard};

use crate::buffer::BufferPool;
use crate::common::config::PageId;
use crate::storage::page::page::{Page, PageData};

/// Scoped wrapper around a pinned page. Dropping the guard unpins the page
/// through the owning buffer pool, passing along whether the holder dirtied
/// it. Callers that mutate the page must call [`PageGuard::mark_dirty`]
/// before the guard goes out of scope.
pub struct PageGuard {
    bpm: Arc<dyn BufferPool>,
    page: Arc<Page>,
    is_dirty: AtomicBool,
}

impl PageGuard {
    pub fn new(bpm: Arc<dyn BufferPool>, page: Arc<Page>) -> Self {
        Self {
            bpm,
            page,
            is_dirty: AtomicBool::new(false),
        }
    }

    pub fn get_page_id(&self) -> PageId {
        self.page.get_page_id()
    }

    pub fn page(&self) -> &Arc<Page> {
        &self.page
    }

    /// Records that the holder mutated the page; the eventual unpin will
    /// carry `dirty = true`.
    pub fn mark_dirty(&self) {
        self.is_dirty.store(true, Ordering::SeqCst);
    }

    /// Acquires the page latch in shared mode.
    pub fn read(&self) -> RwLockReadGuard<'_, PageData> {
        self.page.data().read()
    }

    /// Acquires the page latch in exclusive mode.
    pub fn write(&self) -> RwLockWriteGuard<'_, PageData> {
        self.page.data().write()
    }
}

impl Drop for PageGuard {
    fn drop(&mut self) {
        self.bpm
            .unpin_page(self.page.get_page_id(), self.is_dirty.load(Ordering::SeqCst));
    }
}
