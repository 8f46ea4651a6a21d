use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

use parking_lot::RwLock;

use crate::common::config::{PageId, DB_PAGE_SIZE};

/// Raw bytes of one page.
pub type PageData = [u8; DB_PAGE_SIZE];

/**
 * Page is the basic unit of storage within the database system. Page provides
 * a wrapper for the actual data page held in main memory plus the
 * book-keeping used by the buffer pool manager: pin count, dirty flag and the
 * page latch.
 *
 * The `RwLock` around the data is the per-page reader-writer latch: callers
 * take `data().read()` for shared access and `data().write()` for exclusive
 * access, always after acquiring any higher-level lock (lock order is table
 * lock first, page latch second).
 */
pub struct Page {
    /** The ID of this page. */
    page_id: PageId,
    /** The pin count of this page. */
    pin_count: AtomicI32,
    /** True if the page differs from its image on disk. */
    is_dirty: AtomicBool,
    /** The actual data stored within the page, behind the page latch. */
    data: RwLock<PageData>,
}

impl Page {
    /// Constructor. Zeroes out the page data.
    pub fn new(page_id: PageId) -> Self {
        Self {
            page_id,
            pin_count: AtomicI32::new(0),
            is_dirty: AtomicBool::new(false),
            data: RwLock::new([0; DB_PAGE_SIZE]),
        }
    }

    /// Constructs a page around bytes read from disk.
    pub fn from_data(page_id: PageId, data: PageData) -> Self {
        Self {
            page_id,
            pin_count: AtomicI32::new(0),
            is_dirty: AtomicBool::new(false),
            data: RwLock::new(data),
        }
    }

    /// Returns the page id of this page.
    pub fn get_page_id(&self) -> PageId {
        self.page_id
    }

    /// Returns the pin count of this page.
    pub fn get_pin_count(&self) -> i32 {
        self.pin_count.load(Ordering::SeqCst)
    }

    /// Returns true if the page in memory has been modified from the page on
    /// disk.
    pub fn is_dirty(&self) -> bool {
        self.is_dirty.load(Ordering::SeqCst)
    }

    /// Sets or clears the dirty flag. The flag is sticky: the buffer pool
    /// only clears it after writing the page back.
    pub fn set_dirty(&self, dirty: bool) {
        self.is_dirty.store(dirty, Ordering::SeqCst);
    }

    /// The page latch plus the bytes it protects.
    pub fn data(&self) -> &RwLock<PageData> {
        &self.data
    }

    pub(crate) fn incr_pin_count(&self) -> i32 {
        self.pin_count.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub(crate) fn decr_pin_count(&self) -> i32 {
        self.pin_count.fetch_sub(1, Ordering::SeqCst) - 1
    }
}
