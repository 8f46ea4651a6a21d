use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use log::{debug, error, warn};
use parking_lot::Mutex;

use crate::buffer::lru_replacer::LruReplacer;
use crate::buffer::BufferPool;
use crate::common::config::{FrameId, PageId, DB_PAGE_SIZE};
use crate::common::exception::BufferPoolError;
use crate::storage::disk::disk_manager::DiskIO;
use crate::storage::page::page::Page;

struct PoolInner {
    frames: Vec<Option<Arc<Page>>>,
    page_table: HashMap<PageId, FrameId>,
    free_list: VecDeque<FrameId>,
}

/// A buffer pool instance caching a fixed number of pages from a disk
/// manager. Victim frames are taken from the free list first, then from the
/// LRU replacer; dirty victims are written back before reuse.
///
/// Several instances can be striped over one file by the parallel wrapper:
/// instance `i` of `n` allocates page ids `i, i + n, i + 2n, …` so that
/// `page_id % n` always routes back to the owning instance.
pub struct BufferPoolManager {
    pool_size: usize,
    num_instances: usize,
    next_page_id: AtomicU32,
    disk_manager: Arc<dyn DiskIO>,
    replacer: LruReplacer,
    inner: Mutex<PoolInner>,
}

impl BufferPoolManager {
    /// Creates a standalone buffer pool over `disk_manager` with `pool_size`
    /// frames.
    pub fn new(pool_size: usize, disk_manager: Arc<dyn DiskIO>) -> Self {
        Self::with_instance(pool_size, disk_manager, 0, 1)
    }

    /// Creates one instance of a striped pool; see the type-level docs for
    /// the page id allocation scheme.
    pub fn with_instance(
        pool_size: usize,
        disk_manager: Arc<dyn DiskIO>,
        instance_index: usize,
        num_instances: usize,
    ) -> Self {
        assert!(num_instances > 0 && instance_index < num_instances);
        Self {
            pool_size,
            num_instances,
            next_page_id: AtomicU32::new(instance_index as u32),
            disk_manager,
            replacer: LruReplacer::new(pool_size),
            inner: Mutex::new(PoolInner {
                frames: (0..pool_size).map(|_| None).collect(),
                page_table: HashMap::with_capacity(pool_size),
                free_list: (0..pool_size).collect(),
            }),
        }
    }

    fn allocate_page(&self) -> PageId {
        self.next_page_id
            .fetch_add(self.num_instances as u32, Ordering::SeqCst)
    }

    /// Finds a usable frame, evicting (and writing back) a victim if the
    /// free list is empty. On success the frame is empty and owned by the
    /// caller; on failure the pool state is unchanged.
    fn acquire_frame(&self, inner: &mut PoolInner) -> Result<FrameId, BufferPoolError> {
        if let Some(frame_id) = inner.free_list.pop_front() {
            return Ok(frame_id);
        }

        let Some(frame_id) = self.replacer.victim() else {
            warn!("buffer pool exhausted: all {} frames pinned", self.pool_size);
            return Err(BufferPoolError::NoFreeFrame);
        };

        if let Some(old_page) = inner.frames[frame_id].take() {
            if old_page.is_dirty() {
                let data = old_page.data().read();
                if let Err(e) = self.disk_manager.write_page(old_page.get_page_id(), &data) {
                    // put the victim back so the pool stays consistent
                    drop(data);
                    inner.frames[frame_id] = Some(old_page);
                    self.replacer.unpin(frame_id);
                    return Err(e.into());
                }
                old_page.set_dirty(false);
            }
            debug!(
                "evicting page {} from frame {}",
                old_page.get_page_id(),
                frame_id
            );
            inner.page_table.remove(&old_page.get_page_id());
        }

        Ok(frame_id)
    }

    fn frame_page(inner: &PoolInner, frame_id: FrameId) -> &Arc<Page> {
        inner.frames[frame_id]
            .as_ref()
            .expect("page table points at an empty frame")
    }
}

impl BufferPool for BufferPoolManager {
    fn new_page(&self) -> Result<Arc<Page>, BufferPoolError> {
        let mut inner = self.inner.lock();
        let frame_id = self.acquire_frame(&mut inner)?;

        let page_id = self.allocate_page();
        let page = Arc::new(Page::new(page_id));
        page.incr_pin_count();

        inner.frames[frame_id] = Some(Arc::clone(&page));
        inner.page_table.insert(page_id, frame_id);
        self.replacer.pin(frame_id);

        debug!("allocated page {} in frame {}", page_id, frame_id);
        Ok(page)
    }

    fn fetch_page(&self, page_id: PageId) -> Result<Arc<Page>, BufferPoolError> {
        let mut inner = self.inner.lock();

        if let Some(&frame_id) = inner.page_table.get(&page_id) {
            let page = Arc::clone(Self::frame_page(&inner, frame_id));
            page.incr_pin_count();
            self.replacer.pin(frame_id);
            return Ok(page);
        }

        let frame_id = self.acquire_frame(&mut inner)?;

        let mut data = [0u8; DB_PAGE_SIZE];
        if let Err(e) = self.disk_manager.read_page(page_id, &mut data) {
            inner.free_list.push_front(frame_id);
            return Err(e.into());
        }
        let page = Arc::new(Page::from_data(page_id, data));
        page.incr_pin_count();

        inner.frames[frame_id] = Some(Arc::clone(&page));
        inner.page_table.insert(page_id, frame_id);
        self.replacer.pin(frame_id);

        Ok(page)
    }

    fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> bool {
        let inner = self.inner.lock();
        let Some(&frame_id) = inner.page_table.get(&page_id) else {
            return false;
        };
        let page = Self::frame_page(&inner, frame_id);

        if page.get_pin_count() <= 0 {
            return false;
        }
        if is_dirty {
            page.set_dirty(true);
        }
        if page.decr_pin_count() == 0 {
            self.replacer.unpin(frame_id);
        }
        true
    }

    fn flush_page(&self, page_id: PageId) -> bool {
        let inner = self.inner.lock();
        let Some(&frame_id) = inner.page_table.get(&page_id) else {
            return false;
        };
        let page = Self::frame_page(&inner, frame_id);

        let data = page.data().read();
        match self.disk_manager.write_page(page_id, &data) {
            Ok(()) => {
                page.set_dirty(false);
                true
            }
            Err(e) => {
                error!("failed to flush page {}: {}", page_id, e);
                false
            }
        }
    }

    fn delete_page(&self, page_id: PageId) -> bool {
        let mut inner = self.inner.lock();
        let Some(&frame_id) = inner.page_table.get(&page_id) else {
            // not resident; nothing to do
            return true;
        };
        let page = Self::frame_page(&inner, frame_id);
        if page.get_pin_count() > 0 {
            return false;
        }

        inner.page_table.remove(&page_id);
        inner.frames[frame_id] = None;
        self.replacer.pin(frame_id);
        inner.free_list.push_back(frame_id);
        debug!("deleted page {} from frame {}", page_id, frame_id);
        true
    }

    fn flush_all_pages(&self) {
        let inner = self.inner.lock();
        for page in inner.frames.iter().flatten() {
            if page.is_dirty() {
                let data = page.data().read();
                match self.disk_manager.write_page(page.get_page_id(), &data) {
                    Ok(()) => page.set_dirty(false),
                    Err(e) => error!("failed to flush page {}: {}", page.get_page_id(), e),
                }
            }
        }
    }

    fn pool_size(&self) -> usize {
        self.pool_size
    }
}
