use std::sync::Arc;

use parking_lot::Mutex;

use crate::buffer::buffer_pool_manager::BufferPoolManager;
use crate::buffer::BufferPool;
use crate::common::config::PageId;
use crate::common::exception::BufferPoolError;
use crate::storage::disk::disk_manager::DiskIO;
use crate::storage::page::page::Page;

/// Shards pages across several [`BufferPoolManager`] instances to cut lock
/// contention. Page `p` belongs to instance `p % num_instances`; allocation
/// round-robins through the instances starting at an internal cursor so load
/// spreads evenly.
pub struct ParallelBufferPoolManager {
    instances: Vec<Arc<BufferPoolManager>>,
    next_instance: Mutex<usize>,
}

impl ParallelBufferPoolManager {
    /// Creates `num_instances` pools of `pool_size` frames each, all backed
    /// by the same disk manager.
    pub fn new(num_instances: usize, pool_size: usize, disk_manager: Arc<dyn DiskIO>) -> Self {
        assert!(num_instances > 0);
        let instances = (0..num_instances)
            .map(|i| {
                Arc::new(BufferPoolManager::with_instance(
                    pool_size,
                    Arc::clone(&disk_manager),
                    i,
                    num_instances,
                ))
            })
            .collect();
        Self {
            instances,
            next_instance: Mutex::new(0),
        }
    }

    /// The instance responsible for `page_id`.
    fn instance_for(&self, page_id: PageId) -> &Arc<BufferPoolManager> {
        &self.instances[page_id as usize % self.instances.len()]
    }
}

impl BufferPool for ParallelBufferPoolManager {
    fn new_page(&self) -> Result<Arc<Page>, BufferPoolError> {
        let mut cursor = self.next_instance.lock();
        for _ in 0..self.instances.len() {
            let instance = &self.instances[*cursor];
            *cursor = (*cursor + 1) % self.instances.len();
            match instance.new_page() {
                Ok(page) => return Ok(page),
                Err(BufferPoolError::NoFreeFrame) => continue,
                Err(e) => return Err(e),
            }
        }
        Err(BufferPoolError::NoFreeFrame)
    }

    fn fetch_page(&self, page_id: PageId) -> Result<Arc<Page>, BufferPoolError> {
        self.instance_for(page_id).fetch_page(page_id)
    }

    fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> bool {
        self.instance_for(page_id).unpin_page(page_id, is_dirty)
    }

    fn flush_page(&self, page_id: PageId) -> bool {
        self.instance_for(page_id).flush_page(page_id)
    }

    fn delete_page(&self, page_id: PageId) -> bool {
        self.instance_for(page_id).delete_page(page_id)
    }

    fn flush_all_pages(&self) {
        for instance in &self.instances {
            instance.flush_all_pages();
        }
    }

    fn pool_size(&self) -> usize {
        self.instances.len() * self.instances[0].pool_size()
    }
}
