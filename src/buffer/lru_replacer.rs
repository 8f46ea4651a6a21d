use std::collections::{HashSet, VecDeque};

use parking_lot::Mutex;

use crate::common::config::FrameId;

struct LruInner {
    /// Eviction order: front is the most recently made available, back is
    /// the next victim.
    queue: VecDeque<FrameId>,
    members: HashSet<FrameId>,
}

/// LRU replacement policy over buffer pool frames. Tracks the frames that
/// are available for eviction; `victim` removes and returns the least
/// recently made-available one. All operations are mutually exclusive.
pub struct LruReplacer {
    inner: Mutex<LruInner>,
    capacity: usize,
}

impl LruReplacer {
    /// Creates a replacer able to track up to `num_pages` frames.
    pub fn new(num_pages: usize) -> Self {
        Self {
            inner: Mutex::new(LruInner {
                queue: VecDeque::with_capacity(num_pages),
                members: HashSet::with_capacity(num_pages),
            }),
            capacity: num_pages,
        }
    }

    /// Removes and returns the least recently made-available frame, or
    /// `None` when no frame is evictable.
    pub fn victim(&self) -> Option<FrameId> {
        let mut inner = self.inner.lock();
        let frame_id = inner.queue.pop_back()?;
        inner.members.remove(&frame_id);
        Some(frame_id)
    }

    /// Removes a frame from eviction eligibility. Called after a page in the
    /// frame is pinned. No-op if the frame is not tracked.
    pub fn pin(&self, frame_id: FrameId) {
        let mut inner = self.inner.lock();
        if inner.members.remove(&frame_id) {
            inner.queue.retain(|&f| f != frame_id);
        }
    }

    /// Makes a frame eligible for eviction as the most recently available
    /// one. Called when a page's pin count drops to zero. Idempotent.
    pub fn unpin(&self, frame_id: FrameId) {
        let mut inner = self.inner.lock();
        if inner.members.len() >= self.capacity {
            return;
        }
        if inner.members.insert(frame_id) {
            inner.queue.push_front(frame_id);
        }
    }

    /// Number of frames currently eligible for eviction.
    pub fn size(&self) -> usize {
        self.inner.lock().members.len()
    }
}
