use std::sync::Arc;
use std::sync::Once;

use tempfile::TempDir;

use hematite::buffer::buffer_pool_manager::BufferPoolManager;
use hematite::buffer::parallel_buffer_pool_manager::ParallelBufferPoolManager;
use hematite::buffer::BufferPool;
use hematite::common::logger;
use hematite::storage::disk::disk_manager::FileDiskManager;

static INIT: Once = Once::new();

pub fn init_test_logger() {
    INIT.call_once(|| {
        // Prefer INFO level for CI noise; override via RUST_LOG when needed
        if std::env::var("RUST_LOG").is_err() {
            std::env::set_var("RUST_LOG", "info");
        }
        logger::initialize_logger();
    });
}

/// Scratch database + buffer pool for one test. The backing file lives in a
/// temp dir removed on drop.
pub struct TestContext {
    _temp_dir: TempDir,
    pub bpm: Arc<BufferPoolManager>,
}

impl TestContext {
    pub fn new(pool_size: usize) -> Self {
        init_test_logger();
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");
        let disk_manager = Arc::new(
            FileDiskManager::new(db_path.to_string_lossy().to_string())
                .expect("failed to open db file"),
        );
        let bpm = Arc::new(BufferPoolManager::new(pool_size, disk_manager));
        Self {
            _temp_dir: temp_dir,
            bpm,
        }
    }

    /// The pool as the trait object the index layer consumes.
    pub fn pool(&self) -> Arc<dyn BufferPool> {
        Arc::clone(&self.bpm) as Arc<dyn BufferPool>
    }
}

/// Like [`TestContext`] but sharding pages across several pool instances.
pub struct ParallelTestContext {
    _temp_dir: TempDir,
    pub bpm: Arc<ParallelBufferPoolManager>,
}

impl ParallelTestContext {
    pub fn new(num_instances: usize, pool_size: usize) -> Self {
        init_test_logger();
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");
        let disk_manager = Arc::new(
            FileDiskManager::new(db_path.to_string_lossy().to_string())
                .expect("failed to open db file"),
        );
        let bpm = Arc::new(ParallelBufferPoolManager::new(
            num_instances,
            pool_size,
            disk_manager,
        ));
        Self {
            _temp_dir: temp_dir,
            bpm,
        }
    }
}
