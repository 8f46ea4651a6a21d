use log::{info, trace};
use spin::Mutex;
use std::fs::{File, OpenOptions};
use std::io::Result as IoResult;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::atomic::{AtomicI32, Ordering};

use crate::common::config::{PageId, DB_PAGE_SIZE};

/// The `DiskIO` trait defines the basic operations for interacting with disk
/// storage. Implementers of this trait must provide methods to write and read
/// pages.
pub trait DiskIO: Send + Sync {
    fn write_page(&self, page_id: PageId, page_data: &[u8; DB_PAGE_SIZE]) -> IoResult<()>;
    fn read_page(&self, page_id: PageId, page_data: &mut [u8; DB_PAGE_SIZE]) -> IoResult<()>;
}

/// The `FileDiskManager` performs page-aligned block I/O against a single
/// database file.
pub struct FileDiskManager {
    file_name: String,
    db_io: Mutex<File>,
    num_flushes: AtomicI32,
    num_writes: AtomicI32,
}

impl FileDiskManager {
    /// Creates a new instance of the `FileDiskManager`, creating the backing
    /// file if it does not exist.
    ///
    /// # Arguments
    ///
    /// * `db_file` - The path to the database file.
    pub fn new(db_file: impl Into<String>) -> IoResult<Self> {
        let file_name = db_file.into();
        let db_io = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&file_name)?;

        Ok(Self {
            file_name,
            db_io: Mutex::new(db_io),
            num_flushes: AtomicI32::new(0),
            num_writes: AtomicI32::new(0),
        })
    }

    /// Shuts down the disk manager by flushing any buffered data to disk.
    pub fn shut_down(&self) -> IoResult<()> {
        let mut db_io = self.db_io.lock();
        db_io.flush()?;
        info!("disk manager for {} shut down", self.file_name);
        Ok(())
    }

    /// Retrieves the number of page flushes performed.
    pub fn get_num_flushes(&self) -> i32 {
        self.num_flushes.load(Ordering::SeqCst)
    }

    /// Retrieves the number of page writes performed.
    pub fn get_num_writes(&self) -> i32 {
        self.num_writes.load(Ordering::SeqCst)
    }

    /// Retrieves the size of a specified file.
    pub fn get_file_size(file_name: &str) -> IoResult<u64> {
        let path = Path::new(file_name);
        Ok(path.metadata()?.len())
    }
}

impl DiskIO for FileDiskManager {
    fn write_page(&self, page_id: PageId, page_data: &[u8; DB_PAGE_SIZE]) -> IoResult<()> {
        let offset = page_id as u64 * DB_PAGE_SIZE as u64;
        trace!("writing page {} at offset {}", page_id, offset);

        let mut db_io = self.db_io.lock();
        db_io.seek(SeekFrom::Start(offset))?;
        db_io.write_all(page_data)?;
        db_io.flush()?;
        self.num_writes.fetch_add(1, Ordering::SeqCst);
        self.num_flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn read_page(&self, page_id: PageId, page_data: &mut [u8; DB_PAGE_SIZE]) -> IoResult<()> {
        let offset = page_id as u64 * DB_PAGE_SIZE as u64;
        trace!("reading page {} at offset {}", page_id, offset);

        let mut db_io = self.db_io.lock();
        db_io.seek(SeekFrom::Start(offset))?;

        match db_io.read_exact(page_data) {
            Ok(_) => Ok(()),
            Err(ref e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                // Reading past EOF yields a zero-filled tail.
                let bytes_read = db_io.stream_position()?.saturating_sub(offset);
                page_data[bytes_read as usize..].fill(0);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
