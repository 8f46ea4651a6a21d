use thiserror::Error;

/// Errors surfaced by the buffer pool and its collaborators. Expected
/// outcomes (unpinning an unknown page, deleting a pinned page) are reported
/// through boolean returns; these are the fatal cases.
#[derive(Error, Debug)]
pub enum BufferPoolError {
    #[error("all frames are pinned, no frame available for page allocation")]
    NoFreeFrame,
    #[error("disk i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors surfaced by the extendible hash table. Logical outcomes such as
/// "pair already present" or "depth limit reached" are reported through the
/// boolean return value instead.
#[derive(Error, Debug)]
pub enum HashTableError {
    #[error(transparent)]
    BufferPool(#[from] BufferPoolError),
}
