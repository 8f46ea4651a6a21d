pub const DB_PAGE_SIZE: usize = 4096; // size of a data page in bytes
pub const BUFFER_POOL_SIZE: usize = 10; // default size of the buffer pool
pub const LRU_REPLACER_CAPACITY: usize = BUFFER_POOL_SIZE; // default replacer capacity

pub type FrameId = usize; // frame id type
pub type PageId = u32; // page id type
pub type TxnId = u64; // transaction id type
pub type Lsn = u32; // log sequence number type

pub const INVALID_PAGE_ID: PageId = PageId::MAX; // invalid page id
pub const INVALID_TXN_ID: TxnId = TxnId::MAX; // invalid transaction id
pub const INVALID_LSN: Lsn = Lsn::MAX; // invalid log sequence number
