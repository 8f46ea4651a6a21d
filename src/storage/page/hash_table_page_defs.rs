use crate::common::config::DB_PAGE_SIZE;
use crate::storage::index::codec::FixedCodec;

pub type MappingType<KeyType, ValueType> = (KeyType, ValueType);

/**
 * BUCKET_ARRAY_SIZE is the number of (key, value) pairs that can be stored in
 * an extendible hash index bucket page. It is an approximate calculation
 * based on the encoded size of the key/value pair. For each pair we need two
 * additional bits for occupied_ and readable_:
 * 4 * DB_PAGE_SIZE / (4 * pair_size + 1) = DB_PAGE_SIZE / (pair_size + 0.25)
 * because 0.25 bytes = 2 bits is the space required to maintain the occupied
 * and readable flags for a key value pair.
 */
pub const fn bucket_array_size<KeyType: FixedCodec, ValueType: FixedCodec>() -> usize {
    (4 * DB_PAGE_SIZE) / (4 * (KeyType::ENCODED_LEN + ValueType::ENCODED_LEN) + 1)
}

/**
 * DIRECTORY_ARRAY_SIZE is the number of page_ids that can fit in the
 * directory page of an extendible hash index. This is 512 because the
 * directory array must grow in powers of 2, and 1024 page_ids leaves zero
 * room for storage of the other member variables: page_id_, lsn_,
 * global_depth_, and the array local_depths_.
 */
pub const DIRECTORY_ARRAY_SIZE: usize = 512;

/// Upper bound on both global and local depth; 2^9 = DIRECTORY_ARRAY_SIZE.
pub const HASH_TABLE_MAX_DEPTH: u32 = 9;
