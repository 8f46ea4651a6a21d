use std::fmt;

use serde::{Deserialize, Serialize};

use crate::common::config::{PageId, INVALID_PAGE_ID};

/// Record ID (RID) - identifies a record's physical location in a table.
///
/// A RID consists of a page ID and slot number, together uniquely identifying
/// the physical location of a tuple. Indexes over opaque keys store RIDs as
/// their values.
#[derive(Debug, Clone, Copy, Eq, PartialEq, PartialOrd, Hash, Ord, Serialize, Deserialize)]
pub struct Rid {
    /// The page identifier within the table heap.
    page_id: PageId,
    /// The slot index within the page's slot directory.
    slot_num: u32,
}

impl Rid {
    /// Fixed-width on-page encoding length (little-endian):
    /// `[page_id: u32][slot_num: u32]`.
    pub const ENCODED_LEN: usize = 4 + 4;

    /// Creates a new RID with the given page ID and slot number.
    ///
    /// # Arguments
    ///
    /// * `page_id` - The page identifier.
    /// * `slot_num` - The slot number within the page.
    pub const fn new(page_id: PageId, slot_num: u32) -> Self {
        Self { page_id, slot_num }
    }

    /// Creates an RID from a 64-bit integer: high 32 bits are the page id,
    /// low 32 bits the slot number.
    pub fn from_i64(rid: i64) -> Self {
        let bits = rid as u64;
        Self::new((bits >> 32) as PageId, bits as u32)
    }

    /// Returns the 64-bit packed representation (high 32 bits: `page_id`,
    /// low 32 bits: `slot_num`).
    pub fn to_i64(&self) -> i64 {
        (((self.page_id as u64) << 32) | (self.slot_num as u64)) as i64
    }

    /// Returns the page ID of the RID.
    pub const fn get_page_id(&self) -> PageId {
        self.page_id
    }

    /// Returns the slot number of the RID.
    pub const fn get_slot_num(&self) -> u32 {
        self.slot_num
    }

    /// Serialize the RID as a fixed-width, little-endian byte array:
    /// `[page_id: u32][slot_num: u32]`.
    pub fn to_bytes_le(&self) -> [u8; Self::ENCODED_LEN] {
        let mut out = [0u8; Self::ENCODED_LEN];
        out[..4].copy_from_slice(&self.page_id.to_le_bytes());
        out[4..8].copy_from_slice(&self.slot_num.to_le_bytes());
        out
    }

    /// Try to deserialize a RID from `[page_id: u32][slot_num: u32]`
    /// (little-endian).
    pub fn try_deserialize(data: &[u8]) -> Option<Self> {
        if data.len() < Self::ENCODED_LEN {
            return None;
        }
        let page_id = PageId::from_le_bytes(data[..4].try_into().ok()?);
        let slot_num = u32::from_le_bytes(data[4..8].try_into().ok()?);
        Some(Self::new(page_id, slot_num))
    }

    /// Deserialize a RID from `[page_id: u32][slot_num: u32]` (little-endian).
    ///
    /// # Panics
    ///
    /// Panics if `data` is shorter than `Rid::ENCODED_LEN`.
    pub fn deserialize(data: &[u8]) -> Self {
        Self::try_deserialize(data).expect("Rid::deserialize: buffer too small")
    }
}

/// Formats the RID as `"page_id: <id> slot_num: <num>"`.
impl fmt::Display for Rid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "page_id: {} slot_num: {}", self.page_id, self.slot_num)
    }
}

/// Returns an invalid RID using [`INVALID_PAGE_ID`] and slot 0.
impl Default for Rid {
    fn default() -> Self {
        Self {
            page_id: INVALID_PAGE_ID,
            slot_num: 0,
        }
    }
}
