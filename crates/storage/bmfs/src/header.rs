//! BMFS Header (superblock)
//!
//! Stored at offset 0. Only the first 40 bytes carry fields; the rest of
//! the [`HEADER_SIZE`] area is written as zeroes.

use bmfs_disk::Disk;

use crate::error::{BmfsError, BmfsResult};
use crate::layout::{
    get_u64, put_u64, Record, HEADER_SIZE, ROOT_OFFSET, SIGNATURE, TABLE_ENTRY_SIZE, TABLE_OFFSET,
};

/// Global layout fields of a volume
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Fixed magic, see [`SIGNATURE`]
    pub signature: [u8; 8],
    /// Total usable bytes
    pub total_size: u64,
    /// Byte offset of the allocation table
    pub table_offset: u64,
    /// Number of live allocation table records
    pub table_entry_count: u64,
    /// Byte offset of the root directory's Entry record
    pub root_offset: u64,
}

impl Header {
    /// Header for a freshly formatted volume of `total_size` bytes
    pub fn new(total_size: u64) -> Self {
        Header {
            signature: SIGNATURE,
            total_size,
            table_offset: TABLE_OFFSET,
            table_entry_count: 0,
            root_offset: ROOT_OFFSET,
        }
    }

    /// Check the magic
    pub fn validate(&self) -> BmfsResult<()> {
        if self.signature != SIGNATURE {
            return Err(BmfsError::InvalidSignature);
        }
        Ok(())
    }

    /// Read the header at offset 0
    pub fn read<D: Disk>(disk: &mut D) -> BmfsResult<Self> {
        let header = Self::read_at(disk, 0)?;
        debug_fs!(
            "header: size={} table@{} count={} root@{}",
            header.total_size,
            header.table_offset,
            header.table_entry_count,
            header.root_offset
        );
        Ok(header)
    }

    /// Persist the header at offset 0
    pub fn write<D: Disk>(&self, disk: &mut D) -> BmfsResult<()> {
        self.write_at(disk, 0)
    }

    /// Byte offset of allocation table slot `index`
    pub fn table_slot_offset(&self, index: u64) -> BmfsResult<u64> {
        index
            .checked_mul(TABLE_ENTRY_SIZE as u64)
            .and_then(|rel| rel.checked_add(self.table_offset))
            .ok_or(BmfsError::Fault)
    }
}

impl Default for Header {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Record for Header {
    const SIZE: usize = HEADER_SIZE;

    fn encode(&self, buf: &mut [u8]) {
        buf[..Self::SIZE].fill(0);
        buf[0..8].copy_from_slice(&self.signature);
        put_u64(buf, 8, self.total_size);
        put_u64(buf, 16, self.table_offset);
        put_u64(buf, 24, self.table_entry_count);
        put_u64(buf, 32, self.root_offset);
    }

    fn decode(buf: &[u8]) -> Self {
        let mut signature = [0u8; 8];
        signature.copy_from_slice(&buf[0..8]);
        Header {
            signature,
            total_size: get_u64(buf, 8),
            table_offset: get_u64(buf, 16),
            table_entry_count: get_u64(buf, 24),
            root_offset: get_u64(buf, 32),
        }
    }
}

/// Write a fresh header for a volume of `total_size` bytes
///
/// The allocation table is left as-is on disk: with a live count of zero
/// none of its slots are read before being overwritten.
pub fn format<D: Disk>(disk: &mut D, total_size: u64) -> BmfsResult<Header> {
    let header = Header::new(total_size);
    header.write(disk)?;
    Ok(header)
}
