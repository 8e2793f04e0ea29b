//! BMFS On-Disk Layout
//!
//! Every constant here is part of format version 1. Two implementations
//! that agree on these values can read each other's volumes.
//!
//! ```text
//! 0                 512                         25088      25344   28672
//! ┌─────────────────┬───────────────────────────┬──────────┬───────┬──────────────────
//! │ Header          │ Allocation table          │ Root     │ (pad) │ Data regions ...
//! │ (40 B + zeroes) │ TABLE_MAX x 24 B records  │ Entry    │       │ (first = root dir)
//! └─────────────────┴───────────────────────────┴──────────┴───────┴──────────────────
//! ```
//!
//! All integers are little-endian.

use bmfs_disk::{Disk, DiskExt};

use crate::error::BmfsResult;

// ============================================================================
// FORMAT CONSTANTS
// ============================================================================

/// On-disk format version described by this module
pub const FORMAT_VERSION: u32 = 1;

/// Header magic
pub const SIGNATURE: [u8; 8] = *b"BMFS\0\0\0\0";

/// Allocation granularity
pub const BLOCK_SIZE: u64 = 4096;

/// Bytes reserved for the header at offset 0
pub const HEADER_SIZE: usize = 512;

/// Size of one allocation table record
pub const TABLE_ENTRY_SIZE: usize = 24;

/// Maximum number of allocation table records
pub const TABLE_MAX: u64 = 1024;

/// Size of one directory entry record
pub const ENTRY_SIZE: usize = 256;

/// Size of the name buffer, including the terminator
pub const NAME_MAX: usize = 192;

/// Directory fan-out: entry slots in one directory block
pub const ENTRIES_PER_DIR: u64 = BLOCK_SIZE / ENTRY_SIZE as u64;

/// Byte offset of the allocation table
pub const TABLE_OFFSET: u64 = HEADER_SIZE as u64;

/// Byte offset of the root directory's Entry record
pub const ROOT_OFFSET: u64 = TABLE_OFFSET + TABLE_MAX * TABLE_ENTRY_SIZE as u64;

/// Start of the first allocated region
pub const DATA_OFFSET: u64 = round_up_const(ROOT_OFFSET + ENTRY_SIZE as u64, BLOCK_SIZE);

/// Region reserved for every file or directory created through the facade
pub const OBJECT_RESERVE: u64 = 2 * MIB;

/// Smallest volume that can hold the root directory block
pub const MIN_TOTAL_SIZE: u64 = DATA_OFFSET + BLOCK_SIZE;

/// One mebibyte
pub const MIB: u64 = 1024 * 1024;

const fn round_up_const(value: u64, align: u64) -> u64 {
    value.div_ceil(align) * align
}

// ============================================================================
// COMPILE-TIME CHECKS
// ============================================================================

const _: () = assert!(BLOCK_SIZE % ENTRY_SIZE as u64 == 0);
const _: () = assert!(NAME_MAX + 28 <= ENTRY_SIZE);
const TABLE_END: u64 = TABLE_OFFSET + TABLE_MAX * TABLE_ENTRY_SIZE as u64;
const _: () = assert!(TABLE_END <= ROOT_OFFSET);
const _: () = assert!(ROOT_OFFSET + ENTRY_SIZE as u64 <= DATA_OFFSET);
const _: () = assert!(DATA_OFFSET % BLOCK_SIZE == 0);

// ============================================================================
// RECORD ENCODING
// ============================================================================

/// Largest record size, used for stack buffers
const MAX_RECORD_SIZE: usize = HEADER_SIZE;

/// A fixed-size on-disk record
pub trait Record: Sized {
    /// Encoded size in bytes
    const SIZE: usize;

    /// Encode into `buf[..Self::SIZE]`; bytes not covered by a field are zeroed
    fn encode(&self, buf: &mut [u8]);

    /// Decode from `buf[..Self::SIZE]`
    fn decode(buf: &[u8]) -> Self;

    /// Read one record at the disk cursor
    fn read_from<D: Disk>(disk: &mut D) -> BmfsResult<Self> {
        let mut buf = [0u8; MAX_RECORD_SIZE];
        disk.read(&mut buf[..Self::SIZE])?;
        Ok(Self::decode(&buf[..Self::SIZE]))
    }

    /// Write one record at the disk cursor
    fn write_to<D: Disk>(&self, disk: &mut D) -> BmfsResult<()> {
        let mut buf = [0u8; MAX_RECORD_SIZE];
        self.encode(&mut buf[..Self::SIZE]);
        disk.write(&buf[..Self::SIZE])?;
        Ok(())
    }

    /// Read one record at an absolute offset
    fn read_at<D: Disk>(disk: &mut D, offset: u64) -> BmfsResult<Self> {
        let mut buf = [0u8; MAX_RECORD_SIZE];
        disk.read_at(offset, &mut buf[..Self::SIZE])?;
        Ok(Self::decode(&buf[..Self::SIZE]))
    }

    /// Write one record at an absolute offset
    fn write_at<D: Disk>(&self, disk: &mut D, offset: u64) -> BmfsResult<()> {
        let mut buf = [0u8; MAX_RECORD_SIZE];
        self.encode(&mut buf[..Self::SIZE]);
        disk.write_at(offset, &buf[..Self::SIZE])?;
        Ok(())
    }
}

pub(crate) fn get_u64(buf: &[u8], at: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[at..at + 8]);
    u64::from_le_bytes(bytes)
}

pub(crate) fn put_u64(buf: &mut [u8], at: usize, value: u64) {
    buf[at..at + 8].copy_from_slice(&value.to_le_bytes());
}

pub(crate) fn get_u32(buf: &[u8], at: usize) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&buf[at..at + 4]);
    u32::from_le_bytes(bytes)
}

pub(crate) fn put_u32(buf: &mut [u8], at: usize, value: u32) {
    buf[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

/// Round `size` up to a whole number of blocks, `None` on overflow
pub fn round_up_to_block(size: u64) -> Option<u64> {
    size.checked_add(BLOCK_SIZE - 1)
        .map(|padded| padded / BLOCK_SIZE * BLOCK_SIZE)
}
