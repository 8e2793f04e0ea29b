//! Allocation Table
//!
//! An append-only bump allocator. Each allocation appends one record
//! describing a contiguous, block-aligned region; regions are laid out
//! back to back starting at [`DATA_OFFSET`]. Nothing is ever freed, so the
//! first `table_entry_count` records are always exactly the live set and the
//! next region starts where the last one ends.

use alloc::vec::Vec;
use bmfs_disk::{Disk, SeekFrom};

use crate::error::{BmfsError, BmfsResult};
use crate::header::Header;
use crate::layout::{
    get_u64, put_u64, round_up_to_block, Record, DATA_OFFSET, MIB, TABLE_ENTRY_SIZE, TABLE_MAX,
};

/// One reserved region
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableEntry {
    /// Start of the region
    pub offset: u64,
    /// Bytes requested by the caller
    pub used: u64,
    /// Bytes reserved (`used` rounded up to whole blocks)
    pub reserved: u64,
}

impl TableEntry {
    /// All-zero records mark unused slots
    pub fn is_unused(&self) -> bool {
        self.offset == 0 && self.used == 0 && self.reserved == 0
    }

    /// First byte past the region
    pub fn end(&self) -> Option<u64> {
        self.offset.checked_add(self.reserved)
    }
}

impl Record for TableEntry {
    const SIZE: usize = TABLE_ENTRY_SIZE;

    fn encode(&self, buf: &mut [u8]) {
        put_u64(buf, 0, self.offset);
        put_u64(buf, 8, self.used);
        put_u64(buf, 16, self.reserved);
    }

    fn decode(buf: &[u8]) -> Self {
        TableEntry {
            offset: get_u64(buf, 0),
            used: get_u64(buf, 8),
            reserved: get_u64(buf, 16),
        }
    }
}

/// Read table slot `index`
pub fn read_entry<D: Disk>(disk: &mut D, header: &Header, index: u64) -> BmfsResult<TableEntry> {
    let slot = header.table_slot_offset(index)?;
    TableEntry::read_at(disk, slot)
}

/// Reserve a region of at least `size` bytes and return its offset
///
/// Fails with [`BmfsError::NoSpace`] when the table is full or the region
/// would run past `total_size`, and with [`BmfsError::Fault`] for a zero
/// size or one whose block rounding overflows. The header cache is updated
/// and persisted on success.
pub fn allocate<D: Disk>(disk: &mut D, header: &mut Header, size: u64) -> BmfsResult<u64> {
    if header.table_entry_count >= TABLE_MAX {
        return Err(BmfsError::NoSpace);
    }

    if size == 0 {
        return Err(BmfsError::Fault);
    }
    let reserved = round_up_to_block(size).ok_or(BmfsError::Fault)?;

    let offset = if header.table_entry_count == 0 {
        DATA_OFFSET
    } else {
        let last = read_entry(disk, header, header.table_entry_count - 1)?;
        last.end().ok_or(BmfsError::NoSpace)?
    };

    let end = offset.checked_add(reserved).ok_or(BmfsError::NoSpace)?;
    if end > header.total_size {
        return Err(BmfsError::NoSpace);
    }

    let entry = TableEntry {
        offset,
        used: size,
        reserved,
    };
    let slot = header.table_slot_offset(header.table_entry_count)?;
    entry.write_at(disk, slot)?;
    debug_fs!("table[{}] = {:?}", header.table_entry_count, entry);

    header.table_entry_count += 1;
    header.write(disk)?;

    log::debug!(
        "allocated {} bytes ({} reserved) at {:#x}",
        size,
        reserved,
        offset
    );
    Ok(offset)
}

/// Reserve `mebibytes` MiB
pub fn allocate_mebibytes<D: Disk>(
    disk: &mut D,
    header: &mut Header,
    mebibytes: u64,
) -> BmfsResult<u64> {
    let size = mebibytes.checked_mul(MIB).ok_or(BmfsError::Fault)?;
    allocate(disk, header, size)
}

/// All live records, in allocation order
pub fn entries<D: Disk>(disk: &mut D, header: &Header) -> BmfsResult<Vec<TableEntry>> {
    let count = header.table_entry_count.min(TABLE_MAX);
    let mut entries = Vec::with_capacity(count as usize);

    if count > 0 {
        disk.seek(SeekFrom::Start(header.table_offset))?;
        for _ in 0..count {
            entries.push(TableEntry::read_from(disk)?);
        }
    }

    Ok(entries)
}
