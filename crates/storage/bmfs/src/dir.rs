//! Directory Entry Store
//!
//! A directory is exactly one [`BLOCK_SIZE`] block holding
//! [`ENTRIES_PER_DIR`] fixed-size [`Entry`] slots. A slot whose name starts
//! with the terminator is free. Lookups and inserts are linear scans over
//! the block; there is no overflow into a second block.

use alloc::vec::Vec;
use core::fmt;

use bmfs_disk::{Disk, DiskExt, SeekFrom};

use crate::error::{BmfsError, BmfsResult};
use crate::layout::{
    get_u32, get_u64, put_u32, put_u64, Record, BLOCK_SIZE, ENTRIES_PER_DIR, ENTRY_SIZE, NAME_MAX,
};

// ============================================================================
// ENTRY TYPE
// ============================================================================

/// Type of directory entry
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryType {
    /// Unused slot or unrecognised value
    Unknown = 0,
    /// Regular file
    File = 1,
    /// Directory
    Directory = 2,
}

impl EntryType {
    pub fn from_u32(v: u32) -> Self {
        match v {
            1 => EntryType::File,
            2 => EntryType::Directory,
            _ => EntryType::Unknown,
        }
    }
}

// ============================================================================
// DIRECTORY ENTRY
// ============================================================================

/// Directory entry - fixed 256 bytes
///
/// ```text
/// [0..192)   name, NUL-terminated
/// [192..200) offset
/// [200..208) creation time
/// [208..216) modification time
/// [216..220) type
/// [220..256) reserved
/// ```
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    name: [u8; NAME_MAX],
    /// File or directory
    pub entry_type: EntryType,
    /// File: start of its data region. Directory: start of its entry block.
    pub offset: u64,
    /// Seconds since the Unix epoch
    pub creation_time: u64,
    /// Seconds since the Unix epoch
    pub modification_time: u64,
}

impl Entry {
    /// Create an unnamed entry
    pub fn new(entry_type: EntryType, offset: u64) -> Self {
        Entry {
            name: [0; NAME_MAX],
            entry_type,
            offset,
            creation_time: 0,
            modification_time: 0,
        }
    }

    /// An all-zero, unused slot
    pub fn empty() -> Self {
        Self::new(EntryType::Unknown, 0)
    }

    /// Set the name, leaving room for the terminator
    pub fn set_name(&mut self, name: &str) -> BmfsResult<()> {
        if !bmfs_path::is_valid_name(name, NAME_MAX - 1) {
            return Err(BmfsError::InvalidName);
        }

        self.name = [0; NAME_MAX];
        self.name[..name.len()].copy_from_slice(name.as_bytes());
        Ok(())
    }

    /// Name bytes up to the terminator
    pub fn name(&self) -> &[u8] {
        let len = self.name.iter().position(|&b| b == 0).unwrap_or(NAME_MAX);
        &self.name[..len]
    }

    /// Name as a string slice (empty if not UTF-8)
    pub fn name_str(&self) -> &str {
        core::str::from_utf8(self.name()).unwrap_or("")
    }

    /// True iff the first name byte is the terminator
    pub fn is_empty(&self) -> bool {
        self.name[0] == 0
    }

    pub fn is_directory(&self) -> bool {
        self.entry_type == EntryType::Directory
    }

    pub fn is_file(&self) -> bool {
        self.entry_type == EntryType::File
    }

    /// Check whether the stored name equals `name` over `name`'s length
    ///
    /// Bytes past the query are not compared, so `"boot"` also matches a
    /// slot named `"boot.cfg"`. Never matches an empty name or one that
    /// could not have been stored (`NAME_MAX` bytes or longer).
    pub fn matches_name(&self, name: &[u8]) -> bool {
        if name.is_empty() || name.len() >= NAME_MAX {
            return false;
        }

        self.name[..name.len()] == *name
    }
}

impl Default for Entry {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("name", &self.name_str())
            .field("entry_type", &self.entry_type)
            .field("offset", &self.offset)
            .field("creation_time", &self.creation_time)
            .field("modification_time", &self.modification_time)
            .finish()
    }
}

impl Record for Entry {
    const SIZE: usize = ENTRY_SIZE;

    fn encode(&self, buf: &mut [u8]) {
        buf[..Self::SIZE].fill(0);
        buf[..NAME_MAX].copy_from_slice(&self.name);
        put_u64(buf, NAME_MAX, self.offset);
        put_u64(buf, NAME_MAX + 8, self.creation_time);
        put_u64(buf, NAME_MAX + 16, self.modification_time);
        put_u32(buf, NAME_MAX + 24, self.entry_type as u32);
    }

    fn decode(buf: &[u8]) -> Self {
        let mut name = [0u8; NAME_MAX];
        name.copy_from_slice(&buf[..NAME_MAX]);
        Entry {
            name,
            offset: get_u64(buf, NAME_MAX),
            creation_time: get_u64(buf, NAME_MAX + 8),
            modification_time: get_u64(buf, NAME_MAX + 16),
            entry_type: EntryType::from_u32(get_u32(buf, NAME_MAX + 24)),
        }
    }
}

// ============================================================================
// BLOCK OPERATIONS
// ============================================================================

/// Byte offset of slot `index` in the block at `dir_offset`
fn slot_offset(dir_offset: u64, index: u64) -> BmfsResult<u64> {
    dir_offset
        .checked_add(index * ENTRY_SIZE as u64)
        .ok_or(BmfsError::Fault)
}

/// Store `entry` in the first free slot of the directory block at `dir_offset`
///
/// Does not check for an existing entry with the same name.
pub fn add_entry<D: Disk>(disk: &mut D, dir_offset: u64, entry: &Entry) -> BmfsResult<()> {
    disk.seek(SeekFrom::Start(dir_offset))?;

    for index in 0..ENTRIES_PER_DIR {
        let slot = Entry::read_from(disk)?;
        if slot.is_empty() {
            let pos = slot_offset(dir_offset, index)?;
            entry.write_at(disk, pos)?;
            debug_fs!("dir@{:#x}[{}] <- {:?}", dir_offset, index, entry);
            return Ok(());
        }
    }

    Err(BmfsError::NoSpace)
}

/// Find the entry named `name` in the directory block at `dir_offset`
pub fn find_entry<D: Disk>(disk: &mut D, dir_offset: u64, name: &str) -> BmfsResult<Entry> {
    disk.seek(SeekFrom::Start(dir_offset))?;

    for _index in 0..ENTRIES_PER_DIR {
        let slot = Entry::read_from(disk)?;
        if slot.matches_name(name.as_bytes()) {
            debug_fs!("dir@{:#x}[{}] matches {:?}", dir_offset, _index, name);
            return Ok(slot);
        }
    }

    Err(BmfsError::NotFound)
}

/// All occupied slots of the directory block at `dir_offset`, in slot order
pub fn list_entries<D: Disk>(disk: &mut D, dir_offset: u64) -> BmfsResult<Vec<Entry>> {
    disk.seek(SeekFrom::Start(dir_offset))?;

    let mut entries = Vec::new();
    for _ in 0..ENTRIES_PER_DIR {
        let slot = Entry::read_from(disk)?;
        if !slot.is_empty() {
            entries.push(slot);
        }
    }
    Ok(entries)
}

/// Zero the directory block at `dir_offset` so every slot reads as free
pub fn clear_block<D: Disk>(disk: &mut D, dir_offset: u64) -> BmfsResult<()> {
    disk.zero_range(dir_offset, BLOCK_SIZE)?;
    Ok(())
}
