//! In-memory disk

use alloc::vec;
use alloc::vec::Vec;

use crate::{resolve_seek, Disk, DiskError, DiskResult, SeekFrom};

/// Fixed-capacity RAM disk
///
/// The capacity never grows: writes that would run past the end fail with
/// [`DiskError::OutOfRange`] and leave the buffer untouched.
#[derive(Debug, Clone)]
pub struct MemDisk {
    data: Vec<u8>,
    cursor: u64,
}

impl MemDisk {
    /// Create a zero-filled disk of `size` bytes
    pub fn new(size: usize) -> Self {
        MemDisk {
            data: vec![0u8; size],
            cursor: 0,
        }
    }

    /// Wrap an existing image
    pub fn from_vec(data: Vec<u8>) -> Self {
        MemDisk { data, cursor: 0 }
    }

    /// Raw image contents
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_bytes(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consume the disk and return the image
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn span(&self, count: usize) -> Option<(usize, usize)> {
        let start = usize::try_from(self.cursor).ok()?;
        let end = start.checked_add(count)?;
        (end <= self.data.len()).then_some((start, end))
    }
}

impl Disk for MemDisk {
    fn seek(&mut self, pos: SeekFrom) -> DiskResult<u64> {
        self.cursor = resolve_seek(pos, self.cursor, self.data.len() as u64)?;
        Ok(self.cursor)
    }

    fn read(&mut self, buffer: &mut [u8]) -> DiskResult<()> {
        let (start, end) = self.span(buffer.len()).ok_or(DiskError::UnexpectedEof)?;
        buffer.copy_from_slice(&self.data[start..end]);
        self.cursor = end as u64;
        Ok(())
    }

    fn write(&mut self, buffer: &[u8]) -> DiskResult<()> {
        let (start, end) = self.span(buffer.len()).ok_or(DiskError::OutOfRange)?;
        self.data[start..end].copy_from_slice(buffer);
        self.cursor = end as u64;
        Ok(())
    }
}
