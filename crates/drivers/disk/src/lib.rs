//! Disk Trait for BMFS
//!
//! BMFS talks to storage through a tiny byte-addressable interface: a
//! cursor that can be moved with [`Disk::seek`], and exact reads/writes at
//! that cursor. Anything that can do those three things can host a volume:
//! a RAM buffer during early boot, a raw partition behind an AHCI driver,
//! or an image file on the build host.
//!
//! Backends shipped here:
//! - [`MemDisk`]: fixed-capacity buffer (`no_std` + `alloc`)
//! - [`FileDisk`]: `std::fs::File` wrapper (enable the `std` feature)

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod mem;
#[cfg(feature = "std")]
mod file;

pub use mem::MemDisk;
#[cfg(feature = "std")]
pub use file::FileDisk;

/// Common error type for disk operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DiskError {
    /// Seek target is negative or not representable
    #[error("invalid seek position")]
    InvalidSeek,
    /// Access past the end of a fixed-size device
    #[error("access beyond end of device")]
    OutOfRange,
    /// Device ended before the buffer was filled
    #[error("unexpected end of device")]
    UnexpectedEof,
    /// Device accepted fewer bytes than requested
    #[error("device refused to accept more data")]
    WriteZero,
    /// Device-specific error (errno-style code)
    #[error("device error {0}")]
    Device(i32),
}

impl DiskError {
    /// Convert to errno-style error code
    pub fn to_errno(&self) -> i32 {
        match self {
            DiskError::InvalidSeek => -22, // EINVAL
            DiskError::OutOfRange => -28,  // ENOSPC
            DiskError::UnexpectedEof | DiskError::WriteZero => -5, // EIO
            DiskError::Device(code) => *code,
        }
    }
}

pub type DiskResult<T> = Result<T, DiskError>;

/// Seek origin, mirroring `SEEK_SET` / `SEEK_CUR` / `SEEK_END`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekFrom {
    Start(u64),
    Current(i64),
    End(i64),
}

/// Byte-addressable storage with a single cursor
pub trait Disk {
    /// Move the cursor, returning the new absolute position
    fn seek(&mut self, pos: SeekFrom) -> DiskResult<u64>;

    /// Fill `buffer` from the cursor and advance past it
    fn read(&mut self, buffer: &mut [u8]) -> DiskResult<()>;

    /// Write all of `buffer` at the cursor and advance past it
    fn write(&mut self, buffer: &[u8]) -> DiskResult<()>;

    /// Flush any cached writes to the device
    fn flush(&mut self) -> DiskResult<()> {
        Ok(()) // Default: no caching
    }
}

impl<D: Disk + ?Sized> Disk for &mut D {
    fn seek(&mut self, pos: SeekFrom) -> DiskResult<u64> {
        (**self).seek(pos)
    }

    fn read(&mut self, buffer: &mut [u8]) -> DiskResult<()> {
        (**self).read(buffer)
    }

    fn write(&mut self, buffer: &[u8]) -> DiskResult<()> {
        (**self).write(buffer)
    }

    fn flush(&mut self) -> DiskResult<()> {
        (**self).flush()
    }
}

/// Convenience methods for Disk
pub trait DiskExt: Disk {
    /// Read `buffer.len()` bytes at an absolute offset
    fn read_at(&mut self, offset: u64, buffer: &mut [u8]) -> DiskResult<()> {
        self.seek(SeekFrom::Start(offset))?;
        self.read(buffer)
    }

    /// Write all of `buffer` at an absolute offset
    fn write_at(&mut self, offset: u64, buffer: &[u8]) -> DiskResult<()> {
        self.seek(SeekFrom::Start(offset))?;
        self.write(buffer)
    }

    /// Overwrite `len` bytes starting at `offset` with zeroes
    fn zero_range(&mut self, offset: u64, len: u64) -> DiskResult<()> {
        const CHUNK: usize = 512;
        let zeroes = [0u8; CHUNK];

        self.seek(SeekFrom::Start(offset))?;
        let mut remaining = len;
        while remaining > 0 {
            let n = core::cmp::min(remaining, CHUNK as u64) as usize;
            self.write(&zeroes[..n])?;
            remaining -= n as u64;
        }
        Ok(())
    }

    /// Total device size in bytes (moves the cursor to the end)
    fn size_bytes(&mut self) -> DiskResult<u64> {
        self.seek(SeekFrom::End(0))
    }
}

// Auto-implement DiskExt for all Disk implementors
impl<T: Disk + ?Sized> DiskExt for T {}

/// Resolve a seek request against the current cursor and device length
pub(crate) fn resolve_seek(pos: SeekFrom, cursor: u64, len: u64) -> DiskResult<u64> {
    let target = match pos {
        SeekFrom::Start(offset) => Some(offset),
        SeekFrom::Current(delta) => cursor.checked_add_signed(delta),
        SeekFrom::End(delta) => len.checked_add_signed(delta),
    };
    target.ok_or(DiskError::InvalidSeek)
}
