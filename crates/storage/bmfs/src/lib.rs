//! BMFS - Bare Metal File System
//!
//! A flat, append-only file system for boot-time storage. Objects are
//! named through a tree of fixed-size directory blocks and backed by
//! contiguous regions handed out by a bump allocator.
//!
//! ## Features
//!
//! - **Fixed layout**: every record lives at a computable byte offset
//! - **Append-only allocation**: regions are never freed or moved
//! - **Single-block directories**: 16 entries each, linear scan
//! - **`no_std`**: needs only `alloc` and something implementing [`Disk`]
//!
//! ## Disk Layout
//!
//! ```text
//! Offset 0:       Header (signature, total size, table and root offsets)
//! Offset 512:     Allocation table (1024 x 24-byte records)
//! Offset 25088:   Root directory Entry (256 bytes)
//! Offset 28672+:  Data regions, first one is the root directory block
//! ```
//!
//! ## Usage
//!
//! ```
//! use bmfs::{Bmfs, EntryType, FixedClock};
//! use bmfs_disk::MemDisk;
//!
//! let mut fs = Bmfs::with_clock(MemDisk::new(8 << 20), FixedClock(0));
//! fs.format(8 << 20).unwrap();
//! fs.create_dir("/boot").unwrap();
//! fs.create_file("/boot/kernel.bin").unwrap();
//!
//! let entry = fs.lookup("/boot/kernel.bin").unwrap();
//! assert_eq!(entry.entry_type, EntryType::File);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

#[macro_use]
mod debug;

pub mod dir;
pub mod error;
pub mod fs;
pub mod header;
pub mod layout;
pub mod resolve;
pub mod table;
pub mod time;

#[cfg(test)]
mod tests;

pub use bmfs_disk::Disk;
pub use dir::{Entry, EntryType};
pub use error::{BmfsError, BmfsResult};
pub use fs::{Bmfs, FsOptions, FsStats, LockedBmfs};
pub use header::Header;
pub use table::TableEntry;
pub use time::{Clock, FixedClock};
#[cfg(feature = "std")]
pub use time::SystemClock;
