//! Filesystem Facade
//!
//! [`Bmfs`] owns the disk and composes the header, allocation table,
//! directory store and resolver into whole-volume operations. Every
//! operation reloads the header from disk first; mutations persist it
//! before returning.
//!
//! [`LockedBmfs`] is the shareable variant: one `spin::Mutex` per volume,
//! held for the duration of each operation.

use alloc::sync::Arc;
use alloc::vec::Vec;
use spin::Mutex;

use bmfs_disk::{Disk, DiskExt};

use crate::dir::{self, Entry, EntryType};
use crate::error::{BmfsError, BmfsResult};
use crate::header::{self, Header};
use crate::layout::{Record, BLOCK_SIZE, DATA_OFFSET, MIN_TOTAL_SIZE, OBJECT_RESERVE, TABLE_MAX};
use crate::resolve;
use crate::table::{self, TableEntry};
use crate::time::Clock;
#[cfg(feature = "std")]
use crate::time::SystemClock;

// ============================================================================
// OPTIONS AND STATISTICS
// ============================================================================

/// Runtime behaviour switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FsOptions {
    /// Refuse to create a name that already exists in the parent directory.
    /// The format itself permits duplicates. Uses the same lookup as
    /// `lookup`, so `"a"` is refused while a sibling `"ab"` exists.
    pub reject_duplicates: bool,
}

/// Volume usage summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FsStats {
    /// Volume size from the header
    pub total_size: u64,
    /// Sum of reserved (block-rounded) region sizes
    pub reserved_bytes: u64,
    /// Sum of requested region sizes
    pub used_bytes: u64,
    /// Bytes between the end of the last region and the end of the volume
    pub free_bytes: u64,
    /// Live allocation table records
    pub table_entries: u64,
    /// Allocation table capacity
    pub table_capacity: u64,
}

// ============================================================================
// FACADE
// ============================================================================

/// A BMFS volume on disk `D`, timestamping entries with clock `C`
pub struct Bmfs<D: Disk, C: Clock> {
    disk: D,
    header: Header,
    clock: C,
    options: FsOptions,
}

#[cfg(feature = "std")]
impl<D: Disk> Bmfs<D, SystemClock> {
    /// Wrap `disk` without reading it; call [`Bmfs::format`] next
    pub fn new(disk: D) -> Self {
        Self::with_clock(disk, SystemClock)
    }

    /// Open an existing volume
    pub fn mount(disk: D) -> BmfsResult<Self> {
        Self::mount_with_clock(disk, SystemClock)
    }
}

impl<D: Disk, C: Clock> Bmfs<D, C> {
    pub fn with_clock(disk: D, clock: C) -> Self {
        Bmfs {
            disk,
            header: Header::default(),
            clock,
            options: FsOptions::default(),
        }
    }

    /// Open an existing volume, failing if the header signature is wrong
    pub fn mount_with_clock(disk: D, clock: C) -> BmfsResult<Self> {
        let mut fs = Self::with_clock(disk, clock);
        let header = fs.load_header()?;
        log::debug!(
            "mounted BMFS volume: {} bytes, {} table entries",
            header.total_size,
            header.table_entry_count
        );
        Ok(fs)
    }

    pub fn with_options(mut self, options: FsOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> FsOptions {
        self.options
    }

    /// Re-read the header and check its signature
    fn load_header(&mut self) -> BmfsResult<Header> {
        let header = Header::read(&mut self.disk)?;
        header.validate()?;
        self.header = header;
        Ok(header)
    }

    // ------------------------------------------------------------------------
    // Volume
    // ------------------------------------------------------------------------

    /// Initialize an empty volume of `total_size` bytes
    ///
    /// Writes the header, reserves and clears one block for the root
    /// directory, and stores the root Entry. Anything previously on the
    /// volume becomes unreachable. Fails with `NoSpace` without touching the
    /// disk if `total_size` is below the minimum or larger than the disk.
    pub fn format(&mut self, total_size: u64) -> BmfsResult<()> {
        if total_size < MIN_TOTAL_SIZE {
            return Err(BmfsError::NoSpace);
        }

        let disk_size = self.disk.size_bytes()?;
        if total_size > disk_size {
            log::warn!(
                "cannot format {} bytes on a {} byte disk",
                total_size,
                disk_size
            );
            return Err(BmfsError::NoSpace);
        }

        let mut header = header::format(&mut self.disk, total_size)?;
        let root_block = table::allocate(&mut self.disk, &mut header, BLOCK_SIZE)?;
        dir::clear_block(&mut self.disk, root_block)?;

        let now = self.clock.now();
        let mut root = Entry::new(EntryType::Directory, root_block);
        root.creation_time = now;
        root.modification_time = now;
        root.write_at(&mut self.disk, header.root_offset)?;

        self.header = header;
        log::info!(
            "formatted BMFS volume: {} bytes, root directory at {:#x}",
            total_size,
            root_block
        );
        Ok(())
    }

    /// Check that the disk holds a BMFS volume
    pub fn check_signature(&mut self) -> BmfsResult<()> {
        self.load_header().map(|_| ())
    }

    /// Current header, freshly read
    pub fn header(&mut self) -> BmfsResult<Header> {
        self.load_header()
    }

    /// Usage summary built from the allocation table
    pub fn stats(&mut self) -> BmfsResult<FsStats> {
        let header = self.load_header()?;
        let entries = table::entries(&mut self.disk, &header)?;

        let reserved_bytes = entries.iter().map(|e| e.reserved).sum();
        let used_bytes = entries.iter().map(|e| e.used).sum();
        let data_end = match entries.last() {
            Some(last) => last.end().unwrap_or(u64::MAX),
            None => DATA_OFFSET,
        };

        Ok(FsStats {
            total_size: header.total_size,
            reserved_bytes,
            used_bytes,
            free_bytes: header.total_size.saturating_sub(data_end),
            table_entries: header.table_entry_count,
            table_capacity: TABLE_MAX,
        })
    }

    /// Live allocation table records
    pub fn table_entries(&mut self) -> BmfsResult<Vec<TableEntry>> {
        let header = self.load_header()?;
        table::entries(&mut self.disk, &header)
    }

    // ------------------------------------------------------------------------
    // Allocation
    // ------------------------------------------------------------------------

    /// Reserve a raw region of at least `size` bytes
    pub fn allocate(&mut self, size: u64) -> BmfsResult<u64> {
        self.load_header()?;
        table::allocate(&mut self.disk, &mut self.header, size)
    }

    /// Reserve a raw region of `mebibytes` MiB
    pub fn allocate_mebibytes(&mut self, mebibytes: u64) -> BmfsResult<u64> {
        self.load_header()?;
        table::allocate_mebibytes(&mut self.disk, &mut self.header, mebibytes)
    }

    // ------------------------------------------------------------------------
    // Namespace
    // ------------------------------------------------------------------------

    /// Create a file or directory at `path`
    ///
    /// The object's region is reserved before the path is resolved. If
    /// resolution or insertion then fails, the region stays allocated.
    pub fn create(&mut self, path: &str, entry_type: EntryType) -> BmfsResult<Entry> {
        if entry_type == EntryType::Unknown {
            return Err(BmfsError::Fault);
        }
        self.load_header()?;

        if self.options.reject_duplicates {
            let (parent, name) = resolve::resolve_parent(&mut self.disk, path)?;
            match dir::find_entry(&mut self.disk, parent.offset, name) {
                Ok(_) => return Err(BmfsError::AlreadyExists),
                Err(BmfsError::NotFound) => {}
                Err(e) => return Err(e),
            }
        }

        let offset = table::allocate(&mut self.disk, &mut self.header, OBJECT_RESERVE)?;

        let now = self.clock.now();
        let mut entry = Entry::new(entry_type, offset);
        entry.creation_time = now;
        entry.modification_time = now;

        if let Err(err) = self.link(path, &mut entry) {
            log::warn!(
                "create {:?} failed ({}); region at {:#x} stays allocated",
                path,
                err,
                offset
            );
            return Err(err);
        }

        log::debug!("created {:?} {:?} at {:#x}", entry_type, path, offset);
        Ok(entry)
    }

    /// Name `entry` after the basename of `path` and store it in the parent
    fn link(&mut self, path: &str, entry: &mut Entry) -> BmfsResult<()> {
        let (parent, name) = resolve::resolve_parent(&mut self.disk, path)?;
        entry.set_name(name)?;

        if entry.is_directory() {
            dir::clear_block(&mut self.disk, entry.offset)?;
        }

        dir::add_entry(&mut self.disk, parent.offset, entry)
    }

    pub fn create_file(&mut self, path: &str) -> BmfsResult<Entry> {
        self.create(path, EntryType::File)
    }

    pub fn create_dir(&mut self, path: &str) -> BmfsResult<Entry> {
        self.create(path, EntryType::Directory)
    }

    /// Not supported by format version 1
    pub fn delete_file(&mut self, _path: &str) -> BmfsResult<()> {
        Err(BmfsError::NotImplemented)
    }

    /// Parent directory Entry of `path`, and its basename
    pub fn resolve_parent<'p>(&mut self, path: &'p str) -> BmfsResult<(Entry, &'p str)> {
        self.load_header()?;
        resolve::resolve_parent(&mut self.disk, path)
    }

    /// Entry named by `path`
    pub fn lookup(&mut self, path: &str) -> BmfsResult<Entry> {
        self.load_header()?;
        resolve::lookup(&mut self.disk, path)
    }

    /// Occupied slots of the directory at `path`
    pub fn read_dir(&mut self, path: &str) -> BmfsResult<Vec<Entry>> {
        let entry = self.lookup(path)?;
        if !entry.is_directory() {
            return Err(BmfsError::NotADirectory);
        }
        dir::list_entries(&mut self.disk, entry.offset)
    }

    // ------------------------------------------------------------------------
    // Disk access
    // ------------------------------------------------------------------------

    /// Borrow the underlying disk
    pub fn disk_mut(&mut self) -> &mut D {
        &mut self.disk
    }

    /// Flush and hand back the disk
    ///
    /// On a flush error the disk is dropped with the facade.
    pub fn into_disk(mut self) -> BmfsResult<D> {
        self.disk.flush()?;
        Ok(self.disk)
    }
}

// ============================================================================
// LOCKED FACADE
// ============================================================================

/// Shareable handle that serializes operations on one volume
pub struct LockedBmfs<D: Disk, C: Clock> {
    inner: Arc<Mutex<Bmfs<D, C>>>,
}

impl<D: Disk, C: Clock> Clone for LockedBmfs<D, C> {
    fn clone(&self) -> Self {
        LockedBmfs {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D: Disk, C: Clock> LockedBmfs<D, C> {
    pub fn new(fs: Bmfs<D, C>) -> Self {
        LockedBmfs {
            inner: Arc::new(Mutex::new(fs)),
        }
    }

    /// Hold the lock across several operations
    pub fn lock(&self) -> spin::MutexGuard<'_, Bmfs<D, C>> {
        self.inner.lock()
    }

    /// Take the facade back if this is the last handle
    pub fn into_inner(self) -> Result<Bmfs<D, C>, Self> {
        Arc::try_unwrap(self.inner)
            .map(Mutex::into_inner)
            .map_err(|inner| LockedBmfs { inner })
    }

    pub fn format(&self, total_size: u64) -> BmfsResult<()> {
        self.inner.lock().format(total_size)
    }

    pub fn check_signature(&self) -> BmfsResult<()> {
        self.inner.lock().check_signature()
    }

    pub fn header(&self) -> BmfsResult<Header> {
        self.inner.lock().header()
    }

    pub fn stats(&self) -> BmfsResult<FsStats> {
        self.inner.lock().stats()
    }

    pub fn allocate(&self, size: u64) -> BmfsResult<u64> {
        self.inner.lock().allocate(size)
    }

    pub fn create(&self, path: &str, entry_type: EntryType) -> BmfsResult<Entry> {
        self.inner.lock().create(path, entry_type)
    }

    pub fn create_file(&self, path: &str) -> BmfsResult<Entry> {
        self.inner.lock().create_file(path)
    }

    pub fn create_dir(&self, path: &str) -> BmfsResult<Entry> {
        self.inner.lock().create_dir(path)
    }

    pub fn delete_file(&self, path: &str) -> BmfsResult<()> {
        self.inner.lock().delete_file(path)
    }

    pub fn lookup(&self, path: &str) -> BmfsResult<Entry> {
        self.inner.lock().lookup(path)
    }

    pub fn read_dir(&self, path: &str) -> BmfsResult<Vec<Entry>> {
        self.inner.lock().read_dir(path)
    }
}
