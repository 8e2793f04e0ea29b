//! Volume-level tests for BMFS
//!
//! Run with: cargo test --package bmfs

use alloc::vec::Vec;

use bmfs_disk::{DiskError, MemDisk};

use crate::layout::{
    Record, BLOCK_SIZE, DATA_OFFSET, ENTRIES_PER_DIR, MIB, MIN_TOTAL_SIZE, OBJECT_RESERVE,
    ROOT_OFFSET, TABLE_MAX, TABLE_OFFSET,
};
use crate::*;

// ============================================================================
// HELPERS
// ============================================================================

const NOW: u64 = 1_700_000_000;

/// A freshly formatted volume that fills its whole disk
fn formatted(size: u64) -> Bmfs<MemDisk, FixedClock> {
    let mut fs = Bmfs::with_clock(MemDisk::new(size as usize), FixedClock(NOW));
    fs.format(size).unwrap();
    fs
}

fn names(entries: &[Entry]) -> Vec<&str> {
    entries.iter().map(|e| e.name_str()).collect()
}

// ============================================================================
// FORMAT / MOUNT
// ============================================================================

#[test]
fn test_format_layout() {
    let mut fs = formatted(16 * MIB);

    let header = fs.header().unwrap();
    assert_eq!(header.total_size, 16 * MIB);
    assert_eq!(header.table_offset, TABLE_OFFSET);
    assert_eq!(header.root_offset, ROOT_OFFSET);
    assert_eq!(header.table_entry_count, 1);

    let table = fs.table_entries().unwrap();
    assert_eq!(
        table,
        [TableEntry {
            offset: DATA_OFFSET,
            used: BLOCK_SIZE,
            reserved: BLOCK_SIZE
        }]
    );

    let root = fs.lookup("/").unwrap();
    assert!(root.is_directory());
    assert_eq!(root.offset, DATA_OFFSET);
    assert_eq!(root.creation_time, NOW);
    assert!(fs.read_dir("/").unwrap().is_empty());
}

#[test]
fn test_format_clears_stale_root_block() {
    let mut disk = MemDisk::new(MIB as usize);
    disk.as_mut_bytes().fill(0xA5);

    let mut fs = Bmfs::with_clock(disk, FixedClock(0));
    fs.format(MIB).unwrap();
    assert!(fs.read_dir("/").unwrap().is_empty());
}

#[test]
fn test_format_too_small() {
    let mut fs = Bmfs::with_clock(MemDisk::new(MIN_TOTAL_SIZE as usize), FixedClock(0));
    assert_eq!(fs.format(MIN_TOTAL_SIZE - 1), Err(BmfsError::NoSpace));

    // nothing was written
    let disk = fs.into_disk().unwrap();
    assert!(disk.as_bytes().iter().all(|&b| b == 0));
}

#[test]
fn test_format_larger_than_disk() {
    let mut fs = Bmfs::with_clock(MemDisk::new(MIB as usize), FixedClock(0));
    assert_eq!(fs.format(2 * MIB), Err(BmfsError::NoSpace));

    let disk = fs.into_disk().unwrap();
    assert!(disk.as_bytes().iter().all(|&b| b == 0));
}

#[test]
fn test_format_minimum_size() {
    let mut fs = formatted(MIN_TOTAL_SIZE);
    assert_eq!(fs.stats().unwrap().free_bytes, 0);
    assert_eq!(
        fs.create_file("/x").map(|e| e.offset),
        Err(BmfsError::NoSpace)
    );
}

#[test]
fn test_blank_disk_has_no_signature() {
    let mut fs = Bmfs::with_clock(MemDisk::new(MIB as usize), FixedClock(0));
    assert_eq!(fs.check_signature(), Err(BmfsError::InvalidSignature));
    assert_eq!(
        fs.lookup("/").map(|e| e.offset),
        Err(BmfsError::InvalidSignature)
    );
    assert_eq!(
        fs.create_file("/x").map(|e| e.offset),
        Err(BmfsError::InvalidSignature)
    );

    let mounted = Bmfs::mount_with_clock(MemDisk::new(MIB as usize), FixedClock(0));
    assert_eq!(mounted.err(), Some(BmfsError::InvalidSignature));
}

#[test]
fn test_remount_sees_previous_work() {
    let mut fs = formatted(8 * MIB);
    fs.create_dir("/boot").unwrap();
    fs.create_file("/boot/kernel.bin").unwrap();

    let disk = fs.into_disk().unwrap();
    let mut fs = Bmfs::mount_with_clock(disk, FixedClock(0)).unwrap();
    fs.check_signature().unwrap();
    assert_eq!(names(&fs.read_dir("/boot").unwrap()), ["kernel.bin"]);
    assert_eq!(fs.header().unwrap().table_entry_count, 3);
}

#[test]
fn test_header_reloaded_every_operation() {
    let mut fs = formatted(8 * MIB);
    fs.create_file("/a").unwrap();

    // corrupt the signature behind the facade's back
    fs.disk_mut().as_mut_bytes()[0] = b'X';
    assert_eq!(
        fs.lookup("/a").map(|e| e.offset),
        Err(BmfsError::InvalidSignature)
    );
    assert_eq!(fs.check_signature(), Err(BmfsError::InvalidSignature));
}

// ============================================================================
// CREATE / RESOLVE
// ============================================================================

#[test]
fn test_create_and_resolve() {
    let mut fs = formatted(64 * MIB);

    let docs = fs.create_dir("/docs").unwrap();
    assert_eq!(docs.offset, DATA_OFFSET + BLOCK_SIZE);
    let readme = fs.create_file("/docs/readme.txt").unwrap();
    assert_eq!(readme.offset, docs.offset + OBJECT_RESERVE);

    let (parent, name) = fs.resolve_parent("/docs/readme.txt").unwrap();
    assert_eq!(parent.name(), b"docs");
    assert_eq!(parent.offset, docs.offset);
    assert_eq!(name, "readme.txt");

    let found = fs.lookup("/docs/readme.txt").unwrap();
    assert!(found.is_file());
    assert_eq!(found.offset, readme.offset);
    assert_eq!(found.creation_time, NOW);
    assert_eq!(found.modification_time, NOW);
}

#[test]
fn test_duplicate_names_permitted_by_default() {
    let mut fs = formatted(64 * MIB);
    fs.create_dir("/docs").unwrap();
    let first = fs.create_file("/docs/readme.txt").unwrap();
    let second = fs.create_file("/docs/readme.txt").unwrap();

    // DUPLICATE: two distinct entries now share one name
    assert_ne!(first.offset, second.offset);
    let listing = fs.read_dir("/docs").unwrap();
    assert_eq!(names(&listing), ["readme.txt", "readme.txt"]);

    // lookup returns the first slot
    assert_eq!(fs.lookup("/docs/readme.txt").unwrap().offset, first.offset);
}

#[test]
fn test_reject_duplicates_option() {
    let options = FsOptions {
        reject_duplicates: true,
    };
    let mut fs = formatted(64 * MIB).with_options(options);
    fs.create_dir("/docs").unwrap();
    fs.create_file("/docs/readme.txt").unwrap();
    let count = fs.header().unwrap().table_entry_count;

    assert_eq!(
        fs.create_file("/docs/readme.txt").map(|e| e.offset),
        Err(BmfsError::AlreadyExists)
    );
    // rejected before anything was allocated
    assert_eq!(fs.header().unwrap().table_entry_count, count);

    // still resolves missing parents as usual
    assert_eq!(
        fs.create_file("/nope/readme.txt").map(|e| e.offset),
        Err(BmfsError::NotFound)
    );
    assert_eq!(fs.header().unwrap().table_entry_count, count);
}

#[test]
fn test_root_entry_is_stable() {
    let mut fs = formatted(64 * MIB);

    let mut before = [0u8; 256];
    fs.lookup("/").unwrap().encode(&mut before);

    fs.create_dir("/a").unwrap();
    fs.create_file("/a/one").unwrap();
    fs.create_file("/two").unwrap();

    let root = Entry::read_at(fs.disk_mut(), ROOT_OFFSET).unwrap();
    let mut after = [0u8; 256];
    root.encode(&mut after);
    assert_eq!(before, after);
}

#[test]
fn test_nested_directories() {
    let mut fs = formatted(16 * MIB);
    fs.create_dir("/a").unwrap();
    fs.create_dir("/a/b").unwrap();
    fs.create_file("/a/b/c.txt").unwrap();

    assert_eq!(names(&fs.read_dir("/").unwrap()), ["a"]);
    assert_eq!(names(&fs.read_dir("/a").unwrap()), ["b"]);
    assert_eq!(names(&fs.read_dir("/a/b").unwrap()), ["c.txt"]);
    assert_eq!(names(&fs.read_dir("//a///b/").unwrap()), ["c.txt"]);
}

#[test]
fn test_new_directory_block_starts_empty() {
    let mut fs = formatted(16 * MIB);
    let dir = fs.create_dir("/fresh").unwrap();

    // scribble where the next directory block will land, then reuse it
    let next = dir.offset + OBJECT_RESERVE;
    let block = next as usize..(next + BLOCK_SIZE) as usize;
    fs.disk_mut().as_mut_bytes()[block].fill(0x41);
    let sub = fs.create_dir("/fresh/sub").unwrap();
    assert_eq!(sub.offset, next);
    assert!(fs.read_dir("/fresh/sub").unwrap().is_empty());
}

#[test]
fn test_file_as_intermediate_component() {
    let mut fs = formatted(16 * MIB);
    fs.create_file("/plain").unwrap();
    assert_eq!(
        fs.create_file("/plain/child").map(|e| e.offset),
        Err(BmfsError::NotADirectory)
    );
    assert_eq!(
        fs.read_dir("/plain").map(|e| e.len()),
        Err(BmfsError::NotADirectory)
    );
}

#[test]
fn test_failed_create_leaves_orphan() {
    let mut fs = formatted(16 * MIB);
    assert_eq!(
        fs.create_file("/missing/x").map(|e| e.offset),
        Err(BmfsError::NotFound)
    );

    // the region was reserved before the parent lookup failed
    let table = fs.table_entries().unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table[1].reserved, OBJECT_RESERVE);
    assert!(fs.read_dir("/").unwrap().is_empty());

    // later objects land after the orphan
    let x = fs.create_file("/x").unwrap();
    assert_eq!(x.offset, table[1].offset + OBJECT_RESERVE);
}

#[test]
fn test_disk_error_reaches_caller() {
    // header claims 8 MiB but the device ends right after the root block
    let mut image = formatted(8 * MIB).into_disk().unwrap().into_vec();
    image.truncate(MIN_TOTAL_SIZE as usize);
    let mut fs = Bmfs::mount_with_clock(MemDisk::from_vec(image), FixedClock(0)).unwrap();

    // allocation succeeds, clearing the new directory block does not
    assert_eq!(
        fs.create_dir("/d").map(|e| e.offset),
        Err(BmfsError::Io(DiskError::OutOfRange))
    );

    let table = fs.table_entries().unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table[1].offset, MIN_TOTAL_SIZE);
    assert_eq!(table[1].reserved, OBJECT_RESERVE);
    assert!(fs.read_dir("/").unwrap().is_empty());
}

#[test]
fn test_invalid_basenames() {
    let mut fs = formatted(16 * MIB);
    assert_eq!(
        fs.create_file("/").map(|e| e.offset),
        Err(BmfsError::InvalidName)
    );

    let long = alloc::format!("/{}", "n".repeat(200));
    assert_eq!(
        fs.create_file(&long).map(|e| e.offset),
        Err(BmfsError::InvalidName)
    );
}

#[test]
fn test_directory_capacity() {
    let size = DATA_OFFSET + BLOCK_SIZE + (ENTRIES_PER_DIR + 1) * OBJECT_RESERVE;
    let mut fs = formatted(size);

    for i in 0..ENTRIES_PER_DIR {
        fs.create_file(&alloc::format!("/f{:02}", i)).unwrap();
    }
    assert_eq!(
        fs.create_file("/f16").map(|e| e.offset),
        Err(BmfsError::NoSpace)
    );
    assert_eq!(fs.read_dir("/").unwrap().len(), ENTRIES_PER_DIR as usize);
}

#[test]
fn test_volume_full() {
    let mut fs = formatted(8 * MIB);
    for name in ["/a", "/b", "/c"] {
        fs.create_file(name).unwrap();
    }
    assert_eq!(
        fs.create_file("/d").map(|e| e.offset),
        Err(BmfsError::NoSpace)
    );
    assert_eq!(fs.header().unwrap().table_entry_count, 4);
}

#[test]
fn test_create_unknown_type() {
    let mut fs = formatted(8 * MIB);
    assert_eq!(
        fs.create("/x", EntryType::Unknown).map(|e| e.offset),
        Err(BmfsError::Fault)
    );
    assert_eq!(fs.header().unwrap().table_entry_count, 1);
}

#[test]
fn test_delete_not_implemented() {
    let mut fs = formatted(8 * MIB);
    fs.create_file("/a").unwrap();
    assert_eq!(fs.delete_file("/a"), Err(BmfsError::NotImplemented));
    assert!(fs.lookup("/a").is_ok());
}

// ============================================================================
// ALLOCATION / STATS
// ============================================================================

#[test]
fn test_raw_allocation_passthrough() {
    let mut fs = formatted(8 * MIB);
    let a = fs.allocate(100).unwrap();
    let b = fs.allocate_mebibytes(1).unwrap();
    assert_eq!(a, DATA_OFFSET + BLOCK_SIZE);
    assert_eq!(b, a + BLOCK_SIZE);

    // namespace untouched
    assert!(fs.read_dir("/").unwrap().is_empty());
    let file = fs.create_file("/after").unwrap();
    assert_eq!(file.offset, b + MIB);
}

#[test]
fn test_stats() {
    let mut fs = formatted(16 * MIB);
    fs.allocate(10).unwrap();
    fs.create_file("/a").unwrap();

    let stats = fs.stats().unwrap();
    assert_eq!(stats.total_size, 16 * MIB);
    assert_eq!(stats.table_entries, 3);
    assert_eq!(stats.table_capacity, TABLE_MAX);
    assert_eq!(stats.reserved_bytes, 2 * BLOCK_SIZE + OBJECT_RESERVE);
    assert_eq!(stats.used_bytes, BLOCK_SIZE + 10 + OBJECT_RESERVE);
    assert_eq!(
        stats.free_bytes,
        16 * MIB - (DATA_OFFSET + 2 * BLOCK_SIZE + OBJECT_RESERVE)
    );
}

// ============================================================================
// LOCKED FACADE
// ============================================================================

#[test]
fn test_locked_facade() {
    let disk = MemDisk::new(8 * MIB as usize);
    let fs = LockedBmfs::new(Bmfs::with_clock(disk, FixedClock(0)));
    fs.format(8 * MIB).unwrap();
    fs.create_dir("/etc").unwrap();

    let other = fs.clone();
    other.create_file("/etc/motd").unwrap();
    assert_eq!(names(&fs.read_dir("/etc").unwrap()), ["motd"]);

    // still shared, so it can't be unwrapped yet
    let fs = fs.into_inner().err().unwrap();
    drop(other);
    let mut inner = fs.into_inner().ok().unwrap();
    assert!(inner.lookup("/etc/motd").is_ok());
}

#[cfg(feature = "std")]
#[test]
fn test_locked_facade_across_threads() {
    use std::thread;

    let fs = LockedBmfs::new(formatted(40 * MIB));
    fs.create_dir("/jobs").unwrap();

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let fs = fs.clone();
            thread::spawn(move || {
                for i in 0..3 {
                    let name = alloc::format!("/jobs/t{}-{}", t, i);
                    fs.create_file(&name).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let mut entries = fs.read_dir("/jobs").unwrap();
    assert_eq!(entries.len(), 12);

    // every object got its own region
    entries.sort_by_key(|e| e.offset);
    for pair in entries.windows(2) {
        assert_eq!(pair[1].offset - pair[0].offset, OBJECT_RESERVE);
    }
}
