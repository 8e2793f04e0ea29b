//! Path Resolver
//!
//! Walks a slash-delimited path from the root directory down to the
//! directory that holds (or would hold) the final component.

use bmfs_disk::Disk;
use bmfs_path::Path;

use crate::dir::{self, Entry};
use crate::error::{BmfsError, BmfsResult};
use crate::header::Header;
use crate::layout::{Record, NAME_MAX};

/// Read the root directory's Entry record
pub fn read_root<D: Disk>(disk: &mut D) -> BmfsResult<Entry> {
    let header = Header::read(disk)?;
    header.validate()?;
    Entry::read_at(disk, header.root_offset)
}

/// Locate the parent directory of `path` and return it with the basename
///
/// Every component but the last must name a directory. Fails with
/// [`BmfsError::NotFound`] when one is missing, [`BmfsError::NotADirectory`]
/// when one is a file, and [`BmfsError::InvalidName`] when the basename is
/// empty or does not fit an entry.
pub fn resolve_parent<'p, D: Disk>(disk: &mut D, path: &'p str) -> BmfsResult<(Entry, &'p str)> {
    let mut parent = read_root(disk)?;
    let mut path = Path::new(path);
    let mut current = path.split_root();

    loop {
        let next = path.split_root();
        if next.is_empty() {
            break;
        }

        let entry = dir::find_entry(disk, parent.offset, current)?;
        if !entry.is_directory() {
            debug_fs!("resolve: {:?} is not a directory", current);
            return Err(BmfsError::NotADirectory);
        }
        parent = entry;
        current = next;
    }

    if !bmfs_path::is_valid_name(current, NAME_MAX - 1) {
        return Err(BmfsError::InvalidName);
    }

    Ok((parent, current))
}

/// Find the entry `path` names; `/` (or an empty path) is the root
pub fn lookup<D: Disk>(disk: &mut D, path: &str) -> BmfsResult<Entry> {
    if Path::new(path).is_empty() {
        return read_root(disk);
    }

    let (parent, name) = resolve_parent(disk, path)?;
    dir::find_entry(disk, parent.offset, name)
}
