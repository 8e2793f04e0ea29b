//! Disk image backed by a host file

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, Write};
use std::path::Path;

use crate::{Disk, DiskError, DiskResult, SeekFrom};

/// Disk image file on the host file system
#[derive(Debug)]
pub struct FileDisk {
    file: File,
}

impl FileDisk {
    /// Create (or truncate) an image of `size` bytes
    pub fn create<P: AsRef<Path>>(path: P, size: u64) -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.set_len(size)?;
        Ok(FileDisk { file })
    }

    /// Open an existing image for reading and writing
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Ok(FileDisk { file })
    }

    pub fn into_file(self) -> File {
        self.file
    }
}

impl From<File> for FileDisk {
    fn from(file: File) -> Self {
        FileDisk { file }
    }
}

impl From<io::Error> for DiskError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => DiskError::UnexpectedEof,
            io::ErrorKind::WriteZero => DiskError::WriteZero,
            io::ErrorKind::InvalidInput => DiskError::InvalidSeek,
            _ => DiskError::Device(err.raw_os_error().map_or(-5, |code| -code)),
        }
    }
}

impl Disk for FileDisk {
    fn seek(&mut self, pos: SeekFrom) -> DiskResult<u64> {
        let pos = match pos {
            SeekFrom::Start(offset) => io::SeekFrom::Start(offset),
            SeekFrom::Current(delta) => io::SeekFrom::Current(delta),
            SeekFrom::End(delta) => io::SeekFrom::End(delta),
        };
        Ok(self.file.seek(pos)?)
    }

    fn read(&mut self, buffer: &mut [u8]) -> DiskResult<()> {
        Ok(self.file.read_exact(buffer)?)
    }

    fn write(&mut self, buffer: &[u8]) -> DiskResult<()> {
        Ok(self.file.write_all(buffer)?)
    }

    fn flush(&mut self) -> DiskResult<()> {
        self.file.flush()?;
        Ok(self.file.sync_data()?)
    }
}
