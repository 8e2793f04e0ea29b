//! BMFS Error types

use bmfs_disk::DiskError;

/// BMFS Result type
pub type BmfsResult<T> = Result<T, BmfsError>;

/// BMFS Error types
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BmfsError {
    /// Invalid argument (e.g. a size whose block rounding overflows)
    #[error("invalid argument")]
    Fault,
    /// Error reported by the underlying disk
    #[error("disk I/O error: {0}")]
    Io(#[from] DiskError),
    /// Allocation table full, volume full, or directory block full
    #[error("no space left on volume")]
    NoSpace,
    /// Path component not found
    #[error("no such file or directory")]
    NotFound,
    /// Name is empty, too long, or contains a terminator
    #[error("invalid name")]
    InvalidName,
    /// Header magic does not match
    #[error("not a BMFS volume (bad signature)")]
    InvalidSignature,
    /// Operation exists in the API but not in this format version
    #[error("operation not implemented")]
    NotImplemented,
    /// Intermediate path component is a file
    #[error("not a directory")]
    NotADirectory,
    /// Name already present in the parent directory
    #[error("entry already exists")]
    AlreadyExists,
}

impl BmfsError {
    /// Convert to errno-style error code
    pub fn to_errno(&self) -> i32 {
        match self {
            BmfsError::Fault => -14,            // EFAULT
            BmfsError::Io(_) => -5,             // EIO
            BmfsError::NoSpace => -28,          // ENOSPC
            BmfsError::NotFound => -2,          // ENOENT
            BmfsError::InvalidName => -22,      // EINVAL
            BmfsError::InvalidSignature => -22, // EINVAL
            BmfsError::NotImplemented => -38,   // ENOSYS
            BmfsError::NotADirectory => -20,    // ENOTDIR
            BmfsError::AlreadyExists => -17,    // EEXIST
        }
    }
}
