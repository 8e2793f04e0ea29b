//! Debug macros for the storage layer
//!
//! `debug_fs!` compiles to nothing unless the `debug-storage` feature is
//! enabled, so per-slot tracing costs nothing in firmware builds.

/// Debug print for record-level activity
#[cfg(feature = "debug-storage")]
macro_rules! debug_fs {
    ($($arg:tt)*) => {
        log::debug!(target: "bmfs::trace", "[BMFS] {}", format_args!($($arg)*))
    };
}

#[cfg(not(feature = "debug-storage"))]
macro_rules! debug_fs {
    ($($arg:tt)*) => {};
}
