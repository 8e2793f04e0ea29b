//! BMFS Path Module
//!
//! Borrowed, allocation-free path views for walking slash-delimited paths
//! one component at a time. Used by the BMFS resolver in firmware where no
//! heap is guaranteed.
//!
//! ```
//! use bmfs_path::Path;
//!
//! let mut path = Path::new("/docs//readme.txt");
//! assert_eq!(path.split_root(), "docs");
//! assert_eq!(path.split_root(), "readme.txt");
//! assert_eq!(path.split_root(), "");
//! ```

#![no_std]

/// Path separator
pub const SEPARATOR: char = '/';

/// Borrowed view over a slash-delimited path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Path<'a> {
    inner: &'a str,
}

impl<'a> Path<'a> {
    /// Create a view over `s`
    pub fn new(s: &'a str) -> Self {
        Path { inner: s }
    }

    /// The part of the path not yet split off
    pub fn as_str(&self) -> &'a str {
        self.inner
    }

    /// True when nothing but separators remain
    pub fn is_empty(&self) -> bool {
        self.inner.trim_start_matches(SEPARATOR).is_empty()
    }

    /// Check if path is absolute
    pub fn is_absolute(&self) -> bool {
        self.inner.starts_with(SEPARATOR)
    }

    /// Split off the leading component
    ///
    /// Leading and repeated separators are skipped. The view is advanced
    /// past the returned component. An empty return value means the path is
    /// exhausted, so the component returned by the previous call was the
    /// last one (the basename).
    pub fn split_root(&mut self) -> &'a str {
        let trimmed = self.inner.trim_start_matches(SEPARATOR);
        let end = trimmed.find(SEPARATOR).unwrap_or(trimmed.len());
        let (root, rest) = trimmed.split_at(end);
        self.inner = rest;
        root
    }

    /// Iterate over the remaining components without consuming the view
    pub fn components(&self) -> Components<'a> {
        Components { path: *self }
    }
}

impl<'a> From<&'a str> for Path<'a> {
    fn from(s: &'a str) -> Self {
        Path::new(s)
    }
}

/// Iterator over path components, see [`Path::components`]
#[derive(Debug, Clone)]
pub struct Components<'a> {
    path: Path<'a>,
}

impl<'a> Iterator for Components<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let component = self.path.split_root();
        if component.is_empty() {
            None
        } else {
            Some(component)
        }
    }
}

/// Split path into directory and filename
pub fn split(path: &str) -> (&str, &str) {
    let normalized = path.trim_end_matches(SEPARATOR);

    if let Some(pos) = normalized.rfind(SEPARATOR) {
        if pos == 0 {
            ("/", &normalized[1..])
        } else {
            (&normalized[..pos], &normalized[pos + 1..])
        }
    } else {
        ("/", normalized)
    }
}

/// Check if a path component can be stored as a name of at most `max_len` bytes
pub fn is_valid_name(name: &str, max_len: usize) -> bool {
    !name.is_empty()
        && !name.contains(SEPARATOR)
        && !name.contains('\0')
        && name.len() <= max_len
}
