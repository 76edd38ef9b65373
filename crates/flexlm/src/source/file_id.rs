//! File identity based on device and inode, used to notice rotation.
//!
//! When a log rotator renames the file and creates a fresh one at the same
//! path, the path keeps its name but its identity changes.

use std::fs::Metadata;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId {
    dev: u64,
    ino: u64,
}

impl FileId {
    pub fn new(dev: u64, ino: u64) -> Self {
        Self { dev, ino }
    }

    #[cfg(unix)]
    pub fn from_metadata(metadata: &Metadata) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;

        Some(Self {
            dev: metadata.dev(),
            ino: metadata.ino(),
        })
    }

    /// No stable identity off Unix; rotation falls back to size checks.
    #[cfg(not(unix))]
    pub fn from_metadata(_metadata: &Metadata) -> Option<Self> {
        None
    }
}

/// True only when both identities are known and differ.
pub fn replaced(old: Option<FileId>, new: Option<FileId>) -> bool {
    matches!((old, new), (Some(a), Some(b)) if a != b)
}
