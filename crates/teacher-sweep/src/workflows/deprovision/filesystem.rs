use std::io;
use std::path::Path;

/// Storage holding teacher home directories.
pub trait HomeDirectoryStore {
    fn exists(&self, path: &Path) -> bool;
    /// Recursively removes `path`.
    fn remove_all(&self, path: &Path) -> io::Result<()>;
}

/// The local filesystem. Not hardened against symlink swaps between the
/// existence check and the removal.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFilesystem;

impl HomeDirectoryStore for LocalFilesystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn remove_all(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_dir_all(path)
    }
}
