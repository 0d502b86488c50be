use std::io;
use std::path::{Path, PathBuf};

/// Filesystem mutations that other coordinating actors observe atomically.
///
/// Implementations block; callers run them on a blocking pool.
pub trait FileCoordinator: Send + Sync {
    /// Creates an empty file. Fails with `AlreadyExists` instead of truncating.
    fn create_file(&self, path: &Path) -> io::Result<()>;

    /// Creates a directory and any missing parents. Fails with
    /// `AlreadyExists` when the leaf already exists.
    fn create_dir(&self, path: &Path) -> io::Result<()>;

    /// Moves `from` to `to`. Fails with `AlreadyExists` rather than overwrite.
    fn move_item(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Moves `path` to the trash and returns where it ended up.
    fn trash_item(&self, path: &Path) -> io::Result<PathBuf>;
}
