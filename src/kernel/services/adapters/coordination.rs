//! Local filesystem coordination.
//!
//! Every mutation takes the in-process path lock table first, so two
//! coordinated operations never touch overlapping paths at the same time.
//! Paths overlap when one equals or contains the other.

use crate::kernel::services::ports::FileCoordinator;
use crate::models::naming::{first_free_name, split_name};
use chrono::Local;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Condvar, Mutex, PoisonError};

const TRASH_FILES_DIR: &str = "files";
const TRASH_INFO_DIR: &str = "info";
const TRASH_INFO_EXT: &str = "trashinfo";
/// Local time, no zone, as `.trashinfo` readers expect.
const TRASH_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Unreserved URI characters plus the path separator stay literal.
const TRASH_PATH_ESCAPES: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// errno for cross-device rename on Linux and macOS.
const EXDEV: i32 = 18;

const MAX_COPY_DEPTH: usize = 64;

#[derive(Default)]
struct PathLocks {
    held: Mutex<Vec<PathBuf>>,
    released: Condvar,
}

struct PathLockGuard<'a> {
    locks: &'a PathLocks,
    paths: Vec<PathBuf>,
}

fn overlaps(a: &Path, b: &Path) -> bool {
    a.starts_with(b) || b.starts_with(a)
}

impl PathLocks {
    fn acquire(&self, paths: &[&Path]) -> PathLockGuard<'_> {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        while held
            .iter()
            .any(|h| paths.iter().any(|p| overlaps(h.as_path(), p)))
        {
            held = self
                .released
                .wait(held)
                .unwrap_or_else(PoisonError::into_inner);
        }

        let owned: Vec<PathBuf> = paths.iter().map(|p| p.to_path_buf()).collect();
        held.extend(owned.iter().cloned());
        PathLockGuard {
            locks: self,
            paths: owned,
        }
    }
}

impl Drop for PathLockGuard<'_> {
    fn drop(&mut self) {
        let mut held = self
            .locks
            .held
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for path in &self.paths {
            if let Some(idx) = held.iter().position(|h| h == path) {
                held.swap_remove(idx);
            }
        }
        drop(held);
        self.locks.released.notify_all();
    }
}

pub struct LocalFileCoordinator {
    locks: PathLocks,
    trash_dir: PathBuf,
}

impl LocalFileCoordinator {
    pub fn new(trash_dir: PathBuf) -> Self {
        Self {
            locks: PathLocks::default(),
            trash_dir,
        }
    }

    pub fn trash_dir(&self) -> &Path {
        &self.trash_dir
    }

    fn trash_locked(&self, path: &Path) -> io::Result<PathBuf> {
        fs::symlink_metadata(path)?;

        let files_dir = self.trash_dir.join(TRASH_FILES_DIR);
        let info_dir = self.trash_dir.join(TRASH_INFO_DIR);
        fs::create_dir_all(&files_dir)?;
        fs::create_dir_all(&info_dir)?;

        let original = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "cannot trash a root"))?;
        let (stem, ext) = split_name(&original);
        let name = first_free_name(stem, ext, |candidate| {
            files_dir.join(candidate).exists()
                || info_dir
                    .join(format!("{candidate}.{TRASH_INFO_EXT}"))
                    .exists()
        });

        let info_path = info_dir.join(format!("{name}.{TRASH_INFO_EXT}"));
        write_trash_info(&info_path, path)?;

        let destination = files_dir.join(&name);
        if let Err(e) = move_across_devices(path, &destination) {
            let _ = fs::remove_file(&info_path);
            return Err(e);
        }
        Ok(destination)
    }
}

impl FileCoordinator for LocalFileCoordinator {
    fn create_file(&self, path: &Path) -> io::Result<()> {
        let _guard = self.locks.acquire(&[path]);
        fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)?;
        tracing::debug!(path = %path.display(), "coordinated create_file");
        Ok(())
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        let _guard = self.locks.acquire(&[path]);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::create_dir(path)?;
        tracing::debug!(path = %path.display(), "coordinated create_dir");
        Ok(())
    }

    fn move_item(&self, from: &Path, to: &Path) -> io::Result<()> {
        if to != from && to.starts_with(from) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("cannot move {} into itself", from.display()),
            ));
        }

        let _guard = self.locks.acquire(&[from, to]);
        fs::symlink_metadata(from)?;
        if fs::symlink_metadata(to).is_ok() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", to.display()),
            ));
        }
        fs::rename(from, to)?;
        tracing::debug!(from = %from.display(), to = %to.display(), "coordinated move");
        Ok(())
    }

    fn trash_item(&self, path: &Path) -> io::Result<PathBuf> {
        let _guard = self.locks.acquire(&[path, self.trash_dir.as_path()]);
        let location = self.trash_locked(path)?;
        tracing::debug!(path = %path.display(), location = %location.display(), "coordinated trash");
        Ok(location)
    }
}

fn move_across_devices(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.raw_os_error() == Some(EXDEV) => {
            copy_recursive(from, to, 0)?;
            if fs::symlink_metadata(from)?.is_dir() {
                fs::remove_dir_all(from)
            } else {
                fs::remove_file(from)
            }
        }
        Err(e) => Err(e),
    }
}

fn copy_recursive(src: &Path, dest: &Path, depth: usize) -> io::Result<()> {
    if depth > MAX_COPY_DEPTH {
        return Err(io::Error::new(
            io::ErrorKind::Other,
            format!("maximum recursion depth ({MAX_COPY_DEPTH}) exceeded during copy"),
        ));
    }

    let meta = fs::symlink_metadata(src)?;
    if meta.is_symlink() {
        let target = fs::read_link(src)?;
        #[cfg(unix)]
        std::os::unix::fs::symlink(&target, dest)?;
        #[cfg(not(unix))]
        {
            let _ = target;
            fs::copy(src, dest)?;
        }
    } else if meta.is_dir() {
        fs::create_dir_all(dest)?;
        for entry in fs::read_dir(src)? {
            let entry = entry?;
            copy_recursive(&entry.path(), &dest.join(entry.file_name()), depth + 1)?;
        }
    } else {
        fs::copy(src, dest)?;
    }
    Ok(())
}

fn write_trash_info(info_path: &Path, original: &Path) -> io::Result<()> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(info_path)?;
    write!(
        file,
        "[Trash Info]\nPath={}\nDeletionDate={}\n",
        percent_encode_path(original),
        Local::now().format(TRASH_DATE_FORMAT)
    )
}

fn percent_encode_path(path: &Path) -> String {
    utf8_percent_encode(&path.to_string_lossy(), TRASH_PATH_ESCAPES).to_string()
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/adapters/coordination.rs"]
mod tests;
