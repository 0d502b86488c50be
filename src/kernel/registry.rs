//! Process-wide index of open documents and the windows that own them.

use crate::kernel::services::ports::{Document, WindowPresentation};
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

/// Identifies one directory document (one window).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OwnerId(u64);

impl OwnerId {
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

struct Entry {
    document: Arc<dyn Document>,
    owner: OwnerId,
}

#[derive(Default)]
struct RegistryInner {
    documents: FxHashMap<PathBuf, Entry>,
    windows: FxHashMap<OwnerId, Arc<dyn WindowPresentation>>,
}

#[derive(Default)]
pub struct DocumentRegistry {
    inner: Mutex<RegistryInner>,
}

impl DocumentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry shared by every window in the process.
    pub fn global() -> Arc<DocumentRegistry> {
        static GLOBAL: OnceLock<Arc<DocumentRegistry>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(DocumentRegistry::new())))
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn find(&self, path: &Path) -> Option<Arc<dyn Document>> {
        self.lock()
            .documents
            .get(path)
            .map(|entry| Arc::clone(&entry.document))
    }

    pub fn owner_of(&self, path: &Path) -> Option<OwnerId> {
        self.lock().documents.get(path).map(|entry| entry.owner)
    }

    /// Registers `document` under its path. Returns the current owner
    /// instead when another window already holds that path.
    pub fn register(&self, document: Arc<dyn Document>, owner: OwnerId) -> Result<(), OwnerId> {
        let mut inner = self.lock();
        let path = document.path().to_path_buf();
        if let Some(existing) = inner.documents.get(&path) {
            if existing.owner != owner {
                return Err(existing.owner);
            }
        }
        inner.documents.insert(path, Entry { document, owner });
        Ok(())
    }

    /// Removes the entry for `path` if `owner` holds it.
    pub fn remove(&self, path: &Path, owner: OwnerId) -> bool {
        let mut inner = self.lock();
        match inner.documents.get(path) {
            Some(entry) if entry.owner == owner => {
                inner.documents.remove(path);
                true
            }
            _ => false,
        }
    }

    pub fn register_window(&self, owner: OwnerId, window: Arc<dyn WindowPresentation>) {
        self.lock().windows.insert(owner, window);
    }

    /// Drops the window and every document it still owns.
    pub fn unregister_window(&self, owner: OwnerId) {
        let mut inner = self.lock();
        inner.windows.remove(&owner);
        inner.documents.retain(|_, entry| entry.owner != owner);
    }

    /// Brings the owner's window forward. Returns false for unknown owners.
    pub fn present_owner(&self, owner: OwnerId) -> bool {
        let window = self.lock().windows.get(&owner).cloned();
        match window {
            Some(window) => {
                window.present();
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/registry.rs"]
mod tests;
