//! Restorable window state on disk, one JSON file per directory root.

use super::paths::{ensure_session_dir, hash_path};
use crate::kernel::directory::RestorableState;
use std::io;
use std::path::{Path, PathBuf};

pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn open_default() -> io::Result<Self> {
        ensure_session_dir().map(Self::new)
    }

    pub fn state_path(&self, root: &Path) -> PathBuf {
        self.dir.join(format!("{}.json", hash_path(root)))
    }

    /// Missing or unreadable state restores nothing.
    pub fn load(&self, root: &Path) -> RestorableState {
        let path = self.state_path(root);
        let data = match std::fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return RestorableState::default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot read session state");
                return RestorableState::default();
            }
        };
        serde_json::from_str(&data).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "discarding malformed session state");
            RestorableState::default()
        })
    }

    pub fn save(&self, root: &Path, state: &RestorableState) -> io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let content = serde_json::to_string_pretty(state)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        std::fs::write(self.state_path(root), content)
    }
}
