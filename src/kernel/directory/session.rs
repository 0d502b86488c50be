//! Restorable window state and the bookmarks stored in it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Key under which open documents are recorded.
pub const OPEN_DOCUMENT_BOOKMARKS_KEY: &str = "open_document_bookmarks";

/// Relocatable reference to one open document.
///
/// Keeps the path relative to the directory root as well as the absolute
/// path, so the document is found again after the root was moved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionBookmark {
    absolute: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    relative: Option<PathBuf>,
}

impl SessionBookmark {
    pub fn new(root: &Path, path: &Path) -> Self {
        Self {
            absolute: path.to_path_buf(),
            relative: path.strip_prefix(root).ok().map(Path::to_path_buf),
        }
    }

    pub fn absolute(&self) -> &Path {
        &self.absolute
    }

    /// The path this bookmark points at now, or `None` when stale.
    pub fn resolve(&self, root: &Path) -> Option<PathBuf> {
        if let Some(relative) = self.relative.as_ref().filter(|r| !r.as_os_str().is_empty()) {
            let candidate = root.join(relative);
            if candidate.exists() {
                return Some(candidate);
            }
        }
        self.absolute.exists().then(|| self.absolute.clone())
    }
}

/// Opaque key/value blob a window persists between launches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RestorableState {
    entries: Map<String, Value>,
}

impl RestorableState {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: &str, value: Value) {
        self.entries.insert(key.to_string(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn set_open_document_bookmarks(&mut self, bookmarks: &[SessionBookmark]) {
        let value = Value::Array(
            bookmarks
                .iter()
                .filter_map(|b| serde_json::to_value(b).ok())
                .collect(),
        );
        self.insert(OPEN_DOCUMENT_BOOKMARKS_KEY, value);
    }

    /// Decodes the recorded bookmarks in order. Entries that fail to decode
    /// are skipped.
    pub fn open_document_bookmarks(&self) -> Vec<SessionBookmark> {
        let Some(Value::Array(items)) = self.get(OPEN_DOCUMENT_BOOKMARKS_KEY) else {
            return Vec::new();
        };
        items
            .iter()
            .filter_map(|item| match serde_json::from_value(item.clone()) {
                Ok(bookmark) => Some(bookmark),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping undecodable bookmark");
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn bookmark_follows_moved_root() {
        let dir = tempdir().unwrap();
        let old_root = dir.path().join("old");
        let new_root = dir.path().join("new");
        std::fs::create_dir_all(old_root.join("sub")).unwrap();
        std::fs::write(old_root.join("sub/a.txt"), "a").unwrap();

        let bookmark = SessionBookmark::new(&old_root, &old_root.join("sub/a.txt"));
        std::fs::rename(&old_root, &new_root).unwrap();

        assert_eq!(bookmark.resolve(&new_root), Some(new_root.join("sub/a.txt")));
    }

    #[test]
    fn bookmark_outside_root_uses_absolute_path() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("loose.txt");
        std::fs::write(&file, "x").unwrap();

        let bookmark = SessionBookmark::new(Path::new("/elsewhere"), &file);
        assert_eq!(bookmark.resolve(Path::new("/elsewhere")), Some(file));
    }

    #[test]
    fn stale_bookmark_resolves_to_none() {
        let dir = tempdir().unwrap();
        let bookmark = SessionBookmark::new(dir.path(), &dir.path().join("gone.txt"));
        assert_eq!(bookmark.resolve(dir.path()), None);
    }

    #[test]
    fn bookmarks_round_trip_through_json_and_skip_garbage() {
        let root = Path::new("/w");
        let mut state = RestorableState::default();
        state.set_open_document_bookmarks(&[
            SessionBookmark::new(root, Path::new("/w/a.txt")),
            SessionBookmark::new(root, Path::new("/w/b.txt")),
        ]);

        let mut value = serde_json::to_value(&state).unwrap();
        value[OPEN_DOCUMENT_BOOKMARKS_KEY]
            .as_array_mut()
            .unwrap()
            .insert(1, serde_json::json!(42));
        let decoded: RestorableState = serde_json::from_value(value).unwrap();

        let paths: Vec<_> = decoded
            .open_document_bookmarks()
            .iter()
            .map(|b| b.absolute().to_path_buf())
            .collect();
        assert_eq!(paths, vec![PathBuf::from("/w/a.txt"), PathBuf::from("/w/b.txt")]);
    }
}
