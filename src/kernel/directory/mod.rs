//! Directory document: one window's view of a folder on disk.
//!
//! [`DirectoryDocument`] is a cheap handle. Every call is sent to a single
//! actor task that owns the file tree and the open documents, so state
//! changes are serialized even when callers run concurrently.

mod actor;
mod message;
mod session;

pub use session::{RestorableState, SessionBookmark, OPEN_DOCUMENT_BOOKMARKS_KEY};

use crate::kernel::error::{DirectoryError, DirectoryResult};
use crate::kernel::registry::{DocumentRegistry, OwnerId};
use crate::kernel::services::ports::{
    DefaultExtensionProvider, DirectoryEventSink, DirectoryWatcher, DocumentFactory,
    FileCoordinator, LocalizedStrings, WindowPresentation,
};
use crate::models::{build_file_tree, normalize_path, validate_name, FileTree, NameError};
use actor::{ActorInbox, DirectoryActor};
use message::{NewItemKind, Reply, Request};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Collaborators a directory document works with.
#[derive(Clone)]
pub struct DirectoryServices {
    pub coordinator: Arc<dyn FileCoordinator>,
    pub factory: Arc<dyn DocumentFactory>,
    pub presentation: Arc<dyn WindowPresentation>,
    pub watcher: Arc<dyn DirectoryWatcher>,
    pub registry: Arc<DocumentRegistry>,
    pub extension: Arc<dyn DefaultExtensionProvider>,
    pub strings: LocalizedStrings,
}

/// Point-in-time view of a directory document.
#[derive(Debug, Clone)]
pub struct DirectorySnapshot {
    pub root: PathBuf,
    pub tree: Arc<FileTree>,
    /// Owned documents in opening order.
    pub documents: Vec<PathBuf>,
    pub frontmost: Option<PathBuf>,
}

#[derive(Clone)]
pub struct DirectoryDocument {
    tx: mpsc::UnboundedSender<Request>,
    owner: OwnerId,
}

impl DirectoryDocument {
    /// Loads the tree for `root`, subscribes to changes below it and starts
    /// the actor. Must be called inside a tokio runtime.
    pub async fn open(root: impl Into<PathBuf>, services: DirectoryServices) -> DirectoryResult<Self> {
        let root = normalize_path(&root.into());
        let build_root = root.clone();
        let tree = tokio::task::spawn_blocking(move || build_file_tree(&build_root))
            .await
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
            .and_then(|result| result)
            .map_err(|source| DirectoryError::Materialize {
                path: root.clone(),
                source,
            })?;

        let owner = OwnerId::next();
        let (request_tx, requests) = mpsc::unbounded_channel();
        let (completion_tx, completions) = mpsc::unbounded_channel();
        let (event_tx, events) = mpsc::unbounded_channel();

        let subscription = match services
            .watcher
            .subscribe(&root, DirectoryEventSink::new(event_tx.clone()))
        {
            Ok(subscription) => Some(subscription),
            Err(e) => {
                tracing::warn!(root = %root.display(), error = %e, "cannot watch directory");
                None
            }
        };
        services
            .registry
            .register_window(owner, Arc::clone(&services.presentation));
        services.presentation.synchronize_title(&root);
        tracing::info!(root = %root.display(), nodes = tree.len(), "directory document opened");

        let actor = DirectoryActor::new(
            owner,
            root,
            tree,
            services,
            subscription,
            event_tx,
            completion_tx,
        );
        tokio::spawn(actor.run(ActorInbox {
            requests,
            completions,
            events,
        }));

        Ok(Self {
            tx: request_tx,
            owner,
        })
    }

    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    async fn call<T>(&self, request: impl FnOnce(Reply<T>) -> Request) -> DirectoryResult<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(request(reply))
            .map_err(|_| DirectoryError::Closed)?;
        rx.await.map_err(|_| DirectoryError::Closed)
    }

    /// Opens `path` and makes it frontmost. Unsupported files succeed
    /// without opening anything.
    pub async fn open_document(&self, path: impl AsRef<Path>) -> DirectoryResult<()> {
        let path = path.as_ref().to_path_buf();
        self.call(|reply| Request::Open { path, reply }).await?
    }

    pub async fn change_frontmost_document(&self, path: impl AsRef<Path>) -> DirectoryResult<()> {
        let path = path.as_ref().to_path_buf();
        self.call(|reply| Request::ChangeFrontmost { path, reply })
            .await?
    }

    pub async fn dispose_unused_documents(&self) -> DirectoryResult<()> {
        self.call(|reply| Request::DisposeUnused { reply }).await
    }

    /// Creates "Untitled.<ext>" (or the next free numbered name) in `parent`.
    pub async fn add_file(&self, parent: impl AsRef<Path>) -> DirectoryResult<PathBuf> {
        self.add_item(parent.as_ref(), NewItemKind::File).await
    }

    pub async fn add_folder(&self, parent: impl AsRef<Path>) -> DirectoryResult<PathBuf> {
        self.add_item(parent.as_ref(), NewItemKind::Folder).await
    }

    async fn add_item(&self, parent: &Path, kind: NewItemKind) -> DirectoryResult<PathBuf> {
        let parent = parent.to_path_buf();
        self.call(|reply| Request::AddItem {
            parent,
            kind,
            reply,
        })
        .await?
    }

    /// Renames `path` within its parent and returns the new path.
    pub async fn rename_item(&self, path: impl AsRef<Path>, new_name: &str) -> DirectoryResult<PathBuf> {
        let path = path.as_ref();
        let destination = rename_destination(path, new_name)?;
        match self.move_raw(path, &destination).await? {
            Ok(()) => Ok(destination),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                Err(DirectoryError::DuplicateName(new_name.to_string()))
            }
            Err(e) => Err(DirectoryError::Coordination(e)),
        }
    }

    /// Moves an item. The tree catches up once the watcher reports the change.
    pub async fn move_item(&self, from: impl AsRef<Path>, to: impl AsRef<Path>) -> DirectoryResult<()> {
        self.move_raw(from.as_ref(), to.as_ref())
            .await?
            .map_err(DirectoryError::Coordination)
    }

    async fn move_raw(&self, from: &Path, to: &Path) -> DirectoryResult<io::Result<()>> {
        let (from, to) = (from.to_path_buf(), to.to_path_buf());
        self.call(|reply| Request::Move { from, to, reply }).await
    }

    /// Closes any open document at or below `path`, then moves it to the
    /// trash. Returns the location in the trash.
    pub async fn trash_item(&self, path: impl AsRef<Path>) -> DirectoryResult<PathBuf> {
        let path = path.as_ref().to_path_buf();
        self.call(|reply| Request::Trash { path, reply }).await?
    }

    /// Rebuilds the tree, optionally for a relocated root.
    pub async fn revert(&self, new_root: Option<PathBuf>) -> DirectoryResult<()> {
        self.call(|reply| Request::Revert {
            new_root,
            reply: Some(reply),
        })
        .await?
    }

    /// Tells the directory document that an owned document's edited flag flipped.
    pub fn document_edited_changed(&self) {
        let _ = self.tx.send(Request::EditedChanged);
    }

    pub async fn snapshot(&self) -> DirectoryResult<DirectorySnapshot> {
        self.call(|reply| Request::Snapshot { reply }).await
    }

    /// Asks each edited document, in opening order, whether it may close.
    /// Closes everything and returns true only if all of them agree.
    pub async fn should_close_window(&self) -> DirectoryResult<bool> {
        let edited = self.call(|reply| Request::EditedDocuments { reply }).await?;
        for document in edited {
            if !document.can_close().await {
                tracing::debug!(path = %document.path().display(), "window close declined");
                return Ok(false);
            }
        }
        self.close().await;
        Ok(true)
    }

    /// Closes every owned document and stops watching. Idempotent.
    pub async fn close(&self) {
        let _ = self.call(|reply| Request::Close { reply }).await;
    }

    /// Records the open documents into `state`.
    pub async fn encode_restorable_state(&self, state: &mut RestorableState) -> DirectoryResult<()> {
        let snapshot = self.snapshot().await?;
        let bookmarks: Vec<SessionBookmark> = snapshot
            .documents
            .iter()
            .map(|path| SessionBookmark::new(&snapshot.root, path))
            .collect();
        state.set_open_document_bookmarks(&bookmarks);
        Ok(())
    }

    /// Reopens the documents recorded in `state`, one at a time and in
    /// order, in the background. Stale entries and failed opens are logged
    /// and skipped. Must be called inside a tokio runtime.
    pub fn restore_state(&self, state: &RestorableState) -> JoinHandle<()> {
        let bookmarks = state.open_document_bookmarks();
        let this = self.clone();
        tokio::spawn(async move {
            let root = match this.snapshot().await {
                Ok(snapshot) => snapshot.root,
                Err(_) => return,
            };
            for bookmark in bookmarks {
                let Some(path) = bookmark.resolve(&root) else {
                    tracing::warn!(path = %bookmark.absolute().display(), "skipping stale bookmark");
                    continue;
                };
                if let Err(e) = this.open_document(&path).await {
                    tracing::warn!(path = %path.display(), error = %e, "restore skipped document");
                }
            }
        })
    }
}

/// Validates `new_name` and returns the renamed sibling path of `path`.
pub fn rename_destination(path: &Path, new_name: &str) -> DirectoryResult<PathBuf> {
    validate_name(new_name).map_err(|e| match e {
        NameError::Empty => DirectoryError::EmptyName,
        NameError::InvalidCharacter(ch) => DirectoryError::InvalidCharacter(ch),
    })?;
    let parent = path.parent().ok_or_else(|| {
        DirectoryError::Coordination(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} has no parent", path.display()),
        ))
    })?;
    Ok(parent.join(new_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rename_destination_stays_in_parent() {
        let destination = rename_destination(Path::new("/w/sub/a.txt"), "b.md").unwrap();
        assert_eq!(destination, PathBuf::from("/w/sub/b.md"));
    }

    #[test]
    fn rename_destination_validates_first() {
        assert!(matches!(
            rename_destination(Path::new("/w/a.txt"), ""),
            Err(DirectoryError::EmptyName)
        ));
        assert!(matches!(
            rename_destination(Path::new("/w/a.txt"), "x:y"),
            Err(DirectoryError::InvalidCharacter(':'))
        ));
        assert!(matches!(
            rename_destination(Path::new("/w/a.txt"), "../b"),
            Err(DirectoryError::InvalidCharacter('/'))
        ));
    }
}
