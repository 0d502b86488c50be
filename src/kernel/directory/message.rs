use super::DirectorySnapshot;
use crate::kernel::error::{DirectoryError, DirectoryResult};
use crate::kernel::services::ports::Document;
use crate::models::FileTree;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::oneshot;

pub(super) type Reply<T> = oneshot::Sender<T>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum NewItemKind {
    File,
    Folder,
}

/// Work submitted by a [`super::DirectoryDocument`] handle.
pub(super) enum Request {
    Open {
        path: PathBuf,
        reply: Reply<DirectoryResult<()>>,
    },
    ChangeFrontmost {
        path: PathBuf,
        reply: Reply<DirectoryResult<()>>,
    },
    DisposeUnused {
        reply: Reply<()>,
    },
    AddItem {
        parent: PathBuf,
        kind: NewItemKind,
        reply: Reply<DirectoryResult<PathBuf>>,
    },
    Move {
        from: PathBuf,
        to: PathBuf,
        reply: Reply<io::Result<()>>,
    },
    Trash {
        path: PathBuf,
        reply: Reply<DirectoryResult<PathBuf>>,
    },
    Revert {
        new_root: Option<PathBuf>,
        reply: Option<Reply<DirectoryResult<()>>>,
    },
    EditedChanged,
    Snapshot {
        reply: Reply<DirectorySnapshot>,
    },
    EditedDocuments {
        reply: Reply<Vec<Arc<dyn Document>>>,
    },
    Close {
        reply: Reply<()>,
    },
}

pub(super) enum OpenOutcome {
    /// Not a text-like file; nothing was opened.
    Skipped,
    Opened(Arc<dyn Document>),
}

/// Results of background work, re-entering the actor.
pub(super) enum Completion {
    Opened {
        path: PathBuf,
        result: Result<OpenOutcome, DirectoryError>,
    },
    Rebuilt {
        generation: u64,
        root: PathBuf,
        result: io::Result<FileTree>,
    },
}
