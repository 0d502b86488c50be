//! Contracts for one open file.
//!
//! The directory document only needs identity, the edited flag and the two
//! ways of ending a document's life; everything about editing text stays
//! behind this trait.

use super::runtime::BoxFuture;
use std::io;
use std::path::Path;
use std::sync::Arc;

pub trait Document: Send + Sync {
    /// Absolute path; the identity key inside a directory document.
    fn path(&self) -> &Path;

    fn is_edited(&self) -> bool;

    /// Asks whether the document may close, prompting the user when edited.
    fn can_close(&self) -> BoxFuture<bool>;

    fn close(&self);
}

/// Builds a [`Document`] for a path. Called off the controller thread.
pub trait DocumentFactory: Send + Sync {
    fn materialize(&self, path: &Path) -> io::Result<Arc<dyn Document>>;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SaveChoice {
    Save,
    Discard,
    Cancel,
}

/// Asks the user what to do with unsaved changes.
pub trait SavePrompt: Send + Sync {
    fn ask(&self, path: &Path) -> BoxFuture<SaveChoice>;
}
