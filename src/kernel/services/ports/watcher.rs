use std::io;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryEvent {
    /// Something below the root was created, removed or renamed.
    RootChanged,
    /// The root directory itself now lives at this path.
    RootMoved(PathBuf),
}

/// Where a watch facility delivers events. Safe to use from any thread.
#[derive(Clone)]
pub struct DirectoryEventSink {
    tx: UnboundedSender<DirectoryEvent>,
}

impl DirectoryEventSink {
    pub fn new(tx: UnboundedSender<DirectoryEvent>) -> Self {
        Self { tx }
    }

    /// Returns false once the subscriber is gone.
    pub fn send(&self, event: DirectoryEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// Live registration with a watch facility; dropping it unsubscribes.
pub struct WatchSubscription {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl WatchSubscription {
    pub fn new<F>(release: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            release: Some(Box::new(release)),
        }
    }

    pub fn detached() -> Self {
        Self { release: None }
    }

    pub fn release(mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for WatchSubscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

pub trait DirectoryWatcher: Send + Sync {
    fn subscribe(&self, root: &Path, sink: DirectoryEventSink) -> io::Result<WatchSubscription>;
}
