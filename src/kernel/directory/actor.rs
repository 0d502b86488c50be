//! The single consumer that owns all directory document state.
//!
//! Handles, background completions and watcher events all arrive here as
//! messages; nothing else touches the tree or the owned documents.

use super::message::{Completion, NewItemKind, OpenOutcome, Reply, Request};
use super::{DirectoryServices, DirectorySnapshot};
use crate::kernel::error::{DirectoryError, DirectoryResult};
use crate::kernel::registry::OwnerId;
use crate::kernel::services::ports::{
    DirectoryEvent, DirectoryEventSink, Document, DocumentFactory, FileCoordinator,
    WatchSubscription,
};
use crate::models::{build_file_tree, is_openable, normalize_path, numbered_name, FileTree};
use rustc_hash::FxHashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc::error::SendError;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

const MAX_NAME_ATTEMPTS: usize = 10_000;

pub(super) struct DirectoryActor {
    owner: OwnerId,
    root: PathBuf,
    tree: Arc<FileTree>,
    /// Owned documents in opening order; unique by path.
    documents: Vec<Arc<dyn Document>>,
    frontmost: Option<PathBuf>,
    services: DirectoryServices,
    pending_opens: FxHashMap<PathBuf, Vec<Reply<DirectoryResult<()>>>>,
    generation: u64,
    rebuild_in_flight: bool,
    revert_waiters: Vec<Reply<DirectoryResult<()>>>,
    subscription: Option<WatchSubscription>,
    event_tx: UnboundedSender<DirectoryEvent>,
    completion_tx: UnboundedSender<Completion>,
}

pub(super) struct ActorInbox {
    pub requests: UnboundedReceiver<Request>,
    pub completions: UnboundedReceiver<Completion>,
    pub events: UnboundedReceiver<DirectoryEvent>,
}

impl DirectoryActor {
    pub(super) fn new(
        owner: OwnerId,
        root: PathBuf,
        tree: FileTree,
        services: DirectoryServices,
        subscription: Option<WatchSubscription>,
        event_tx: UnboundedSender<DirectoryEvent>,
        completion_tx: UnboundedSender<Completion>,
    ) -> Self {
        Self {
            owner,
            root,
            tree: Arc::new(tree),
            documents: Vec::new(),
            frontmost: None,
            services,
            pending_opens: FxHashMap::default(),
            generation: 0,
            rebuild_in_flight: false,
            revert_waiters: Vec::new(),
            subscription,
            event_tx,
            completion_tx,
        }
    }

    pub(super) async fn run(mut self, mut inbox: ActorInbox) {
        loop {
            tokio::select! {
                request = inbox.requests.recv() => match request {
                    Some(request) => {
                        if !self.handle_request(request) {
                            return;
                        }
                    }
                    None => {
                        self.shutdown();
                        return;
                    }
                },
                Some(completion) = inbox.completions.recv() => self.handle_completion(completion),
                Some(event) = inbox.events.recv() => self.handle_event(event),
            }
        }
    }

    /// Returns false once the document has closed.
    fn handle_request(&mut self, request: Request) -> bool {
        match request {
            Request::Open { path, reply } => self.open_document(path, reply),
            Request::ChangeFrontmost { path, reply } => {
                let result = self.change_frontmost(path);
                let _ = reply.send(result);
            }
            Request::DisposeUnused { reply } => {
                self.dispose_unused();
                self.refresh_edited_indicator();
                let _ = reply.send(());
            }
            Request::AddItem {
                parent,
                kind,
                reply,
            } => self.add_item(parent, kind, reply),
            Request::Move { from, to, reply } => self.move_item(from, to, reply),
            Request::Trash { path, reply } => self.trash_item(path, reply),
            Request::Revert { new_root, reply } => self.revert(new_root, reply),
            Request::EditedChanged => self.refresh_edited_indicator(),
            Request::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            Request::EditedDocuments { reply } => {
                let edited = self
                    .documents
                    .iter()
                    .filter(|document| document.is_edited())
                    .cloned()
                    .collect();
                let _ = reply.send(edited);
            }
            Request::Close { reply } => {
                self.shutdown();
                let _ = reply.send(());
                return false;
            }
        }
        true
    }

    fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Opened { path, result } => self.on_opened(path, result),
            Completion::Rebuilt {
                generation,
                root,
                result,
            } => self.on_rebuilt(generation, root, result),
        }
    }

    fn handle_event(&mut self, event: DirectoryEvent) {
        tracing::debug!(root = %self.root.display(), ?event, "directory event");
        match event {
            DirectoryEvent::RootChanged => self.revert(None, None),
            DirectoryEvent::RootMoved(new_root) => self.revert(Some(new_root), None),
        }
    }

    /// Identity key for `path`: rooted at the directory when relative and
    /// lexically normalized, so `sub/../a.txt` and `a.txt` are one document.
    fn absolute(&self, path: PathBuf) -> PathBuf {
        if path.is_absolute() {
            normalize_path(&path)
        } else {
            normalize_path(&self.root.join(path))
        }
    }

    fn document(&self, path: &Path) -> Option<&Arc<dyn Document>> {
        self.documents.iter().find(|document| document.path() == path)
    }

    fn foreign_owner(&self, path: &Path) -> Option<OwnerId> {
        self.services
            .registry
            .owner_of(path)
            .filter(|owner| *owner != self.owner)
    }

    fn open_document(&mut self, path: PathBuf, reply: Reply<DirectoryResult<()>>) {
        let path = self.absolute(path);
        if self.frontmost.as_deref() == Some(path.as_path()) {
            let _ = reply.send(Ok(()));
            return;
        }
        if self.document(&path).is_some() {
            self.make_frontmost(&path);
            let _ = reply.send(Ok(()));
            return;
        }
        if let Some(owner) = self.foreign_owner(&path) {
            self.services.registry.present_owner(owner);
            let _ = reply.send(Err(DirectoryError::AlreadyOpenElsewhere(path)));
            return;
        }
        if let Some(waiters) = self.pending_opens.get_mut(&path) {
            waiters.push(reply);
            return;
        }

        self.pending_opens.insert(path.clone(), vec![reply]);
        let factory = Arc::clone(&self.services.factory);
        let completions = self.completion_tx.clone();
        tokio::task::spawn_blocking(move || {
            let result = materialize(factory.as_ref(), &path);
            if let Err(SendError(Completion::Opened {
                result: Ok(OpenOutcome::Opened(document)),
                ..
            })) = completions.send(Completion::Opened { path, result })
            {
                document.close();
            }
        });
    }

    fn on_opened(&mut self, path: PathBuf, result: DirectoryResult<OpenOutcome>) {
        let waiters = self.pending_opens.remove(&path).unwrap_or_default();
        let outcome = match result {
            Ok(OpenOutcome::Skipped) => {
                tracing::debug!(path = %path.display(), "skipping unsupported file");
                Ok(())
            }
            Ok(OpenOutcome::Opened(document)) => self.adopt(path, document),
            Err(e) => {
                if !matches!(e, DirectoryError::NotADocument(_)) {
                    tracing::error!(error = %e, "open document failed");
                    self.services.presentation.report_error(&e);
                }
                Err(e)
            }
        };

        for waiter in waiters {
            let _ = waiter.send(match &outcome {
                Ok(()) => Ok(()),
                Err(e) => Err(e.duplicate()),
            });
        }
    }

    fn adopt(&mut self, path: PathBuf, document: Arc<dyn Document>) -> DirectoryResult<()> {
        if let Err(owner) = self
            .services
            .registry
            .register(Arc::clone(&document), self.owner)
        {
            document.close();
            self.services.registry.present_owner(owner);
            return Err(DirectoryError::AlreadyOpenElsewhere(path));
        }

        let key = document.path().to_path_buf();
        tracing::debug!(path = %key.display(), "document opened");
        self.documents.push(document);
        self.make_frontmost(&key);
        Ok(())
    }

    fn change_frontmost(&mut self, path: PathBuf) -> DirectoryResult<()> {
        let path = self.absolute(path);
        if self.document(&path).is_none() {
            return Err(DirectoryError::NotOwned(path));
        }
        self.make_frontmost(&path);
        Ok(())
    }

    fn make_frontmost(&mut self, path: &Path) {
        let Some(document) = self.document(path).cloned() else {
            return;
        };

        let presentation = Arc::clone(&self.services.presentation);
        if let Some(previous) = self.frontmost.take() {
            if previous != path {
                presentation.set_displayed_document(None);
            }
        }
        presentation.set_displayed_document(Some(document));
        self.frontmost = Some(path.to_path_buf());
        presentation.present();

        self.dispose_unused();
        self.refresh_edited_indicator();
    }

    /// Closes every owned document that is neither frontmost nor edited.
    fn dispose_unused(&mut self) {
        let frontmost = self.frontmost.clone();
        let (keep, unused): (Vec<_>, Vec<_>) = std::mem::take(&mut self.documents)
            .into_iter()
            .partition(|document| {
                document.is_edited() || frontmost.as_deref() == Some(document.path())
            });
        self.documents = keep;
        for document in unused {
            self.release(document.as_ref());
            tracing::debug!(path = %document.path().display(), "disposed unused document");
        }
    }

    fn release(&self, document: &dyn Document) {
        document.close();
        self.services.registry.remove(document.path(), self.owner);
    }

    fn refresh_edited_indicator(&self) {
        let edited = self.documents.iter().any(|document| document.is_edited());
        self.services.presentation.set_edited_indicator(edited);
    }

    fn add_item(&self, parent: PathBuf, kind: NewItemKind, reply: Reply<DirectoryResult<PathBuf>>) {
        let parent = self.absolute(parent);
        let (base, extension) = match kind {
            NewItemKind::File => (
                self.services.strings.untitled_file.clone(),
                self.services.extension.default_extension(),
            ),
            NewItemKind::Folder => (self.services.strings.untitled_folder.clone(), None),
        };

        let coordinator = Arc::clone(&self.services.coordinator);
        tokio::task::spawn_blocking(move || {
            let result = create_untitled(
                coordinator.as_ref(),
                &parent,
                &base,
                extension.as_deref(),
                kind,
            )
            .map_err(DirectoryError::Coordination);
            let _ = reply.send(result);
        });
    }

    fn move_item(&self, from: PathBuf, to: PathBuf, reply: Reply<io::Result<()>>) {
        let from = self.absolute(from);
        let to = self.absolute(to);
        let coordinator = Arc::clone(&self.services.coordinator);
        tokio::task::spawn_blocking(move || {
            let _ = reply.send(coordinator.move_item(&from, &to));
        });
    }

    fn trash_item(&mut self, path: PathBuf, reply: Reply<DirectoryResult<PathBuf>>) {
        let path = self.absolute(path);

        if self
            .frontmost
            .as_deref()
            .is_some_and(|frontmost| frontmost.starts_with(&path))
        {
            self.services.presentation.set_displayed_document(None);
            self.frontmost = None;
        }
        let (trashed, keep): (Vec<_>, Vec<_>) = std::mem::take(&mut self.documents)
            .into_iter()
            .partition(|document| document.path().starts_with(&path));
        self.documents = keep;
        for document in &trashed {
            self.release(document.as_ref());
        }
        if !trashed.is_empty() {
            self.refresh_edited_indicator();
        }

        let coordinator = Arc::clone(&self.services.coordinator);
        tokio::task::spawn_blocking(move || {
            let result = coordinator
                .trash_item(&path)
                .map_err(DirectoryError::Coordination);
            let _ = reply.send(result);
        });
    }

    fn revert(&mut self, new_root: Option<PathBuf>, reply: Option<Reply<DirectoryResult<()>>>) {
        if let Some(new_root) = new_root {
            if new_root != self.root {
                tracing::info!(
                    from = %self.root.display(),
                    to = %new_root.display(),
                    "directory root moved"
                );
                self.root = new_root;
                self.resubscribe();
            }
        }
        if let Some(reply) = reply {
            self.revert_waiters.push(reply);
        }

        self.generation += 1;
        if !self.rebuild_in_flight {
            self.start_rebuild();
        }
    }

    fn start_rebuild(&mut self) {
        self.rebuild_in_flight = true;
        let generation = self.generation;
        let root = self.root.clone();
        let completions = self.completion_tx.clone();
        tokio::task::spawn_blocking(move || {
            let result = build_file_tree(&root);
            let _ = completions.send(Completion::Rebuilt {
                generation,
                root,
                result,
            });
        });
    }

    fn on_rebuilt(&mut self, generation: u64, root: PathBuf, result: io::Result<FileTree>) {
        self.rebuild_in_flight = false;
        if generation != self.generation {
            tracing::debug!(generation, latest = self.generation, "dropping stale rebuild");
            self.start_rebuild();
            return;
        }

        let outcome = match result {
            Ok(tree) => {
                tracing::debug!(root = %root.display(), nodes = tree.len(), "file tree rebuilt");
                self.tree = Arc::new(tree);
                self.services.presentation.synchronize_title(&root);
                self.refresh_edited_indicator();
                Ok(())
            }
            Err(e) => {
                tracing::warn!(root = %root.display(), error = %e, "file tree rebuild failed");
                Err(DirectoryError::Coordination(e))
            }
        };

        for waiter in self.revert_waiters.drain(..) {
            let _ = waiter.send(match &outcome {
                Ok(()) => Ok(()),
                Err(e) => Err(e.duplicate()),
            });
        }
    }

    fn resubscribe(&mut self) {
        if let Some(previous) = self.subscription.take() {
            previous.release();
        }
        let sink = DirectoryEventSink::new(self.event_tx.clone());
        self.subscription = match self.services.watcher.subscribe(&self.root, sink) {
            Ok(subscription) => Some(subscription),
            Err(e) => {
                tracing::warn!(root = %self.root.display(), error = %e, "cannot watch directory");
                None
            }
        };
    }

    fn snapshot(&self) -> DirectorySnapshot {
        DirectorySnapshot {
            root: self.root.clone(),
            tree: Arc::clone(&self.tree),
            documents: self
                .documents
                .iter()
                .map(|document| document.path().to_path_buf())
                .collect(),
            frontmost: self.frontmost.clone(),
        }
    }

    fn shutdown(&mut self) {
        if self.frontmost.take().is_some() {
            self.services.presentation.set_displayed_document(None);
        }
        for document in self.documents.drain(..) {
            document.close();
        }
        self.services.registry.unregister_window(self.owner);
        if let Some(subscription) = self.subscription.take() {
            subscription.release();
        }

        for (_, waiters) in self.pending_opens.drain() {
            for waiter in waiters {
                let _ = waiter.send(Err(DirectoryError::Closed));
            }
        }
        for waiter in self.revert_waiters.drain(..) {
            let _ = waiter.send(Err(DirectoryError::Closed));
        }
        tracing::info!(root = %self.root.display(), "directory document closed");
    }
}

fn materialize(factory: &dyn DocumentFactory, path: &Path) -> DirectoryResult<OpenOutcome> {
    let metadata = std::fs::metadata(path).map_err(|source| DirectoryError::Materialize {
        path: path.to_path_buf(),
        source,
    })?;
    if metadata.is_dir() {
        return Err(DirectoryError::NotADocument(path.to_path_buf()));
    }
    if !is_openable(path) {
        return Ok(OpenOutcome::Skipped);
    }
    factory
        .materialize(path)
        .map(OpenOutcome::Opened)
        .map_err(|source| DirectoryError::Materialize {
            path: path.to_path_buf(),
            source,
        })
}

/// Creates the first free "Untitled", "Untitled 2", ... item under `parent`.
fn create_untitled(
    coordinator: &dyn FileCoordinator,
    parent: &Path,
    base: &str,
    extension: Option<&str>,
    kind: NewItemKind,
) -> io::Result<PathBuf> {
    for attempt in 1..=MAX_NAME_ATTEMPTS {
        let candidate = parent.join(numbered_name(base, extension, attempt));
        if std::fs::symlink_metadata(&candidate).is_ok() {
            continue;
        }
        let created = match kind {
            NewItemKind::File => coordinator.create_file(&candidate),
            NewItemKind::Folder => coordinator.create_dir(&candidate),
        };
        match created {
            Ok(()) => {
                tracing::debug!(path = %candidate.display(), ?kind, "created item");
                return Ok(candidate);
            }
            // Lost a race with another writer; try the next name. Anything
            // else reporting AlreadyExists (a file in the parent chain) is final.
            Err(e)
                if e.kind() == io::ErrorKind::AlreadyExists
                    && std::fs::symlink_metadata(&candidate).is_ok() =>
            {
                continue
            }
            Err(e) => return Err(e),
        }
    }
    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("no free name for {base} in {}", parent.display()),
    ))
}
