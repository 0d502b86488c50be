use crate::kernel::services::ports::{
    DirectoryEvent, DirectoryEventSink, DirectoryWatcher, WatchSubscription,
};
use crate::models::should_ignore;
use notify::event::{ModifyKind, RenameMode};
use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

const WATCHER_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Watch facility backed by `notify`.
///
/// The root is watched recursively for structural changes; its parent is
/// watched non-recursively so a rename of the root itself is seen.
#[derive(Default)]
pub struct NotifyWatcher;

impl NotifyWatcher {
    pub fn new() -> Self {
        Self
    }
}

fn notify_to_io(e: notify::Error) -> io::Error {
    match e.kind {
        notify::ErrorKind::Io(err) => err,
        notify::ErrorKind::PathNotFound => io::Error::new(io::ErrorKind::NotFound, "watch path not found"),
        other => io::Error::new(io::ErrorKind::Other, format!("{other:?}")),
    }
}

fn spawn_watcher(
    root: PathBuf,
    sink: DirectoryEventSink,
) -> Result<RecommendedWatcher, notify::Error> {
    RecommendedWatcher::new(
        move |res: Result<notify::Event, notify::Error>| match res {
            Ok(event) => {
                if let Some(event) = classify_event(&root, &event) {
                    let _ = sink.send(event);
                }
            }
            Err(e) => tracing::warn!(error = %e, "file watcher error"),
        },
        Config::default().with_poll_interval(WATCHER_POLL_INTERVAL),
    )
}

impl DirectoryWatcher for NotifyWatcher {
    fn subscribe(&self, root: &Path, sink: DirectoryEventSink) -> io::Result<WatchSubscription> {
        let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());

        let mut tree_watcher = spawn_watcher(root.clone(), sink.clone()).map_err(notify_to_io)?;
        tree_watcher
            .watch(&root, RecursiveMode::Recursive)
            .map_err(notify_to_io)?;

        let parent_watcher = match root.parent() {
            Some(parent) => {
                let mut watcher = spawn_watcher(root.clone(), sink).map_err(notify_to_io)?;
                match watcher.watch(parent, RecursiveMode::NonRecursive) {
                    Ok(()) => Some(watcher),
                    Err(e) => {
                        tracing::warn!(parent = %parent.display(), error = %e, "root moves will not be detected");
                        None
                    }
                }
            }
            None => None,
        };

        tracing::debug!(root = %root.display(), "watch subscription registered");
        Ok(WatchSubscription::new(move || {
            drop(tree_watcher);
            drop(parent_watcher);
            tracing::debug!(root = %root.display(), "watch subscription released");
        }))
    }
}

/// Maps one raw notify event to the directory event it implies, if any.
fn classify_event(root: &Path, event: &notify::Event) -> Option<DirectoryEvent> {
    match event.kind {
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) if event.paths.len() >= 2 => {
            let (from, to) = (&event.paths[0], &event.paths[1]);
            if from.as_path() == root {
                return Some(DirectoryEvent::RootMoved(to.clone()));
            }
            structural_change(root, &event.paths)
        }
        EventKind::Create(_) | EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(_)) => {
            structural_change(root, &event.paths)
        }
        _ => None,
    }
}

fn structural_change(root: &Path, paths: &[PathBuf]) -> Option<DirectoryEvent> {
    let relevant = paths.iter().any(|path| {
        path.as_path() == root
            || (path.starts_with(root) && !contains_ignored_component(path, root))
    });
    relevant.then_some(DirectoryEvent::RootChanged)
}

fn contains_ignored_component(path: &Path, root: &Path) -> bool {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative.components().any(|component| {
        if let Component::Normal(name) = component {
            should_ignore(&name.to_string_lossy())
        } else {
            false
        }
    })
}
