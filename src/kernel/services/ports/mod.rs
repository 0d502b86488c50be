//! Service ports: traits + data contracts.

pub mod coordinator;
pub mod document;
pub mod presentation;
pub mod runtime;
pub mod settings;
pub mod watcher;

pub use coordinator::FileCoordinator;
pub use document::{Document, DocumentFactory, SaveChoice, SavePrompt};
pub use presentation::WindowPresentation;
pub use runtime::BoxFuture;
pub use settings::{DefaultExtensionProvider, LocalizedStrings, Settings};
pub use watcher::{DirectoryEvent, DirectoryEventSink, DirectoryWatcher, WatchSubscription};
