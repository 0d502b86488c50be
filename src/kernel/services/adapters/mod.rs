//! Service adapters: OS/runtime specific implementations (IO/async).

pub mod coordination;
pub mod document;
pub mod file_watcher;
pub mod paths;
pub mod runtime;
pub mod session_store;
pub mod settings;

pub use coordination::LocalFileCoordinator;
pub use document::{TextDocument, TextDocumentFactory};
pub use file_watcher::NotifyWatcher;
pub use paths::{default_trash_dir, ensure_log_dir, ensure_session_dir, get_log_dir, hash_path};
pub use runtime::AsyncRuntime;
pub use session_store::SessionStore;
pub use settings::{ensure_settings_file, get_settings_path, load_settings, load_settings_from};
