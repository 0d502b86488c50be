//! Headless core: directory documents, the document registry and services.

pub mod directory;
pub mod error;
pub mod registry;
pub mod services;

pub use directory::{
    DirectoryDocument, DirectoryServices, DirectorySnapshot, RestorableState, SessionBookmark,
};
pub use error::{DirectoryError, DirectoryResult};
pub use registry::{DocumentRegistry, OwnerId};
