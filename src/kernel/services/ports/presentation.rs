use super::document::Document;
use crate::kernel::error::DirectoryError;
use std::path::Path;
use std::sync::Arc;

/// The window showing a directory document.
pub trait WindowPresentation: Send + Sync {
    fn set_displayed_document(&self, document: Option<Arc<dyn Document>>);

    fn set_edited_indicator(&self, edited: bool);

    fn synchronize_title(&self, root: &Path);

    /// Brings the window to the front.
    fn present(&self);

    fn report_error(&self, error: &DirectoryError);
}
