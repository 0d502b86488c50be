use super::*;
use crate::kernel::error::DirectoryError;
use crate::kernel::services::ports::BoxFuture;
use std::sync::atomic::AtomicUsize;

struct StubDocument(PathBuf);

impl Document for StubDocument {
    fn path(&self) -> &Path {
        &self.0
    }

    fn is_edited(&self) -> bool {
        false
    }

    fn can_close(&self) -> BoxFuture<bool> {
        Box::pin(async { true })
    }

    fn close(&self) {}
}

#[derive(Default)]
struct CountingWindow {
    presented: AtomicUsize,
}

impl WindowPresentation for CountingWindow {
    fn set_displayed_document(&self, _document: Option<Arc<dyn Document>>) {}
    fn set_edited_indicator(&self, _edited: bool) {}
    fn synchronize_title(&self, _root: &Path) {}

    fn present(&self) {
        self.presented.fetch_add(1, Ordering::SeqCst);
    }

    fn report_error(&self, _error: &DirectoryError) {}
}

fn doc(path: &str) -> Arc<dyn Document> {
    Arc::new(StubDocument(PathBuf::from(path)))
}

#[test]
fn test_register_and_find() {
    let registry = DocumentRegistry::new();
    let owner = OwnerId::next();
    registry.register(doc("/w/a.txt"), owner).unwrap();

    assert!(registry.find(Path::new("/w/a.txt")).is_some());
    assert_eq!(registry.owner_of(Path::new("/w/a.txt")), Some(owner));
    assert!(registry.find(Path::new("/w/b.txt")).is_none());
}

#[test]
fn test_register_refuses_other_owner() {
    let registry = DocumentRegistry::new();
    let first = OwnerId::next();
    let second = OwnerId::next();
    assert_ne!(first, second);

    registry.register(doc("/w/a.txt"), first).unwrap();
    assert_eq!(registry.register(doc("/w/a.txt"), second), Err(first));
    assert_eq!(registry.owner_of(Path::new("/w/a.txt")), Some(first));
}

#[test]
fn test_remove_only_by_owner() {
    let registry = DocumentRegistry::new();
    let owner = OwnerId::next();
    registry.register(doc("/w/a.txt"), owner).unwrap();

    assert!(!registry.remove(Path::new("/w/a.txt"), OwnerId::next()));
    assert!(registry.remove(Path::new("/w/a.txt"), owner));
    assert!(registry.find(Path::new("/w/a.txt")).is_none());
}

#[test]
fn test_present_owner_and_unregister() {
    let registry = DocumentRegistry::new();
    let owner = OwnerId::next();
    let window = Arc::new(CountingWindow::default());
    registry.register_window(owner, window.clone());
    registry.register(doc("/w/a.txt"), owner).unwrap();

    assert!(registry.present_owner(owner));
    assert_eq!(window.presented.load(Ordering::SeqCst), 1);

    registry.unregister_window(owner);
    assert!(!registry.present_owner(owner));
    assert!(registry.find(Path::new("/w/a.txt")).is_none());
}

#[test]
fn test_global_is_shared() {
    assert!(Arc::ptr_eq(&DocumentRegistry::global(), &DocumentRegistry::global()));
}
