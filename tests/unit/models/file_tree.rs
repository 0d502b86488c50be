use super::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_new_tree() {
    let tree = FileTree::new_with_root("test".into(), PathBuf::from("/test"));
    assert!(tree.is_dir(tree.root()));
    assert!(tree.is_empty());
    assert_eq!(tree.absolute_root(), Path::new("/test"));
}

#[test]
fn test_insert_child() {
    let mut tree = FileTree::new_with_root("root".into(), PathBuf::from("/root"));
    let root = tree.root();

    let file_id = tree
        .insert_child(root, "file.txt".into(), NodeKind::File)
        .unwrap();
    let dir_id = tree
        .insert_child(root, "subdir".into(), NodeKind::Dir)
        .unwrap();

    assert!(!tree.is_dir(file_id));
    assert!(tree.is_dir(dir_id));
    assert_eq!(tree.path(file_id), Some(Path::new("/root/file.txt")));
    assert_eq!(tree.parent(file_id), Some(root));
    assert_eq!(
        tree.find_node_by_path(Path::new("/root/subdir")),
        Some(dir_id)
    );
}

#[test]
fn test_insert_duplicate_sibling_rejected() {
    let mut tree = FileTree::new_with_root("root".into(), PathBuf::from("/root"));
    let root = tree.root();

    tree.insert_child(root, "a.txt".into(), NodeKind::File)
        .unwrap();
    let err = tree
        .insert_child(root, "a.txt".into(), NodeKind::File)
        .unwrap_err();
    assert!(matches!(err, FileTreeError::NameExists));
}

#[test]
fn test_insert_under_file_rejected() {
    let mut tree = FileTree::new_with_root("root".into(), PathBuf::from("/root"));
    let root = tree.root();

    let file_id = tree
        .insert_child(root, "a.txt".into(), NodeKind::File)
        .unwrap();
    let err = tree
        .insert_child(file_id, "b.txt".into(), NodeKind::File)
        .unwrap_err();
    assert!(matches!(err, FileTreeError::ParentNotDirectory));
}

#[test]
fn test_flatten_for_view_puts_dirs_first() {
    let mut tree = FileTree::new_with_root("root".into(), PathBuf::from("/root"));
    let root = tree.root();

    tree.insert_child(root, "a.txt".into(), NodeKind::File)
        .unwrap();
    let dir_id = tree
        .insert_child(root, "zdir".into(), NodeKind::Dir)
        .unwrap();
    tree.insert_child(dir_id, "inner.txt".into(), NodeKind::File)
        .unwrap();

    let rows = tree.flatten_for_view();
    let names: Vec<_> = rows
        .iter()
        .map(|r| (r.name.to_string_lossy().to_string(), r.depth))
        .collect();
    assert_eq!(
        names,
        vec![
            ("zdir".to_string(), 1),
            ("inner.txt".to_string(), 2),
            ("a.txt".to_string(), 1),
        ]
    );
}

#[test]
fn test_build_file_tree_walks_nested_directories() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("src/nested")).unwrap();
    fs::write(dir.path().join("README.md"), "hi").unwrap();
    fs::write(dir.path().join("src/lib.rs"), "").unwrap();
    fs::write(dir.path().join("src/nested/deep.txt"), "").unwrap();

    let tree = build_file_tree(dir.path()).unwrap();
    let root = tree.absolute_root().to_path_buf();

    assert!(tree.contains_path(&root.join("README.md")));
    assert!(tree.contains_path(&root.join("src/lib.rs")));
    let deep = tree
        .find_node_by_path(&root.join("src/nested/deep.txt"))
        .unwrap();
    let nested = tree.parent(deep).unwrap();
    assert_eq!(tree.path(nested), Some(root.join("src/nested").as_path()));
    assert!(tree.is_dir(nested));
    assert_eq!(tree.len(), 6);
}

#[test]
fn test_build_file_tree_skips_ignored_names() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join(".git/objects")).unwrap();
    fs::write(dir.path().join(".DS_Store"), "").unwrap();
    fs::write(dir.path().join("notes.txt"), "").unwrap();

    let tree = build_file_tree(dir.path()).unwrap();
    let root = tree.root();
    let names: Vec<_> = tree
        .children(root)
        .unwrap()
        .map(|(name, _)| name.to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["notes.txt".to_string()]);
}

#[test]
fn test_build_file_tree_missing_root_is_error() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("missing");
    assert!(build_file_tree(&missing).is_err());
}

#[test]
fn test_rebuild_reflects_changes() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("old.txt"), "").unwrap();
    let before = build_file_tree(dir.path()).unwrap();

    fs::rename(dir.path().join("old.txt"), dir.path().join("new.txt")).unwrap();
    let after = build_file_tree(dir.path()).unwrap();

    let root = after.absolute_root().to_path_buf();
    assert!(before.contains_path(&root.join("old.txt")));
    assert!(!after.contains_path(&root.join("old.txt")));
    assert!(after.contains_path(&root.join("new.txt")));
}
