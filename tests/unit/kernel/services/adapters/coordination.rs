use super::*;
use std::sync::Arc;
use std::thread;
use tempfile::tempdir;

fn coordinator_in(dir: &Path) -> LocalFileCoordinator {
    LocalFileCoordinator::new(dir.join("trash"))
}

#[test]
fn test_create_file_refuses_to_overwrite() {
    let dir = tempdir().unwrap();
    let coordinator = coordinator_in(dir.path());
    let path = dir.path().join("a.txt");

    coordinator.create_file(&path).unwrap();
    assert!(path.is_file());

    let err = coordinator.create_file(&path).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
}

#[test]
fn test_create_dir_makes_missing_parents() {
    let dir = tempdir().unwrap();
    let coordinator = coordinator_in(dir.path());
    let path = dir.path().join("a/b/c");

    coordinator.create_dir(&path).unwrap();
    assert!(path.is_dir());

    let err = coordinator.create_dir(&path).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
}

#[test]
fn test_move_refuses_existing_destination() {
    let dir = tempdir().unwrap();
    let coordinator = coordinator_in(dir.path());
    let from = dir.path().join("from.txt");
    let to = dir.path().join("to.txt");
    fs::write(&from, "from").unwrap();
    fs::write(&to, "to").unwrap();

    let err = coordinator.move_item(&from, &to).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
    assert_eq!(fs::read_to_string(&to).unwrap(), "to");
    assert!(from.exists());
}

#[test]
fn test_move_onto_itself_reports_existing() {
    let dir = tempdir().unwrap();
    let coordinator = coordinator_in(dir.path());
    let path = dir.path().join("same.txt");
    fs::write(&path, "").unwrap();

    let err = coordinator.move_item(&path, &path).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
}

#[test]
fn test_move_into_own_subtree_rejected() {
    let dir = tempdir().unwrap();
    let coordinator = coordinator_in(dir.path());
    let folder = dir.path().join("folder");
    fs::create_dir(&folder).unwrap();

    let err = coordinator
        .move_item(&folder, &folder.join("inner"))
        .unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
}

#[test]
fn test_move_missing_source_is_not_found() {
    let dir = tempdir().unwrap();
    let coordinator = coordinator_in(dir.path());

    let err = coordinator
        .move_item(&dir.path().join("ghost"), &dir.path().join("b"))
        .unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::NotFound);
}

#[test]
fn test_trash_moves_item_and_writes_info() {
    let dir = tempdir().unwrap();
    let coordinator = coordinator_in(dir.path());
    let path = dir.path().join("notes.txt");
    fs::write(&path, "bye").unwrap();

    let location = coordinator.trash_item(&path).unwrap();

    assert!(!path.exists());
    assert_eq!(location, coordinator.trash_dir().join("files/notes.txt"));
    assert_eq!(fs::read_to_string(&location).unwrap(), "bye");
    let info =
        fs::read_to_string(coordinator.trash_dir().join("info/notes.txt.trashinfo")).unwrap();
    assert!(info.starts_with("[Trash Info]\n"));
    assert!(info.contains("DeletionDate="));
    assert!(info.contains(&format!("Path={}", percent_encode_path(&path))));
}

#[test]
fn test_trash_disambiguates_names_already_in_trash() {
    let dir = tempdir().unwrap();
    let coordinator = coordinator_in(dir.path());
    let first = dir.path().join("a/notes.txt");
    let second = dir.path().join("b/notes.txt");
    fs::create_dir_all(first.parent().unwrap()).unwrap();
    fs::create_dir_all(second.parent().unwrap()).unwrap();
    fs::write(&first, "1").unwrap();
    fs::write(&second, "2").unwrap();

    let first_location = coordinator.trash_item(&first).unwrap();
    let second_location = coordinator.trash_item(&second).unwrap();

    assert_ne!(first_location, second_location);
    assert!(second_location.ends_with("notes 2.txt"));
    assert_eq!(fs::read_to_string(second_location).unwrap(), "2");
}

#[test]
fn test_trash_missing_item_fails_without_info_file() {
    let dir = tempdir().unwrap();
    let coordinator = coordinator_in(dir.path());

    let err = coordinator
        .trash_item(&dir.path().join("ghost.txt"))
        .unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::NotFound);
    assert!(!coordinator.trash_dir().join("info").exists());
}

#[test]
fn test_concurrent_creates_of_same_path_have_one_winner() {
    let dir = tempdir().unwrap();
    let coordinator = Arc::new(coordinator_in(dir.path()));
    let path = dir.path().join("race.txt");

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let coordinator = Arc::clone(&coordinator);
            let path = path.clone();
            thread::spawn(move || coordinator.create_file(&path).is_ok())
        })
        .collect();
    let winners = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();

    assert_eq!(winners, 1);
}

#[test]
fn test_overlapping_paths() {
    assert!(overlaps(Path::new("/a"), Path::new("/a/b")));
    assert!(overlaps(Path::new("/a/b"), Path::new("/a")));
    assert!(overlaps(Path::new("/a"), Path::new("/a")));
    assert!(!overlaps(Path::new("/a/b"), Path::new("/a/c")));
    assert!(!overlaps(Path::new("/ab"), Path::new("/a")));
}

#[test]
fn test_lock_released_after_guard_drop() {
    let locks = PathLocks::default();
    {
        let _guard = locks.acquire(&[Path::new("/x")]);
        assert_eq!(locks.held.lock().unwrap().len(), 1);
    }
    assert!(locks.held.lock().unwrap().is_empty());
    let _again = locks.acquire(&[Path::new("/x/y")]);
}

#[test]
fn test_trash_info_deletion_date_is_local_time() {
    let dir = tempdir().unwrap();
    let coordinator = coordinator_in(dir.path());
    let path = dir.path().join("dated.txt");
    fs::write(&path, "").unwrap();

    let before = Local::now().naive_local() - chrono::Duration::seconds(1);
    coordinator.trash_item(&path).unwrap();
    let after = Local::now().naive_local() + chrono::Duration::seconds(1);

    let info =
        fs::read_to_string(coordinator.trash_dir().join("info/dated.txt.trashinfo")).unwrap();
    let stamp = info
        .lines()
        .find_map(|line| line.strip_prefix("DeletionDate="))
        .unwrap();
    let deleted_at = chrono::NaiveDateTime::parse_from_str(stamp, TRASH_DATE_FORMAT).unwrap();
    assert!(before <= deleted_at && deleted_at <= after);
}

#[test]
fn test_percent_encode_path() {
    assert_eq!(
        percent_encode_path(Path::new("/tmp/my notes.txt")),
        "/tmp/my%20notes.txt"
    );
    assert_eq!(
        percent_encode_path(Path::new("/tmp/caf\u{e9}~1.md")),
        "/tmp/caf%C3%A9~1.md"
    );
}
