//! Item names: validation and "Name 2.ext" style disambiguation, plus the
//! lexical path form used as a document's identity.

use std::path::{Component, Path, PathBuf};

/// Characters that may never appear in an item name. `:` is the legacy
/// path delimiter on macOS volumes and is refused everywhere for portability.
pub const RESERVED_DELIMITER: char = ':';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameError {
    Empty,
    InvalidCharacter(char),
}

pub fn validate_name(name: &str) -> Result<(), NameError> {
    if name.is_empty() {
        return Err(NameError::Empty);
    }
    if let Some(ch) = name
        .chars()
        .find(|&ch| std::path::is_separator(ch) || ch == '/' || ch == RESERVED_DELIMITER)
    {
        return Err(NameError::InvalidCharacter(ch));
    }
    Ok(())
}

/// Splits `name` into stem and extension. Leading-dot names have no extension.
pub fn split_name(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => (&name[..idx], Some(&name[idx + 1..])),
        _ => (name, None),
    }
}

/// The `attempt`-th candidate for a base name: attempt 1 is the bare name,
/// later attempts append " 2", " 3", ... before the extension.
pub fn numbered_name(base: &str, extension: Option<&str>, attempt: usize) -> String {
    let stem = if attempt <= 1 {
        base.to_string()
    } else {
        format!("{base} {attempt}")
    };
    match extension.filter(|ext| !ext.is_empty()) {
        Some(ext) => format!("{stem}.{ext}"),
        None => stem,
    }
}

/// First candidate name for which `taken` returns false.
pub fn first_free_name<F>(base: &str, extension: Option<&str>, mut taken: F) -> String
where
    F: FnMut(&str) -> bool,
{
    let mut attempt = 1;
    loop {
        let candidate = numbered_name(base, extension, attempt);
        if !taken(&candidate) {
            return candidate;
        }
        attempt += 1;
    }
}

/// Resolves `.` and `..` without touching the filesystem. `..` never climbs
/// above the root.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_empty_and_reserved() {
        assert_eq!(validate_name(""), Err(NameError::Empty));
        assert_eq!(validate_name("a/b"), Err(NameError::InvalidCharacter('/')));
        assert_eq!(validate_name("a:b"), Err(NameError::InvalidCharacter(':')));
        assert_eq!(validate_name("notes v2.txt"), Ok(()));
    }

    #[test]
    fn split_name_handles_dotfiles() {
        assert_eq!(split_name("a.txt"), ("a", Some("txt")));
        assert_eq!(split_name("archive.tar.gz"), ("archive.tar", Some("gz")));
        assert_eq!(split_name(".env"), (".env", None));
        assert_eq!(split_name("trailing."), ("trailing.", None));
        assert_eq!(split_name("Makefile"), ("Makefile", None));
    }

    #[test]
    fn numbered_names() {
        assert_eq!(numbered_name("Untitled", Some("txt"), 1), "Untitled.txt");
        assert_eq!(numbered_name("Untitled", Some("txt"), 2), "Untitled 2.txt");
        assert_eq!(numbered_name("untitled folder", None, 3), "untitled folder 3");
        assert_eq!(numbered_name("x", Some(""), 1), "x");
    }

    #[test]
    fn first_free_name_skips_taken() {
        let taken = ["Untitled.txt", "Untitled 2.txt"];
        let name = first_free_name("Untitled", Some("txt"), |c| taken.contains(&c));
        assert_eq!(name, "Untitled 3.txt");
    }

    #[test]
    fn normalize_path_resolves_dots_lexically() {
        assert_eq!(
            normalize_path(Path::new("/w/sub/../a.txt")),
            PathBuf::from("/w/a.txt")
        );
        assert_eq!(
            normalize_path(Path::new("/w/./sub/./b.md")),
            PathBuf::from("/w/sub/b.md")
        );
        assert_eq!(normalize_path(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(normalize_path(Path::new("../a/..")), PathBuf::from(".."));
    }
}
