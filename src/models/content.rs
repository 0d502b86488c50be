//! 文件内容分类
//!
//! Decides which entries a directory document will open as text and which
//! names are noise that never shows up in a tree.

use std::io::{self, Read};
use std::path::Path;

/// Bytes inspected when the extension alone does not decide.
const SNIFF_LEN: usize = 8 * 1024;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ContentKind {
    Text,
    Binary,
}

pub fn should_ignore(name: &str) -> bool {
    matches!(
        name,
        ".DS_Store"
            | ".Spotlight-V100"
            | ".Trashes"
            | ".fseventsd"
            | ".TemporaryItems"
            | ".localized"
            | "Thumbs.db"
            | "desktop.ini"
            | ".git"
            | "node_modules"
    )
}

fn is_text_extension(ext: &str) -> bool {
    matches!(
        ext,
        "txt" | "text" | "md" | "markdown" | "rst" | "adoc" | "org" | "tex" | "csv" | "tsv"
            | "log" | "json" | "jsonc" | "toml" | "yaml" | "yml" | "xml" | "html" | "htm"
            | "css" | "scss" | "less" | "svg" | "ini" | "cfg" | "conf" | "env" | "properties"
            | "rs" | "c" | "h" | "cc" | "cpp" | "hpp" | "m" | "mm" | "swift" | "go" | "py"
            | "rb" | "pl" | "php" | "java" | "kt" | "kts" | "scala" | "js" | "mjs" | "cjs"
            | "ts" | "tsx" | "jsx" | "vue" | "lua" | "sh" | "bash" | "zsh" | "fish" | "ps1"
            | "bat" | "sql" | "graphql" | "proto" | "cmake" | "mk" | "gradle" | "lock"
            | "gitignore" | "editorconfig" | "diff" | "patch"
    )
}

fn is_binary_extension(ext: &str) -> bool {
    matches!(
        ext,
        "png" | "jpg" | "jpeg" | "gif" | "bmp" | "ico" | "tif" | "tiff" | "webp" | "heic"
            | "pdf" | "zip" | "gz" | "tgz" | "bz2" | "xz" | "7z" | "rar" | "tar" | "dmg"
            | "iso" | "exe" | "dll" | "so" | "dylib" | "a" | "o" | "class" | "jar" | "wasm"
            | "mp3" | "mp4" | "m4a" | "mov" | "avi" | "mkv" | "wav" | "flac" | "ogg" | "ttf"
            | "otf" | "woff" | "woff2" | "sqlite" | "db" | "bin" | "dat"
    )
}

/// Classifies by content: NUL bytes or a non-UTF-8 prefix mean binary.
pub fn sniff_bytes(bytes: &[u8]) -> ContentKind {
    if memchr::memchr(0, bytes).is_some() {
        return ContentKind::Binary;
    }
    match std::str::from_utf8(bytes) {
        Ok(_) => ContentKind::Text,
        // A multi-byte sequence cut off by the sniff window is still text.
        Err(e) if e.error_len().is_none() => ContentKind::Text,
        Err(_) => ContentKind::Binary,
    }
}

fn sniff_file(path: &Path) -> io::Result<ContentKind> {
    let mut file = std::fs::File::open(path)?;
    let mut buf = Vec::with_capacity(SNIFF_LEN);
    file.by_ref().take(SNIFF_LEN as u64).read_to_end(&mut buf)?;
    Ok(sniff_bytes(&buf))
}

/// Resolves the content kind of `path`, or `None` when it cannot be
/// determined (unknown extension and unreadable file).
pub fn classify(path: &Path) -> Option<ContentKind> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase());
    match ext.as_deref() {
        Some(ext) if is_text_extension(ext) => return Some(ContentKind::Text),
        Some(ext) if is_binary_extension(ext) => return Some(ContentKind::Binary),
        _ => {}
    }
    sniff_file(path).ok()
}

/// Whether a directory document should open `path` as an editable file.
///
/// Extensionless files are always opened; files with an extension are
/// opened only when they classify as text.
pub fn is_openable(path: &Path) -> bool {
    let Some(name) = path.file_name() else {
        return false;
    };
    if should_ignore(&name.to_string_lossy()) {
        return false;
    }

    let has_extension = path.extension().is_some_and(|e| !e.is_empty());
    if !has_extension {
        return true;
    }
    classify(path) == Some(ContentKind::Text)
}
