//! 文件树快照模型
//!
//! A [`FileTree`] is an immutable snapshot of a directory on disk. It is
//! built once by [`build_file_tree`] and replaced wholesale whenever the
//! directory changes; nothing patches a tree in place after it is built.

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use std::{
    collections::BTreeMap,
    ffi::{OsStr, OsString},
    fmt, io,
    path::{Path, PathBuf},
};

use super::content::should_ignore;

new_key_type! { pub struct NodeId; }

/// Deepest nesting followed while walking; guards against bind-mount loops.
const MAX_DEPTH: usize = 64;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Dir,
}

#[derive(Debug)]
pub enum FileTreeError {
    ParentNotDirectory,
    NameExists,
    InvalidNodeId,
}

impl fmt::Display for FileTreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileTreeError::ParentNotDirectory => write!(f, "parent is not a directory"),
            FileTreeError::NameExists => write!(f, "name already exists in parent"),
            FileTreeError::InvalidNodeId => write!(f, "invalid node id"),
        }
    }
}

impl std::error::Error for FileTreeError {}

/// One filesystem entry. `parent` is a lookup key into the owning arena,
/// never a second owner.
#[derive(Debug, Clone)]
pub struct Node {
    kind: NodeKind,
    name: OsString,
    path: PathBuf,
    parent: Option<NodeId>,
    children: Option<BTreeMap<OsString, NodeId>>,
}

impl Node {
    fn new_file(name: OsString, path: PathBuf, parent: Option<NodeId>) -> Self {
        Self {
            kind: NodeKind::File,
            name,
            path,
            parent,
            children: None,
        }
    }

    fn new_dir(name: OsString, path: PathBuf, parent: Option<NodeId>) -> Self {
        Self {
            kind: NodeKind::Dir,
            name,
            path,
            parent,
            children: Some(BTreeMap::new()),
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn name(&self) -> &OsStr {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Dir
    }
}

pub struct FileTree {
    arena: SlotMap<NodeId, Node>,
    root: NodeId,
    id_by_path: FxHashMap<PathBuf, NodeId>,
}

impl fmt::Debug for FileTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileTree")
            .field("root", &self.absolute_root())
            .field("len", &self.len())
            .finish()
    }
}

impl FileTree {
    fn new_with_root(root_name: OsString, absolute_root: PathBuf) -> Self {
        let mut arena = SlotMap::with_key();
        let root = arena.insert(Node::new_dir(root_name, absolute_root.clone(), None));

        let mut id_by_path = FxHashMap::default();
        id_by_path.insert(absolute_root, root);

        Self {
            arena,
            root,
            id_by_path,
        }
    }

    #[cfg(test)]
    pub fn new_with_root_for_test(root_name: OsString, absolute_root: PathBuf) -> Self {
        Self::new_with_root(root_name, absolute_root)
    }

    pub(crate) fn insert_child(
        &mut self,
        parent: NodeId,
        name: OsString,
        kind: NodeKind,
    ) -> Result<NodeId, FileTreeError> {
        let path = {
            let parent_ro = self.arena.get(parent).ok_or(FileTreeError::InvalidNodeId)?;
            let children_ro = parent_ro
                .children
                .as_ref()
                .ok_or(FileTreeError::ParentNotDirectory)?;
            if children_ro.contains_key(&name) {
                return Err(FileTreeError::NameExists);
            }
            parent_ro.path.join(&name)
        };

        let node = match kind {
            NodeKind::File => Node::new_file(name.clone(), path.clone(), Some(parent)),
            NodeKind::Dir => Node::new_dir(name.clone(), path.clone(), Some(parent)),
        };
        let id = self.arena.insert(node);

        let parent_node = self
            .arena
            .get_mut(parent)
            .ok_or(FileTreeError::InvalidNodeId)?;
        let children = parent_node
            .children
            .as_mut()
            .ok_or(FileTreeError::ParentNotDirectory)?;
        children.insert(name, id);
        self.id_by_path.insert(path, id);

        Ok(id)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn absolute_root(&self) -> &Path {
        self.arena
            .get(self.root)
            .map(|n| n.path.as_path())
            .unwrap_or(Path::new(""))
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.arena.get(id)
    }

    pub fn path(&self, id: NodeId) -> Option<&Path> {
        self.arena.get(id).map(|n| n.path.as_path())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena.get(id).and_then(|n| n.parent)
    }

    pub fn is_dir(&self, id: NodeId) -> bool {
        self.arena
            .get(id)
            .map(|n| n.kind == NodeKind::Dir)
            .unwrap_or(false)
    }

    pub fn children(&self, id: NodeId) -> Option<impl Iterator<Item = (&OsString, &NodeId)>> {
        self.arena
            .get(id)
            .and_then(|n| n.children.as_ref())
            .map(|c| c.iter())
    }

    pub fn find_node_by_path(&self, path: &Path) -> Option<NodeId> {
        self.id_by_path.get(path).copied()
    }

    pub fn contains_path(&self, path: &Path) -> bool {
        self.id_by_path.contains_key(path)
    }
}

/// Depth-first, directories-before-files listing used by presenters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTreeRow {
    pub id: NodeId,
    pub depth: u16,
    pub name: OsString,
    pub is_dir: bool,
}

impl FileTree {
    pub fn flatten_for_view(&self) -> Vec<FileTreeRow> {
        let mut result = Vec::new();
        let mut stack: Vec<(NodeId, u16)> = vec![(self.root, 0)];

        while let Some((id, depth)) = stack.pop() {
            let Some(node) = self.arena.get(id) else {
                continue;
            };

            if id != self.root {
                result.push(FileTreeRow {
                    id,
                    depth,
                    name: node.name.clone(),
                    is_dir: node.kind == NodeKind::Dir,
                });
            }

            let Some(children) = &node.children else {
                continue;
            };

            let mut dirs = Vec::new();
            let mut files = Vec::new();
            for &child_id in children.values() {
                if self.is_dir(child_id) {
                    dirs.push(child_id);
                } else {
                    files.push(child_id);
                }
            }

            for file_id in files.into_iter().rev() {
                stack.push((file_id, depth + 1));
            }
            for dir_id in dirs.into_iter().rev() {
                stack.push((dir_id, depth + 1));
            }
        }

        result
    }
}

fn load_dir_entries(path: &Path) -> io::Result<Vec<(OsString, bool)>> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(path)? {
        let entry = entry?;
        let name = entry.file_name();
        if should_ignore(&name.to_string_lossy()) {
            continue;
        }
        // file_type() does not follow symlinks, so linked directories stay leaves.
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        entries.push((name, is_dir));
    }
    Ok(entries)
}

/// Builds a full snapshot of `root_path`.
///
/// Only a failure to read the root itself is an error. Subdirectories that
/// cannot be read show up as empty directories.
pub fn build_file_tree(root_path: &Path) -> io::Result<FileTree> {
    // Not canonicalized: node paths must compare equal to document paths
    // built from the same root.
    let absolute_root = if root_path.is_absolute() {
        root_path.to_path_buf()
    } else {
        std::env::current_dir()?.join(root_path)
    };

    let root_name = root_path
        .file_name()
        .or_else(|| root_path.iter().next_back())
        .unwrap_or(root_path.as_os_str())
        .to_os_string();

    let mut tree = FileTree::new_with_root(root_name, absolute_root.clone());

    let root_entries = load_dir_entries(&absolute_root)?;
    let mut pending: Vec<(NodeId, Vec<(OsString, bool)>, usize)> =
        vec![(tree.root, root_entries, 0)];

    while let Some((parent, entries, depth)) = pending.pop() {
        for (name, is_dir) in entries {
            let kind = if is_dir {
                NodeKind::Dir
            } else {
                NodeKind::File
            };
            let Ok(id) = tree.insert_child(parent, name, kind) else {
                continue;
            };
            if !is_dir || depth + 1 >= MAX_DEPTH {
                continue;
            }

            let Some(dir_path) = tree.path(id).map(Path::to_path_buf) else {
                continue;
            };
            match load_dir_entries(&dir_path) {
                Ok(children) => pending.push((id, children, depth + 1)),
                Err(e) => {
                    tracing::warn!(path = %dir_path.display(), error = %e, "skip unreadable directory");
                }
            }
        }
    }

    tracing::debug!(root = %absolute_root.display(), nodes = tree.len(), "file tree built");
    Ok(tree)
}

#[cfg(test)]
#[path = "../../tests/unit/models/file_tree.rs"]
mod tests;
