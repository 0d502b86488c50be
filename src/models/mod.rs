//! 数据模型层

pub mod content;
pub mod file_tree;
pub mod naming;

pub use content::{classify, is_openable, should_ignore, sniff_bytes, ContentKind};
pub use file_tree::{build_file_tree, FileTree, FileTreeError, FileTreeRow, Node, NodeId, NodeKind};
pub use naming::{
    first_free_name, normalize_path, numbered_name, split_name, validate_name, NameError,
};
