//! folio - directory documents
//!
//! 模块结构：
//! - models: 数据模型（FileTree, content classification, naming）
//! - kernel: 核心（DirectoryDocument, DocumentRegistry, services）

pub mod kernel;
pub mod models;
