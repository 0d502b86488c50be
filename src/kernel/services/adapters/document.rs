//! Rope-backed text document.

use crate::kernel::services::ports::{BoxFuture, Document, DocumentFactory, SaveChoice, SavePrompt};
use ropey::Rope;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

struct TextDocumentInner {
    path: PathBuf,
    rope: Mutex<Rope>,
    edited: AtomicBool,
    closed: AtomicBool,
}

impl TextDocumentInner {
    fn save(&self) -> io::Result<()> {
        let rope = self.rope.lock().unwrap_or_else(PoisonError::into_inner);
        write_rope_to_path(&self.path, &rope)?;
        self.edited.store(false, Ordering::Release);
        Ok(())
    }
}

pub struct TextDocument {
    inner: Arc<TextDocumentInner>,
    prompt: Option<Arc<dyn SavePrompt>>,
}

impl TextDocument {
    pub fn load(path: &Path, prompt: Option<Arc<dyn SavePrompt>>) -> io::Result<Self> {
        let file = std::fs::File::open(path)?;
        let rope = Rope::from_reader(io::BufReader::new(file))?;
        Ok(Self {
            inner: Arc::new(TextDocumentInner {
                path: path.to_path_buf(),
                rope: Mutex::new(rope),
                edited: AtomicBool::new(false),
                closed: AtomicBool::new(false),
            }),
            prompt,
        })
    }

    pub fn text(&self) -> String {
        self.inner
            .rope
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .to_string()
    }

    pub fn len_chars(&self) -> usize {
        self.inner
            .rope
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len_chars()
    }

    /// Inserts at a char index, clamped to the end of the text.
    pub fn insert(&self, char_idx: usize, text: &str) {
        let mut rope = self.inner.rope.lock().unwrap_or_else(PoisonError::into_inner);
        let idx = char_idx.min(rope.len_chars());
        rope.insert(idx, text);
        self.inner.edited.store(true, Ordering::Release);
    }

    pub fn replace_all(&self, text: &str) {
        let mut rope = self.inner.rope.lock().unwrap_or_else(PoisonError::into_inner);
        *rope = Rope::from_str(text);
        self.inner.edited.store(true, Ordering::Release);
    }

    pub fn save(&self) -> io::Result<()> {
        self.inner.save()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }
}

impl Document for TextDocument {
    fn path(&self) -> &Path {
        &self.inner.path
    }

    fn is_edited(&self) -> bool {
        self.inner.edited.load(Ordering::Acquire)
    }

    fn can_close(&self) -> BoxFuture<bool> {
        if !self.is_edited() {
            return Box::pin(async { true });
        }
        let Some(prompt) = self.prompt.clone() else {
            return Box::pin(async { false });
        };

        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            match prompt.ask(&inner.path).await {
                SaveChoice::Save => match inner.save() {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::error!(path = %inner.path.display(), error = %e, "save before close failed");
                        false
                    }
                },
                SaveChoice::Discard => true,
                SaveChoice::Cancel => false,
            }
        })
    }

    fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
    }
}

#[derive(Default)]
pub struct TextDocumentFactory {
    prompt: Option<Arc<dyn SavePrompt>>,
}

impl TextDocumentFactory {
    pub fn new(prompt: Option<Arc<dyn SavePrompt>>) -> Self {
        Self { prompt }
    }
}

impl DocumentFactory for TextDocumentFactory {
    fn materialize(&self, path: &Path) -> io::Result<Arc<dyn Document>> {
        let document = TextDocument::load(path, self.prompt.clone())?;
        Ok(Arc::new(document))
    }
}

fn write_rope_to_path(path: &Path, rope: &Rope) -> io::Result<()> {
    let file = std::fs::File::create(path)?;
    let mut writer = io::BufWriter::new(file);
    for chunk in rope.chunks() {
        writer.write_all(chunk.as_bytes())?;
    }
    writer.flush()
}
