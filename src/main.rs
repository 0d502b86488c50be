//folio/src/main.rs
use folio::kernel::services::adapters::{
    default_trash_dir, ensure_settings_file, load_settings, AsyncRuntime, LocalFileCoordinator,
    NotifyWatcher, SessionStore, TextDocumentFactory,
};
use folio::kernel::services::ports::{Document, Settings, WindowPresentation};
use folio::kernel::{
    DirectoryDocument, DirectoryError, DirectoryResult, DirectoryServices, DocumentRegistry,
    RestorableState,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::{env, io};

mod logging;

const USAGE: &str = "usage: folio [--verbose] <directory> [file...]";

/// Presentation for a headless run: state changes go to the log, errors to stderr.
struct ConsoleWindow;

impl WindowPresentation for ConsoleWindow {
    fn set_displayed_document(&self, document: Option<Arc<dyn Document>>) {
        match document {
            Some(document) => tracing::info!(path = %document.path().display(), "displaying"),
            None => tracing::debug!("display cleared"),
        }
    }

    fn set_edited_indicator(&self, edited: bool) {
        tracing::debug!(edited, "edited indicator");
    }

    fn synchronize_title(&self, root: &Path) {
        tracing::debug!(root = %root.display(), "title synchronized");
    }

    fn present(&self) {}

    fn report_error(&self, error: &DirectoryError) {
        eprintln!("folio: {error}");
    }
}

struct Args {
    verbose: bool,
    root: PathBuf,
    files: Vec<PathBuf>,
}

fn parse_args() -> Option<Args> {
    let mut verbose = false;
    let mut positional = Vec::new();
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "-v" | "--verbose" => verbose = true,
            _ => positional.push(PathBuf::from(arg)),
        }
    }
    let mut positional = positional.into_iter();
    let root = positional.next()?;
    Some(Args {
        verbose,
        root,
        files: positional.collect(),
    })
}

fn absolute(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    })
}

fn main() -> ExitCode {
    let Some(args) = parse_args() else {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    };

    let logging = logging::init(args.verbose);
    if let Some(guard) = logging.as_ref().filter(|_| args.verbose) {
        eprintln!("folio: logging to {}", guard.log_dir().display());
    }
    if let Err(e) = ensure_settings_file() {
        tracing::warn!(error = %e, "cannot create settings file");
    }
    let settings = load_settings();

    let runtime = match AsyncRuntime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("folio: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(args, settings)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("folio: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args, settings: Settings) -> DirectoryResult<()> {
    let root = absolute(&args.root);
    let trash_dir = settings
        .trash_dir
        .clone()
        .or_else(default_trash_dir)
        .unwrap_or_else(|| env::temp_dir().join("folio-trash"));

    let services = DirectoryServices {
        coordinator: Arc::new(LocalFileCoordinator::new(trash_dir)),
        factory: Arc::new(TextDocumentFactory::default()),
        presentation: Arc::new(ConsoleWindow),
        watcher: Arc::new(NotifyWatcher::new()),
        registry: DocumentRegistry::global(),
        extension: Arc::new(settings.clone()),
        strings: settings.strings.clone(),
    };
    let directory = DirectoryDocument::open(&root, services).await?;

    let store = match SessionStore::open_default() {
        Ok(store) => Some(store),
        Err(e) => {
            tracing::warn!(error = %e, "session state unavailable");
            None
        }
    };
    if settings.restore_session {
        if let Some(store) = &store {
            let state = store.load(&root);
            if let Err(e) = directory.restore_state(&state).await {
                tracing::warn!(error = %e, "session restore task failed");
            }
        }
    }

    for file in &args.files {
        if let Err(e) = directory.open_document(absolute(file)).await {
            eprintln!("folio: {e}");
        }
    }

    let snapshot = directory.snapshot().await?;
    print_snapshot(&snapshot)?;

    if let Some(store) = &store {
        let mut state = RestorableState::default();
        directory.encode_restorable_state(&mut state).await?;
        if let Err(e) = store.save(&root, &state) {
            tracing::warn!(error = %e, "cannot save session state");
        }
    }

    directory.close().await;
    Ok(())
}

fn print_snapshot(snapshot: &folio::kernel::DirectorySnapshot) -> io::Result<()> {
    use std::io::Write;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{}", snapshot.root.display())?;
    for row in snapshot.tree.flatten_for_view() {
        let indent = "  ".repeat(row.depth as usize);
        let suffix = if row.is_dir { "/" } else { "" };
        writeln!(out, "{indent}{}{suffix}", row.name.to_string_lossy())?;
    }
    writeln!(out)?;
    for path in &snapshot.documents {
        let marker = if snapshot.frontmost.as_ref() == Some(path) {
            "*"
        } else {
            " "
        };
        writeln!(out, "{marker} {}", path.display())?;
    }
    Ok(())
}
