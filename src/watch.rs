//! File watcher: renders the preview on startup, then reconciles it each time
//! the source file is regenerated.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use notify::{RecursiveMode, Watcher as _};

use crate::commands;
use crate::config::Config;
use crate::document::SourceDocument;
use crate::error::Error;
use crate::preview::{self, HeadlessSurface, SyncOutcome};

/// Debounce delay between filesystem events and re-render.
const DEBOUNCE_MS: u64 = 100;

/// Create a filesystem watcher that signals on the channel whenever a file
/// named `file_name` is created, modified, or removed.
///
/// # Errors
///
/// Returns `Error::Watch` if the watcher cannot be created.
fn create_watcher(
    tx: crossbeam_channel::Sender<()>,
    file_name: OsString,
) -> Result<notify::RecommendedWatcher, Error> {
    return notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
        if let Ok(event) = res
            && matches!(
                event.kind,
                notify::EventKind::Create(_) | notify::EventKind::Modify(_) | notify::EventKind::Remove(_)
            )
            && event.paths.iter().any(|p| return p.file_name() == Some(file_name.as_os_str()))
        {
            let _ = tx.send(());
        }
    })
    .map_err(|e| {
        return Error::Watch { reason: format!("watcher setup failed: {e}") };
    });
}

/// Live preview state for one source file.
struct PreviewLoop {
    /// Preview tuning.
    config: Config,
    /// Digest of the markup last rendered, to skip no-op events.
    last_digest: Option<String>,
    /// Rendered document destination.
    out: PathBuf,
    /// Watched source file.
    source: PathBuf,
    /// The rendering kept alive between changes.
    surface: HeadlessSurface,
}

impl PreviewLoop {
    /// Re-read the source and bring the preview up to date.
    ///
    /// # Errors
    ///
    /// Returns errors from reading the source or writing the output.
    fn refresh(&mut self) -> Result<(), Error> {
        let markup = commands::read_file(&self.source)?;
        let digest = SourceDocument::from_text(&markup).digest();
        if self.last_digest.as_deref() == Some(digest.as_str()) {
            return Ok(());
        }

        let outcome = preview::sync(&mut self.surface, &markup, &self.config.preview);
        self.surface.tick_frame();
        std::fs::write(&self.out, self.surface.render())?;
        self.last_digest = Some(digest);

        match outcome {
            SyncOutcome::Incremental => eprintln!("watch: preview updated in place"),
            SyncOutcome::Rebuilt => eprintln!("watch: preview rebuilt"),
        }
        return Ok(());
    }
}

/// Entry point for the watch command.
///
/// Renders once, then watches the source's directory and reconciles on changes.
///
/// # Errors
///
/// Returns errors from config loading, the initial render, or watcher setup.
pub fn run(source: &Path, out: &Path) -> Result<ExitCode, Error> {
    let config = Config::load(&PathBuf::from("."))?;
    let mut state = PreviewLoop {
        config,
        last_digest: None,
        out: out.to_path_buf(),
        source: source.to_path_buf(),
        surface: HeadlessSurface::new(),
    };

    eprintln!("watch: initial render");
    state.refresh()?;

    let file_name = source
        .file_name()
        .map(OsString::from)
        .ok_or_else(|| return Error::Watch { reason: format!("`{}` is not a file", source.display()) })?;
    let dir = source
        .parent()
        .filter(|p| return !p.as_os_str().is_empty())
        .map_or_else(|| return PathBuf::from("."), Path::to_path_buf);

    let (tx, rx) = crossbeam_channel::unbounded();
    let mut watcher = create_watcher(tx, file_name)?;
    watcher
        .watch(&dir, RecursiveMode::NonRecursive)
        .map_err(|e| return Error::Watch { reason: format!("cannot watch `{}`: {e}", dir.display()) })?;

    eprintln!("watch: monitoring {}, press Ctrl+C to stop", source.display());

    let mut last_code = ExitCode::SUCCESS;
    while rx.recv().is_ok() {
        let debounce = Duration::from_millis(DEBOUNCE_MS);
        while rx.recv_timeout(debounce).is_ok() {}
        last_code = match state.refresh() {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("error: {e}");
                commands::exit_code_for(&e)
            },
        };
    }

    return Ok(last_code);
}
