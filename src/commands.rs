//! Core CLI commands for pinpatch: locate, patch, preview.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::config::Config;
use crate::document::SourceDocument;
use crate::error::Error;
use crate::locator;
use crate::preview::{self, HeadlessSurface, SyncOutcome};
use crate::session::EditorSession;
use crate::types::{EditIntent, Fingerprint, MatchResult};

/// Exit code for a weak (low-confidence) match that was still used.
const EXIT_WEAK: u8 = 1;
/// Exit code for a failed locate or patch.
const EXIT_FAILED: u8 = 2;
/// Exit code for any other error.
const EXIT_ERROR: u8 = 3;

/// Map an error to the process exit code documented by `pinpatch info`.
pub fn exit_code_for(e: &Error) -> ExitCode {
    return ExitCode::from(exit_status(e));
}

/// Numeric exit status for an error.
const fn exit_status(e: &Error) -> u8 {
    return match e {
        Error::AmbiguousMatch { .. }
        | Error::LineOutOfRange { .. }
        | Error::NotFound { .. }
        | Error::PatchPatternMismatch { .. }
        | Error::StaleBaseline { .. }
        | Error::UnsupportedEdit { .. } => EXIT_FAILED,
        Error::FileNotFound { .. }
        | Error::InvalidTarget { .. }
        | Error::Io(_)
        | Error::Json(_)
        | Error::Pattern(_)
        | Error::TomlDe(_)
        | Error::Watch { .. } => EXIT_ERROR,
    };
}

/// Read a file, reporting a missing file as `Error::FileNotFound`.
///
/// # Errors
///
/// Returns `Error::FileNotFound` or `Error::Io`.
pub fn read_file(path: &Path) -> Result<String, Error> {
    return std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            return Error::FileNotFound { path: path.to_path_buf() };
        }
        return Error::Io(e);
    });
}

/// Load a fingerprint from a JSON file.
///
/// # Errors
///
/// Returns `Error::FileNotFound`, `Error::Io`, or `Error::Json`.
fn load_fingerprint(path: &Path) -> Result<Fingerprint, Error> {
    let json = read_file(path)?;
    return Ok(serde_json::from_str(&json)?);
}

/// Exit code for a successful match: weak matches get their own code.
fn exit_code_for_match(target: &MatchResult) -> ExitCode {
    if target.confidence.is_weak() {
        return ExitCode::from(EXIT_WEAK);
    }
    return ExitCode::SUCCESS;
}

/// Warn on stderr about a match the caller should double-check.
fn report_match_quality(target: &MatchResult) {
    if target.ambiguous {
        eprintln!(
            "warning: several lines fit equally well, picked line {} ({} confidence)",
            target.line_index.saturating_add(1),
            target.confidence
        );
    } else if target.confidence.is_weak() {
        eprintln!("warning: positional guess at line {}", target.line_index.saturating_add(1));
    }
}

/// Locate a fingerprinted element and print `line<TAB>confidence<TAB>strategy`
/// with a 1-based line number.
///
/// # Errors
///
/// Returns errors from reading inputs, config loading, or locating.
pub fn locate(file: &Path, fingerprint: &Path) -> Result<ExitCode, Error> {
    let config = Config::load(&PathBuf::from("."))?;
    let source = read_file(file)?;
    let fingerprint = load_fingerprint(fingerprint)?;

    let document = SourceDocument::from_text(&source);
    let target = locator::locate(fingerprint, document.lines(), &config.locator)?;

    println!("{}\t{}\t{}", target.line_index.saturating_add(1), target.confidence, target.strategy);
    report_match_quality(&target);
    return Ok(exit_code_for_match(&target));
}

/// Locate, patch, and write the file back (or print it with `dry_run`).
///
/// The file is re-read before writing; if it changed on disk in the meantime
/// the regenerated content wins and the edit is discarded.
///
/// # Errors
///
/// Returns errors from reading inputs, config loading, locating, patching,
/// or writing; `Error::StaleBaseline` if the file changed underneath.
pub fn patch(file: &Path, fingerprint: &Path, intent: &EditIntent, dry_run: bool) -> Result<ExitCode, Error> {
    let config = Config::load(&PathBuf::from("."))?;
    let source = read_file(file)?;
    let fingerprint = load_fingerprint(fingerprint)?;

    let mut session = EditorSession::new(&source, config.locator);
    let baseline = session.baseline();
    let target = session.apply_edit(&baseline, fingerprint, intent)?;
    let patched = session.document().to_text();

    if dry_run {
        print!("{patched}");
    } else {
        let on_disk = SourceDocument::from_text(&read_file(file)?).digest();
        if on_disk != baseline.digest {
            return Err(Error::StaleBaseline {
                current_generation: baseline.generation.saturating_add(1),
                edit_generation: baseline.generation,
            });
        }
        std::fs::write(file, patched)?;
    }

    eprintln!(
        "Patched line {} of {}: {} ({} confidence via {})",
        target.line_index.saturating_add(1),
        file.display(),
        intent.describe(),
        target.confidence,
        target.strategy
    );
    report_match_quality(&target);
    return Ok(exit_code_for_match(&target));
}

/// Render `file` into a fresh headless surface and write the document to `out`.
///
/// # Errors
///
/// Returns errors from reading the source, config loading, or writing `out`.
pub fn preview(file: &Path, out: &Path) -> Result<(), Error> {
    let config = Config::load(&PathBuf::from("."))?;
    let markup = read_file(file)?;

    let mut surface = HeadlessSurface::new();
    let outcome = preview::sync(&mut surface, &markup, &config.preview);
    surface.tick_frame();
    std::fs::write(out, surface.render())?;

    let mode = match outcome {
        SyncOutcome::Incremental => "updated",
        SyncOutcome::Rebuilt => "built",
    };
    eprintln!("Preview {mode}: {}", out.display());
    return Ok(());
}
