//! Crate-level error types for pinpatch diagnostics.

use std::path::PathBuf;

use crate::types::Confidence;

/// Every failure in pinpatch is recoverable at the call site: the caller reports
/// it and leaves the source document untouched. Each variant names the tag,
/// line, or edit that failed so a diagnostic can be rendered without a debugger.
#[allow(clippy::error_impl_error, reason = "crate-level error type shared by library and binary")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Several lines survived every tie-break and strict matching refused to guess.
    #[error(
        "ambiguous match for <{tag}>: {} candidate lines ({}), best guess line {} at {confidence} confidence",
        lines.len(),
        lines.iter().map(|l| return l.saturating_add(1).to_string()).collect::<Vec<_>>().join(", "),
        best.saturating_add(1)
    )]
    AmbiguousMatch {
        /// Zero-based index of the line the best-effort pick would have used.
        best: usize,
        /// Confidence the best-effort pick would have carried.
        confidence: Confidence,
        /// Zero-based indices of every surviving candidate line.
        lines: Vec<usize>,
        /// Tag name of the element being located.
        tag: String,
    },

    /// A source or fingerprint file does not exist on disk.
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The picked element cannot be fingerprinted.
    #[error("invalid target: {reason}")]
    InvalidTarget {
        /// Why the element was rejected.
        reason: String,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// JSON (de)serialization of a fingerprint or edit intent failed.
    #[error("json: {0}")]
    Json(
        /// The wrapped JSON error.
        #[from]
        serde_json::Error,
    ),

    /// A patch addressed a line the document does not have.
    #[error("line {} out of range (document has {len} lines)", line.saturating_add(1))]
    LineOutOfRange {
        /// Number of lines in the document.
        len: usize,
        /// Zero-based line index that was requested.
        line: usize,
    },

    /// No candidate line reached sufficient confidence.
    #[error("no source line matches <{tag}>: {reason}")]
    NotFound {
        /// Number of lines that opened the tag at all.
        candidates: usize,
        /// Which tier gave up and why.
        reason: String,
        /// Tag name of the element being located.
        tag: String,
    },

    /// None of the edit patterns fit the target line's actual syntax.
    #[error("cannot apply {edit} to <{tag}> on line {}: {reason}", line.saturating_add(1))]
    PatchPatternMismatch {
        /// Short description of the attempted edit.
        edit: String,
        /// Zero-based index of the target line.
        line: usize,
        /// What the patterns expected but did not find.
        reason: String,
        /// Tag name of the element being patched.
        tag: String,
    },

    /// A dynamically built pattern failed to compile.
    #[error("pattern: {0}")]
    Pattern(
        /// The wrapped regex error.
        #[from]
        regex::Error,
    ),

    /// The edit was computed against a baseline that has since been replaced.
    #[error("stale edit discarded: made against baseline {edit_generation}, current is {current_generation}")]
    StaleBaseline {
        /// Generation of the session's current baseline.
        current_generation: u64,
        /// Generation the edit was made against.
        edit_generation: u64,
    },

    /// TOML deserialization of the config file failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),

    /// The edit is well-formed but cannot be expressed as a single-line change.
    #[error("unsupported edit {edit} on <{tag}>: {reason}")]
    UnsupportedEdit {
        /// Short description of the attempted edit.
        edit: String,
        /// Why the edit cannot be applied in place.
        reason: String,
        /// Tag name of the element being patched.
        tag: String,
    },

    /// The file watcher could not be set up.
    #[error("watch: {reason}")]
    Watch {
        /// Description of the watcher failure.
        reason: String,
    },
}
