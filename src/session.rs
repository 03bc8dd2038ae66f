//! Editor session: the one writer of a source document.
//!
//! Every edit names the baseline it was computed against. Regenerated content
//! replaces the baseline outright, and an edit made against an older baseline
//! is discarded instead of merged.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{info, warn};

use crate::config::LocatorConfig;
use crate::document::SourceDocument;
use crate::error::Error;
use crate::locator::locate;
use crate::types::{EditIntent, Fingerprint, MatchResult};

/// Identity of one version of the source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Baseline {
    /// SHA-256 of the text at this version.
    pub digest: String,
    /// Monotonic version counter, bumped by every edit and every replacement.
    pub generation: u64,
}

/// Source document plus the state needed to apply edits to it in order.
#[derive(Debug, Clone)]
pub struct EditorSession {
    /// Locator tuning used for every edit.
    config: LocatorConfig,
    /// Current source.
    document: SourceDocument,
    /// Current baseline generation.
    generation: u64,
}

impl EditorSession {
    /// Start a session on `text` at generation zero.
    pub fn new(text: &str, config: LocatorConfig) -> Self {
        return Self { config, document: SourceDocument::from_text(text), generation: 0 };
    }

    /// The current baseline.
    pub fn baseline(&self) -> Baseline {
        return Baseline { digest: self.document.digest(), generation: self.generation };
    }

    /// The current source.
    pub const fn document(&self) -> &SourceDocument {
        return &self.document;
    }

    /// Replace the source with regenerated content. Edits made against any
    /// earlier baseline will be refused.
    pub fn replace_baseline(&mut self, text: &str) -> Baseline {
        self.document = SourceDocument::from_text(text);
        self.generation = self.generation.saturating_add(1);
        info!("baseline replaced, now generation {}", self.generation);
        return self.baseline();
    }

    /// Locate the fingerprinted element and apply `intent` there. On success
    /// the source advances to a new generation; on any error it is unchanged.
    ///
    /// # Errors
    ///
    /// Returns `Error::StaleBaseline` if `baseline` is not the current one,
    /// or any locator or patch error.
    pub fn apply_edit(
        &mut self,
        baseline: &Baseline,
        fingerprint: Fingerprint,
        intent: &EditIntent,
    ) -> Result<MatchResult, Error> {
        if baseline.generation != self.generation {
            warn!(
                "discarding {} made against generation {}, current is {}",
                intent.describe(),
                baseline.generation,
                self.generation
            );
            return Err(Error::StaleBaseline {
                current_generation: self.generation,
                edit_generation: baseline.generation,
            });
        }

        let target = locate(fingerprint, self.document.lines(), &self.config)?;
        self.document.apply(&target, intent)?;
        self.generation = self.generation.saturating_add(1);
        return Ok(target);
    }
}

/// An [`EditorSession`] shared between threads; calls are serialized.
#[derive(Debug, Clone)]
pub struct SharedSession(Arc<Mutex<EditorSession>>);

impl SharedSession {
    /// Share `session`.
    pub fn new(session: EditorSession) -> Self {
        return Self(Arc::new(Mutex::new(session)));
    }

    /// Lock the session. A panic in another holder cannot leave the document
    /// half-written, so a poisoned lock is recovered.
    fn lock(&self) -> MutexGuard<'_, EditorSession> {
        return self.0.lock().unwrap_or_else(PoisonError::into_inner);
    }

    /// See [`EditorSession::apply_edit`].
    ///
    /// # Errors
    ///
    /// Same as [`EditorSession::apply_edit`].
    pub fn apply_edit(
        &self,
        baseline: &Baseline,
        fingerprint: Fingerprint,
        intent: &EditIntent,
    ) -> Result<MatchResult, Error> {
        return self.lock().apply_edit(baseline, fingerprint, intent);
    }

    /// See [`EditorSession::baseline`].
    pub fn baseline(&self) -> Baseline {
        return self.lock().baseline();
    }

    /// See [`EditorSession::replace_baseline`].
    pub fn replace_baseline(&self, text: &str) -> Baseline {
        return self.lock().replace_baseline(text);
    }

    /// Current source text.
    pub fn text(&self) -> String {
        return self.lock().document().to_text();
    }
}
