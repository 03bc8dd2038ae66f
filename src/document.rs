//! The editable HTML source as an ordered list of lines.

use sha2::{Digest as _, Sha256};

use crate::error::Error;
use crate::types::{EditIntent, MatchResult};

/// HTML source split on `\n`. Carriage returns stay part of their line so
/// `to_text` reproduces the input byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// Lines without their `\n` terminator.
    lines: Vec<String>,
    /// Whether the text ended with `\n`.
    trailing_newline: bool,
}

impl SourceDocument {
    /// Split text into lines.
    pub fn from_text(text: &str) -> Self {
        let trailing_newline = text.ends_with('\n');
        let body = text.strip_suffix('\n').unwrap_or(text);
        let lines = if text.is_empty() {
            Vec::new()
        } else {
            body.split('\n').map(String::from).collect()
        };
        return Self { lines, trailing_newline };
    }

    /// SHA-256 of the full text, hex-encoded lowercase.
    pub fn digest(&self) -> String {
        let hash = Sha256::digest(self.to_text().as_bytes());
        return format!("{hash:x}");
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        return self.lines.len();
    }

    /// Whether the document has no lines at all.
    pub fn is_empty(&self) -> bool {
        return self.lines.is_empty();
    }

    /// The lines, in order.
    pub fn lines(&self) -> &[String] {
        return &self.lines;
    }

    /// Apply one edit at a located line. On error the document is unchanged.
    ///
    /// # Errors
    ///
    /// Returns any error from [`crate::patch::apply_patch`].
    pub fn apply(&mut self, target: &MatchResult, intent: &EditIntent) -> Result<(), Error> {
        self.lines = crate::patch::apply_patch(&self.lines, target, intent)?;
        return Ok(());
    }

    /// Join the lines back into text.
    pub fn to_text(&self) -> String {
        let mut text = self.lines.join("\n");
        if self.trailing_newline {
            text.push('\n');
        }
        return text;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_text_byte_for_byte() {
        for text in ["", "\n", "<p>a</p>", "<p>a</p>\n", "<p>\r\n  a\r\n</p>\r\n", "a\n\nb"] {
            assert_eq!(SourceDocument::from_text(text).to_text(), text, "{text:?}");
        }
    }

    #[test]
    fn keeps_carriage_returns_inside_lines() {
        let doc = SourceDocument::from_text("<h1>a</h1>\r\n<p>b</p>\r\n");
        assert_eq!(doc.lines(), ["<h1>a</h1>\r", "<p>b</p>\r"]);
    }

    #[test]
    fn digest_tracks_content() {
        let a = SourceDocument::from_text("<p>a</p>");
        let b = SourceDocument::from_text("<p>b</p>");
        assert_eq!(a.digest().len(), 64);
        assert_ne!(a.digest(), b.digest());
        assert_eq!(a.digest(), SourceDocument::from_text("<p>a</p>").digest());
    }
}
