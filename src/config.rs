use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Name of the project config file looked up in the working directory.
pub const CONFIG_FILE: &str = ".pinpatch.toml";

/// Project configuration loaded from `.pinpatch.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Source locator tuning.
    pub locator: LocatorConfig,
    /// Preview reconciler tuning.
    pub preview: PreviewConfig,
}

/// Tuning for [`crate::locator::locate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LocatorConfig {
    /// Direct text must be longer than this many characters to be searched for.
    pub min_text_len: usize,
    /// Refuse best-effort picks instead of returning them flagged as ambiguous.
    pub strict: bool,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        return Self { min_text_len: 3, strict: false };
    }
}

/// Tuning for [`crate::preview::reconcile`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreviewConfig {
    /// Class of the centering container fragments are wrapped in.
    pub container_class: String,
    /// CSS `max-width` of that container.
    pub fragment_width: String,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        return Self {
            container_class: "pinpatch-fragment".to_string(),
            fragment_width: "1200px".to_string(),
        };
    }
}

impl Config {
    /// Load config from `.pinpatch.toml` in the given root directory.
    /// Returns defaults if the file doesn't exist. Returns an error if the file
    /// exists but is malformed: a config the user wrote is never silently ignored.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// or `Error::TomlDe` if the TOML is malformed.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(CONFIG_FILE);
        let content = match std::fs::read_to_string(&path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::Io(e)),
            Ok(c) => c,
        };

        return Self::parse(&content);
    }

    /// Parse config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `Error::TomlDe` if the TOML is malformed or names unknown keys.
    pub fn parse(content: &str) -> Result<Self, Error> {
        return Ok(toml::from_str(content)?);
    }
}
