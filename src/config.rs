use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

#[cfg(windows)]
const PLATFORM_NEWLINE: &str = "\r\n";
#[cfg(not(windows))]
const PLATFORM_NEWLINE: &str = "\n";

const DEFAULT_INDENT: &str = "   ";

/// Rendering configuration of a [`Document`](crate::Document).
///
/// Fixed for the lifetime of a document; a different configuration needs a
/// new document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Line terminator written after every rendered line.
    pub newline: String,
    /// Indentation unit used once per nesting level in lists.
    pub indent: String,
    /// Separate fragments by a single newline instead of a blank line.
    pub suppressed: bool,
    /// Characters prefixed with a backslash in prose content.
    pub escape_chars: Vec<char>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            newline: PLATFORM_NEWLINE.to_string(),
            indent: DEFAULT_INDENT.to_string(),
            suppressed: false,
            escape_chars: Vec::new(),
        }
    }
}

impl Config {
    pub fn with_newline(mut self, newline: impl Into<String>) -> Self {
        self.newline = newline.into();
        self
    }

    pub fn with_indent(mut self, indent: impl Into<String>) -> Self {
        self.indent = indent.into();
        self
    }

    pub fn with_suppressed(mut self, suppressed: bool) -> Self {
        self.suppressed = suppressed;
        self
    }

    pub fn with_escape_chars(mut self, chars: impl IntoIterator<Item = char>) -> Self {
        self.escape_chars = chars.into_iter().collect();
        self
    }

    /// Marker written after each fragment's own trailing newline.
    ///
    /// In normal mode this is another newline, which yields a blank line
    /// between fragments. Suppressed documents write nothing here.
    pub fn line_end(&self) -> &str {
        if self.suppressed { "" } else { self.newline.as_str() }
    }

    /// Parse a config from TOML text. Missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Load config from a TOML file, or return defaults if it cannot be used.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(Error::Io { source, .. }) => {
                tracing::debug!(path = %path.display(), error = %source, "config not readable, using defaults");
                Self::default()
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring invalid config");
                Self::default()
            }
        }
    }
}
