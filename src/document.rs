//! Message pages.
//!
//! A [`Message`] is rendered into a single self-contained HTML page (inline CSS, no external
//! references) that shows the text on a centered card. The page is what the QR symbol points
//! at, so it has to display the same way when opened straight from disk.

use std::fs;
use std::path::{self, Path, PathBuf};

use tracing::{info, warn};

use crate::error::{Error, Result};

const TEMPLATE: &str = include_str!("templates/message.html");
const PLACEHOLDER: &str = "{{message}}";

/// Substitutions applied in order. `&` comes first so the entities produced by the later
/// rules are not escaped again.
const ESCAPES: [(&str, &str); 5] = [
    ("&", "&amp;"),
    ("<", "&lt;"),
    (">", "&gt;"),
    ("\"", "&quot;"),
    ("'", "&#39;"),
];

/// Escapes the five markup-significant characters of `text`.
///
/// ```rust
/// assert_eq!(qrnote::escape_html("Hello & <world>"), "Hello &amp; &lt;world&gt;");
/// ```
pub fn escape_html(text: &str) -> String {
    ESCAPES
        .iter()
        .fold(text.to_owned(), |acc, (from, to)| acc.replace(from, to))
}

/// Text to show on the page. Never blank.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message(String);

impl Message {
    /// Accepts any text containing at least one non-whitespace character.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyMessage`] for empty or whitespace-only text.
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            warn!("rejected empty message");
            return Err(Error::EmptyMessage);
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Renders messages into the card page.
#[derive(Clone, Copy, Debug, Default)]
pub struct DocumentRenderer;

impl DocumentRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Returns the complete page for `text`, escaped and embedded without truncation.
    pub fn render_to_string(&self, text: &str) -> String {
        TEMPLATE.replacen(PLACEHOLDER, &escape_html(text), 1)
    }

    /// Writes the page for `text` to `output_path` as UTF-8, replacing any existing file, and
    /// returns the absolute path of the written file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be written.
    pub fn render(&self, text: &str, output_path: impl AsRef<Path>) -> Result<PathBuf> {
        let output_path = output_path.as_ref();
        let html = self.render_to_string(text);
        fs::write(output_path, html.as_bytes()).map_err(|e| Error::io(output_path, e))?;
        let absolute = path::absolute(output_path).map_err(|e| Error::io(output_path, e))?;
        info!(path = %absolute.display(), bytes = html.len(), "wrote message page");
        Ok(absolute)
    }
}
