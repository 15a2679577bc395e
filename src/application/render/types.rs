use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One piece of a stored post body as shown to readers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DisplayBlock {
    /// Markup emitted as stored, surrounding whitespace included.
    Html { html: String },
    /// Source to be highlighted. Markdown fence bodies are kept verbatim,
    /// other blocks are entity-decoded.
    Code { language: String, source: String },
}

impl DisplayBlock {
    pub fn html(html: impl Into<String>) -> Self {
        Self::Html { html: html.into() }
    }

    pub fn code(language: impl Into<String>, source: impl Into<String>) -> Self {
        Self::Code {
            language: language.into(),
            source: source.into(),
        }
    }

    pub fn is_code(&self) -> bool {
        matches!(self, DisplayBlock::Code { .. })
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("syntax highlighting failed: {language}: {message}")]
    Highlighting { language: String, message: String },
}
