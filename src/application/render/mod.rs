//! Reader-facing rendering of stored post bodies.
//!
//! Rendering is pure: the same stored HTML always produces the same output.
//! Markup blocks pass through untouched and code blocks are highlighted with
//! `syntax-` prefixed CSS classes.

mod display;
mod highlight;
mod types;

use std::sync::Arc;

use once_cell::sync::Lazy;
use syntect::{html::ClassStyle, parsing::SyntaxSet};
use tracing::debug;

use crate::application::codec::FALLBACK_LANGUAGE;

pub use display::split_for_display;
pub use types::{DisplayBlock, RenderError};

use highlight::highlight_code;

pub struct DisplayRenderer {
    syntax_set: SyntaxSet,
    class_style: ClassStyle,
    fallback_language: String,
}

impl DisplayRenderer {
    pub fn new(fallback_language: impl Into<String>) -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            class_style: ClassStyle::SpacedPrefixed { prefix: "syntax-" },
            fallback_language: fallback_language.into(),
        }
    }

    pub fn split(&self, html: &str) -> Vec<DisplayBlock> {
        split_for_display(html, &self.fallback_language)
    }

    pub fn render_block(&self, block: &DisplayBlock) -> Result<String, RenderError> {
        match block {
            DisplayBlock::Html { html } => Ok(html.clone()),
            DisplayBlock::Code { language, source } => {
                highlight_code(language, source, &self.syntax_set, self.class_style)
            }
        }
    }

    /// Split `html` and render every block, joining the results with newlines.
    pub fn render(&self, html: &str) -> Result<String, RenderError> {
        let blocks = self.split(html);
        let rendered = blocks
            .iter()
            .map(|block| self.render_block(block))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            target = "folio::render",
            blocks = blocks.len(),
            code_blocks = blocks.iter().filter(|b| b.is_code()).count(),
            "rendered content"
        );
        Ok(rendered.join("\n"))
    }
}

impl Default for DisplayRenderer {
    fn default() -> Self {
        Self::new(FALLBACK_LANGUAGE)
    }
}

static DISPLAY_RENDERER: Lazy<Arc<DisplayRenderer>> =
    Lazy::new(|| Arc::new(DisplayRenderer::default()));

/// Access the shared renderer, initialised on first use.
pub fn display_renderer() -> Arc<DisplayRenderer> {
    Arc::clone(&DISPLAY_RENDERER)
}
