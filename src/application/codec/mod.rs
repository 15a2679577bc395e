//! Conversion between a stored post body and its ordered sections.
//!
//! Decoding accepts HTML written by this codec as well as code blocks from
//! older editors (Quill syntax blocks, bare `<pre><code>` and `<pre>`).
//! Encoding always writes the tagged `pre.code-block` form, so a stored body
//! converges on that shape after one edit.

pub mod escape;
pub mod recognize;
pub mod snippet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::sections::{ContentSection, SectionKind};

use self::escape::{escape_attribute, escape_code};
use self::recognize::{EDITOR_KINDS, scan};

pub use self::recognize::{BlockKind, CodeSpan};
pub use self::snippet::{CodeSnippet, parse_code_snippet};

pub const DEFAULT_CODE_LANGUAGE: &str = "javascript";
pub const FALLBACK_LANGUAGE: &str = "text";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecSettings {
    /// Language given to code sections created by the editor.
    pub default_code_language: String,
    /// Language recorded for blocks that carry none.
    pub fallback_language: String,
}

impl Default for CodecSettings {
    fn default() -> Self {
        Self {
            default_code_language: DEFAULT_CODE_LANGUAGE.to_string(),
            fallback_language: FALLBACK_LANGUAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SectionCodec {
    settings: CodecSettings,
}

impl SectionCodec {
    pub fn new(settings: CodecSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &CodecSettings {
        &self.settings
    }

    /// Split `html` into text and code sections in source order.
    ///
    /// Never fails. Blank input yields one empty text section; input without
    /// code blocks yields one text section holding the trimmed input.
    pub fn decode(&self, html: &str) -> Vec<ContentSection> {
        if html.trim().is_empty() {
            return vec![ContentSection::text("")];
        }

        let spans = scan(html, EDITOR_KINDS, &self.settings.fallback_language);
        let mut sections = Vec::with_capacity(spans.len() * 2 + 1);
        let mut cursor = 0usize;

        for span in spans {
            push_text_gap(&mut sections, &html[cursor..span.start]);
            sections.push(ContentSection::code(span.source, span.language));
            cursor = span.end;
        }
        push_text_gap(&mut sections, &html[cursor..]);

        debug!(
            target = "folio::codec",
            sections = sections.len(),
            code_sections = sections.iter().filter(|s| s.is_code()).count(),
            "decoded content"
        );

        sections
    }

    /// Serialize `sections` into the canonical stored form, one block per line.
    pub fn encode(&self, sections: &[ContentSection]) -> String {
        let mut html = String::new();

        for (index, section) in sections.iter().enumerate() {
            if index > 0 {
                html.push('\n');
            }
            match section.kind {
                SectionKind::Text => html.push_str(&section.content),
                SectionKind::Code => self.write_code_block(&mut html, section),
            }
        }

        html
    }

    /// A new empty section of `kind`, code sections carrying the default language.
    pub fn blank_section(&self, kind: SectionKind) -> ContentSection {
        match kind {
            SectionKind::Text => ContentSection::text(""),
            SectionKind::Code => {
                ContentSection::code("", self.settings.default_code_language.clone())
            }
        }
    }

    fn write_code_block(&self, html: &mut String, section: &ContentSection) {
        let language = section
            .language
            .as_deref()
            .filter(|language| !language.trim().is_empty())
            .unwrap_or(&self.settings.fallback_language);

        html.push_str(r#"<pre class="code-block" data-language=""#);
        html.push_str(&escape_attribute(language));
        html.push_str(r#""><code>"#);
        html.push_str(&escape_code(&section.content));
        html.push_str("</code></pre>");
    }
}

fn push_text_gap(sections: &mut Vec<ContentSection>, gap: &str) {
    let trimmed = gap.trim();
    if !trimmed.is_empty() {
        sections.push(ContentSection::text(trimmed));
    }
}

/// Decode with the default settings.
pub fn decode_sections(html: &str) -> Vec<ContentSection> {
    SectionCodec::default().decode(html)
}

/// Encode with the default settings.
pub fn encode_sections(sections: &[ContentSection]) -> String {
    SectionCodec::default().encode(sections)
}
