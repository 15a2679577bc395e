//! Code block recognizers and overlap reconciliation.
//!
//! Each [`BlockKind`] owns one pattern. Kinds are scanned in the order the
//! caller lists them; a span is kept only if it does not overlap a span
//! claimed by an earlier pass, so identical matches from more generic
//! patterns are never counted twice. The result is sorted by source offset.
//!
//! The tagged pattern only accepts bodies without a raw `<`, which is what
//! the encoder writes. A tagged block holding markup is read as a generic
//! `<pre><code>` block, so an unclosed tagged opener can never swallow a
//! later block.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::debug;

use super::escape::unescape_code;

static TAGGED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?is)<pre\s[^>]*class="code-block"[^>]*data-language="([^"]*)"[^>]*><code>([^<]*)</code></pre>"#,
    )
    .expect("invalid tagged code block regex")
});

static QUILL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<pre\s[^>]*class="ql-syntax"[^>]*>(.*?)</pre>"#)
        .expect("invalid quill syntax regex")
});

static PRE_CODE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<pre(\s[^>]*)?><code(\s[^>]*)?>(.*?)</code></pre>"#)
        .expect("invalid pre code regex")
});

static PRE_ONLY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<pre(?:\s[^>]*)?>(.*?)</pre>"#).expect("invalid pre regex")
});

static MARKDOWN_FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(\w+)?\n(.*?)```").expect("invalid markdown fence regex"));

static DATA_LANGUAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\bdata-language\s*=\s*"([^"]*)""#).expect("invalid data-language regex")
});

static LANGUAGE_CLASS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)class\s*=\s*"[^"]*\blanguage-([^\s"]+)"#).expect("invalid language regex")
});

/// Recognized shapes of an embedded code block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    /// `<pre class="code-block" data-language="…"><code>…</code></pre>`, as written by the encoder.
    Tagged,
    /// `<pre class="ql-syntax">…</pre>` from the rich-text editor's syntax block.
    QuillSyntax,
    /// Any other `<pre><code>…</code></pre>`. The language comes from a
    /// `data-language` on `<pre>`, then a `language-*` class on `<code>`.
    PreCode,
    /// Any other `<pre>…</pre>`.
    PreOnly,
    /// A markdown fence: three backticks, optional language, newline, body, three backticks.
    MarkdownFence,
}

/// Recognizers used when opening a post for editing, in priority order.
pub const EDITOR_KINDS: &[BlockKind] = &[
    BlockKind::Tagged,
    BlockKind::QuillSyntax,
    BlockKind::PreCode,
    BlockKind::PreOnly,
];

/// Recognizers used when splitting a stored post for display, in priority order.
pub const DISPLAY_KINDS: &[BlockKind] = &[
    BlockKind::MarkdownFence,
    BlockKind::Tagged,
    BlockKind::QuillSyntax,
    BlockKind::PreCode,
    BlockKind::PreOnly,
];

impl BlockKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BlockKind::Tagged => "tagged",
            BlockKind::QuillSyntax => "quill_syntax",
            BlockKind::PreCode => "pre_code",
            BlockKind::PreOnly => "pre_only",
            BlockKind::MarkdownFence => "markdown_fence",
        }
    }

    fn pattern(self) -> &'static Regex {
        match self {
            BlockKind::Tagged => &TAGGED_RE,
            BlockKind::QuillSyntax => &QUILL_RE,
            BlockKind::PreCode => &PRE_CODE_RE,
            BlockKind::PreOnly => &PRE_ONLY_RE,
            BlockKind::MarkdownFence => &MARKDOWN_FENCE_RE,
        }
    }

    fn extract(self, captures: &Captures<'_>, fallback_language: &str) -> (String, String) {
        let group = |index: usize| captures.get(index).map(|m| m.as_str()).unwrap_or("");

        match self {
            BlockKind::Tagged => (
                language_or(unescape_code(group(1)).as_ref(), fallback_language),
                unescape_code(group(2)).into_owned(),
            ),
            BlockKind::QuillSyntax | BlockKind::PreOnly => (
                fallback_language.to_string(),
                unescape_code(group(1)).into_owned(),
            ),
            BlockKind::PreCode => {
                let attribute = |pattern: &Regex, attrs: &str| {
                    pattern
                        .captures(attrs)
                        .and_then(|c| c.get(1))
                        .map(|m| unescape_code(m.as_str()).into_owned())
                        .filter(|language| !language.trim().is_empty())
                };
                let language = attribute(&*DATA_LANGUAGE_RE, group(1))
                    .or_else(|| attribute(&*LANGUAGE_CLASS_RE, group(2)))
                    .unwrap_or_default();
                (
                    language_or(&language, fallback_language),
                    unescape_code(group(3)).into_owned(),
                )
            }
            BlockKind::MarkdownFence => (
                language_or(group(1), fallback_language),
                group(2).to_string(),
            ),
        }
    }
}

fn language_or(language: &str, fallback: &str) -> String {
    if language.trim().is_empty() {
        fallback.to_string()
    } else {
        language.to_string()
    }
}

/// A claimed byte range of the source and the code it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeSpan {
    pub start: usize,
    pub end: usize,
    pub kind: BlockKind,
    pub language: String,
    pub source: String,
}

impl CodeSpan {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    fn overlaps(&self, start: usize, end: usize) -> bool {
        start < self.end && self.start < end
    }
}

/// Run `kinds` over `html` in order and return the non-overlapping spans sorted by offset.
pub fn scan(html: &str, kinds: &[BlockKind], fallback_language: &str) -> Vec<CodeSpan> {
    let mut claimed: Vec<CodeSpan> = Vec::new();

    for &kind in kinds {
        let mut matched = 0usize;
        let mut skipped = 0usize;

        for captures in kind.pattern().captures_iter(html) {
            let Some(whole) = captures.get(0) else {
                continue;
            };
            let (start, end) = (whole.start(), whole.end());

            if claimed.iter().any(|span| span.overlaps(start, end)) {
                skipped += 1;
                continue;
            }

            let (language, source) = kind.extract(&captures, fallback_language);
            claimed.push(CodeSpan {
                start,
                end,
                kind,
                language,
                source,
            });
            matched += 1;
        }

        if matched > 0 || skipped > 0 {
            debug!(
                target = "folio::codec::recognize",
                kind = kind.as_str(),
                matched,
                skipped,
                "recognizer pass finished"
            );
        }
    }

    claimed.sort_by_key(|span| span.start);
    claimed
}
