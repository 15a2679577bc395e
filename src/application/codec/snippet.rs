//! Reads a single pasted code block into a language and source pair.

use std::{cell::RefCell, rc::Rc};

use lol_html::{RewriteStrSettings, element, rewrite_str, text};
use tracing::debug;

use super::escape::unescape_code;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeSnippet {
    pub language: String,
    pub source: String,
}

#[derive(Default)]
struct SnippetState {
    blocks: usize,
    language: Option<String>,
    raw_text: String,
}

/// Extract the first `pre.code-block` element from `html`.
///
/// Returns `None` when the fragment holds no such element or cannot be
/// tokenized. The text content is taken from every descendant, so an inner
/// `<code>` wrapper or highlighting spans do not leak into the source.
pub fn parse_code_snippet(html: &str, fallback_language: &str) -> Option<CodeSnippet> {
    let state = Rc::new(RefCell::new(SnippetState::default()));

    let result = rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!("pre.code-block", {
                    let state = Rc::clone(&state);
                    move |el| {
                        let mut state = state.borrow_mut();
                        state.blocks = state.blocks.saturating_add(1);
                        if state.blocks == 1 {
                            state.language = el.get_attribute("data-language");
                        }
                        Ok(())
                    }
                }),
                text!("pre.code-block", {
                    let state = Rc::clone(&state);
                    move |chunk| {
                        let mut state = state.borrow_mut();
                        if state.blocks == 1 {
                            state.raw_text.push_str(chunk.as_str());
                        }
                        Ok(())
                    }
                }),
            ],
            ..RewriteStrSettings::default()
        },
    );

    if let Err(err) = result {
        debug!(
            target = "folio::codec::snippet",
            error = %err,
            "snippet could not be tokenized"
        );
        return None;
    }

    let state = state.borrow();
    if state.blocks == 0 {
        return None;
    }

    let language = state
        .language
        .as_deref()
        .map(|value| unescape_code(value).trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| fallback_language.to_string());

    Some(CodeSnippet {
        language,
        source: unescape_code(&state.raw_text).into_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_language_and_decoded_source() {
        let snippet = parse_code_snippet(
            r#"<pre class="code-block" data-language="ts"><code>let a = 1 &lt; 2;</code></pre>"#,
            "text",
        )
        .expect("snippet");
        assert_eq!(snippet.language, "ts");
        assert_eq!(snippet.source, "let a = 1 < 2;");
    }

    #[test]
    fn missing_language_uses_fallback() {
        let snippet =
            parse_code_snippet(r#"<pre class="code-block"><code>x</code></pre>"#, "text")
                .expect("snippet");
        assert_eq!(snippet.language, "text");
    }

    #[test]
    fn nested_markup_contributes_text_only() {
        let snippet = parse_code_snippet(
            r#"<div><pre class="wide code-block" data-language="rust"><code><span class="kw">fn</span> main() {}</code></pre></div>"#,
            "text",
        )
        .expect("snippet");
        assert_eq!(snippet.source, "fn main() {}");
    }

    #[test]
    fn only_first_block_is_taken() {
        let snippet = parse_code_snippet(
            concat!(
                r#"<pre class="code-block" data-language="a"><code>one</code></pre>"#,
                r#"<pre class="code-block" data-language="b"><code>two</code></pre>"#,
            ),
            "text",
        )
        .expect("snippet");
        assert_eq!(snippet.language, "a");
        assert_eq!(snippet.source, "one");
    }

    #[test]
    fn fragment_without_code_block_is_rejected() {
        assert_eq!(parse_code_snippet("<p>hello</p><pre>x</pre>", "text"), None);
        assert_eq!(parse_code_snippet("", "text"), None);
    }
}
