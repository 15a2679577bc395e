//! Splits a stored post body into markup and code blocks for readers.
//!
//! Unlike the editor decoder, markup between code blocks is kept untrimmed
//! and markdown fences are honoured ahead of every HTML shape, since older
//! posts were written in markdown.

use tracing::debug;

use crate::application::{
    codec::recognize::{DISPLAY_KINDS, scan},
    render::types::DisplayBlock,
};

pub fn split_for_display(html: &str, fallback_language: &str) -> Vec<DisplayBlock> {
    if html.trim().is_empty() {
        return Vec::new();
    }

    let spans = scan(html, DISPLAY_KINDS, fallback_language);
    if spans.is_empty() {
        return vec![DisplayBlock::html(html)];
    }

    let mut blocks = Vec::with_capacity(spans.len() * 2 + 1);
    let mut cursor = 0usize;
    for span in spans {
        push_markup(&mut blocks, &html[cursor..span.start]);
        blocks.push(DisplayBlock::code(span.language, span.source));
        cursor = span.end;
    }
    push_markup(&mut blocks, &html[cursor..]);

    debug!(
        target = "folio::render::display",
        blocks = blocks.len(),
        "split content for display"
    );
    blocks
}

fn push_markup(blocks: &mut Vec<DisplayBlock>, gap: &str) {
    if !gap.trim().is_empty() {
        blocks.push(DisplayBlock::html(gap));
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn blank_input_has_no_blocks() {
        assert!(split_for_display("", "text").is_empty());
        assert!(split_for_display(" \n ", "text").is_empty());
    }

    #[test]
    fn content_without_code_is_one_block() {
        assert_eq!(
            split_for_display("<p>just prose</p>\n", "text"),
            vec![DisplayBlock::html("<p>just prose</p>\n")]
        );
    }

    #[test]
    fn markup_between_blocks_keeps_whitespace() {
        let html = concat!(
            "<p>a</p>\n",
            r#"<pre class="code-block" data-language="sql"><code>SELECT 1 &gt; 0;</code></pre>"#,
            "\n\n",
            "```rust\nfn main() {}\n```",
            "\n<p>b</p>",
        );
        assert_eq!(
            split_for_display(html, "text"),
            vec![
                DisplayBlock::html("<p>a</p>\n"),
                DisplayBlock::code("sql", "SELECT 1 > 0;"),
                DisplayBlock::code("rust", "fn main() {}\n"),
                DisplayBlock::html("\n<p>b</p>"),
            ]
        );
    }

    #[test]
    fn fence_without_language_uses_fallback() {
        let blocks = split_for_display("```\nplain &amp; raw\n```", "text");
        assert_eq!(blocks, vec![DisplayBlock::code("text", "plain &amp; raw\n")]);
    }
}
