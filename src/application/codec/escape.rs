//! Entity escaping for code blocks embedded in stored HTML.
//!
//! Escaping handles `&` before `<` and `>` so existing entities in source
//! text survive a round trip. Unescaping is a single pass over the input,
//! so `&amp;lt;` decodes to the literal text `&lt;` and never to `<`.

use std::borrow::Cow;

pub fn escape_code(source: &str) -> Cow<'_, str> {
    html_escape::encode_text(source)
}

pub fn unescape_code(escaped: &str) -> Cow<'_, str> {
    html_escape::decode_html_entities(escaped)
}

pub fn escape_attribute(value: &str) -> Cow<'_, str> {
    html_escape::encode_double_quoted_attribute(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(escape_code("a < b && c > d"), "a &lt; b &amp;&amp; c &gt; d");
    }

    #[test]
    fn unescape_does_not_cascade() {
        assert_eq!(unescape_code("&amp;lt;div&amp;gt;"), "&lt;div&gt;");
        assert_eq!(unescape_code("&lt;div&gt;"), "<div>");
    }

    #[test]
    fn escape_then_unescape_recovers_source() {
        let source = "if (a < b && b > c) { x = \"&lt;\"; }";
        assert_eq!(unescape_code(&escape_code(source)), source);
    }

    #[test]
    fn attribute_escaping_covers_quotes() {
        assert_eq!(escape_attribute("c\"sharp"), "c&quot;sharp");
    }
}
