use syntect::{
    html::{ClassStyle, ClassedHTMLGenerator},
    parsing::{SyntaxReference, SyntaxSet},
    util::LinesWithEndings,
};

use crate::application::{codec::escape::escape_attribute, render::types::RenderError};

/// Highlight `code` as `language` into a classed `<pre>` block.
///
/// Unknown languages are highlighted as plain text but keep their name in
/// the emitted `data-language` attribute.
pub(crate) fn highlight_code(
    language: &str,
    code: &str,
    syntax_set: &SyntaxSet,
    class_style: ClassStyle,
) -> Result<String, RenderError> {
    let syntax =
        find_syntax(syntax_set, language).unwrap_or_else(|| syntax_set.find_syntax_plain_text());

    let mut code_with_newline = code.to_string();
    if !code_with_newline.ends_with('\n') {
        code_with_newline.push('\n');
    }

    let mut generator = ClassedHTMLGenerator::new_with_class_style(syntax, syntax_set, class_style);

    for line in LinesWithEndings::from(code_with_newline.as_str()) {
        generator
            .parse_html_for_line_which_includes_newline(line)
            .map_err(|err| RenderError::Highlighting {
                language: language.to_string(),
                message: err.to_string(),
            })?;
    }

    let highlighted = generator.finalize();
    let class_token = class_token(language);

    Ok(format!(
        "<pre class=\"syntax-highlight syntax-lang-{class_token}\" data-language=\"{}\"><code class=\"language-{class_token} syntax-code\">{highlighted}</code></pre>",
        escape_attribute(language),
    ))
}

fn find_syntax<'a>(syntax_set: &'a SyntaxSet, token: &str) -> Option<&'a SyntaxReference> {
    let lowercase = token.trim().to_ascii_lowercase();
    if lowercase.is_empty() {
        return None;
    }
    syntax_set
        .find_syntax_by_token(&lowercase)
        .or_else(|| syntax_set.find_syntax_by_name(&lowercase))
        .or_else(|| syntax_set.find_syntax_by_extension(&lowercase))
}

/// Lowercased language name reduced to characters safe inside a class list.
fn class_token(language: &str) -> String {
    let token: String = language
        .trim()
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '+' | '#' | '_' | '-') {
                ch.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();

    if token.is_empty() {
        "text".to_string()
    } else {
        token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_token_is_attribute_safe() {
        assert_eq!(class_token("C++"), "c++");
        assert_eq!(class_token("objective c"), "objective-c");
        assert_eq!(class_token("\"><script>"), "---script-");
        assert_eq!(class_token("  "), "text");
    }

    #[test]
    fn unknown_language_uses_plain_text() {
        let syntax_set = SyntaxSet::load_defaults_newlines();
        let html = highlight_code(
            "klingon",
            "a < b",
            &syntax_set,
            ClassStyle::SpacedPrefixed { prefix: "syntax-" },
        )
        .expect("highlight");
        assert!(html.starts_with(r#"<pre class="syntax-highlight syntax-lang-klingon" data-language="klingon">"#));
        assert!(html.contains("a &lt; b"));
    }
}
