use folio::application::{
    metadata::{MetadataService, anchor_headings, table_of_contents},
    render::{DisplayBlock, display_renderer, split_for_display},
};
use pretty_assertions::assert_eq;

#[test]
fn markdown_fences_take_priority_over_html_blocks() {
    let blocks = split_for_display(include_str!("fixtures/markdown_post.md"), "text");
    let code: Vec<(&str, &str)> = blocks
        .iter()
        .filter_map(|block| match block {
            DisplayBlock::Code { language, source } => Some((language.as_str(), source.as_str())),
            DisplayBlock::Html { .. } => None,
        })
        .collect();

    assert_eq!(
        code,
        vec![
            ("bash", "echo \"<pre>not html</pre>\" && ls\n"),
            ("json", "{\"a\": 1}"),
            ("text", "untagged fence\n"),
        ]
    );
    assert!(matches!(&blocks[0], DisplayBlock::Html { html } if html.starts_with("# Notes")));
}

#[test]
fn rendered_post_highlights_every_code_block() {
    let html = display_renderer()
        .render(include_str!("fixtures/legacy_post.html"))
        .expect("render");

    assert_eq!(html.matches("<pre class=\"syntax-highlight").count(), 4);
    assert!(html.contains("data-language=\"rust\""));
    assert!(html.contains("<p>Fin.</p>"));
    assert!(!html.contains("ql-syntax"));
}

#[test]
fn fixture_metadata_after_anchoring() {
    let anchored = anchor_headings(include_str!("fixtures/legacy_post.html")).expect("anchors");
    assert!(anchored.contains(r#"<h3 id="tagged-blocks">"#));

    let toc = table_of_contents(&anchored).expect("toc");
    let ids: Vec<&str> = toc.iter().map(|entry| entry.id.as_str()).collect();
    assert_eq!(ids, vec!["why", "tagged-blocks"]);

    let metadata = MetadataService::default()
        .derive("Why Sections?", &anchored, |_| true)
        .expect("metadata");
    assert_eq!(metadata.slug, "why-sections");
    assert_eq!(metadata.reading_time_minutes, 1);
}
