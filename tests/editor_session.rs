use folio::{
    application::{
        codec::{CodecSettings, SectionCodec, decode_sections},
        editor::{EditorError, SectionEditor},
    },
    domain::sections::{SectionKind, SectionPatch, equivalent},
};
use pretty_assertions::assert_eq;

fn open_legacy() -> SectionEditor {
    SectionEditor::open(
        include_str!("fixtures/legacy_post.html"),
        SectionCodec::default(),
    )
}

#[test]
fn html_always_matches_sections() {
    let mut editor = open_legacy();
    let first = editor.sections()[0].id;

    let added = editor.add(SectionKind::Code, Some(0));
    editor.update(added, SectionPatch::content("let a = 1 < 2;").with_language("ts"));
    editor.remove(first);

    let mut order: Vec<_> = editor.sections().iter().map(|s| s.id).collect();
    order.rotate_left(1);
    editor.reorder(&order).expect("permutation");

    assert!(equivalent(
        &decode_sections(editor.html()),
        editor.sections()
    ));
    assert_eq!(editor.revision(), 4);
}

#[test]
fn list_never_becomes_empty() {
    let mut editor = SectionEditor::open("<p>a</p><pre>b</pre>", SectionCodec::default());
    while editor.len() > 1 {
        let id = editor.sections()[0].id;
        assert!(editor.remove(id));
    }

    let last = editor.sections()[0].id;
    assert!(!editor.remove(last));
    assert_eq!(editor.len(), 1);
    assert!(!editor.is_empty());
}

#[test]
fn configured_default_language_applies_to_new_code() {
    let codec = SectionCodec::new(CodecSettings {
        default_code_language: "python".into(),
        ..CodecSettings::default()
    });
    let mut editor = SectionEditor::open("", codec);
    let id = editor.add(SectionKind::Code, None);

    assert_eq!(editor.position(id), Some(1));
    assert_eq!(
        editor.html(),
        "\n<pre class=\"code-block\" data-language=\"python\"><code></code></pre>"
    );
}

#[test]
fn failed_reorder_reports_sizes() {
    let mut editor = open_legacy();
    let err = editor.reorder(&[]).expect_err("empty order");
    assert_eq!(
        err,
        EditorError::NotAPermutation {
            expected: editor.len(),
            received: 0
        }
    );
    assert_eq!(
        err.to_string(),
        format!(
            "reorder expected a permutation of {} section ids, got 0",
            editor.len()
        )
    );
}

#[test]
fn snippet_import_round_trips_through_html() {
    let mut editor = SectionEditor::open("", SectionCodec::default());
    let id = editor.add(SectionKind::Code, None);
    assert!(editor.import_snippet(
        id,
        r#"<pre class="code-block" data-language="html"><code>&lt;p&gt;hi&lt;/p&gt;</code></pre>"#,
    ));

    let reopened = SectionEditor::open(editor.html(), SectionCodec::default());
    let code = &reopened.sections()[0];
    assert_eq!(code.content, "<p>hi</p>");
    assert_eq!(code.language.as_deref(), Some("html"));
}
