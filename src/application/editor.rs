//! In-memory section editing session for one post body.
//!
//! The editor owns its section list exclusively. Every accepted change
//! re-encodes the list, so [`SectionEditor::html`] always reflects the
//! current sections. Refused changes leave both untouched.

use std::collections::HashSet;

use thiserror::Error;
use tracing::{debug, trace};

use crate::{
    application::codec::{SectionCodec, parse_code_snippet},
    domain::sections::{ContentSection, SectionId, SectionKind, SectionPatch},
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditorError {
    #[error("reorder expected a permutation of {expected} section ids, got {received}")]
    NotAPermutation { expected: usize, received: usize },
}

#[derive(Debug, Clone)]
pub struct SectionEditor {
    codec: SectionCodec,
    sections: Vec<ContentSection>,
    html: String,
    revision: u64,
}

impl SectionEditor {
    /// Decode `stored_html` and immediately re-encode it into canonical form.
    pub fn open(stored_html: &str, codec: SectionCodec) -> Self {
        let sections = codec.decode(stored_html);
        let html = codec.encode(&sections);
        debug!(
            target = "folio::editor",
            sections = sections.len(),
            "editor opened"
        );
        Self {
            codec,
            sections,
            html,
            revision: 0,
        }
    }

    pub fn sections(&self) -> &[ContentSection] {
        &self.sections
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    /// Number of changes applied since [`SectionEditor::open`].
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Always false; the list keeps at least one section.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn position(&self, id: SectionId) -> Option<usize> {
        self.sections.iter().position(|section| section.id == id)
    }

    pub fn get(&self, id: SectionId) -> Option<&ContentSection> {
        self.sections.iter().find(|section| section.id == id)
    }

    pub fn into_html(self) -> String {
        self.html
    }

    /// Insert an empty section after index `after`, or append when `after` is
    /// `None` or past the end.
    pub fn add(&mut self, kind: SectionKind, after: Option<usize>) -> SectionId {
        let section = self.codec.blank_section(kind);
        let id = section.id;
        let index = after
            .map(|after| after.saturating_add(1).min(self.sections.len()))
            .unwrap_or(self.sections.len());

        self.sections.insert(index, section);
        self.commit("add");
        id
    }

    /// Remove section `id`. Refused when it is the last section or unknown.
    pub fn remove(&mut self, id: SectionId) -> bool {
        if self.sections.len() <= 1 {
            trace!(target = "folio::editor", %id, "refusing to remove last section");
            return false;
        }
        let Some(index) = self.position(id) else {
            return false;
        };

        self.sections.remove(index);
        self.commit("remove");
        true
    }

    pub fn update(&mut self, id: SectionId, patch: SectionPatch) -> bool {
        let Some(section) = self.sections.iter_mut().find(|section| section.id == id) else {
            return false;
        };

        section.apply(patch);
        self.commit("update");
        true
    }

    /// Replace the order with `order`, which must name every current id exactly once.
    pub fn reorder(&mut self, order: &[SectionId]) -> Result<(), EditorError> {
        let not_a_permutation = || EditorError::NotAPermutation {
            expected: self.sections.len(),
            received: order.len(),
        };

        if order.len() != self.sections.len() {
            return Err(not_a_permutation());
        }

        let mut seen = HashSet::with_capacity(order.len());
        let mut indices = Vec::with_capacity(order.len());
        for id in order {
            let index = self.position(*id).ok_or_else(not_a_permutation)?;
            if !seen.insert(index) {
                return Err(not_a_permutation());
            }
            indices.push(index);
        }

        let mut slots: Vec<Option<ContentSection>> =
            std::mem::take(&mut self.sections).into_iter().map(Some).collect();
        self.sections = indices
            .into_iter()
            .filter_map(|index| slots[index].take())
            .collect();

        self.commit("reorder");
        Ok(())
    }

    /// Replace the content and language of code section `id` with the first
    /// `pre.code-block` found in `snippet_html`.
    pub fn import_snippet(&mut self, id: SectionId, snippet_html: &str) -> bool {
        let Some(section) = self.get(id) else {
            return false;
        };
        if !section.is_code() {
            return false;
        }
        let Some(snippet) =
            parse_code_snippet(snippet_html, &self.codec.settings().fallback_language)
        else {
            return false;
        };

        self.update(
            id,
            SectionPatch::content(snippet.source).with_language(snippet.language),
        )
    }

    fn commit(&mut self, operation: &'static str) {
        self.html = self.codec.encode(&self.sections);
        self.revision = self.revision.saturating_add(1);
        trace!(
            target = "folio::editor",
            operation,
            revision = self.revision,
            sections = self.sections.len(),
            "sections re-encoded"
        );
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const SCENARIO: &str = "<p>Intro</p>\n<pre class=\"code-block\" data-language=\"python\"><code>print(1)</code></pre>\n<p>Outro</p>";

    fn editor(html: &str) -> SectionEditor {
        SectionEditor::open(html, SectionCodec::default())
    }

    fn ids(editor: &SectionEditor) -> Vec<SectionId> {
        editor.sections().iter().map(|s| s.id).collect()
    }

    #[test]
    fn open_normalizes_stored_html() {
        let editor = editor(SCENARIO);
        assert_eq!(editor.len(), 3);
        assert_eq!(editor.revision(), 0);
        assert_eq!(editor.html(), SCENARIO);
    }

    #[test]
    fn add_appends_or_inserts_after_index() {
        let mut editor = editor(SCENARIO);
        let appended = editor.add(SectionKind::Text, None);
        assert_eq!(editor.position(appended), Some(3));

        let inserted = editor.add(SectionKind::Code, Some(0));
        assert_eq!(editor.position(inserted), Some(1));
        let section = editor.get(inserted).expect("inserted section");
        assert_eq!(section.language.as_deref(), Some("javascript"));
        assert_eq!(section.content, "");

        let clamped = editor.add(SectionKind::Text, Some(99));
        assert_eq!(editor.position(clamped), Some(editor.len() - 1));
        assert_eq!(editor.revision(), 3);
    }

    #[test]
    fn last_section_cannot_be_removed() {
        let mut editor = editor("");
        let only = editor.sections()[0].id;
        assert!(!editor.remove(only));
        assert_eq!(editor.len(), 1);
        assert_eq!(editor.revision(), 0);
    }

    #[test]
    fn remove_deletes_and_reencodes() {
        let mut editor = editor(SCENARIO);
        let code = editor.sections()[1].id;
        assert!(editor.remove(code));
        assert_eq!(editor.html(), "<p>Intro</p>\n<p>Outro</p>");
        assert!(!editor.remove(code));
    }

    #[test]
    fn update_merges_fields_and_ignores_unknown_ids() {
        let mut editor = editor(SCENARIO);
        let code = editor.sections()[1].id;

        assert!(editor.update(code, SectionPatch::content("print(a < b)")));
        assert!(editor.update(code, SectionPatch::language("py")));
        assert!(
            editor
                .html()
                .contains(r#"<pre class="code-block" data-language="py"><code>print(a &lt; b)</code></pre>"#)
        );

        let before = editor.html().to_string();
        assert!(!editor.update(SectionId::new(), SectionPatch::content("x")));
        assert_eq!(editor.html(), before);
        assert_eq!(editor.revision(), 2);
    }

    #[test]
    fn reorder_applies_permutation() {
        let mut editor = editor(SCENARIO);
        let mut order = ids(&editor);
        order.reverse();
        editor.reorder(&order).expect("valid permutation");
        assert_eq!(ids(&editor), order);
        assert!(editor.html().starts_with("<p>Outro</p>\n<pre"));
    }

    #[test]
    fn reorder_rejects_non_permutations() {
        let mut editor = editor(SCENARIO);
        let original = ids(&editor);

        let short = &original[..2];
        assert_eq!(
            editor.reorder(short),
            Err(EditorError::NotAPermutation {
                expected: 3,
                received: 2
            })
        );

        let duplicated = vec![original[0], original[0], original[1]];
        assert!(editor.reorder(&duplicated).is_err());

        let foreign = vec![original[0], original[1], SectionId::new()];
        assert!(editor.reorder(&foreign).is_err());

        assert_eq!(ids(&editor), original);
        assert_eq!(editor.revision(), 0);
    }

    #[test]
    fn import_snippet_replaces_code_section() {
        let mut editor = editor(SCENARIO);
        let code = editor.sections()[1].id;
        let text = editor.sections()[0].id;
        let snippet = r#"<pre class="code-block" data-language="rust"><code>let x = &amp;y;</code></pre>"#;

        assert!(!editor.import_snippet(text, snippet));
        assert!(!editor.import_snippet(code, "<p>no code</p>"));
        assert!(editor.import_snippet(code, snippet));

        let section = editor.get(code).expect("code section");
        assert_eq!(section.content, "let x = &y;");
        assert_eq!(section.language.as_deref(), Some("rust"));
    }
}
