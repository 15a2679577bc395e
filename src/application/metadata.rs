//! Metadata derived from a post body before it is saved: slug, word count,
//! reading time and the heading outline.

use std::{cell::RefCell, collections::HashSet, num::NonZeroU32, rc::Rc};

use lol_html::{RewriteStrSettings, element, rewrite_str, text};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::{
    application::codec::escape::unescape_code,
    domain::{
        posts::{DEFAULT_WORDS_PER_MINUTE, PostMetadata, TocEntry, reading_time_minutes},
        slug::{AnchorSlugger, SlugError, generate_unique_slug},
    },
};

const OUTLINE_SELECTOR: &str = "h2, h3, h4";
const FALLBACK_ANCHOR: &str = "section";

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("invalid tag regex"));

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error(transparent)]
    Slug(#[from] SlugError),
    #[error("document processing failed: {message}")]
    Document { message: String },
}

impl MetadataError {
    fn document(err: impl ToString) -> Self {
        Self::Document {
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetadataService {
    words_per_minute: NonZeroU32,
}

impl Default for MetadataService {
    fn default() -> Self {
        Self {
            words_per_minute: NonZeroU32::new(DEFAULT_WORDS_PER_MINUTE).unwrap_or(NonZeroU32::MIN),
        }
    }
}

impl MetadataService {
    pub fn new(words_per_minute: NonZeroU32) -> Self {
        Self { words_per_minute }
    }

    pub fn words_per_minute(&self) -> NonZeroU32 {
        self.words_per_minute
    }

    /// Reading time for `html`; at least one minute unless the body is blank.
    pub fn reading_time(&self, html: &str) -> u32 {
        if html.trim().is_empty() {
            return 0;
        }
        reading_time_minutes(count_words(html), self.words_per_minute).max(1)
    }

    /// Derive everything stored alongside a post. `is_unique` reports whether
    /// a slug candidate is still free.
    pub fn derive<F>(
        &self,
        title: &str,
        html: &str,
        is_unique: F,
    ) -> Result<PostMetadata, MetadataError>
    where
        F: FnMut(&str) -> bool,
    {
        let slug = generate_unique_slug(title, is_unique)?;
        let word_count = count_words(html);
        let table_of_contents = table_of_contents(html)?;

        debug!(
            target = "folio::metadata",
            slug = %slug,
            word_count,
            headings = table_of_contents.len(),
            "derived post metadata"
        );

        Ok(PostMetadata {
            slug,
            word_count,
            reading_time_minutes: self.reading_time(html),
            table_of_contents,
        })
    }
}

/// Whitespace-separated words once every tag is removed.
pub fn count_words(html: &str) -> u32 {
    let stripped = TAG_RE.replace_all(html, " ");
    u32::try_from(stripped.split_whitespace().count()).unwrap_or(u32::MAX)
}

#[derive(Default)]
struct OutlineState {
    entries: Vec<TocEntry>,
    current: Option<usize>,
}

/// `h2` to `h4` headings that carry an `id`, in document order.
pub fn table_of_contents(html: &str) -> Result<Vec<TocEntry>, MetadataError> {
    let state = Rc::new(RefCell::new(OutlineState::default()));

    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!(OUTLINE_SELECTOR, {
                    let state = Rc::clone(&state);
                    move |el| {
                        let mut state = state.borrow_mut();
                        let level = heading_level(&el.tag_name());
                        match el.get_attribute("id").filter(|id| !id.trim().is_empty()) {
                            Some(id) => {
                                state.entries.push(TocEntry {
                                    level,
                                    id,
                                    title: String::new(),
                                });
                                state.current = Some(state.entries.len() - 1);
                            }
                            None => state.current = None,
                        }
                        Ok(())
                    }
                }),
                text!(OUTLINE_SELECTOR, {
                    let state = Rc::clone(&state);
                    move |chunk| {
                        let mut state = state.borrow_mut();
                        if let Some(index) = state.current
                            && let Some(entry) = state.entries.get_mut(index)
                        {
                            entry.title.push_str(chunk.as_str());
                        }
                        Ok(())
                    }
                }),
            ],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(MetadataError::document)?;

    let entries = std::mem::take(&mut state.borrow_mut().entries);
    Ok(entries
        .into_iter()
        .map(|entry| TocEntry {
            title: unescape_code(entry.title.trim()).trim().to_string(),
            ..entry
        })
        .collect())
}

#[derive(Default)]
struct HeadingScan {
    taken_ids: HashSet<String>,
    headings: Vec<(bool, String)>,
}

/// Give every `h2` to `h4` heading without an `id` a unique anchor derived
/// from its text. Existing ids anywhere in the document are left alone and
/// never reused.
pub fn anchor_headings(html: &str) -> Result<String, MetadataError> {
    let scan = Rc::new(RefCell::new(HeadingScan::default()));

    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!("[id]", {
                    let scan = Rc::clone(&scan);
                    move |el| {
                        if let Some(id) = el.get_attribute("id") {
                            scan.borrow_mut().taken_ids.insert(id);
                        }
                        Ok(())
                    }
                }),
                element!(OUTLINE_SELECTOR, {
                    let scan = Rc::clone(&scan);
                    move |el| {
                        let has_id = el.has_attribute("id");
                        scan.borrow_mut().headings.push((has_id, String::new()));
                        Ok(())
                    }
                }),
                text!(OUTLINE_SELECTOR, {
                    let scan = Rc::clone(&scan);
                    move |chunk| {
                        if let Some((_, text)) = scan.borrow_mut().headings.last_mut() {
                            text.push_str(chunk.as_str());
                        }
                        Ok(())
                    }
                }),
            ],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(MetadataError::document)?;

    let HeadingScan {
        taken_ids,
        headings,
    } = std::mem::take(&mut *scan.borrow_mut());

    if headings.iter().all(|(has_id, _)| *has_id) {
        return Ok(html.to_string());
    }

    let mut slugger = AnchorSlugger::new();
    for id in &taken_ids {
        slugger.reserve(id);
    }

    let mut anchors = Vec::with_capacity(headings.len());
    for (has_id, text) in &headings {
        if *has_id {
            anchors.push(None);
            continue;
        }
        let title = unescape_code(text.trim()).into_owned();
        let anchor = match slugger.anchor_for(&title) {
            Ok(anchor) => anchor,
            Err(SlugError::EmptyInput | SlugError::Unrepresentable { .. }) => {
                slugger.anchor_for(FALLBACK_ANCHOR)?
            }
            Err(err) => return Err(err.into()),
        };
        anchors.push(Some(anchor));
    }

    let anchors = Rc::new(anchors);
    let index = Rc::new(RefCell::new(0usize));

    let rewritten = rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![element!(OUTLINE_SELECTOR, {
                let anchors = Rc::clone(&anchors);
                let index = Rc::clone(&index);
                move |el| {
                    let mut idx = index.borrow_mut();
                    if let Some(Some(anchor)) = anchors.get(*idx) {
                        el.set_attribute("id", anchor)?;
                    }
                    *idx += 1;
                    Ok(())
                }
            })],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(MetadataError::document)?;

    Ok(rewritten)
}

fn heading_level(tag_name: &str) -> u8 {
    tag_name
        .strip_prefix(['h', 'H'])
        .and_then(|value| value.parse::<u8>().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn words_are_counted_without_markup() {
        assert_eq!(count_words("<p>One <b>two</b></p><p>three</p>"), 3);
        assert_eq!(count_words(""), 0);
    }

    #[test]
    fn reading_time_has_floor_for_non_empty_bodies() {
        let service = MetadataService::default();
        assert_eq!(service.reading_time(""), 0);
        assert_eq!(service.reading_time("<p></p>"), 1);
        let long = "word ".repeat(401);
        assert_eq!(service.reading_time(&long), 3);
    }

    #[test]
    fn outline_lists_identified_headings() {
        let html = concat!(
            r#"<h1 id="top">Title</h1>"#,
            r#"<h2 id="setup">Set <em>up</em></h2>"#,
            "<h3>No anchor</h3>",
            r#"<h4 id="deep"> Fish &amp; Chips </h4>"#,
            r#"<h5 id="fine">Too deep</h5>"#,
        );
        let toc = table_of_contents(html).expect("toc");
        assert_eq!(
            toc,
            vec![
                TocEntry {
                    level: 2,
                    id: "setup".into(),
                    title: "Set up".into()
                },
                TocEntry {
                    level: 4,
                    id: "deep".into(),
                    title: "Fish & Chips".into()
                },
            ]
        );
    }

    #[test]
    fn anchors_are_unique_and_respect_existing_ids() {
        let html = concat!(
            r#"<p id="intro">x</p>"#,
            "<h2>Intro</h2>",
            "<h2>Intro</h2>",
            r#"<h3 id="kept">Kept</h3>"#,
            "<h4>!!!</h4>",
        );
        let anchored = anchor_headings(html).expect("anchors");
        assert_eq!(
            anchored,
            concat!(
                r#"<p id="intro">x</p>"#,
                r#"<h2 id="intro-2">Intro</h2>"#,
                r#"<h2 id="intro-3">Intro</h2>"#,
                r#"<h3 id="kept">Kept</h3>"#,
                r#"<h4 id="section">!!!</h4>"#,
            )
        );
        assert_eq!(table_of_contents(&anchored).expect("toc").len(), 4);
    }

    #[test]
    fn derive_collects_all_fields() {
        let service = MetadataService::default();
        let metadata = service
            .derive(
                "Hello World",
                r#"<h2 id="a">A</h2><p>some words here</p>"#,
                |candidate| candidate != "hello-world",
            )
            .expect("metadata");
        assert_eq!(metadata.slug, "hello-world-2");
        assert_eq!(metadata.word_count, 4);
        assert_eq!(metadata.reading_time_minutes, 1);
        assert_eq!(metadata.table_of_contents.len(), 1);
    }
}
