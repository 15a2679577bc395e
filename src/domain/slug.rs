//! Slug helpers for post URLs and heading anchors.
//!
//! Slugs are lowercase ASCII with every run of non-alphanumeric characters
//! collapsed into a single `-` (via the `slug` crate, which also
//! transliterates accented letters). Uniqueness is delegated to a caller
//! supplied predicate so the generation logic stays free of persistence.

use std::collections::HashMap;

use slug::slugify;
use thiserror::Error;

const MAX_SUFFIX_ATTEMPTS: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug source text is empty")]
    EmptyInput,
    #[error("failed to derive slug from `{input}`")]
    Unrepresentable { input: String },
    #[error("exhausted attempts to find a unique slug for `{base}`")]
    Exhausted { base: String },
}

/// Derive a base slug from the provided human-readable text.
pub fn derive_slug(input: &str) -> Result<String, SlugError> {
    if input.trim().is_empty() {
        return Err(SlugError::EmptyInput);
    }

    let candidate = slugify(input);
    if candidate.is_empty() {
        return Err(SlugError::Unrepresentable {
            input: input.to_string(),
        });
    }

    Ok(candidate)
}

/// Produce a slug that does not collide according to the supplied predicate.
///
/// `is_unique` returns `true` when the candidate is free. Collisions are
/// retried with a counter suffix (`-2`, `-3`, …).
pub fn generate_unique_slug<F>(input: &str, mut is_unique: F) -> Result<String, SlugError>
where
    F: FnMut(&str) -> bool,
{
    let base = derive_slug(input)?;

    if is_unique(&base) {
        return Ok(base);
    }

    for attempt in 2..=MAX_SUFFIX_ATTEMPTS + 1 {
        let candidate = format!("{base}-{attempt}");
        if is_unique(&candidate) {
            return Ok(candidate);
        }
    }

    Err(SlugError::Exhausted { base })
}

/// Hands out document-unique anchor ids for headings, in visiting order.
///
/// Ids already present in the document can be reserved up front so generated
/// anchors never shadow them.
#[derive(Default, Debug)]
pub struct AnchorSlugger {
    occurrences: HashMap<String, usize>,
}

impl AnchorSlugger {
    pub fn new() -> Self {
        Self {
            occurrences: HashMap::new(),
        }
    }

    /// Mark an existing id as taken.
    pub fn reserve(&mut self, id: &str) {
        self.occurrences.entry(id.to_string()).or_insert(1);
    }

    pub fn anchor_for(&mut self, heading: &str) -> Result<String, SlugError> {
        let base = derive_slug(heading)?;
        let mut count = {
            let entry = self.occurrences.entry(base.clone()).or_insert(0);
            *entry += 1;
            *entry
        };

        if count == 1 {
            return Ok(base);
        }

        loop {
            let candidate = format!("{base}-{count}");
            if !self.occurrences.contains_key(&candidate) {
                self.occurrences.insert(candidate.clone(), 1);
                self.occurrences.insert(base, count);
                return Ok(candidate);
            }
            count += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_slug_collapses_punctuation() {
        assert_eq!(
            derive_slug("  Hello, World!  Rust & HTML ").expect("slug"),
            "hello-world-rust-html"
        );
    }

    #[test]
    fn derive_slug_rejects_blank_and_symbols() {
        assert_eq!(derive_slug("   "), Err(SlugError::EmptyInput));
        assert!(matches!(
            derive_slug("!!!"),
            Err(SlugError::Unrepresentable { .. })
        ));
    }

    #[test]
    fn generate_unique_slug_appends_counter() {
        let mut existing = vec!["pattern-library".to_string()];
        let slug = generate_unique_slug("Pattern Library", |candidate| {
            if existing.contains(&candidate.to_string()) {
                false
            } else {
                existing.push(candidate.to_string());
                true
            }
        })
        .expect("unique slug");

        assert_eq!(slug, "pattern-library-2");
        assert!(existing.contains(&slug));
    }

    #[test]
    fn generate_unique_slug_exhausted() {
        let result =
            generate_unique_slug("Example", |_| false).expect_err("should exhaust attempts");
        assert_eq!(
            result,
            SlugError::Exhausted {
                base: "example".to_string()
            }
        );
    }

    #[test]
    fn anchor_slugger_produces_unique_slugs() {
        let mut slugger = AnchorSlugger::new();

        assert_eq!(slugger.anchor_for("Overview").expect("slug"), "overview");
        assert_eq!(slugger.anchor_for("Overview").expect("slug"), "overview-2");
        assert_eq!(slugger.anchor_for("Café Notes").expect("slug"), "cafe-notes");
    }

    #[test]
    fn anchor_slugger_skips_reserved_ids() {
        let mut slugger = AnchorSlugger::new();
        slugger.reserve("setup");
        slugger.reserve("setup-2");

        assert_eq!(slugger.anchor_for("Setup").expect("slug"), "setup-3");
    }
}
