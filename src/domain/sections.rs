//! Typed content sections edited independently and flattened into one HTML body.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::error::DomainError;

const ID_PREFIX: &str = "section-";

/// Identifier of a section within one edit session. Regenerated on every decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectionId(Uuid);

impl SectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for SectionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{ID_PREFIX}{}", self.0)
    }
}

impl FromStr for SectionId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix(ID_PREFIX).unwrap_or(s);
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|err| DomainError::validation(format!("invalid section id `{s}`: {err}")))
    }
}

impl Serialize for SectionId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SectionId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Text,
    Code,
}

impl SectionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SectionKind::Text => "text",
            SectionKind::Code => "code",
        }
    }
}

impl Display for SectionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "code" => Ok(Self::Code),
            other => Err(DomainError::validation(format!(
                "unknown section type `{other}`"
            ))),
        }
    }
}

/// One editable unit of a post body.
///
/// `content` holds raw HTML for text sections and unescaped source for code
/// sections. Only code sections carry a `language`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSection {
    #[serde(default)]
    pub id: SectionId,
    #[serde(rename = "type")]
    pub kind: SectionKind,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl ContentSection {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            id: SectionId::new(),
            kind: SectionKind::Text,
            content: content.into(),
            language: None,
        }
    }

    pub fn code(content: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            id: SectionId::new(),
            kind: SectionKind::Code,
            content: content.into(),
            language: Some(language.into()),
        }
    }

    pub fn is_code(&self) -> bool {
        self.kind == SectionKind::Code
    }

    /// Merge the populated fields of `patch`. Languages are dropped for text sections.
    pub fn apply(&mut self, patch: SectionPatch) {
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(language) = patch.language
            && self.is_code()
        {
            self.language = Some(language);
        }
    }

    /// Compares kind, content and language, ignoring the session-local id.
    pub fn same_content(&self, other: &ContentSection) -> bool {
        self.kind == other.kind && self.content == other.content && self.language == other.language
    }
}

/// Partial update applied through [`ContentSection::apply`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl SectionPatch {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            language: None,
        }
    }

    pub fn language(language: impl Into<String>) -> Self {
        Self {
            content: None,
            language: Some(language.into()),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.language.is_none()
    }
}

/// True when both lists hold the same kinds, contents and languages in the same order.
pub fn equivalent(left: &[ContentSection], right: &[ContentSection]) -> bool {
    left.len() == right.len()
        && left
            .iter()
            .zip(right.iter())
            .all(|(a, b)| a.same_content(b))
}
