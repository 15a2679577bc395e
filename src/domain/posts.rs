//! Post-level metadata derived from the stored body.

use std::fmt::{self, Display, Formatter};
use std::num::NonZeroU32;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::domain::error::DomainError;

pub const DEFAULT_WORDS_PER_MINUTE: u32 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl PostStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
            PostStatus::Archived => "archived",
        }
    }
}

impl Display for PostStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            "archived" => Ok(Self::Archived),
            other => Err(DomainError::validation(format!(
                "unknown post status `{other}`"
            ))),
        }
    }
}

/// Status plus the first-publication timestamp, which is never cleared once set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Publication {
    pub status: PostStatus,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub published_at: Option<OffsetDateTime>,
}

impl Publication {
    pub fn draft() -> Self {
        Self::default()
    }

    /// Move to `status`. Returns `true` when this call stamped `published_at`.
    pub fn set_status(&mut self, status: PostStatus, now: OffsetDateTime) -> bool {
        let changed = self.status != status;
        self.status = status;
        if changed && status == PostStatus::Published && self.published_at.is_none() {
            self.published_at = Some(now);
            return true;
        }
        false
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    pub level: u8,
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostMetadata {
    pub slug: String,
    pub word_count: u32,
    pub reading_time_minutes: u32,
    pub table_of_contents: Vec<TocEntry>,
}

/// Minutes needed to read `word_count` words, rounded up.
pub fn reading_time_minutes(word_count: u32, words_per_minute: NonZeroU32) -> u32 {
    word_count.div_ceil(words_per_minute.get())
}
