//! # Catalog Module
//!
//! Durable system of record for the video library.
//!
//! The [`Catalog`] trait is the seam between the in-memory caches and the
//! relational store. Production code talks to [`SqliteCatalog`]; tests can
//! swap in a mock to observe exactly which queries the caches issue.
//!
//! ## Identity
//!
//! - `original_url` is the identity anchor. The selection cache, the hall of
//!   fame and play history are all keyed by it.
//! - `name` is globally unique across categories, enforced at insert time.
//! - `shortened_url` is display-only and may change freely.

pub mod sqlite;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};

use crate::error::Result;

pub use sqlite::SqliteCatalog;

/// Traffic-light classification driving selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Green,
    Red,
    Yellow,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Green, Category::Red, Category::Yellow];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Green => "green",
            Category::Red => "red",
            Category::Yellow => "yellow",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category `{0}` (expected green, red or yellow)")]
pub struct ParseCategoryError(pub String);

impl FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "green" => Ok(Category::Green),
            "red" => Ok(Category::Red),
            "yellow" => Ok(Category::Yellow),
            _ => Err(ParseCategoryError(s.to_string())),
        }
    }
}

/// Links kept for videos re-hosted from a third-party platform.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Provenance {
    pub author_link: Option<String>,
    pub source_link: Option<String>,
    pub audio_link: Option<String>,
}

/// What an external media fetcher hands back for a TikTok/Instagram style link.
///
/// Stored verbatim; the core never performs the fetch itself.
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedMedia {
    pub resolved_media_location: String,
    pub attribution_link: Option<String>,
    pub source_original_link: Option<String>,
    pub associated_audio_link: Option<String>,
}

/// A row of the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRecord {
    pub id: i64,
    pub name: String,
    pub category: Category,
    pub shortened_url: String,
    pub original_url: String,
    pub added_by: String,
    pub date_added: String,
    pub is_hall_of_fame: bool,
    /// Normalized `a,b,c` form, see [`crate::hashtags`]
    pub hashtags: Option<String>,
    pub provenance: Provenance,
}

impl VideoRecord {
    pub fn tags(&self) -> Vec<String> {
        crate::hashtags::parse_stored(self.hashtags.as_deref())
    }
}

/// Drops a legacy `#1234` discriminator from a stored contributor name.
pub fn display_contributor(added_by: &str) -> &str {
    match added_by.rsplit_once('#') {
        Some((user, discriminator))
            if !discriminator.is_empty() && discriminator.chars().all(|c| c.is_ascii_digit()) =>
        {
            user
        }
        _ => added_by,
    }
}

/// A video about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVideo {
    pub name: String,
    pub category: Category,
    pub shortened_url: String,
    pub original_url: String,
    pub added_by: String,
    pub date_added: String,
    pub provenance: Provenance,
}

impl NewVideo {
    /// A direct upload. Without a shortener the display URL is the original.
    pub fn new(
        name: impl Into<String>,
        category: Category,
        url: impl Into<String>,
        added_by: impl Into<String>,
    ) -> Self {
        let url = url.into();
        Self {
            name: name.into().trim().to_string(),
            category,
            shortened_url: url.clone(),
            original_url: url,
            added_by: added_by.into(),
            date_added: chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            provenance: Provenance::default(),
        }
    }

    /// A video re-hosted from a third-party platform.
    #[allow(dead_code)]
    pub fn from_fetched(
        name: impl Into<String>,
        category: Category,
        media: FetchedMedia,
        added_by: impl Into<String>,
    ) -> Self {
        let mut video = Self::new(name, category, media.resolved_media_location, added_by);
        video.provenance = Provenance {
            author_link: media.attribution_link,
            source_link: media.source_original_link,
            audio_link: media.associated_audio_link,
        };
        video
    }
}

/// How a caller names the video to delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    Name,
    OriginalUrl,
}

impl IdentifierKind {
    pub(crate) fn column(&self) -> &'static str {
        match self {
            IdentifierKind::Name => "name",
            IdentifierKind::OriginalUrl => "original_url",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictField {
    Name,
    ShortenedUrl,
    OriginalUrl,
    SourceLink,
}

impl fmt::Display for ConflictField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConflictField::Name => "name",
            ConflictField::ShortenedUrl => "url",
            ConflictField::OriginalUrl => "original url",
            ConflictField::SourceLink => "source link",
        };
        f.write_str(label)
    }
}

/// One clash found by the insert-time conflict scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub field: ConflictField,
    /// Name of the record that already owns the value
    pub name: String,
    /// That record's original URL
    pub url: String,
}

/// Canonical details of a deleted row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedVideo {
    pub original_url: String,
    pub name: String,
    pub category: Category,
    pub added_by: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HallOfFameChange {
    Promoted(VideoRecord),
    AlreadyPromoted(VideoRecord),
    NotFound,
}

/// Rows sharing one `original_url`, ordered by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    pub original_url: String,
    pub records: Vec<VideoRecord>,
}

/// Async access to the durable catalog.
///
/// Every method is a suspension point; implementations must not touch any
/// in-memory cache.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Inserts after scanning name, both URLs and the source link for
    /// clashes. Every clash is reported, not just the first.
    async fn insert(&self, video: NewVideo) -> Result<VideoRecord>;

    /// Deletes by name or original URL, walking each category in turn.
    async fn delete(&self, identifier: &str, kind: IdentifierKind) -> Result<Option<RemovedVideo>>;

    async fn delete_by_id(&self, id: i64) -> Result<()>;

    async fn get_by_name(&self, name: &str) -> Result<Option<VideoRecord>>;

    /// Matches either the display URL or the original URL.
    async fn find_by_url(&self, url: &str) -> Result<Option<VideoRecord>>;

    /// Returns `false` when no row carries `name`.
    async fn update_category(&self, name: &str, category: Category) -> Result<bool>;

    /// `identifier` may be a name or an original URL.
    async fn set_hall_of_fame(&self, identifier: &str) -> Result<HallOfFameChange>;

    /// Full replace of the stored hashtag string.
    async fn update_hashtags(&self, name: &str, hashtags: &str) -> Result<bool>;

    async fn urls_in_category(&self, category: Category) -> Result<Vec<String>>;

    /// Full records of one category, ordered by name.
    async fn videos_in_category(&self, category: Category) -> Result<Vec<VideoRecord>>;

    async fn hall_of_fame_urls(&self) -> Result<Vec<String>>;

    async fn all_videos(&self) -> Result<Vec<VideoRecord>>;

    async fn duplicate_groups(&self) -> Result<Vec<DuplicateGroup>>;

    /// Makes the store itself reject a second row with the same original URL.
    async fn enforce_unique_identity(&self) -> Result<()>;

    async fn counts_by_category(&self) -> Result<BTreeMap<Category, u64>>;

    /// Raw `added_by` values with their row counts.
    async fn counts_by_contributor(&self) -> Result<Vec<(String, u64)>>;

    /// Distinct non-empty stored hashtag strings.
    async fn hashtag_strings(&self) -> Result<Vec<String>>;
}
