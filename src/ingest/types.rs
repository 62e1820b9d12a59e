// src/ingest/types.rs
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ingest::providers::rss2json::Rss2JsonItem;
use crate::ingest::xml::XmlItem;
use crate::sentiment::SentimentLabel;

/// Closed set of site sections a feed can publish into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Category {
    #[default]
    News,
    Investigations,
    #[serde(rename = "Exclusive Sources", alias = "ExclusiveSources")]
    ExclusiveSources,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::News => "News",
            Category::Investigations => "Investigations",
            Category::ExclusiveSources => "Exclusive Sources",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "News" => Ok(Category::News),
            "Investigations" => Ok(Category::Investigations),
            "Exclusive Sources" | "ExclusiveSources" => Ok(Category::ExclusiveSources),
            other => anyhow::bail!("unknown category: {other}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub category: Category,
}

impl FeedSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>, category: Category) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            category,
        }
    }
}

/// Enclosure reference as published by the feed (`<enclosure url type>`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Enclosure {
    pub url: String,
    pub mime: Option<String>,
}

/// Entry exactly as one fetch strategy produced it. Every downstream step
/// works on [`FeedEntry`] instead; see `normalize::normalize_entry`.
#[derive(Debug, Clone)]
pub enum RawEntry {
    Json(Rss2JsonItem),
    Xml(XmlItem),
}

/// Strategy-independent entry shape.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
    pub title: String,
    pub description: String,
    pub link: String,
    pub published_at: Option<DateTime<Utc>>,
    pub author: Option<String>,
    pub media_url: Option<String>,
    pub enclosure: Option<Enclosure>,
}

/// Identity of a stored article: exact title, source link and publish time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub title: String,
    pub source_link: String,
    pub published_at: DateTime<Utc>,
}

impl DedupKey {
    pub fn new(
        title: impl Into<String>,
        source_link: impl Into<String>,
        published_at: DateTime<Utc>,
    ) -> Self {
        Self {
            title: title.into(),
            source_link: source_link.into(),
            published_at,
        }
    }

    /// Stable id: SHA-256 over the key, hex encoded.
    pub fn id(&self) -> String {
        use sha2::{Digest, Sha256};
        use std::fmt::Write as _;
        let mut hasher = Sha256::new();
        hasher.update(self.title.as_bytes());
        hasher.update([0x1f]);
        hasher.update(self.source_link.as_bytes());
        hasher.update([0x1f]);
        hasher.update(timestamp_str(&self.published_at).as_bytes());
        let digest = hasher.finalize();
        let mut out = String::with_capacity(digest.len() * 2);
        for b in digest.iter() {
            let _ = write!(&mut out, "{:02x}", b);
        }
        out
    }
}

/// Canonical storage form of a publish timestamp (RFC 3339, UTC, seconds).
pub fn timestamp_str(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Enriched, persisted article. Created once per dedup key and never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestedArticle {
    pub id: String,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub author: String,
    pub published_at: DateTime<Utc>,
    pub source_url: String,
    pub image_url: String,
    pub category: Category,
    pub tags: Vec<String>,
    pub sentiment_label: SentimentLabel,
    pub sentiment_confidence: f64,
    pub source_name: String,
}

impl IngestedArticle {
    pub fn dedup_key(&self) -> DedupKey {
        DedupKey::new(&self.title, &self.source_url, self.published_at)
    }
}
