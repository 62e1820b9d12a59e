// src/ingest/normalize.rs
//! Strategy-independent entry shaping: every `RawEntry` becomes a
//! `FeedEntry` here, and the derived article fields (excerpt, image, tags)
//! are computed from that single shape.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::OffsetDateTime;

use crate::ingest::providers::rss2json::Rss2JsonItem;
use crate::ingest::types::{Enclosure, FeedEntry, RawEntry};
use crate::ingest::xml::XmlItem;

/// Column width of stored titles and excerpts.
pub const MAX_STORED_CHARS: usize = 255;

pub const UNTITLED: &str = "Untitled";

static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<[^>]*>").unwrap());
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

pub fn normalize_entry(raw: RawEntry) -> FeedEntry {
    match raw {
        RawEntry::Json(item) => from_json(item),
        RawEntry::Xml(item) => from_xml(item),
    }
}

fn from_json(item: Rss2JsonItem) -> FeedEntry {
    let enclosure = json_enclosure(&item.enclosure);
    FeedEntry {
        title: clean_title(item.title.as_deref()),
        description: non_empty(item.description)
            .or_else(|| non_empty(item.content))
            .unwrap_or_default(),
        link: non_empty(item.link).unwrap_or_default(),
        published_at: item.pub_date.as_deref().and_then(parse_published),
        author: non_empty(item.author),
        media_url: non_empty(item.thumbnail),
        enclosure,
    }
}

fn from_xml(item: XmlItem) -> FeedEntry {
    FeedEntry {
        title: clean_title(item.title.as_deref()),
        description: non_empty(item.description)
            .or_else(|| non_empty(item.content))
            .or_else(|| non_empty(item.summary))
            .unwrap_or_default(),
        link: non_empty(item.link).unwrap_or_default(),
        published_at: item.published.as_deref().and_then(parse_published),
        author: non_empty(item.author),
        media_url: non_empty(item.media_url),
        enclosure: item.enclosure.filter(|e| !e.url.trim().is_empty()),
    }
}

// rss2json emits `{}` or `[]` when there is no enclosure.
fn json_enclosure(v: &serde_json::Value) -> Option<Enclosure> {
    let url = v.get("link").or_else(|| v.get("url"))?.as_str()?.trim();
    if url.is_empty() {
        return None;
    }
    Some(Enclosure {
        url: url.to_string(),
        mime: v.get("type").and_then(|t| t.as_str()).map(str::to_string),
    })
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn clean_title(raw: Option<&str>) -> String {
    let t = collapse_ws(&html_escape::decode_html_entities(raw.unwrap_or_default()));
    if t.is_empty() {
        UNTITLED.to_string()
    } else {
        cap_chars(&t, MAX_STORED_CHARS)
    }
}

fn collapse_ws(s: &str) -> String {
    RE_WS.replace_all(s, " ").trim().to_string()
}

/// Parse a feed date. Accepts RFC 2822, RFC 3339, `YYYY-MM-DD HH:MM:SS`,
/// `YYYY-MM-DDTHH:MM:SS[.fff]` and `YYYY-MM-DD`; offset-less forms are
/// taken as UTC. Sub-second precision is dropped so the value round-trips
/// through storage.
pub fn parse_published(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let from_time = |odt: OffsetDateTime| Utc.timestamp_opt(odt.unix_timestamp(), 0).single();

    if let Ok(odt) = OffsetDateTime::parse(s, &Rfc2822) {
        return from_time(odt);
    }
    if let Ok(odt) = OffsetDateTime::parse(s, &Rfc3339) {
        return from_time(odt);
    }
    // Zone names such as "GMT" or "EST" that the strict parser rejects.
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Utc.timestamp_opt(dt.timestamp(), 0).single();
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Utc.timestamp_opt(naive.and_utc().timestamp(), 0).single();
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Remove markup, decode entities and collapse whitespace.
pub fn strip_html(s: &str) -> String {
    let no_tags = RE_TAGS.replace_all(s, " ");
    let decoded = html_escape::decode_html_entities(&no_tags);
    // Entity-escaped markup decodes into tags; drop those too.
    let no_tags = RE_TAGS.replace_all(&decoded, " ");
    collapse_ws(&no_tags.replace('\u{a0}', " "))
}

/// First `len` characters of the plain-text description, ellipsis-terminated.
pub fn build_excerpt(description: &str, len: usize) -> String {
    let plain = strip_html(description);
    let prefix: String = plain.chars().take(len).collect();
    let excerpt = format!("{}...", prefix.trim_end());
    cap_chars(&excerpt, MAX_STORED_CHARS)
}

/// Media element, else an image enclosure, else `default`.
pub fn resolve_image(entry: &FeedEntry, default: &str) -> String {
    if let Some(url) = &entry.media_url {
        return url.clone();
    }
    entry
        .enclosure
        .as_ref()
        .filter(|e| {
            e.mime
                .as_deref()
                .is_some_and(|m| m.trim().to_ascii_lowercase().starts_with("image/"))
        })
        .map(|e| e.url.clone())
        .unwrap_or_else(|| default.to_string())
}

/// Tag form of a source name: lower-cased, whitespace runs become `-`.
pub fn source_tag(source_name: &str) -> String {
    RE_WS
        .replace_all(source_name.trim(), "-")
        .to_lowercase()
}

pub fn article_tags(source_name: &str) -> Vec<String> {
    vec!["rss".to_string(), source_tag(source_name)]
}

pub fn cap_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}
