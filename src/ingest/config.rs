// src/ingest/config.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::conflict::ConflictOverride;
use crate::ingest::types::{Category, FeedSource};

pub const ENV_CONFIG_PATH: &str = "INGEST_CONFIG_PATH";
pub const ENV_SOURCES_PATH: &str = "INGEST_SOURCES_PATH";

const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Pipeline settings. Every field has a default, so a partial file works.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub fetch_timeout_secs: u64,
    pub max_concurrent_sources: usize,
    pub strategies: Vec<String>,
    pub rss2json_endpoint: String,
    pub allorigins_endpoint: String,
    pub default_image_url: String,
    pub excerpt_len: usize,
    pub conflict_override: bool,
    pub conflict_positive_factor: f64,
    pub conflict_negative_factor: f64,
    pub interval_secs: u64,
    pub database_url: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        let conflict = ConflictOverride::default();
        Self {
            fetch_timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_concurrent_sources: 4,
            strategies: vec!["rss2json".into(), "allorigins".into(), "direct".into()],
            rss2json_endpoint: "https://api.rss2json.com/v1/api.json".into(),
            allorigins_endpoint: "https://api.allorigins.win/get".into(),
            default_image_url: "/images/article-placeholder.png".into(),
            excerpt_len: 150,
            conflict_override: true,
            conflict_positive_factor: conflict.positive_factor,
            conflict_negative_factor: conflict.negative_factor,
            interval_secs: 1800,
            database_url: "sqlite:data/articles.db?mode=rwc".into(),
        }
    }
}

impl IngestConfig {
    /// Replace out-of-range values instead of failing the whole load.
    pub fn clamped(mut self) -> Self {
        let d = Self::default();
        if self.fetch_timeout_secs == 0 {
            self.fetch_timeout_secs = d.fetch_timeout_secs;
        }
        self.max_concurrent_sources = self.max_concurrent_sources.max(1);
        self.strategies = clean_list(self.strategies);
        if self.strategies.is_empty() {
            self.strategies = d.strategies;
        }
        if self.excerpt_len == 0 {
            self.excerpt_len = d.excerpt_len;
        }
        if !self.conflict_positive_factor.is_finite() || self.conflict_positive_factor < 0.0 {
            self.conflict_positive_factor = d.conflict_positive_factor;
        }
        if !self.conflict_negative_factor.is_finite() || self.conflict_negative_factor < 0.0 {
            self.conflict_negative_factor = d.conflict_negative_factor;
        }
        if self.default_image_url.trim().is_empty() {
            self.default_image_url = d.default_image_url;
        }
        self
    }

    /// Conflict adjustment to install on the ingest-time classifier, if enabled.
    pub fn conflict(&self) -> Option<ConflictOverride> {
        self.conflict_override.then(|| ConflictOverride {
            positive_factor: self.conflict_positive_factor,
            negative_factor: self.conflict_negative_factor,
        })
    }
}

/// Load pipeline settings from an explicit path (TOML or JSON).
pub fn load_config_from(path: &Path) -> Result<IngestConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading ingest config from {}", path.display()))?;
    let cfg: IngestConfig = match ext_of(path).as_str() {
        "json" => serde_json::from_str(&content)?,
        _ => toml::from_str(&content)?,
    };
    Ok(cfg.clamped())
}

/// Load settings using env var + fallbacks:
/// 1) $INGEST_CONFIG_PATH
/// 2) config/ingest.toml
/// 3) config/ingest.json
/// 4) built-in defaults
pub fn load_config_default() -> Result<IngestConfig> {
    match resolve(ENV_CONFIG_PATH, "config/ingest")? {
        Some(p) => load_config_from(&p),
        None => Ok(IngestConfig::default()),
    }
}

/// Load the feed list from an explicit path. TOML uses `[[sources]]`
/// tables; JSON is either a bare array or `{"sources": [...]}`.
pub fn load_sources_from(path: &Path) -> Result<Vec<FeedSource>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading sources from {}", path.display()))?;
    parse_sources(&content, ext_of(path).as_str())
}

/// Same lookup order as [`load_config_default`], falling back to
/// [`default_sources`].
pub fn load_sources_default() -> Result<Vec<FeedSource>> {
    match resolve(ENV_SOURCES_PATH, "config/sources")? {
        Some(p) => load_sources_from(&p),
        None => Ok(default_sources()),
    }
}

/// Feeds seeded into an empty source directory.
pub fn default_sources() -> Vec<FeedSource> {
    [
        ("Al Jazeera", "https://www.aljazeera.com/xml/rss/all.xml"),
        (
            "BBC Middle East",
            "https://feeds.bbci.co.uk/news/world/middle_east/rss.xml",
        ),
        (
            "Reuters Middle East",
            "https://www.reutersagency.com/feed/?taxonomy=best-regions&post_type=best&best-regions=middle-east",
        ),
        ("Al Arabiya", "https://english.alarabiya.net/tools/rss"),
    ]
    .into_iter()
    .map(|(name, url)| FeedSource::new(name, url, Category::News))
    .collect()
}

fn resolve(env_key: &str, stem: &str) -> Result<Option<PathBuf>> {
    if let Ok(p) = std::env::var(env_key) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return Ok(Some(pb));
        } else {
            return Err(anyhow!("{env_key} points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from(format!("{stem}.toml"));
    if toml_p.exists() {
        return Ok(Some(toml_p));
    }
    let json_p = PathBuf::from(format!("{stem}.json"));
    if json_p.exists() {
        return Ok(Some(json_p));
    }
    Ok(None)
}

fn ext_of(path: &Path) -> String {
    path.extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase()
}

fn parse_sources(s: &str, hint_ext: &str) -> Result<Vec<FeedSource>> {
    let try_toml = hint_ext == "toml" || s.contains("[[sources]]");
    if try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    if let Ok(v) = parse_json(s) {
        return Ok(v);
    }
    if !try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    Err(anyhow!("unsupported sources format"))
}

#[derive(Deserialize)]
struct SourcesDoc {
    sources: Vec<FeedSource>,
}

fn parse_toml(s: &str) -> Result<Vec<FeedSource>> {
    let v: SourcesDoc = toml::from_str(s)?;
    Ok(clean_sources(v.sources))
}

fn parse_json(s: &str) -> Result<Vec<FeedSource>> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum JsonSources {
        List(Vec<FeedSource>),
        Doc(SourcesDoc),
    }
    let v = match serde_json::from_str(s)? {
        JsonSources::List(v) => v,
        JsonSources::Doc(d) => d.sources,
    };
    Ok(clean_sources(v))
}

/// Trim names and URLs, drop blanks, keep the first source per URL.
fn clean_sources(items: Vec<FeedSource>) -> Vec<FeedSource> {
    use std::collections::HashSet;
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(items.len());
    for mut it in items {
        it.name = it.name.trim().to_string();
        it.url = it.url.trim().to_string();
        if it.name.is_empty() || it.url.is_empty() || !seen.insert(it.url.clone()) {
            continue;
        }
        out.push(it);
    }
    out
}

/// Trim and drop blank entries, preserving order and the first occurrence.
fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for it in items {
        let t = it.trim().to_ascii_lowercase();
        if !t.is_empty() && !out.contains(&t) {
            out.push(t);
        }
    }
    out
}
