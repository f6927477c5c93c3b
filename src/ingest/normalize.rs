// src/ingest/normalize.rs
//! Shared field cleaning and the raw → canonical mapping every adapter goes through.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::OnceCell;
use regex::Regex;
use time::{format_description::well_known::Rfc2822, OffsetDateTime, UtcOffset};

use crate::ingest::error::EntryError;
use crate::ingest::types::{CanonicalJob, Category, SourceBatch};

pub const PLACEHOLDER_TITLE: &str = "Untitled";
pub const PLACEHOLDER_COMPANY: &str = "Unknown";
pub const PLACEHOLDER_LOCATION: &str = "Remote";

pub const DESCRIPTION_MAX_CHARS: usize = 1000;

/// Normalize display text: decode entities, strip tags, fold whitespace, trim.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));
    out = re_tags.replace_all(&out, " ").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace (covers NBSP too)
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").expect("ws regex"));
    out = re_ws.replace_all(&out, " ").to_string();
    out.trim().to_string()
}

pub fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        s.chars().take(max).collect()
    } else {
        s.to_string()
    }
}

/// First candidate that is present and not blank, trimmed.
pub fn pick<'a, I>(candidates: I) -> Option<String>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    candidates
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// Native ids arrive as strings or numbers depending on the provider.
pub fn id_string(v: Option<&serde_json::Value>) -> Option<String> {
    match v? {
        serde_json::Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn from_unix(secs: i64) -> Option<DateTime<Utc>> {
    if secs <= 0 {
        return None;
    }
    DateTime::from_timestamp(secs, 0)
}

fn parse_rfc2822(ts: &str) -> Option<DateTime<Utc>> {
    OffsetDateTime::parse(ts, &Rfc2822)
        .ok()
        .map(|dt| dt.to_offset(UtcOffset::UTC).unix_timestamp())
        .and_then(from_unix)
}

/// Parse the date shapes upstream APIs emit. Naive values are taken as UTC.
pub fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(dt) = parse_rfc2822(s) {
        return Some(dt);
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(n) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(n.and_utc());
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0).map(|n| n.and_utc());
    }
    s.parse::<i64>().ok().and_then(from_unix)
}

/// First candidate that parses as a date. A present but unparseable value
/// falls through to the next one.
pub fn first_date<'a, I>(candidates: I) -> Option<DateTime<Utc>>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    candidates.into_iter().flatten().find_map(parse_published)
}

pub(crate) fn short_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(16);
    for b in digest.iter().take(8) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

fn validate_url(raw: &str) -> Result<String, EntryError> {
    let parsed = url::Url::parse(raw).map_err(|_| EntryError::InvalidUrl(raw.to_string()))?;
    let ok_scheme = matches!(parsed.scheme(), "http" | "https");
    if !ok_scheme || parsed.host_str().is_none() {
        return Err(EntryError::InvalidUrl(raw.to_string()));
    }
    Ok(raw.to_string())
}

/// Provider fields after lookup, before any invariant is enforced.
#[derive(Debug, Clone, Default)]
pub struct RawJob {
    pub native_id: Option<String>,
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub published: Option<DateTime<Utc>>,
}

fn clean(v: Option<String>) -> Option<String> {
    v.map(|s| normalize_text(&s)).filter(|s| !s.is_empty())
}

/// Enforce the canonical invariants. Only a missing/unusable URL rejects the entry;
/// other absent fields get placeholders, and an absent date gets `fetched_at`.
pub fn canonicalize(
    source: &str,
    raw: RawJob,
    fetched_at: DateTime<Utc>,
) -> Result<CanonicalJob, EntryError> {
    let url = raw
        .url
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(EntryError::MissingUrl)?;
    let url = validate_url(url)?;

    let native_id = raw
        .native_id
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| short_hash(&url));

    Ok(CanonicalJob {
        id: format!("{source}:{native_id}"),
        title: clean(raw.title).unwrap_or_else(|| PLACEHOLDER_TITLE.to_string()),
        company: clean(raw.company).unwrap_or_else(|| PLACEHOLDER_COMPANY.to_string()),
        location: clean(raw.location).unwrap_or_else(|| PLACEHOLDER_LOCATION.to_string()),
        url,
        category: Category::Other,
        source: source.to_string(),
        published: raw.published.unwrap_or(fetched_at),
        description: clean(raw.description).map(|d| truncate_chars(&d, DESCRIPTION_MAX_CHARS)),
    })
}

/// Accumulates one adapter's records, counting entries that had to be dropped.
pub struct BatchCollector {
    source: &'static str,
    fetched_at: DateTime<Utc>,
    batch: SourceBatch,
}

impl BatchCollector {
    pub fn new(source: &'static str, fetched_at: DateTime<Utc>) -> Self {
        Self {
            source,
            fetched_at,
            batch: SourceBatch::default(),
        }
    }

    pub fn push(&mut self, raw: RawJob) {
        match canonicalize(self.source, raw, self.fetched_at) {
            Ok(job) => self.batch.jobs.push(job),
            Err(e) => self.reject(e),
        }
    }

    pub fn reject(&mut self, err: EntryError) {
        self.batch.dropped += 1;
        tracing::debug!(target: "ingest", source = self.source, error = %err, "dropped upstream entry");
    }

    pub fn finish(self) -> SourceBatch {
        self.batch
    }
}
