//! Validation and canonicalization of raw feed entries.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use thiserror::Error;

use super::extract::RawEntry;

static IMG_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("img").expect("static selector"));

/// Why an entry was rejected instead of normalized.
///
/// Rejections are entry-local: the pipeline logs them at warning level and
/// moves on to the next entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("entry has no title")]
    MissingTitle,
    #[error("entry has no link")]
    MissingLink,
    #[error("entry has no published date")]
    MissingDate,
}

/// A validated entry ready for classification and persistence.
#[derive(Debug, Clone)]
pub struct NormalizedEntry {
    pub title: String,
    pub link: String,
    /// None when the source date string failed to parse
    pub published: Option<DateTime<Utc>>,
    /// None when no image could be extracted; the storage layer substitutes
    /// the placeholder sentinel
    pub image: Option<String>,
}

/// Validate a raw entry and canonicalize its fields.
///
/// Title, link and the raw published-date string are required; a date that is
/// present but unparsable is not an error and yields `published: None`. When
/// no image was extracted directly, the first `img[src]` of the entry's HTML
/// content is used instead.
pub fn normalize(raw: RawEntry) -> Result<NormalizedEntry, Rejection> {
    let title = non_blank(raw.title).ok_or(Rejection::MissingTitle)?;
    let link = non_blank(raw.link).ok_or(Rejection::MissingLink)?;
    let published_raw = non_blank(raw.published).ok_or(Rejection::MissingDate)?;

    let image = raw
        .image
        .or_else(|| raw.content_html.as_deref().and_then(first_image_src));

    Ok(NormalizedEntry {
        title,
        link,
        published: parse_timestamp(&published_raw),
        image,
    })
}

/// Best-effort timestamp parsing. RSS dates are RFC 2822, Atom dates are
/// RFC 3339, and real-world feeds serve a few sloppy naive variants; anything
/// unrecognized becomes `None` rather than an error.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
    }

    None
}

/// `src` of the first `img` element in an HTML fragment.
fn first_image_src(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    document
        .select(&IMG_SELECTOR)
        .next()?
        .value()
        .attr("src")
        .map(str::to_string)
}

fn non_blank(value: Option<String>) -> Option<String> {
    let trimmed = value?.trim().to_string();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}
