//! Raw field extraction from parsed feed documents.
//!
//! Extraction is deliberately permissive: every `item`/`entry` yields a
//! [`RawEntry`], with missing fields left as `None`. Rejection of incomplete
//! entries is the normalizer's job, so a feed full of broken entries still
//! gets each one looked at individually.

use url::Url;

use super::parser::{Element, FeedKind};

/// Raw, unvalidated fields pulled from one feed entry.
#[derive(Debug, Default, Clone)]
pub struct RawEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub published: Option<String>,
    pub image: Option<String>,
    /// Raw HTML body of an Atom `content` element, kept for image extraction
    pub content_html: Option<String>,
}

/// Extract every entry of the document under its format-specific rules.
///
/// `feed_url` is the URL the document was fetched from; Atom permits relative
/// `href` values, which are resolved against it.
pub fn extract_entries(root: &Element, kind: FeedKind, feed_url: &str) -> Vec<RawEntry> {
    match kind {
        FeedKind::Rss => root.descendants("item").into_iter().map(rss_item).collect(),
        FeedKind::Atom => root
            .descendants("entry")
            .into_iter()
            .map(|entry| atom_entry(entry, feed_url))
            .collect(),
    }
}

/// RSS 2.0: `title`, `link` and `pubDate` are plain text children; the image
/// rides in a media extension (`media:thumbnail` or `media:content`), whose
/// prefix has already been stripped by the parser.
fn rss_item(item: &Element) -> RawEntry {
    RawEntry {
        title: child_text(item, "title"),
        link: child_text(item, "link"),
        published: child_text(item, "pubDate"),
        image: media_url(item, "thumbnail").or_else(|| media_url(item, "content")),
        content_html: None,
    }
}

/// Atom 1.0: the link is the `href` of the `rel="alternate"` link element,
/// resolved against the feed URL when relative; `published` falls back to
/// `updated`; the `content` body is carried along for image extraction.
fn atom_entry(entry: &Element, feed_url: &str) -> RawEntry {
    let link = entry
        .descendants("link")
        .into_iter()
        .find(|l| l.attr("rel") == Some("alternate"))
        .and_then(|l| l.attr("href"))
        .and_then(|href| resolve_link(href, feed_url));

    RawEntry {
        title: child_text(entry, "title"),
        link,
        published: child_text(entry, "published").or_else(|| child_text(entry, "updated")),
        image: None,
        content_html: child_text(entry, "content"),
    }
}

/// Non-empty trimmed text of the first matching descendant.
fn child_text(parent: &Element, name: &str) -> Option<String> {
    let text = parent.first(name)?.text();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// `url` attribute of the first matching media element that carries one.
/// Elements without a `url` attribute are skipped so that e.g. a textual
/// `<content>` child cannot shadow a later `<media:content url=...>`.
fn media_url(item: &Element, name: &str) -> Option<String> {
    item.descendants(name)
        .into_iter()
        .find_map(|el| el.attr("url"))
        .map(str::to_string)
}

/// Make a relative href absolute against the feed's own URL. Absolute hrefs
/// pass through unchanged; hrefs that cannot be resolved are dropped (the
/// normalizer then rejects the entry for its missing link).
fn resolve_link(href: &str, feed_url: &str) -> Option<String> {
    match Url::parse(href) {
        Ok(absolute) => Some(absolute.into()),
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(feed_url)
            .and_then(|base| base.join(href))
            .ok()
            .map(Into::into),
        Err(_) => None,
    }
}
