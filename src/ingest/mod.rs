//! The feed ingestion pipeline.
//!
//! One feed flows fetch → parse → detect format → extract → normalize →
//! classify → insert-if-new, in document order. Entry-level problems skip
//! only that entry; feed-level problems abort only that feed. [`ingest_all`]
//! fans the pipeline out across sources with bounded concurrency and keeps
//! their failure domains isolated.

pub mod classify;
pub mod extract;
pub mod fetcher;
pub mod normalize;
pub mod parser;

use futures::stream::{self, StreamExt};
use thiserror::Error;

use crate::config::{default_language, FeedSource};
use crate::storage::{Database, NewArticle};

pub use fetcher::{FetchError, FETCH_TIMEOUT};
pub use normalize::Rejection;
pub use parser::{FeedKind, ParseError};

/// Sentinel stored when no image could be extracted for an article.
pub const PLACEHOLDER_IMAGE: &str = "placeholder.jpg";

/// Maximum number of feeds fetched simultaneously by [`ingest_all`].
const MAX_CONCURRENT_FEEDS: usize = 4;

/// Feed-level failures. Any of these aborts the current feed's ingestion;
/// none of them affects sibling feeds.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Transport failure: non-success status, network error, or timeout
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),
    /// Malformed XML or a document that is neither RSS nor Atom
    #[error("Unreadable feed: {0}")]
    Parse(#[from] ParseError),
    /// Database operation failed outside the per-entry insert path
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Per-feed ingestion counters, for observability.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
    /// Entries found in the document
    pub entries: usize,
    /// New articles created this run
    pub inserted: usize,
    /// Entries whose link already had a stored article (left untouched)
    pub duplicates: usize,
    /// Entries rejected by validation or failed at persistence
    pub skipped: usize,
}

/// Outcome of one source inside an [`ingest_all`] run.
pub struct SourceOutcome {
    pub source: FeedSource,
    pub result: Result<IngestReport, IngestError>,
}

/// Ingest a single feed end to end.
///
/// The publisher row is created up front (with its configured language) so
/// that even a feed that fails to fetch registers who it belonged to. The
/// article insert is keyed on `link`: re-running ingestion with identical
/// content inserts nothing and updates nothing — the first write wins.
///
/// # Errors
///
/// Returns [`IngestError`] for feed-fatal conditions only. Incomplete
/// entries, unparsable dates, and per-entry persistence failures are logged
/// and counted in the report instead.
pub async fn ingest_feed(
    db: &Database,
    client: &reqwest::Client,
    source: &FeedSource,
) -> Result<IngestReport, IngestError> {
    tracing::info!(feed = %source.url, publisher = %source.publisher, "Starting ingestion");

    let language = source
        .language
        .as_deref()
        .unwrap_or_else(|| default_language(&source.publisher));
    let publisher = db
        .find_or_create_publisher(&source.publisher, language)
        .await
        .map_err(|e| IngestError::Storage(e.to_string()))?;

    let bytes = fetcher::fetch_feed(client, &source.url).await?;

    let root = parser::parse_document(&bytes)?;
    let kind = parser::detect_kind(&root)?;
    let raw_entries = extract::extract_entries(&root, kind, &source.url);
    tracing::info!(
        feed = %source.url,
        format = ?kind,
        entries = raw_entries.len(),
        "Feed parsed"
    );

    let mut report = IngestReport {
        entries: raw_entries.len(),
        ..Default::default()
    };

    for raw in raw_entries {
        let entry = match normalize::normalize(raw) {
            Ok(entry) => entry,
            Err(rejection) => {
                tracing::warn!(feed = %source.url, reason = %rejection, "Skipping incomplete entry");
                report.skipped += 1;
                continue;
            }
        };

        let category = classify::classify(&entry.title, &publisher.name);
        let article = NewArticle {
            title: entry.title,
            link: entry.link,
            published_date: entry.published.map(|dt| dt.timestamp()),
            main_image: entry
                .image
                .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
            categories: category.to_string(),
        };

        match db.insert_article_if_new(publisher.id, &article).await {
            Ok(true) => report.inserted += 1,
            Ok(false) => {
                tracing::debug!(link = %article.link, "Article already stored");
                report.duplicates += 1;
            }
            Err(e) => {
                tracing::error!(link = %article.link, error = %e, "Failed to store article");
                report.skipped += 1;
            }
        }
    }

    // A publisher with nothing stored after a run usually means the feed
    // changed shape; worth surfacing even though nothing failed outright.
    match db.count_articles_for_publisher(publisher.id).await {
        Ok(0) => tracing::error!(
            feed = %source.url,
            publisher = %publisher.name,
            "No articles stored for publisher after run"
        ),
        Ok(_) => {}
        Err(e) => tracing::warn!(error = %e, "Failed to count publisher articles"),
    }

    tracing::info!(
        feed = %source.url,
        inserted = report.inserted,
        duplicates = report.duplicates,
        skipped = report.skipped,
        "Ingestion finished"
    );

    Ok(report)
}

/// Ingest every configured source, isolating failures per source.
///
/// Sources are processed with bounded concurrency; a failing source is
/// logged and reported in its [`SourceOutcome`] without stopping the others.
/// Results are returned in completion order, not input order.
pub async fn ingest_all(
    db: Database,
    client: reqwest::Client,
    sources: Vec<FeedSource>,
) -> Vec<SourceOutcome> {
    if sources.is_empty() {
        tracing::warn!("No feed sources configured");
        return Vec::new();
    }

    stream::iter(sources.into_iter())
        .map(|source| {
            let db = db.clone();
            let client = client.clone();

            async move {
                let result = ingest_feed(&db, &client, &source).await;
                if let Err(e) = &result {
                    tracing::error!(
                        feed = %source.url,
                        publisher = %source.publisher,
                        error = %e,
                        "Feed ingestion failed"
                    );
                }
                SourceOutcome { source, result }
            }
        })
        .buffer_unordered(MAX_CONCURRENT_FEEDS)
        .collect()
        .await
}
