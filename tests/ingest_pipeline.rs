//! End-to-end pipeline tests: mock HTTP feed in, SQLite rows out.
//!
//! Each test creates its own in-memory database and wiremock server for
//! isolation. These exercise the full fetch → parse → extract → normalize →
//! classify → persist path, including the idempotence and failure-isolation
//! guarantees.

use pretty_assertions::assert_eq;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use newsdesk::config::FeedSource;
use newsdesk::ingest::{ingest_all, ingest_feed, IngestError, PLACEHOLDER_IMAGE};
use newsdesk::storage::Database;

const RSS_ONE_ITEM: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <title>Test Channel</title>
    <item>
        <title>Local Market Opens</title>
        <link>http://x.test/a</link>
        <pubDate>Mon, 01 Jan 2024 00:00:00 GMT</pubDate>
    </item>
</channel></rss>"#;

async fn test_db() -> Database {
    Database::open(":memory:").await.unwrap()
}

fn source(url: &str, publisher: &str) -> FeedSource {
    FeedSource {
        url: url.to_string(),
        publisher: publisher.to_string(),
        language: None,
    }
}

async fn serve(body: &str) -> MockServer {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("Content-Type", "application/xml"),
        )
        .mount(&mock_server)
        .await;
    mock_server
}

// ============================================================================
// RSS end-to-end
// ============================================================================

#[tokio::test]
async fn test_rss_item_becomes_article_with_defaults() {
    let server = serve(RSS_ONE_ITEM).await;
    let db = test_db().await;
    let client = reqwest::Client::new();

    let report = ingest_feed(&db, &client, &source(&format!("{}/feed", server.uri()), "SAYS"))
        .await
        .unwrap();
    assert_eq!(report.entries, 1);
    assert_eq!(report.inserted, 1);
    assert_eq!(report.skipped, 0);

    let articles = db.list_articles(None).await.unwrap();
    assert_eq!(articles.len(), 1);
    let article = &articles[0];
    assert_eq!(article.title, "Local Market Opens");
    assert_eq!(article.link, "http://x.test/a");
    assert_eq!(article.main_image, PLACEHOLDER_IMAGE);
    assert_eq!(article.categories, "News");
    // Mon, 01 Jan 2024 00:00:00 GMT
    assert_eq!(article.published_date, Some(1704067200));
}

#[tokio::test]
async fn test_publisher_created_with_default_language() {
    let server = serve(RSS_ONE_ITEM).await;
    let db = test_db().await;
    let client = reqwest::Client::new();

    ingest_feed(&db, &client, &source(&format!("{}/feed", server.uri()), "SAYS"))
        .await
        .unwrap();

    let publishers = db.list_publishers().await.unwrap();
    assert_eq!(publishers.len(), 1);
    assert_eq!(publishers[0].name, "SAYS");
    assert_eq!(publishers[0].language, "EN");
}

#[tokio::test]
async fn test_harian_metro_language_override() {
    let server = serve(RSS_ONE_ITEM).await;
    let db = test_db().await;
    let client = reqwest::Client::new();

    ingest_feed(
        &db,
        &client,
        &source(&format!("{}/feed", server.uri()), "Harian Metro"),
    )
    .await
    .unwrap();

    let publishers = db.list_publishers().await.unwrap();
    assert_eq!(publishers[0].language, "BM");
}

// ============================================================================
// Idempotence and first-write-wins
// ============================================================================

#[tokio::test]
async fn test_reingestion_is_idempotent() {
    let server = serve(RSS_ONE_ITEM).await;
    let db = test_db().await;
    let client = reqwest::Client::new();
    let src = source(&format!("{}/feed", server.uri()), "SAYS");

    let first = ingest_feed(&db, &client, &src).await.unwrap();
    let second = ingest_feed(&db, &client, &src).await.unwrap();

    assert_eq!(first.inserted, 1);
    assert_eq!(second.inserted, 0);
    assert_eq!(second.duplicates, 1);
    assert_eq!(db.list_articles(None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_same_link_different_title_keeps_first_write() {
    let db = test_db().await;
    let client = reqwest::Client::new();

    let server_a = serve(RSS_ONE_ITEM).await;
    ingest_feed(&db, &client, &source(&format!("{}/feed", server_a.uri()), "SAYS"))
        .await
        .unwrap();

    let changed = RSS_ONE_ITEM.replace("Local Market Opens", "Updated Headline");
    let server_b = serve(&changed).await;
    let report = ingest_feed(&db, &client, &source(&format!("{}/feed", server_b.uri()), "SAYS"))
        .await
        .unwrap();

    assert_eq!(report.inserted, 0);
    assert_eq!(report.duplicates, 1);

    let articles = db.list_articles(None).await.unwrap();
    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0].title, "Local Market Opens");
}

// ============================================================================
// Entry-level skip isolation
// ============================================================================

#[tokio::test]
async fn test_incomplete_entries_skipped_without_stopping_the_feed() {
    let body = r#"<rss><channel>
        <item><title>No link here</title><pubDate>Mon, 01 Jan 2024 00:00:00 GMT</pubDate></item>
        <item><link>http://x.test/no-title</link><pubDate>Mon, 01 Jan 2024 00:00:00 GMT</pubDate></item>
        <item>
            <title>Complete</title>
            <link>http://x.test/ok</link>
            <pubDate>Tue, 02 Jan 2024 00:00:00 GMT</pubDate>
        </item>
    </channel></rss>"#;
    let server = serve(body).await;
    let db = test_db().await;
    let client = reqwest::Client::new();

    let report = ingest_feed(&db, &client, &source(&format!("{}/feed", server.uri()), "SAYS"))
        .await
        .unwrap();

    assert_eq!(report.entries, 3);
    assert_eq!(report.skipped, 2);
    assert_eq!(report.inserted, 1);

    let articles = db.list_articles(None).await.unwrap();
    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0].link, "http://x.test/ok");
}

#[tokio::test]
async fn test_unparsable_pubdate_stores_null_published_date() {
    let body = r#"<rss><channel><item>
        <title>Odd date</title>
        <link>http://x.test/odd</link>
        <pubDate>sometime soon</pubDate>
    </item></channel></rss>"#;
    let server = serve(body).await;
    let db = test_db().await;
    let client = reqwest::Client::new();

    let report = ingest_feed(&db, &client, &source(&format!("{}/feed", server.uri()), "SAYS"))
        .await
        .unwrap();
    assert_eq!(report.inserted, 1);

    let articles = db.list_articles(None).await.unwrap();
    assert_eq!(articles[0].published_date, None);
}

// ============================================================================
// Atom path
// ============================================================================

#[tokio::test]
async fn test_atom_relative_link_resolved_and_image_pulled_from_content() {
    let body = r#"<feed xmlns="http://www.w3.org/2005/Atom">
        <title>Blog</title>
        <entry>
            <title>Nasi Lemak Review</title>
            <link rel="alternate" href="/posts/nasi-lemak"/>
            <published>2024-03-05T10:00:00Z</published>
            <content type="html">&lt;p&gt;so good&lt;/p&gt;&lt;img src="http://img.test/nl.jpg"&gt;</content>
        </entry>
    </feed>"#;
    let server = serve(body).await;
    let db = test_db().await;
    let client = reqwest::Client::new();
    let feed_url = format!("{}/feed", server.uri());

    let report = ingest_feed(&db, &client, &source(&feed_url, "Eat Drink KL"))
        .await
        .unwrap();
    assert_eq!(report.inserted, 1);

    let articles = db.list_articles(None).await.unwrap();
    let article = &articles[0];
    assert_eq!(article.link, format!("{}/posts/nasi-lemak", server.uri()));
    assert_eq!(article.main_image, "http://img.test/nl.jpg");
    // Publisher override: everything from Eat Drink KL is Food
    assert_eq!(article.categories, "Food");
}

// ============================================================================
// Feed-level failures
// ============================================================================

#[tokio::test]
async fn test_http_500_is_a_transport_failure_before_parsing() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let db = test_db().await;
    let client = reqwest::Client::new();
    let result = ingest_feed(
        &db,
        &client,
        &source(&format!("{}/feed", mock_server.uri()), "SAYS"),
    )
    .await;

    assert!(matches!(result.unwrap_err(), IngestError::Fetch(_)));
    assert_eq!(db.list_articles(None).await.unwrap().len(), 0);
}

#[tokio::test]
async fn test_unknown_format_creates_nothing_and_spares_the_caller() {
    let server = serve("<html><body>not a feed</body></html>").await;
    let db = test_db().await;
    let client = reqwest::Client::new();
    let src = source(&format!("{}/feed", server.uri()), "SAYS");

    // Direct invocation reports the error...
    let result = ingest_feed(&db, &client, &src).await;
    assert!(matches!(result.unwrap_err(), IngestError::Parse(_)));

    // ...but the orchestrator absorbs it without panicking
    let outcomes = ingest_all(db.clone(), client, vec![src]).await;
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].result.is_err());
    assert_eq!(db.list_articles(None).await.unwrap().len(), 0);
}

#[tokio::test]
async fn test_one_bad_source_does_not_stop_the_others() {
    let good = serve(RSS_ONE_ITEM).await;
    let bad = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&bad)
        .await;

    let db = test_db().await;
    let client = reqwest::Client::new();
    let sources = vec![
        source(&format!("{}/feed", bad.uri()), "Broken Feed"),
        source(&format!("{}/feed", good.uri()), "SAYS"),
    ];

    let outcomes = ingest_all(db.clone(), client, sources).await;
    assert_eq!(outcomes.len(), 2);

    let failures = outcomes.iter().filter(|o| o.result.is_err()).count();
    assert_eq!(failures, 1);
    assert_eq!(db.list_articles(None).await.unwrap().len(), 1);
}

// ============================================================================
// Read side
// ============================================================================

#[tokio::test]
async fn test_language_filter_follows_publisher() {
    let db = test_db().await;
    let client = reqwest::Client::new();

    let server_en = serve(RSS_ONE_ITEM).await;
    ingest_feed(&db, &client, &source(&format!("{}/feed", server_en.uri()), "SAYS"))
        .await
        .unwrap();

    let bm_body = RSS_ONE_ITEM.replace("http://x.test/a", "http://x.test/bm");
    let server_bm = serve(&bm_body).await;
    ingest_feed(
        &db,
        &client,
        &source(&format!("{}/feed", server_bm.uri()), "Harian Metro"),
    )
    .await
    .unwrap();

    assert_eq!(db.list_articles(None).await.unwrap().len(), 2);

    let bm_only = db.list_articles(Some("BM")).await.unwrap();
    assert_eq!(bm_only.len(), 1);
    assert_eq!(bm_only[0].link, "http://x.test/bm");
}
