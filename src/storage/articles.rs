use anyhow::Result;

use super::schema::Database;
use super::types::{Article, NewArticle};

const ARTICLE_COLUMNS: &str =
    "a.id, a.publisher_id, a.title, a.link, a.published_date, a.main_image, a.categories, a.fetched_at";

impl Database {
    // ========================================================================
    // Article Operations
    // ========================================================================

    /// Insert an article unless one with the same link already exists.
    ///
    /// Returns `true` when a new row was created. An existing row is never
    /// touched — the first write wins, and revisiting a link is a no-op
    /// success. The UNIQUE constraint on `link` makes this atomic under
    /// concurrent ingestion runs.
    pub async fn insert_article_if_new(
        &self,
        publisher_id: i64,
        article: &NewArticle,
    ) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            INSERT INTO articles
                (publisher_id, title, link, published_date, main_image, categories, fetched_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(link) DO NOTHING
        "#,
        )
        .bind(publisher_id)
        .bind(&article.title)
        .bind(&article.link)
        .bind(article.published_date)
        .bind(&article.main_image)
        .bind(&article.categories)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Get all articles, newest first, optionally filtered by the owning
    /// publisher's language.
    pub async fn list_articles(&self, language: Option<&str>) -> Result<Vec<Article>> {
        let articles = match language {
            Some(language) => {
                sqlx::query_as::<_, Article>(&format!(
                    r#"
                    SELECT {ARTICLE_COLUMNS}
                    FROM articles a
                    JOIN publishers p ON p.id = a.publisher_id
                    WHERE p.language = ?
                    ORDER BY a.published_date DESC, a.fetched_at DESC
                "#
                ))
                .bind(language)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Article>(&format!(
                    r#"
                    SELECT {ARTICLE_COLUMNS}
                    FROM articles a
                    ORDER BY a.published_date DESC, a.fetched_at DESC
                "#
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(articles)
    }

    /// Look up a single article by id.
    pub async fn get_article(&self, id: i64) -> Result<Option<Article>> {
        let article = sqlx::query_as::<_, Article>(&format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles a WHERE a.id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(article)
    }

    /// Number of stored articles belonging to a publisher.
    pub async fn count_articles_for_publisher(&self, publisher_id: i64) -> Result<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM articles WHERE publisher_id = ?")
                .bind(publisher_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}
