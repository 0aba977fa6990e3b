use anyhow::Result;

use super::schema::Database;
use super::types::Publisher;

impl Database {
    // ========================================================================
    // Publisher Operations
    // ========================================================================

    /// Find a publisher by name, creating it with the given language if it
    /// does not exist yet.
    ///
    /// Language is write-once: `ON CONFLICT DO NOTHING` means an existing
    /// row keeps whatever language it was created with, regardless of what
    /// this call passes.
    pub async fn find_or_create_publisher(
        &self,
        name: &str,
        language: &str,
    ) -> Result<Publisher> {
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO publishers (name, language, created_at)
            VALUES (?, ?, ?)
            ON CONFLICT(name) DO NOTHING
        "#,
        )
        .bind(name)
        .bind(language)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let publisher = sqlx::query_as::<_, Publisher>(
            "SELECT id, name, language FROM publishers WHERE name = ?",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(publisher)
    }

    /// Get all publishers, ordered by name.
    pub async fn list_publishers(&self) -> Result<Vec<Publisher>> {
        let publishers = sqlx::query_as::<_, Publisher>(
            "SELECT id, name, language FROM publishers ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(publishers)
    }

    /// Look up a single publisher by id.
    pub async fn get_publisher(&self, id: i64) -> Result<Option<Publisher>> {
        let publisher = sqlx::query_as::<_, Publisher>(
            "SELECT id, name, language FROM publishers WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(publisher)
    }

    /// Delete a publisher; its articles cascade.
    ///
    /// Never called by the pipeline — this is the external-admin path that
    /// the ON DELETE CASCADE exists for.
    pub async fn delete_publisher(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM publishers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
