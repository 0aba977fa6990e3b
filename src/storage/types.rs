use serde::Serialize;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Database-specific errors surfaced at open time.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// Generic database error
    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

// ============================================================================
// Data Structures
// ============================================================================

/// A publisher row. Created lazily on the first ingestion run that names it;
/// `language` is fixed at creation and never rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Publisher {
    pub id: i64,
    pub name: String,
    pub language: String,
}

/// A stored article row. `link` is globally unique: it is the identity of an
/// article across ingestion runs. Timestamps are epoch seconds;
/// `published_date` is null when the source date failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Article {
    pub id: i64,
    pub publisher_id: i64,
    pub title: String,
    pub link: String,
    pub published_date: Option<i64>,
    pub main_image: String,
    pub categories: String,
    pub fetched_at: i64,
}

/// Fields for an article about to be inserted. The placeholder image
/// sentinel has already been substituted by the pipeline at this point.
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub title: String,
    pub link: String,
    pub published_date: Option<i64>,
    pub main_image: String,
    pub categories: String,
}
