use async_trait::async_trait;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::{InsertResult, NewBookmark};

/// Bookmark data ready for insertion, defaults already applied
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedBookmark {
    pub id: String,
    pub url: String,
    pub tags: Option<Vec<String>>,
    pub collection: Option<String>,
    pub user_id: Option<String>,
}

/// Database-specific adapter for bookmark INSERT operations
#[async_trait]
pub trait BookmarkInserter: Send + Sync {
    /// Execute the insert and return the number of rows written
    async fn execute_bookmark_insert(&self, data: &PreparedBookmark) -> AppResult<u64>;
}

/// Shared business logic for bookmark INSERT operations
pub struct BookmarkInsertProcessor;

impl BookmarkInsertProcessor {
    /// Apply entity defaults and required-field checks
    ///
    /// - `url` must be present and non-blank
    /// - `id` is generated when absent; a supplied id is kept as-is
    /// - `tags` are passed through untouched (no dedup, no sort)
    pub fn prepare_bookmark_for_insert(data: &NewBookmark) -> AppResult<PreparedBookmark> {
        let url = match data.url.as_deref() {
            Some(url) if !url.trim().is_empty() => url.to_string(),
            _ => return Err(AppError::constraint("Bookmark url is required")),
        };

        let id = match data.id.as_deref() {
            Some(id) if id.trim().is_empty() => {
                return Err(AppError::constraint("Bookmark id cannot be empty"))
            }
            Some(id) => id.to_string(),
            None => crate::utils::generate_id(),
        };

        Ok(PreparedBookmark {
            id,
            url,
            tags: data.tags.clone(),
            collection: data.collection.clone(),
            user_id: data.user_id.clone(),
        })
    }
}

/// Unified bookmark INSERT operations using the adapter pattern
pub struct UnifiedBookmarkInsertOps<T: BookmarkInserter> {
    inserter: T,
}

impl<T: BookmarkInserter> UnifiedBookmarkInsertOps<T> {
    pub fn new(inserter: T) -> Self {
        Self { inserter }
    }

    /// Create a bookmark using shared logic and database-specific execution
    pub async fn create_bookmark(&self, data: &NewBookmark) -> AppResult<InsertResult> {
        let prepared = BookmarkInsertProcessor::prepare_bookmark_for_insert(data)?;

        let rows_affected = self.inserter.execute_bookmark_insert(&prepared).await?;
        debug!(id = %prepared.id, rows_affected, "Bookmark inserted");

        Ok(InsertResult {
            id: prepared.id,
            rows_affected,
        })
    }
}
