use async_trait::async_trait;
use tracing::debug;

use crate::error::AppResult;
use crate::models::WriteResult;

/// Database-specific adapter for bookmark DELETE operations
#[async_trait]
pub trait BookmarkDeleter: Send + Sync {
    /// Execute the delete and return the number of rows removed
    async fn execute_bookmark_delete(&self, id: &str) -> AppResult<u64>;
}

/// Unified bookmark DELETE operations using the adapter pattern
pub struct UnifiedBookmarkDeleteOps<T: BookmarkDeleter> {
    deleter: T,
}

impl<T: BookmarkDeleter> UnifiedBookmarkDeleteOps<T> {
    pub fn new(deleter: T) -> Self {
        Self { deleter }
    }

    /// Delete a bookmark. Deleting a missing id is not an error.
    pub async fn delete_bookmark(&self, id: &str) -> AppResult<WriteResult> {
        if id.is_empty() {
            return Ok(WriteResult::new(0));
        }

        let rows_affected = self.deleter.execute_bookmark_delete(id).await?;
        debug!(id = %id, rows_affected, "Bookmark delete executed");

        Ok(WriteResult::new(rows_affected))
    }
}
