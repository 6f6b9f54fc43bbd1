use async_trait::async_trait;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::{BookmarkPatch, WriteResult};

/// One column assignment of a bookmark UPDATE, still in logical form.
/// Each backend encodes the value for its own column type.
#[derive(Debug, Clone, PartialEq)]
pub enum BookmarkChange {
    Url(String),
    Tags(Option<Vec<String>>),
    Collection(Option<String>),
    UserId(Option<String>),
}

impl BookmarkChange {
    pub fn column(&self) -> &'static str {
        match self {
            BookmarkChange::Url(_) => "url",
            BookmarkChange::Tags(_) => "tags",
            BookmarkChange::Collection(_) => "collection",
            BookmarkChange::UserId(_) => "user_id",
        }
    }
}

/// Database-specific adapter for bookmark UPDATE operations
#[async_trait]
pub trait BookmarkUpdater: Send + Sync {
    /// Apply `changes` to the row with `id`, returning the affected row count
    async fn execute_bookmark_update(&self, id: &str, changes: &[BookmarkChange])
        -> AppResult<u64>;
}

/// Shared business logic for bookmark UPDATE operations
pub struct BookmarkUpdateProcessor;

impl BookmarkUpdateProcessor {
    /// Turn a patch into column assignments, in column declaration order.
    /// Only supplied fields produce a change.
    pub fn prepare_changes(patch: &BookmarkPatch) -> AppResult<Vec<BookmarkChange>> {
        let mut changes = Vec::new();

        if let Some(url) = &patch.url {
            if url.trim().is_empty() {
                return Err(AppError::constraint("Bookmark url cannot be empty"));
            }
            changes.push(BookmarkChange::Url(url.clone()));
        }
        if let Some(tags) = &patch.tags {
            changes.push(BookmarkChange::Tags(tags.clone()));
        }
        if let Some(collection) = &patch.collection {
            changes.push(BookmarkChange::Collection(collection.clone()));
        }
        if let Some(user_id) = &patch.user_id {
            changes.push(BookmarkChange::UserId(user_id.clone()));
        }

        Ok(changes)
    }
}

/// Unified bookmark UPDATE operations using the adapter pattern
pub struct UnifiedBookmarkUpdateOps<T: BookmarkUpdater> {
    updater: T,
}

impl<T: BookmarkUpdater> UnifiedBookmarkUpdateOps<T> {
    pub fn new(updater: T) -> Self {
        Self { updater }
    }

    /// Update a bookmark. Unknown ids and empty patches succeed with zero
    /// affected rows.
    pub async fn update_bookmark(&self, id: &str, patch: &BookmarkPatch) -> AppResult<WriteResult> {
        let changes = BookmarkUpdateProcessor::prepare_changes(patch)?;

        if changes.is_empty() || id.is_empty() {
            debug!(id = %id, "Bookmark update has nothing to apply");
            return Ok(WriteResult::new(0));
        }

        let rows_affected = self.updater.execute_bookmark_update(id, &changes).await?;
        debug!(id = %id, rows_affected, "Bookmark updated");

        Ok(WriteResult::new(rows_affected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_changes_only_supplied_fields() {
        let patch = BookmarkPatch {
            collection: Some(None),
            tags: Some(Some(vec!["a".to_string()])),
            ..BookmarkPatch::default()
        };
        let changes = BookmarkUpdateProcessor::prepare_changes(&patch).unwrap();

        assert_eq!(
            changes,
            vec![
                BookmarkChange::Tags(Some(vec!["a".to_string()])),
                BookmarkChange::Collection(None),
            ]
        );
        assert_eq!(changes[1].column(), "collection");
    }

    #[test]
    fn test_blank_url_rejected() {
        let err = BookmarkUpdateProcessor::prepare_changes(&BookmarkPatch::url("")).unwrap_err();
        assert!(err.is_constraint());
    }

    struct CountingUpdater(u64);

    #[async_trait]
    impl BookmarkUpdater for CountingUpdater {
        async fn execute_bookmark_update(
            &self,
            _id: &str,
            changes: &[BookmarkChange],
        ) -> AppResult<u64> {
            assert!(!changes.is_empty());
            Ok(self.0)
        }
    }

    #[tokio::test]
    async fn test_empty_patch_is_noop() {
        let ops = UnifiedBookmarkUpdateOps::new(CountingUpdater(1));
        let result = ops
            .update_bookmark("some-id", &BookmarkPatch::default())
            .await
            .unwrap();
        assert_eq!(result.rows_affected, 0);
    }

    #[tokio::test]
    async fn test_update_reports_adapter_row_count() {
        let ops = UnifiedBookmarkUpdateOps::new(CountingUpdater(0));
        let result = ops
            .update_bookmark("nonexistent-id", &BookmarkPatch::url("x"))
            .await
            .unwrap();
        assert_eq!(result.rows_affected, 0);
    }
}
