use async_trait::async_trait;
use tracing::debug;

use crate::error::AppResult;
use crate::models::{Bookmark, Page};

/// Database-specific adapter for bookmark SELECT operations
#[async_trait]
pub trait BookmarkReader: Send + Sync {
    /// Fetch bookmarks, decoded into their logical form
    async fn fetch_bookmarks(&self, page: Option<Page>) -> AppResult<Vec<Bookmark>>;
}

/// Shared helpers for bookmark reads
pub struct BookmarkReadProcessor;

impl BookmarkReadProcessor {
    /// `LIMIT`/`OFFSET` suffix understood by SQLite, MySQL and PostgreSQL.
    /// Empty when no page is requested.
    pub fn page_clause(page: Option<Page>) -> String {
        match page {
            Some(page) => format!(" LIMIT {} OFFSET {}", page.limit, page.offset),
            None => String::new(),
        }
    }
}

/// Unified bookmark read operations using the adapter pattern
pub struct UnifiedBookmarkReadOps<T: BookmarkReader> {
    reader: T,
}

impl<T: BookmarkReader> UnifiedBookmarkReadOps<T> {
    pub fn new(reader: T) -> Self {
        Self { reader }
    }

    pub async fn get_bookmarks(&self, page: Option<Page>) -> AppResult<Vec<Bookmark>> {
        let bookmarks = self.reader.fetch_bookmarks(page).await?;
        debug!(count = bookmarks.len(), paged = page.is_some(), "Bookmarks fetched");
        Ok(bookmarks)
    }
}
