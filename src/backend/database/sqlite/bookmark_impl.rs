use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use super::super::bookmark_delete::BookmarkDeleter;
use super::super::bookmark_insert::{BookmarkInserter, PreparedBookmark};
use super::super::bookmark_read::{BookmarkReadProcessor, BookmarkReader};
use super::super::bookmark_update::{BookmarkChange, BookmarkUpdater};
use super::super::encoding::{tags_json, text_timestamp};
use crate::backend::DatabaseType;
use crate::error::{AppError, AppResult};
use crate::models::{Bookmark, Page};
use crate::schema::{SchemaMapping, BOOKMARKS};

fn bookmarks_table() -> String {
    SchemaMapping::new(DatabaseType::SQLite).table(&BOOKMARKS)
}

/// Decode a bookmark row: tags are JSON text, created_at is UTC text
pub(crate) fn row_to_bookmark(row: &SqliteRow) -> AppResult<Bookmark> {
    let read = |e| AppError::from_sqlx("Failed to read bookmark row", e);

    let tags: Option<String> = row.try_get("tags").map_err(read)?;
    let created_at: String = row.try_get("created_at").map_err(read)?;

    Ok(Bookmark {
        id: row.try_get("id").map_err(read)?,
        url: row.try_get("url").map_err(read)?,
        tags: tags_json::decode(tags.as_deref())?,
        collection: row.try_get("collection").map_err(read)?,
        user_id: row.try_get("user_id").map_err(read)?,
        created_at: text_timestamp::decode(&created_at)?,
    })
}

/// SQLite-specific implementation of BookmarkInserter
pub struct SqliteBookmarkInserter {
    pool: SqlitePool,
    table: String,
}

impl SqliteBookmarkInserter {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            table: bookmarks_table(),
        }
    }
}

#[async_trait]
impl BookmarkInserter for SqliteBookmarkInserter {
    async fn execute_bookmark_insert(&self, data: &PreparedBookmark) -> AppResult<u64> {
        let sql = format!(
            "INSERT INTO {} ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            self.table,
            BOOKMARKS.column_list()
        );

        let result = sqlx::query(&sql)
            .bind(&data.id)
            .bind(&data.url)
            .bind(tags_json::encode(data.tags.as_deref())?)
            .bind(&data.collection)
            .bind(&data.user_id)
            .bind(text_timestamp::now())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::from_sqlx("Failed to insert bookmark", e))?;

        Ok(result.rows_affected())
    }
}

/// SQLite-specific implementation of BookmarkUpdater
pub struct SqliteBookmarkUpdater {
    pool: SqlitePool,
    table: String,
}

impl SqliteBookmarkUpdater {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            table: bookmarks_table(),
        }
    }
}

#[async_trait]
impl BookmarkUpdater for SqliteBookmarkUpdater {
    async fn execute_bookmark_update(
        &self,
        id: &str,
        changes: &[BookmarkChange],
    ) -> AppResult<u64> {
        let mut builder = QueryBuilder::<Sqlite>::new(format!("UPDATE {} SET ", self.table));
        {
            let mut assignments = builder.separated(", ");
            for change in changes {
                assignments.push(format!("{} = ", change.column()));
                match change {
                    BookmarkChange::Url(url) => assignments.push_bind_unseparated(url.clone()),
                    BookmarkChange::Tags(tags) => assignments
                        .push_bind_unseparated(tags_json::encode(tags.as_deref())?),
                    BookmarkChange::Collection(collection) => {
                        assignments.push_bind_unseparated(collection.clone())
                    }
                    BookmarkChange::UserId(user_id) => {
                        assignments.push_bind_unseparated(user_id.clone())
                    }
                };
            }
        }
        builder.push(" WHERE id = ").push_bind(id.to_string());

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::from_sqlx("Failed to update bookmark", e))?;

        Ok(result.rows_affected())
    }
}

/// SQLite-specific implementation of BookmarkDeleter
pub struct SqliteBookmarkDeleter {
    pool: SqlitePool,
    table: String,
}

impl SqliteBookmarkDeleter {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            table: bookmarks_table(),
        }
    }
}

#[async_trait]
impl BookmarkDeleter for SqliteBookmarkDeleter {
    async fn execute_bookmark_delete(&self, id: &str) -> AppResult<u64> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", self.table);

        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::from_sqlx("Failed to delete bookmark", e))?;

        Ok(result.rows_affected())
    }
}

/// SQLite-specific implementation of BookmarkReader
pub struct SqliteBookmarkReader {
    pool: SqlitePool,
    table: String,
}

impl SqliteBookmarkReader {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            table: bookmarks_table(),
        }
    }
}

#[async_trait]
impl BookmarkReader for SqliteBookmarkReader {
    async fn fetch_bookmarks(&self, page: Option<Page>) -> AppResult<Vec<Bookmark>> {
        let sql = format!(
            "SELECT {} FROM {}{}",
            BOOKMARKS.column_list(),
            self.table,
            BookmarkReadProcessor::page_clause(page)
        );

        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::from_sqlx("Failed to fetch bookmarks", e))?;

        rows.iter().map(row_to_bookmark).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::database::DatabaseBackendConfig;
    use crate::backend::database::sqlite::SqliteBackend;
    use crate::backend::Backend;

    async fn setup() -> SqlitePool {
        let backend = SqliteBackend::connect(&DatabaseBackendConfig::memory_sqlite())
            .await
            .unwrap();
        backend.init_schema().await.unwrap();
        backend.pool().clone()
    }

    fn prepared(id: &str, tags: Option<Vec<&str>>) -> PreparedBookmark {
        PreparedBookmark {
            id: id.to_string(),
            url: "https://e.com".to_string(),
            tags: tags.map(|t| t.into_iter().map(String::from).collect()),
            collection: Some("c1".to_string()),
            user_id: None,
        }
    }

    #[tokio::test]
    async fn test_tags_stored_as_json_text() {
        let pool = setup().await;
        let inserter = SqliteBookmarkInserter::new(pool.clone());
        inserter
            .execute_bookmark_insert(&prepared("b1", Some(vec!["a", "b"])))
            .await
            .unwrap();

        let (raw_tags, raw_created): (String, String) =
            sqlx::query_as("SELECT tags, created_at FROM bookmarks WHERE id = 'b1'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(raw_tags, r#"["a","b"]"#);
        assert!(text_timestamp::decode(&raw_created).is_ok());
    }

    #[tokio::test]
    async fn test_update_can_clear_nullable_columns() {
        let pool = setup().await;
        SqliteBookmarkInserter::new(pool.clone())
            .execute_bookmark_insert(&prepared("b1", Some(vec!["a"])))
            .await
            .unwrap();

        let rows = SqliteBookmarkUpdater::new(pool.clone())
            .execute_bookmark_update(
                "b1",
                &[BookmarkChange::Tags(None), BookmarkChange::Collection(None)],
            )
            .await
            .unwrap();
        assert_eq!(rows, 1);

        let bookmarks = SqliteBookmarkReader::new(pool)
            .fetch_bookmarks(None)
            .await
            .unwrap();
        assert_eq!(bookmarks[0].tags, None);
        assert_eq!(bookmarks[0].collection, None);
        assert_eq!(bookmarks[0].url, "https://e.com");
    }

    #[tokio::test]
    async fn test_duplicate_id_is_constraint_error() {
        let pool = setup().await;
        let inserter = SqliteBookmarkInserter::new(pool);
        inserter
            .execute_bookmark_insert(&prepared("dup", None))
            .await
            .unwrap();
        let err = inserter
            .execute_bookmark_insert(&prepared("dup", None))
            .await
            .unwrap_err();
        assert!(err.is_constraint());
    }

    #[tokio::test]
    async fn test_reader_pages() {
        let pool = setup().await;
        let inserter = SqliteBookmarkInserter::new(pool.clone());
        for i in 0..5 {
            inserter
                .execute_bookmark_insert(&prepared(&format!("b{}", i), None))
                .await
                .unwrap();
        }

        let reader = SqliteBookmarkReader::new(pool);
        let page = reader
            .fetch_bookmarks(Some(Page {
                limit: 2,
                offset: 4,
            }))
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(reader.fetch_bookmarks(None).await.unwrap().len(), 5);
    }
}
