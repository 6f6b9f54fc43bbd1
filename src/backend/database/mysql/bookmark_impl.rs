use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::types::Json;
use sqlx::{MySql, MySqlPool, QueryBuilder, Row};

use super::super::bookmark_delete::BookmarkDeleter;
use super::super::bookmark_insert::{BookmarkInserter, PreparedBookmark};
use super::super::bookmark_read::{BookmarkReadProcessor, BookmarkReader};
use super::super::bookmark_update::{BookmarkChange, BookmarkUpdater};
use crate::backend::DatabaseType;
use crate::error::{AppError, AppResult};
use crate::models::{Bookmark, Page};
use crate::schema::{SchemaMapping, BOOKMARKS};

fn bookmarks_table() -> String {
    SchemaMapping::new(DatabaseType::MySql).table(&BOOKMARKS)
}

fn tags_value(tags: &Option<Vec<String>>) -> Option<Json<Vec<String>>> {
    tags.clone().map(Json)
}

/// Decode a bookmark row: tags live in a `JSON` column
pub(crate) fn row_to_bookmark(row: &MySqlRow) -> AppResult<Bookmark> {
    let read = |e| AppError::from_sqlx("Failed to read bookmark row", e);
    let tags: Option<Json<Vec<String>>> = row.try_get("tags").map_err(read)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(read)?;

    Ok(Bookmark {
        id: row.try_get("id").map_err(read)?,
        url: row.try_get("url").map_err(read)?,
        tags: tags.map(|Json(tags)| tags),
        collection: row.try_get("collection").map_err(read)?,
        user_id: row.try_get("user_id").map_err(read)?,
        created_at,
    })
}

/// MySQL-specific implementation of BookmarkInserter
pub struct MySqlBookmarkInserter {
    pool: MySqlPool,
    table: String,
}

impl MySqlBookmarkInserter {
    pub fn new(pool: MySqlPool) -> Self {
        Self {
            pool,
            table: bookmarks_table(),
        }
    }
}

#[async_trait]
impl BookmarkInserter for MySqlBookmarkInserter {
    async fn execute_bookmark_insert(&self, data: &PreparedBookmark) -> AppResult<u64> {
        let sql = format!(
            "INSERT INTO {} ({}) VALUES (?, ?, ?, ?, ?)",
            self.table,
            BOOKMARKS.writable_column_list()
        );

        let result = sqlx::query(&sql)
            .bind(&data.id)
            .bind(&data.url)
            .bind(tags_value(&data.tags))
            .bind(&data.collection)
            .bind(&data.user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::from_sqlx("Failed to insert bookmark", e))?;

        Ok(result.rows_affected())
    }
}

/// MySQL-specific implementation of BookmarkUpdater
pub struct MySqlBookmarkUpdater {
    pool: MySqlPool,
    table: String,
}

impl MySqlBookmarkUpdater {
    pub fn new(pool: MySqlPool) -> Self {
        Self {
            pool,
            table: bookmarks_table(),
        }
    }
}

#[async_trait]
impl BookmarkUpdater for MySqlBookmarkUpdater {
    async fn execute_bookmark_update(
        &self,
        id: &str,
        changes: &[BookmarkChange],
    ) -> AppResult<u64> {
        let mut builder = QueryBuilder::<MySql>::new(format!("UPDATE {} SET ", self.table));
        {
            let mut assignments = builder.separated(", ");
            for change in changes {
                assignments.push(format!("{} = ", change.column()));
                match change {
                    BookmarkChange::Url(url) => assignments.push_bind_unseparated(url.clone()),
                    BookmarkChange::Tags(tags) => {
                        assignments.push_bind_unseparated(tags_value(tags))
                    }
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

/// MySQL-specific implementation of BookmarkDeleter
pub struct MySqlBookmarkDeleter {
    pool: MySqlPool,
    table: String,
}

impl MySqlBookmarkDeleter {
    pub fn new(pool: MySqlPool) -> Self {
        Self {
            pool,
            table: bookmarks_table(),
        }
    }
}

#[async_trait]
impl BookmarkDeleter for MySqlBookmarkDeleter {
    async fn execute_bookmark_delete(&self, id: &str) -> AppResult<u64> {
        let sql = format!("DELETE FROM {} WHERE id = ?", self.table);

        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::from_sqlx("Failed to delete bookmark", e))?;

        Ok(result.rows_affected())
    }
}

/// MySQL-specific implementation of BookmarkReader
pub struct MySqlBookmarkReader {
    pool: MySqlPool,
    table: String,
}

impl MySqlBookmarkReader {
    pub fn new(pool: MySqlPool) -> Self {
        Self {
            pool,
            table: bookmarks_table(),
        }
    }
}

#[async_trait]
impl BookmarkReader for MySqlBookmarkReader {
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

    #[test]
    fn test_tags_value_wraps_list_only() {
        assert!(tags_value(&None).is_none());
        let wrapped = tags_value(&Some(vec!["a".to_string()])).unwrap();
        assert_eq!(wrapped.0, vec!["a".to_string()]);
    }

    #[test]
    fn test_table_name_is_backtick_quoted() {
        assert_eq!(bookmarks_table(), "`bookmarks`");
    }
}
