use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};

use super::super::bookmark_delete::BookmarkDeleter;
use super::super::bookmark_insert::{BookmarkInserter, PreparedBookmark};
use super::super::bookmark_read::{BookmarkReadProcessor, BookmarkReader};
use super::super::bookmark_update::{BookmarkChange, BookmarkUpdater};
use crate::backend::DatabaseType;
use crate::error::{AppError, AppResult};
use crate::models::{Bookmark, Page};
use crate::schema::{SchemaMapping, BOOKMARKS};

fn bookmarks_table() -> String {
    SchemaMapping::new(DatabaseType::PostgreSQL).table(&BOOKMARKS)
}

/// Decode a bookmark row: tags are a native `TEXT[]`, created_at is a
/// `TIMESTAMPTZ` read back as a UTC instant
pub(crate) fn row_to_bookmark(row: &PgRow) -> AppResult<Bookmark> {
    let read = |e| AppError::from_sqlx("Failed to read bookmark row", e);
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(read)?;

    Ok(Bookmark {
        id: row.try_get("id").map_err(read)?,
        url: row.try_get("url").map_err(read)?,
        tags: row.try_get("tags").map_err(read)?,
        collection: row.try_get("collection").map_err(read)?,
        user_id: row.try_get("user_id").map_err(read)?,
        created_at,
    })
}

/// PostgreSQL-specific implementation of BookmarkInserter
///
/// `created_at` is left to the column default.
pub struct PostgresBookmarkInserter {
    pool: PgPool,
    table: String,
}

impl PostgresBookmarkInserter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            table: bookmarks_table(),
        }
    }
}

#[async_trait]
impl BookmarkInserter for PostgresBookmarkInserter {
    async fn execute_bookmark_insert(&self, data: &PreparedBookmark) -> AppResult<u64> {
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ($1, $2, $3, $4, $5)",
            self.table,
            BOOKMARKS.writable_column_list()
        );

        let result = sqlx::query(&sql)
            .bind(&data.id)
            .bind(&data.url)
            .bind(&data.tags)
            .bind(&data.collection)
            .bind(&data.user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::from_sqlx("Failed to insert bookmark", e))?;

        Ok(result.rows_affected())
    }
}

/// PostgreSQL-specific implementation of BookmarkUpdater
pub struct PostgresBookmarkUpdater {
    pool: PgPool,
    table: String,
}

impl PostgresBookmarkUpdater {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            table: bookmarks_table(),
        }
    }
}

#[async_trait]
impl BookmarkUpdater for PostgresBookmarkUpdater {
    async fn execute_bookmark_update(
        &self,
        id: &str,
        changes: &[BookmarkChange],
    ) -> AppResult<u64> {
        let mut builder = QueryBuilder::<Postgres>::new(format!("UPDATE {} SET ", self.table));
        {
            let mut assignments = builder.separated(", ");
            for change in changes {
                assignments.push(format!("{} = ", change.column()));
                match change {
                    BookmarkChange::Url(url) => assignments.push_bind_unseparated(url.clone()),
                    BookmarkChange::Tags(tags) => assignments.push_bind_unseparated(tags.clone()),
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

/// PostgreSQL-specific implementation of BookmarkDeleter
pub struct PostgresBookmarkDeleter {
    pool: PgPool,
    table: String,
}

impl PostgresBookmarkDeleter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            table: bookmarks_table(),
        }
    }
}

#[async_trait]
impl BookmarkDeleter for PostgresBookmarkDeleter {
    async fn execute_bookmark_delete(&self, id: &str) -> AppResult<u64> {
        let sql = format!("DELETE FROM {} WHERE id = $1", self.table);

        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::from_sqlx("Failed to delete bookmark", e))?;

        Ok(result.rows_affected())
    }
}

/// PostgreSQL-specific implementation of BookmarkReader
pub struct PostgresBookmarkReader {
    pool: PgPool,
    table: String,
}

impl PostgresBookmarkReader {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            table: bookmarks_table(),
        }
    }
}

#[async_trait]
impl BookmarkReader for PostgresBookmarkReader {
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
