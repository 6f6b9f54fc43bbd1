use ::libsql::{Connection, Row, Value};
use async_trait::async_trait;

use super::super::bookmark_delete::BookmarkDeleter;
use super::super::bookmark_insert::{BookmarkInserter, PreparedBookmark};
use super::super::bookmark_read::{BookmarkReadProcessor, BookmarkReader};
use super::super::bookmark_update::{BookmarkChange, BookmarkUpdater};
use super::super::encoding::{tags_json, text_timestamp};
use super::values;
use crate::backend::DatabaseType;
use crate::error::{AppError, AppResult};
use crate::models::{Bookmark, Page};
use crate::schema::{SchemaMapping, BOOKMARKS};

fn bookmarks_table() -> String {
    SchemaMapping::new(DatabaseType::Libsql).table(&BOOKMARKS)
}

fn tags_value(tags: Option<&[String]>) -> AppResult<Value> {
    Ok(values::opt_text(tags_json::encode(tags)?.as_deref()))
}

/// Positional decode in `BOOKMARKS.column_list()` order
pub(crate) fn row_to_bookmark(row: &Row) -> AppResult<Bookmark> {
    let tags = values::get_opt_text(row, 2, "tags")?;
    let created_at = values::get_text(row, 5, "created_at")?;

    Ok(Bookmark {
        id: values::get_text(row, 0, "id")?,
        url: values::get_text(row, 1, "url")?,
        tags: tags_json::decode(tags.as_deref())?,
        collection: values::get_opt_text(row, 3, "collection")?,
        user_id: values::get_opt_text(row, 4, "user_id")?,
        created_at: text_timestamp::decode(&created_at)?,
    })
}

/// libsql-specific implementation of BookmarkInserter
pub struct LibsqlBookmarkInserter {
    conn: Connection,
    table: String,
}

impl LibsqlBookmarkInserter {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn,
            table: bookmarks_table(),
        }
    }
}

#[async_trait]
impl BookmarkInserter for LibsqlBookmarkInserter {
    async fn execute_bookmark_insert(&self, data: &PreparedBookmark) -> AppResult<u64> {
        let sql = format!(
            "INSERT INTO {} ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            self.table,
            BOOKMARKS.column_list()
        );
        let params = vec![
            values::text(&data.id),
            values::text(&data.url),
            tags_value(data.tags.as_deref())?,
            values::opt_text(data.collection.as_deref()),
            values::opt_text(data.user_id.as_deref()),
            Value::Text(text_timestamp::now()),
        ];

        self.conn
            .execute(&sql, params)
            .await
            .map_err(|e| AppError::from_libsql("Failed to insert bookmark", e))
    }
}

/// libsql-specific implementation of BookmarkUpdater
pub struct LibsqlBookmarkUpdater {
    conn: Connection,
    table: String,
}

impl LibsqlBookmarkUpdater {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn,
            table: bookmarks_table(),
        }
    }
}

#[async_trait]
impl BookmarkUpdater for LibsqlBookmarkUpdater {
    async fn execute_bookmark_update(
        &self,
        id: &str,
        changes: &[BookmarkChange],
    ) -> AppResult<u64> {
        let mut assignments = Vec::with_capacity(changes.len());
        let mut params = Vec::with_capacity(changes.len() + 1);

        for change in changes {
            params.push(match change {
                BookmarkChange::Url(url) => values::text(url),
                BookmarkChange::Tags(tags) => tags_value(tags.as_deref())?,
                BookmarkChange::Collection(collection) => values::opt_text(collection.as_deref()),
                BookmarkChange::UserId(user_id) => values::opt_text(user_id.as_deref()),
            });
            assignments.push(format!("{} = ?{}", change.column(), params.len()));
        }
        params.push(values::text(id));

        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?{}",
            self.table,
            assignments.join(", "),
            params.len()
        );

        self.conn
            .execute(&sql, params)
            .await
            .map_err(|e| AppError::from_libsql("Failed to update bookmark", e))
    }
}

/// libsql-specific implementation of BookmarkDeleter
pub struct LibsqlBookmarkDeleter {
    conn: Connection,
    table: String,
}

impl LibsqlBookmarkDeleter {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn,
            table: bookmarks_table(),
        }
    }
}

#[async_trait]
impl BookmarkDeleter for LibsqlBookmarkDeleter {
    async fn execute_bookmark_delete(&self, id: &str) -> AppResult<u64> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", self.table);

        self.conn
            .execute(&sql, vec![values::text(id)])
            .await
            .map_err(|e| AppError::from_libsql("Failed to delete bookmark", e))
    }
}

/// libsql-specific implementation of BookmarkReader
pub struct LibsqlBookmarkReader {
    conn: Connection,
    table: String,
}

impl LibsqlBookmarkReader {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn,
            table: bookmarks_table(),
        }
    }
}

#[async_trait]
impl BookmarkReader for LibsqlBookmarkReader {
    async fn fetch_bookmarks(&self, page: Option<Page>) -> AppResult<Vec<Bookmark>> {
        let sql = format!(
            "SELECT {} FROM {}{}",
            BOOKMARKS.column_list(),
            self.table,
            BookmarkReadProcessor::page_clause(page)
        );

        let mut rows = self
            .conn
            .query(&sql, ())
            .await
            .map_err(|e| AppError::from_libsql("Failed to fetch bookmarks", e))?;

        let mut bookmarks = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| AppError::from_libsql("Failed to fetch bookmarks", e))?
        {
            bookmarks.push(row_to_bookmark(&row)?);
        }

        Ok(bookmarks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_value() {
        assert_eq!(tags_value(None).unwrap(), Value::Null);
        let tags = vec!["a".to_string(), "b".to_string()];
        assert_eq!(
            tags_value(Some(&tags)).unwrap(),
            Value::Text(r#"["a","b"]"#.to_string())
        );
    }

    #[test]
    fn test_table_name_is_quoted() {
        assert_eq!(bookmarks_table(), "\"bookmarks\"");
    }
}
