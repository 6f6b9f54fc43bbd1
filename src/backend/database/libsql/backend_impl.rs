use ::libsql::{Builder, Connection, Database};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

use super::super::config::DatabaseBackendConfig;
use super::{
    LibsqlBookmarkDeleter, LibsqlBookmarkInserter, LibsqlBookmarkReader, LibsqlBookmarkUpdater,
    LibsqlSessionStore,
};
use crate::backend::database::{
    UnifiedBookmarkDeleteOps, UnifiedBookmarkInsertOps, UnifiedBookmarkReadOps,
    UnifiedBookmarkUpdateOps,
};
use crate::backend::{Backend, BookmarkBackend, DatabaseType, SessionStore};
use crate::error::{AppError, AppResult};
use crate::models::{Bookmark, BookmarkPatch, InsertResult, NewBookmark, Page, WriteResult};

/// libsql / Turso backend
///
/// Talks to a libsql server over HTTP with a single shared connection.
/// Column encodings are the SQLite ones, so a database can move between this
/// backend and the embedded one without conversion.
pub struct LibsqlBackend {
    conn: Connection,
    session_store: Arc<LibsqlSessionStore>,
    bookmark_insert_ops: UnifiedBookmarkInsertOps<LibsqlBookmarkInserter>,
    bookmark_update_ops: UnifiedBookmarkUpdateOps<LibsqlBookmarkUpdater>,
    bookmark_delete_ops: UnifiedBookmarkDeleteOps<LibsqlBookmarkDeleter>,
    bookmark_read_ops: UnifiedBookmarkReadOps<LibsqlBookmarkReader>,
}

impl LibsqlBackend {
    pub fn new(db: Arc<Database>, conn: Connection) -> Self {
        Self {
            session_store: Arc::new(LibsqlSessionStore::new(db, conn.clone())),
            bookmark_insert_ops: UnifiedBookmarkInsertOps::new(LibsqlBookmarkInserter::new(
                conn.clone(),
            )),
            bookmark_update_ops: UnifiedBookmarkUpdateOps::new(LibsqlBookmarkUpdater::new(
                conn.clone(),
            )),
            bookmark_delete_ops: UnifiedBookmarkDeleteOps::new(LibsqlBookmarkDeleter::new(
                conn.clone(),
            )),
            bookmark_read_ops: UnifiedBookmarkReadOps::new(LibsqlBookmarkReader::new(conn.clone())),
            conn,
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Turso hands out `libsql://` URLs; the HTTP client needs `https://`
    fn remote_url(url: &str) -> String {
        match url.strip_prefix("libsql://") {
            Some(rest) => format!("https://{}", rest),
            None => url.to_string(),
        }
    }
}

#[async_trait]
impl Backend for LibsqlBackend {
    async fn connect(config: &DatabaseBackendConfig) -> AppResult<Self> {
        config.validate()?;

        let url = Self::remote_url(&config.connection_url);
        let token = config.auth_token.clone().unwrap_or_default();

        let db = Builder::new_remote(url, token)
            .build()
            .await
            .map_err(|e| AppError::connection("libsql", format!("Failed to open database: {}", e)))?;
        let conn = db
            .connect()
            .map_err(|e| AppError::connection("libsql", format!("Failed to connect: {}", e)))?;

        let backend = Self::new(Arc::new(db), conn);
        backend.health_check().await?;

        backend
            .conn
            .execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| AppError::from_libsql("Failed to enable foreign keys", e))?;

        info!(authenticated = config.auth_token.is_some(), "libsql backend ready");
        Ok(backend)
    }

    fn database_type(&self) -> DatabaseType {
        DatabaseType::Libsql
    }

    async fn health_check(&self) -> AppResult<()> {
        let mut rows = self
            .conn
            .query("SELECT 1", ())
            .await
            .map_err(|e| AppError::connection("libsql", format!("Health check failed: {}", e)))?;
        rows.next()
            .await
            .map_err(|e| AppError::connection("libsql", format!("Health check failed: {}", e)))?;

        Ok(())
    }

    async fn init_schema(&self) -> AppResult<()> {
        super::schema::init_schema(&self.conn).await
    }

    fn session_store(&self) -> Arc<dyn SessionStore> {
        self.session_store.clone()
    }

    /// The HTTP stream is released when the last handle drops
    async fn close(&self) -> AppResult<()> {
        debug!("libsql connection released");
        Ok(())
    }
}

#[async_trait]
impl BookmarkBackend for LibsqlBackend {
    async fn create_bookmark(&self, data: &NewBookmark) -> AppResult<InsertResult> {
        self.bookmark_insert_ops.create_bookmark(data).await
    }

    async fn update_bookmark(&self, id: &str, patch: &BookmarkPatch) -> AppResult<WriteResult> {
        self.bookmark_update_ops.update_bookmark(id, patch).await
    }

    async fn delete_bookmark(&self, id: &str) -> AppResult<WriteResult> {
        self.bookmark_delete_ops.delete_bookmark(id).await
    }

    async fn get_bookmarks(&self, page: Option<Page>) -> AppResult<Vec<Bookmark>> {
        self.bookmark_read_ops.get_bookmarks(page).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_url() {
        assert_eq!(
            LibsqlBackend::remote_url("libsql://bookmarks-acme.turso.io"),
            "https://bookmarks-acme.turso.io"
        );
        assert_eq!(
            LibsqlBackend::remote_url("http://127.0.0.1:8080"),
            "http://127.0.0.1:8080"
        );
    }

    #[tokio::test]
    async fn test_unreachable_server_is_connection_error() {
        let config = DatabaseBackendConfig::libsql("http://127.0.0.1:1", None)
            .with_connection_timeout(1);
        match LibsqlBackend::connect(&config).await {
            Err(err) => assert!(err.is_connection(), "unexpected error: {err}"),
            Ok(_) => panic!("connecting to a closed port should fail"),
        }
    }
}
