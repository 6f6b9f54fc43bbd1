use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::super::config::DatabaseBackendConfig;
use super::{
    SqliteBookmarkDeleter, SqliteBookmarkInserter, SqliteBookmarkReader, SqliteBookmarkUpdater,
    SqliteSessionStore,
};
use crate::backend::database::{
    UnifiedBookmarkDeleteOps, UnifiedBookmarkInsertOps, UnifiedBookmarkReadOps,
    UnifiedBookmarkUpdateOps,
};
use crate::backend::{Backend, BookmarkBackend, DatabaseType, SessionStore};
use crate::error::{AppError, AppResult};
use crate::models::{Bookmark, BookmarkPatch, InsertResult, NewBookmark, Page, WriteResult};

/// Embedded SQLite backend
///
/// Backed by a sqlx pool. An in-memory database is pinned to a single
/// connection that never expires, since closing it would drop the data.
pub struct SqliteBackend {
    pool: SqlitePool,
    session_store: Arc<SqliteSessionStore>,
    bookmark_insert_ops: UnifiedBookmarkInsertOps<SqliteBookmarkInserter>,
    bookmark_update_ops: UnifiedBookmarkUpdateOps<SqliteBookmarkUpdater>,
    bookmark_delete_ops: UnifiedBookmarkDeleteOps<SqliteBookmarkDeleter>,
    bookmark_read_ops: UnifiedBookmarkReadOps<SqliteBookmarkReader>,
}

impl SqliteBackend {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            session_store: Arc::new(SqliteSessionStore::new(pool.clone())),
            bookmark_insert_ops: UnifiedBookmarkInsertOps::new(SqliteBookmarkInserter::new(
                pool.clone(),
            )),
            bookmark_update_ops: UnifiedBookmarkUpdateOps::new(SqliteBookmarkUpdater::new(
                pool.clone(),
            )),
            bookmark_delete_ops: UnifiedBookmarkDeleteOps::new(SqliteBookmarkDeleter::new(
                pool.clone(),
            )),
            bookmark_read_ops: UnifiedBookmarkReadOps::new(SqliteBookmarkReader::new(pool.clone())),
            pool,
        }
    }

    /// Get the connection pool reference
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn connect_options(config: &DatabaseBackendConfig) -> AppResult<SqliteConnectOptions> {
        let url = config.connection_url.as_str();
        let options = if config.is_memory_database() {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| AppError::connection("sqlite", e.to_string()))?
        } else if url.starts_with("sqlite:") {
            SqliteConnectOptions::from_str(url).map_err(|e| {
                AppError::connection("sqlite", format!("Invalid SQLite URL: {}", e))
            })?
        } else {
            SqliteConnectOptions::new().filename(url)
        };

        Ok(options.create_if_missing(true).foreign_keys(true))
    }
}

#[async_trait]
impl Backend for SqliteBackend {
    async fn connect(config: &DatabaseBackendConfig) -> AppResult<Self> {
        config.validate()?;

        let options = Self::connect_options(config)?;
        let mut pool_options = SqlitePoolOptions::new()
            .acquire_timeout(Duration::from_secs(config.connection_timeout));

        pool_options = if config.is_memory_database() {
            pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            pool_options.max_connections(config.max_connections)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| AppError::connection("sqlite", format!("Failed to open database: {}", e)))?;

        let backend = Self::new(pool);
        backend.health_check().await?;

        info!(memory = config.is_memory_database(), "SQLite backend ready");
        Ok(backend)
    }

    fn database_type(&self) -> DatabaseType {
        DatabaseType::SQLite
    }

    async fn health_check(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::connection("sqlite", format!("Health check failed: {}", e)))?;

        Ok(())
    }

    async fn init_schema(&self) -> AppResult<()> {
        super::schema::init_schema(&self.pool).await
    }

    fn session_store(&self) -> Arc<dyn SessionStore> {
        self.session_store.clone()
    }

    async fn close(&self) -> AppResult<()> {
        self.pool.close().await;
        Ok(())
    }
}

#[async_trait]
impl BookmarkBackend for SqliteBackend {
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
