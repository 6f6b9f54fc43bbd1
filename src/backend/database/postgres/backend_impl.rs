use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::super::config::DatabaseBackendConfig;
use super::{
    PostgresBookmarkDeleter, PostgresBookmarkInserter, PostgresBookmarkReader,
    PostgresBookmarkUpdater, PostgresSessionStore,
};
use crate::backend::database::{
    UnifiedBookmarkDeleteOps, UnifiedBookmarkInsertOps, UnifiedBookmarkReadOps,
    UnifiedBookmarkUpdateOps,
};
use crate::backend::{Backend, BookmarkBackend, DatabaseType, SessionStore};
use crate::error::{AppError, AppResult};
use crate::models::{Bookmark, BookmarkPatch, InsertResult, NewBookmark, Page, WriteResult};

/// PostgreSQL database backend implementation
///
/// Tags use a native `TEXT[]` column and expiries a native `BIGINT`, so no
/// codec sits between the driver and the logical values.
pub struct PostgresBackend {
    pool: PgPool,
    session_store: Arc<PostgresSessionStore>,
    bookmark_insert_ops: UnifiedBookmarkInsertOps<PostgresBookmarkInserter>,
    bookmark_update_ops: UnifiedBookmarkUpdateOps<PostgresBookmarkUpdater>,
    bookmark_delete_ops: UnifiedBookmarkDeleteOps<PostgresBookmarkDeleter>,
    bookmark_read_ops: UnifiedBookmarkReadOps<PostgresBookmarkReader>,
}

impl PostgresBackend {
    /// Create a new PostgreSQL backend instance
    pub fn new(pool: PgPool) -> Self {
        let bookmark_inserter = PostgresBookmarkInserter::new(pool.clone());
        let bookmark_updater = PostgresBookmarkUpdater::new(pool.clone());
        let bookmark_deleter = PostgresBookmarkDeleter::new(pool.clone());
        let bookmark_reader = PostgresBookmarkReader::new(pool.clone());

        Self {
            session_store: Arc::new(PostgresSessionStore::new(pool.clone())),
            pool,
            bookmark_insert_ops: UnifiedBookmarkInsertOps::new(bookmark_inserter),
            bookmark_update_ops: UnifiedBookmarkUpdateOps::new(bookmark_updater),
            bookmark_delete_ops: UnifiedBookmarkDeleteOps::new(bookmark_deleter),
            bookmark_read_ops: UnifiedBookmarkReadOps::new(bookmark_reader),
        }
    }

    /// Get the connection pool reference
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Backend for PostgresBackend {
    async fn connect(config: &DatabaseBackendConfig) -> AppResult<Self> {
        config.validate()?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(&config.connection_url)
            .await
            .map_err(|e| {
                AppError::connection("postgres", format!("Failed to connect to PostgreSQL: {}", e))
            })?;

        let backend = Self::new(pool);
        backend.health_check().await?;

        info!(max_connections = config.max_connections, "PostgreSQL backend ready");
        Ok(backend)
    }

    fn database_type(&self) -> DatabaseType {
        DatabaseType::PostgreSQL
    }

    async fn health_check(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::connection("postgres", format!("Health check failed: {}", e)))?;

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
impl BookmarkBackend for PostgresBackend {
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
