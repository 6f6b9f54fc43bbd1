use async_trait::async_trait;
use sqlx::mysql::MySqlPoolOptions;
use sqlx::MySqlPool;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::super::config::DatabaseBackendConfig;
use super::{
    MySqlBookmarkDeleter, MySqlBookmarkInserter, MySqlBookmarkReader, MySqlBookmarkUpdater,
    MySqlSessionStore,
};
use crate::backend::database::{
    UnifiedBookmarkDeleteOps, UnifiedBookmarkInsertOps, UnifiedBookmarkReadOps,
    UnifiedBookmarkUpdateOps,
};
use crate::backend::{Backend, BookmarkBackend, DatabaseType, SessionStore};
use crate::error::{AppError, AppResult};
use crate::models::{Bookmark, BookmarkPatch, InsertResult, NewBookmark, Page, WriteResult};

/// MySQL / MariaDB backend
pub struct MySqlBackend {
    pool: MySqlPool,
    session_store: Arc<MySqlSessionStore>,
    bookmark_insert_ops: UnifiedBookmarkInsertOps<MySqlBookmarkInserter>,
    bookmark_update_ops: UnifiedBookmarkUpdateOps<MySqlBookmarkUpdater>,
    bookmark_delete_ops: UnifiedBookmarkDeleteOps<MySqlBookmarkDeleter>,
    bookmark_read_ops: UnifiedBookmarkReadOps<MySqlBookmarkReader>,
}

impl MySqlBackend {
    pub fn new(pool: MySqlPool) -> Self {
        let bookmark_inserter = MySqlBookmarkInserter::new(pool.clone());
        let bookmark_updater = MySqlBookmarkUpdater::new(pool.clone());
        let bookmark_deleter = MySqlBookmarkDeleter::new(pool.clone());
        let bookmark_reader = MySqlBookmarkReader::new(pool.clone());

        Self {
            session_store: Arc::new(MySqlSessionStore::new(pool.clone())),
            pool,
            bookmark_insert_ops: UnifiedBookmarkInsertOps::new(bookmark_inserter),
            bookmark_update_ops: UnifiedBookmarkUpdateOps::new(bookmark_updater),
            bookmark_delete_ops: UnifiedBookmarkDeleteOps::new(bookmark_deleter),
            bookmark_read_ops: UnifiedBookmarkReadOps::new(bookmark_reader),
        }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    /// sqlx only understands the `mysql://` scheme
    fn normalized_url(url: &str) -> String {
        match url.strip_prefix("mariadb://") {
            Some(rest) => format!("mysql://{}", rest),
            None => url.to_string(),
        }
    }
}

#[async_trait]
impl Backend for MySqlBackend {
    async fn connect(config: &DatabaseBackendConfig) -> AppResult<Self> {
        config.validate()?;

        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(&Self::normalized_url(&config.connection_url))
            .await
            .map_err(|e| AppError::connection("mysql", format!("Failed to connect to MySQL: {}", e)))?;

        let backend = Self::new(pool);
        backend.health_check().await?;

        info!(max_connections = config.max_connections, "MySQL backend ready");
        Ok(backend)
    }

    fn database_type(&self) -> DatabaseType {
        DatabaseType::MySql
    }

    async fn health_check(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::connection("mysql", format!("Health check failed: {}", e)))?;

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
impl BookmarkBackend for MySqlBackend {
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
