pub mod backend;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod password;
pub mod schema;
pub mod utils;

use tracing::info;

// Re-export commonly used types for easier access
pub use backend::{
    BackendFactory, BookmarkBackend, DatabaseType, DriverConnection, SessionStore, SessionTables,
};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use models::{Bookmark, BookmarkPatch, InsertResult, NewBookmark, Page, WriteResult};

/// Open the shared connection for the configured driver.
///
/// Returns the connection handle together with the schema handle and the
/// session-store adapter. Tables are not created here; see
/// [`backend::Backend::init_schema`].
pub async fn create_connection(config: &AppConfig) -> AppResult<DriverConnection> {
    let backend_config = config.database_backend_config();
    info!(driver = %backend_config.database_type, "Creating database connection");
    BackendFactory::connect(&backend_config).await
}
