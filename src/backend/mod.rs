use crate::backend::database::DatabaseBackendConfig;
use crate::error::AppResult;
use crate::models::{
    Bookmark, BookmarkPatch, InsertResult, Key, NewBookmark, NewUser, Page, Session,
    SessionUpdate, User, WriteResult,
};
use crate::schema::SchemaMapping;
use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

pub mod database;

/// Supported database backend types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatabaseType {
    /// Embedded file database (also the default)
    SQLite,
    /// Edge-replicated libsql / Turso service
    Libsql,
    MySql,
    PostgreSQL,
}

impl DatabaseType {
    pub const ALL: [DatabaseType; 4] = [
        DatabaseType::SQLite,
        DatabaseType::Libsql,
        DatabaseType::MySql,
        DatabaseType::PostgreSQL,
    ];

    /// Configuration literal of this backend (`DB_DRIVER`)
    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseType::SQLite => "sqlite",
            DatabaseType::Libsql => "libsql",
            DatabaseType::MySql => "mysql",
            DatabaseType::PostgreSQL => "postgres",
        }
    }

    /// Pick a backend from a driver name. Absent or unrecognised names fall
    /// back to the embedded SQLite backend.
    pub fn select(driver: Option<&str>) -> Self {
        match driver {
            None => DatabaseType::SQLite,
            Some(name) => name.parse().unwrap_or_else(|_| {
                warn!(driver = %name, "Unrecognized database driver, falling back to sqlite");
                DatabaseType::SQLite
            }),
        }
    }
}

impl Default for DatabaseType {
    fn default() -> Self {
        DatabaseType::SQLite
    }
}

impl fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatabaseType {
    type Err = String;

    /// Strict parse, used by configuration validation
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(DatabaseType::SQLite),
            "libsql" => Ok(DatabaseType::Libsql),
            "mysql" => Ok(DatabaseType::MySql),
            "postgres" | "postgresql" => Ok(DatabaseType::PostgreSQL),
            other => Err(format!(
                "unsupported database driver '{}', expected one of sqlite, libsql, mysql, postgres",
                other
            )),
        }
    }
}

/// Core backend abstraction
///
/// Each driver (SQLite, libsql, MySQL, PostgreSQL) implements this trait. It
/// owns the connection handle and knows its physical schema.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Open the connection handle. Never creates or migrates tables.
    async fn connect(config: &DatabaseBackendConfig) -> AppResult<Self>
    where
        Self: Sized;

    fn database_type(&self) -> DatabaseType;

    /// Schema handle describing this backend's physical encodings
    fn schema(&self) -> SchemaMapping {
        SchemaMapping::new(self.database_type())
    }

    /// Check if the storage backend is healthy and accessible
    async fn health_check(&self) -> AppResult<()>;

    /// Create all tables if they do not exist yet
    async fn init_schema(&self) -> AppResult<()>;

    /// Session-store adapter sharing this backend's connection
    fn session_store(&self) -> Arc<dyn SessionStore>;

    /// Release the connection handle
    async fn close(&self) -> AppResult<()> {
        Ok(())
    }
}

/// Bookmark CRUD operations, identical on every backend.
///
/// None of these check ownership; filtering by `user_id` is up to the caller.
#[async_trait]
pub trait BookmarkBackend: Backend {
    /// Insert a bookmark. A missing url or an id collision is a
    /// `Constraint` error.
    async fn create_bookmark(&self, data: &NewBookmark) -> AppResult<InsertResult>;

    /// Update the supplied fields. A missing id affects zero rows and
    /// still succeeds.
    async fn update_bookmark(&self, id: &str, patch: &BookmarkPatch) -> AppResult<WriteResult>;

    /// Delete by id. A missing id affects zero rows and still succeeds.
    async fn delete_bookmark(&self, id: &str) -> AppResult<WriteResult>;

    /// List bookmarks in unspecified order, optionally windowed
    async fn get_bookmarks(&self, page: Option<Page>) -> AppResult<Vec<Bookmark>>;

    /// Full table scan
    async fn get_all_bookmarks(&self) -> AppResult<Vec<Bookmark>> {
        self.get_bookmarks(None).await
    }
}

/// Table bindings managed by a session-store adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTables {
    pub user: &'static str,
    pub session: &'static str,
    pub key: &'static str,
}

impl Default for SessionTables {
    fn default() -> Self {
        Self {
            user: crate::schema::USERS.name,
            session: crate::schema::SESSIONS.name,
            key: crate::schema::KEYS.name,
        }
    }
}

/// Storage primitives handed to the external session authenticator.
///
/// Values are stored and returned verbatim; expiry policy, renewal and
/// cleanup decisions belong to the authenticator.
#[async_trait]
pub trait SessionStore: Send + Sync {
    fn tables(&self) -> SessionTables {
        SessionTables::default()
    }

    async fn get_user(&self, id: &str) -> AppResult<Option<User>>;

    /// Insert a user and, optionally, its first key in one transaction.
    /// Returns the user id.
    async fn set_user(&self, user: &NewUser, key: Option<&Key>) -> AppResult<String>;

    async fn get_session(&self, id: &str) -> AppResult<Option<Session>>;

    async fn get_sessions_by_user_id(&self, user_id: &str) -> AppResult<Vec<Session>>;

    async fn set_session(&self, session: &Session) -> AppResult<()>;

    async fn update_session(&self, id: &str, update: &SessionUpdate) -> AppResult<WriteResult>;

    async fn delete_session(&self, id: &str) -> AppResult<WriteResult>;

    async fn delete_sessions_by_user_id(&self, user_id: &str) -> AppResult<WriteResult>;

    async fn get_key(&self, id: &str) -> AppResult<Option<Key>>;

    async fn get_keys_by_user_id(&self, user_id: &str) -> AppResult<Vec<Key>>;

    async fn set_key(&self, key: &Key) -> AppResult<()>;

    async fn update_key(&self, id: &str, hashed_password: Option<&str>)
        -> AppResult<WriteResult>;

    async fn delete_key(&self, id: &str) -> AppResult<WriteResult>;

    async fn delete_keys_by_user_id(&self, user_id: &str) -> AppResult<WriteResult>;
}

/// Everything a driver hands back from connection creation
#[derive(Clone)]
pub struct DriverConnection {
    pub backend: Arc<dyn BookmarkBackend>,
    pub schema: SchemaMapping,
    pub session_store: Arc<dyn SessionStore>,
}

impl DriverConnection {
    pub fn database_type(&self) -> DatabaseType {
        self.schema.database_type()
    }

    /// Release the shared handle. Called once on shutdown.
    pub async fn close(&self) -> AppResult<()> {
        info!(driver = %self.database_type(), "Closing database connection");
        self.backend.close().await
    }
}

impl fmt::Debug for DriverConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverConnection")
            .field("database_type", &self.database_type())
            .field("tables", &self.session_store.tables())
            .finish()
    }
}

/// Factory for creating backend instances
pub struct BackendFactory;

impl BackendFactory {
    /// Open the configured backend and wire its schema handle and
    /// session-store adapter. Connection failures are not retried.
    pub async fn connect(config: &DatabaseBackendConfig) -> AppResult<DriverConnection> {
        let backend: Arc<dyn BookmarkBackend> = Arc::from(Self::create_backend(config).await?);
        let session_store = backend.session_store();
        let schema = backend.schema();

        info!(
            driver = %config.database_type,
            url = %crate::utils::redact_connection_url(&config.connection_url),
            "Database connection established"
        );

        Ok(DriverConnection {
            backend,
            schema,
            session_store,
        })
    }

    /// Create a backend based on configuration (returns Box)
    pub async fn create_backend(
        config: &DatabaseBackendConfig,
    ) -> AppResult<Box<dyn BookmarkBackend>> {
        config.validate()?;

        match config.database_type {
            DatabaseType::SQLite => {
                let backend = database::sqlite::SqliteBackend::connect(config).await?;
                Ok(Box::new(backend))
            }
            DatabaseType::Libsql => {
                let backend = database::libsql::LibsqlBackend::connect(config).await?;
                Ok(Box::new(backend))
            }
            DatabaseType::MySql => {
                let backend = database::mysql::MySqlBackend::connect(config).await?;
                Ok(Box::new(backend))
            }
            DatabaseType::PostgreSQL => {
                let backend = database::postgres::PostgresBackend::connect(config).await?;
                Ok(Box::new(backend))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_defaults_to_sqlite() {
        assert_eq!(DatabaseType::select(None), DatabaseType::SQLite);
        assert_eq!(DatabaseType::select(Some("")), DatabaseType::SQLite);
        assert_eq!(DatabaseType::select(Some("oracle")), DatabaseType::SQLite);
    }

    #[test]
    fn test_select_known_drivers() {
        assert_eq!(DatabaseType::select(Some("sqlite")), DatabaseType::SQLite);
        assert_eq!(DatabaseType::select(Some("libsql")), DatabaseType::Libsql);
        assert_eq!(DatabaseType::select(Some("mysql")), DatabaseType::MySql);
        assert_eq!(DatabaseType::select(Some("postgres")), DatabaseType::PostgreSQL);
        assert_eq!(DatabaseType::select(Some("POSTGRES")), DatabaseType::PostgreSQL);
    }

    #[test]
    fn test_strict_parse_rejects_unknown() {
        assert!("mongodb".parse::<DatabaseType>().is_err());
        for db in DatabaseType::ALL {
            assert_eq!(db.as_str().parse::<DatabaseType>().unwrap(), db);
        }
    }

    #[test]
    fn test_session_tables() {
        let tables = SessionTables::default();
        assert_eq!(tables.user, "users");
        assert_eq!(tables.session, "sessions");
        assert_eq!(tables.key, "keys");
    }
}
