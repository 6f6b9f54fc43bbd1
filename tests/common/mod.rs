#![allow(dead_code)]

use bookmark_store::backend::database::DatabaseBackendConfig;
use bookmark_store::backend::{BackendFactory, BookmarkBackend, DatabaseType, SessionStore};
use bookmark_store::DriverConnection;
use std::sync::Arc;
use std::time::Duration;
use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};
use testcontainers_modules::mysql::Mysql;
use testcontainers_modules::postgres::Postgres;

/// Set to run the matrix against MySQL, PostgreSQL and libsql-server
/// containers. Without it only SQLite runs.
pub const CONTAINER_TESTS_ENV: &str = "BOOKMARK_STORE_CONTAINER_TESTS";

const LIBSQL_IMAGE: &str = "ghcr.io/tursodatabase/libsql-server";
const LIBSQL_PORT: u16 = 8080;
/// PostgreSQL runs away from UTC so creation times are checked as instants.
const POSTGRES_TIME_ZONE: &str = "Asia/Tokyo";

pub type TestResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TestDatabaseType {
    Sqlite,
    Libsql,
    MySql,
    Postgres,
}

impl TestDatabaseType {
    pub fn database_type(self) -> DatabaseType {
        match self {
            TestDatabaseType::Sqlite => DatabaseType::SQLite,
            TestDatabaseType::Libsql => DatabaseType::Libsql,
            TestDatabaseType::MySql => DatabaseType::MySql,
            TestDatabaseType::Postgres => DatabaseType::PostgreSQL,
        }
    }

    pub fn needs_container(self) -> bool {
        self != TestDatabaseType::Sqlite
    }
}

enum TestContainer {
    Postgres(ContainerAsync<Postgres>),
    MySql(ContainerAsync<Mysql>),
    Libsql(ContainerAsync<GenericImage>),
}

/// A connected backend with its schema created. Holds the container (if
/// any) so the server lives as long as the test.
pub struct TestDatabase {
    pub database_type: TestDatabaseType,
    pub connection: DriverConnection,
    _container: Option<TestContainer>,
}

impl TestDatabase {
    pub fn backend(&self) -> &Arc<dyn BookmarkBackend> {
        &self.connection.backend
    }

    pub fn session_store(&self) -> &Arc<dyn SessionStore> {
        &self.connection.session_store
    }
}

pub fn containers_enabled() -> bool {
    std::env::var(CONTAINER_TESTS_ENV).is_ok()
}

/// Connect to a fresh database of the given type and create the schema.
/// Returns `None` when the type needs a container and containers are off.
pub async fn setup_test_database(db_type: TestDatabaseType) -> TestResult<Option<TestDatabase>> {
    if db_type.needs_container() && !containers_enabled() {
        eprintln!(
            "skipping {:?} test, set {} to run it",
            db_type, CONTAINER_TESTS_ENV
        );
        return Ok(None);
    }

    let (config, container) = match db_type {
        TestDatabaseType::Sqlite => (DatabaseBackendConfig::memory_sqlite(), None),
        TestDatabaseType::Postgres => {
            let container = Postgres::default()
                .with_env_var("TZ", POSTGRES_TIME_ZONE)
                .start()
                .await?;
            let url = format!(
                "postgres://postgres:postgres@{}:{}/postgres",
                container.get_host().await?,
                container.get_host_port_ipv4(5432).await?
            );
            (
                DatabaseBackendConfig::postgres(url).with_max_connections(5),
                Some(TestContainer::Postgres(container)),
            )
        }
        TestDatabaseType::MySql => {
            let container = Mysql::default().start().await?;
            let url = format!(
                "mysql://root@{}:{}/test",
                container.get_host().await?,
                container.get_host_port_ipv4(3306).await?
            );
            (
                DatabaseBackendConfig::mysql(url).with_max_connections(5),
                Some(TestContainer::MySql(container)),
            )
        }
        TestDatabaseType::Libsql => {
            let container = GenericImage::new(LIBSQL_IMAGE, "latest")
                .with_exposed_port(LIBSQL_PORT.tcp())
                .with_wait_for(WaitFor::seconds(1))
                .start()
                .await?;
            let url = format!(
                "http://{}:{}",
                container.get_host().await?,
                container.get_host_port_ipv4(LIBSQL_PORT).await?
            );
            (
                DatabaseBackendConfig::libsql(url, None),
                Some(TestContainer::Libsql(container)),
            )
        }
    };

    let connection = connect_with_retry(&config).await?;
    connection.backend.init_schema().await?;

    Ok(Some(TestDatabase {
        database_type: db_type,
        connection,
        _container: container,
    }))
}

/// Servers may accept TCP before they accept queries; retry for a while.
async fn connect_with_retry(config: &DatabaseBackendConfig) -> TestResult<DriverConnection> {
    let mut attempts = 0;
    loop {
        match BackendFactory::connect(config).await {
            Ok(connection) => return Ok(connection),
            Err(e) if e.is_connection() && attempts < 30 => {
                attempts += 1;
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Run the same async scenario against every backend type.
///
/// Generates one `#[tokio::test]` per backend, named `<test>_<backend>`.
/// Scenarios are `async fn(&TestDatabase)`.
#[allow(unused_macros)]
macro_rules! matrix_test {
    (@run $db_type:ident, $test_fn:ident) => {
        let db_type = common::TestDatabaseType::$db_type;
        let db = match common::setup_test_database(db_type).await {
            Ok(Some(db)) => db,
            Ok(None) => return,
            Err(e) => panic!("Failed to set up {:?} database: {}", db_type, e),
        };
        $test_fn(&db).await;
        db.connection.close().await.unwrap();
    };
    ($test_name:ident, $test_fn:ident) => {
        paste::paste! {
            #[tokio::test]
            async fn [<$test_name _sqlite>]() {
                matrix_test!(@run Sqlite, $test_fn);
            }

            #[tokio::test]
            async fn [<$test_name _libsql>]() {
                matrix_test!(@run Libsql, $test_fn);
            }

            #[tokio::test]
            async fn [<$test_name _mysql>]() {
                matrix_test!(@run MySql, $test_fn);
            }

            #[tokio::test]
            async fn [<$test_name _postgres>]() {
                matrix_test!(@run Postgres, $test_fn);
            }
        }
    };
}
