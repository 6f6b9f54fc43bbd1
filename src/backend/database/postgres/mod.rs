//! PostgreSQL backend (sqlx)

pub mod backend_impl;
pub mod bookmark_impl;
pub mod schema;
pub mod session_store_impl;

pub use backend_impl::PostgresBackend;
pub use bookmark_impl::{
    PostgresBookmarkDeleter, PostgresBookmarkInserter, PostgresBookmarkReader,
    PostgresBookmarkUpdater,
};
pub use session_store_impl::PostgresSessionStore;
