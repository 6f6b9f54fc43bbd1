//! Embedded SQLite backend (sqlx)

pub mod backend_impl;
pub mod bookmark_impl;
pub mod schema;
pub mod session_store_impl;

pub use backend_impl::SqliteBackend;
pub use bookmark_impl::{
    SqliteBookmarkDeleter, SqliteBookmarkInserter, SqliteBookmarkReader, SqliteBookmarkUpdater,
};
pub use session_store_impl::SqliteSessionStore;
