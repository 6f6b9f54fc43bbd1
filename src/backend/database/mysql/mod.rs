//! MySQL / MariaDB backend (sqlx)

pub mod backend_impl;
pub mod bookmark_impl;
pub mod schema;
pub mod session_store_impl;

pub use backend_impl::MySqlBackend;
pub use bookmark_impl::{
    MySqlBookmarkDeleter, MySqlBookmarkInserter, MySqlBookmarkReader, MySqlBookmarkUpdater,
};
pub use session_store_impl::MySqlSessionStore;
