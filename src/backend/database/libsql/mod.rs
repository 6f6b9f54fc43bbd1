//! libsql / Turso backend (remote client)

pub mod backend_impl;
pub mod bookmark_impl;
pub mod schema;
pub mod session_store_impl;
mod values;

pub use backend_impl::LibsqlBackend;
pub use bookmark_impl::{
    LibsqlBookmarkDeleter, LibsqlBookmarkInserter, LibsqlBookmarkReader, LibsqlBookmarkUpdater,
};
pub use session_store_impl::LibsqlSessionStore;
