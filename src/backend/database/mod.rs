//! Database abstraction layer for the bookmark store
//!
//! Shared per-operation logic lives at this level; each backend only
//! supplies the statements and the value encodings for its engine.
//!
//! # Architecture
//!
//! ```text
//! Common Logic (bookmark_insert.rs, bookmark_update.rs, session_store.rs, ...)
//!     ↓
//! Database-specific implementations
//!     ├── sqlite/   (embedded file, sqlx)
//!     ├── libsql/   (edge-replicated service, libsql client)
//!     ├── mysql/    (sqlx)
//!     └── postgres/ (sqlx)
//! ```

pub mod bookmark_delete;
pub mod bookmark_insert;
pub mod bookmark_read;
pub mod bookmark_update;
pub mod config;
pub mod encoding;
pub mod libsql;
pub mod mysql;
pub mod postgres;
pub mod session_store;
pub mod sqlite;

pub use config::DatabaseBackendConfig;

pub use bookmark_insert::UnifiedBookmarkInsertOps;

pub use bookmark_update::UnifiedBookmarkUpdateOps;

pub use bookmark_delete::UnifiedBookmarkDeleteOps;

pub use bookmark_read::UnifiedBookmarkReadOps;
