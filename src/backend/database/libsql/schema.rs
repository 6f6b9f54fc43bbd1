use ::libsql::Connection;

use crate::backend::DatabaseType;
use crate::error::{AppError, AppResult};
use crate::schema::SchemaMapping;

/// Create every table that does not exist yet
pub async fn init_schema(conn: &Connection) -> AppResult<()> {
    let mapping = SchemaMapping::new(DatabaseType::Libsql);

    for sql in mapping.create_statements() {
        conn.execute(&sql, ())
            .await
            .map_err(|e| AppError::from_libsql("Failed to create table", e))?;
    }

    Ok(())
}
