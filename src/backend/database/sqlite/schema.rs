use crate::backend::DatabaseType;
use crate::error::{AppError, AppResult};
use crate::schema::SchemaMapping;
use sqlx::SqlitePool;

/// Create every table that does not exist yet
///
/// Existing tables are left untouched; there is no migration logic.
pub async fn init_schema(pool: &SqlitePool) -> AppResult<()> {
    let mapping = SchemaMapping::new(DatabaseType::SQLite);

    for sql in mapping.create_statements() {
        sqlx::query(&sql)
            .execute(pool)
            .await
            .map_err(|e| AppError::from_sqlx("Failed to create table", e))?;
    }

    Ok(())
}
