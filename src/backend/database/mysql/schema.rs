use crate::backend::DatabaseType;
use crate::error::{AppError, AppResult};
use crate::schema::SchemaMapping;
use sqlx::MySqlPool;

/// Create every table that does not exist yet
///
/// MySQL commits DDL implicitly, so statements run one by one.
pub async fn init_schema(pool: &MySqlPool) -> AppResult<()> {
    let mapping = SchemaMapping::new(DatabaseType::MySql);

    for sql in mapping.create_statements() {
        sqlx::query(&sql)
            .execute(pool)
            .await
            .map_err(|e| AppError::from_sqlx("Failed to create table", e))?;
    }

    Ok(())
}
