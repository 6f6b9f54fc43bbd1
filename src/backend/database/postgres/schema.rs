use crate::backend::DatabaseType;
use crate::error::{AppError, AppResult};
use crate::schema::SchemaMapping;
use sqlx::PgPool;

/// Create every table that does not exist yet, in one transaction
pub async fn init_schema(pool: &PgPool) -> AppResult<()> {
    let mapping = SchemaMapping::new(DatabaseType::PostgreSQL);

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AppError::from_sqlx("Failed to begin schema transaction", e))?;

    for sql in mapping.create_statements() {
        sqlx::query(&sql)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::from_sqlx("Failed to create table", e))?;
    }

    tx.commit()
        .await
        .map_err(|e| AppError::from_sqlx("Failed to commit schema", e))?;

    Ok(())
}
