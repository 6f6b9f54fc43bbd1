use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, MySqlPool, QueryBuilder, Row};
use tracing::debug;

use super::super::session_store::SessionStoreProcessor;
use crate::backend::{DatabaseType, SessionStore};
use crate::error::{AppError, AppResult};
use crate::models::{Key, NewUser, Session, SessionUpdate, User, WriteResult};
use crate::schema::{SchemaMapping, KEYS, SESSIONS, USERS};

/// Session-store adapter over the MySQL pool.
///
/// `keys` is a reserved word in MySQL; every table name goes through the
/// schema mapping's quoting.
pub struct MySqlSessionStore {
    pool: MySqlPool,
    users: String,
    sessions: String,
    keys: String,
}

impl MySqlSessionStore {
    pub fn new(pool: MySqlPool) -> Self {
        let mapping = SchemaMapping::new(DatabaseType::MySql);
        Self {
            pool,
            users: mapping.table(&USERS),
            sessions: mapping.table(&SESSIONS),
            keys: mapping.table(&KEYS),
        }
    }
}

fn row_to_user(row: &MySqlRow) -> AppResult<User> {
    let read = |e| AppError::from_sqlx("Failed to read user row", e);
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(read)?;
    Ok(User {
        id: row.try_get("id").map_err(read)?,
        created_at,
    })
}

fn row_to_session(row: &MySqlRow) -> AppResult<Session> {
    let read = |e| AppError::from_sqlx("Failed to read session row", e);
    Ok(Session {
        id: row.try_get("id").map_err(read)?,
        user_id: row.try_get("user_id").map_err(read)?,
        active_expires: row.try_get("active_expires").map_err(read)?,
        idle_expires: row.try_get("idle_expires").map_err(read)?,
    })
}

fn row_to_key(row: &MySqlRow) -> AppResult<Key> {
    let read = |e| AppError::from_sqlx("Failed to read key row", e);
    Ok(Key {
        id: row.try_get("id").map_err(read)?,
        user_id: row.try_get("user_id").map_err(read)?,
        hashed_password: row.try_get("hashed_password").map_err(read)?,
    })
}

#[async_trait]
impl SessionStore for MySqlSessionStore {
    async fn get_user(&self, id: &str) -> AppResult<Option<User>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = ?",
            USERS.column_list(),
            self.users
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::from_sqlx("Failed to fetch user", e))?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn set_user(&self, user: &NewUser, key: Option<&Key>) -> AppResult<String> {
        let user_id = SessionStoreProcessor::prepare_user_id(user)?;
        let key = key
            .map(|k| SessionStoreProcessor::key_for_user(k, &user_id))
            .transpose()?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::from_sqlx("Failed to begin transaction", e))?;

        let sql = format!(
            "INSERT INTO {} ({}) VALUES (?)",
            self.users,
            USERS.writable_column_list()
        );
        sqlx::query(&sql)
            .bind(&user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::from_sqlx("Failed to insert user", e))?;

        if let Some(key) = &key {
            let sql = format!(
                "INSERT INTO {} ({}) VALUES (?, ?, ?)",
                self.keys,
                KEYS.column_list()
            );
            sqlx::query(&sql)
                .bind(&key.id)
                .bind(&key.user_id)
                .bind(&key.hashed_password)
                .execute(&mut *tx)
                .await
                .map_err(|e| AppError::from_sqlx("Failed to insert key", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::from_sqlx("Failed to commit user", e))?;

        debug!(user_id = %user_id, with_key = key.is_some(), "User created");
        Ok(user_id)
    }

    async fn get_session(&self, id: &str) -> AppResult<Option<Session>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = ?",
            SESSIONS.column_list(),
            self.sessions
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::from_sqlx("Failed to fetch session", e))?;

        row.as_ref().map(row_to_session).transpose()
    }

    async fn get_sessions_by_user_id(&self, user_id: &str) -> AppResult<Vec<Session>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE user_id = ?",
            SESSIONS.column_list(),
            self.sessions
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::from_sqlx("Failed to fetch sessions", e))?;

        rows.iter().map(row_to_session).collect()
    }

    async fn set_session(&self, session: &Session) -> AppResult<()> {
        let sql = format!(
            "INSERT INTO {} ({}) VALUES (?, ?, ?, ?)",
            self.sessions,
            SESSIONS.column_list()
        );
        sqlx::query(&sql)
            .bind(&session.id)
            .bind(&session.user_id)
            .bind(session.active_expires)
            .bind(session.idle_expires)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::from_sqlx("Failed to insert session", e))?;
        Ok(())
    }

    async fn update_session(&self, id: &str, update: &SessionUpdate) -> AppResult<WriteResult> {
        if update.is_empty() {
            return Ok(WriteResult::new(0));
        }
        let changes = SessionStoreProcessor::session_changes(update);

        let mut builder = QueryBuilder::<MySql>::new(format!("UPDATE {} SET ", self.sessions));
        {
            let mut assignments = builder.separated(", ");
            for (column, value) in changes {
                assignments.push(format!("{} = ", column));
                assignments.push_bind_unseparated(value);
            }
        }
        builder.push(" WHERE id = ").push_bind(id.to_string());

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::from_sqlx("Failed to update session", e))?;
        Ok(WriteResult::new(result.rows_affected()))
    }

    async fn delete_session(&self, id: &str) -> AppResult<WriteResult> {
        let sql = format!("DELETE FROM {} WHERE id = ?", self.sessions);
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::from_sqlx("Failed to delete session", e))?;
        Ok(WriteResult::new(result.rows_affected()))
    }

    async fn delete_sessions_by_user_id(&self, user_id: &str) -> AppResult<WriteResult> {
        let sql = format!("DELETE FROM {} WHERE user_id = ?", self.sessions);
        let result = sqlx::query(&sql)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::from_sqlx("Failed to delete sessions", e))?;
        Ok(WriteResult::new(result.rows_affected()))
    }

    async fn get_key(&self, id: &str) -> AppResult<Option<Key>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = ?",
            KEYS.column_list(),
            self.keys
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::from_sqlx("Failed to fetch key", e))?;

        row.as_ref().map(row_to_key).transpose()
    }

    async fn get_keys_by_user_id(&self, user_id: &str) -> AppResult<Vec<Key>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE user_id = ?",
            KEYS.column_list(),
            self.keys
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::from_sqlx("Failed to fetch keys", e))?;

        rows.iter().map(row_to_key).collect()
    }

    async fn set_key(&self, key: &Key) -> AppResult<()> {
        let sql = format!(
            "INSERT INTO {} ({}) VALUES (?, ?, ?)",
            self.keys,
            KEYS.column_list()
        );
        sqlx::query(&sql)
            .bind(&key.id)
            .bind(&key.user_id)
            .bind(&key.hashed_password)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::from_sqlx("Failed to insert key", e))?;
        Ok(())
    }

    async fn update_key(
        &self,
        id: &str,
        hashed_password: Option<&str>,
    ) -> AppResult<WriteResult> {
        let sql = format!("UPDATE {} SET hashed_password = ? WHERE id = ?", self.keys);
        let result = sqlx::query(&sql)
            .bind(hashed_password)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::from_sqlx("Failed to update key", e))?;
        Ok(WriteResult::new(result.rows_affected()))
    }

    async fn delete_key(&self, id: &str) -> AppResult<WriteResult> {
        let sql = format!("DELETE FROM {} WHERE id = ?", self.keys);
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::from_sqlx("Failed to delete key", e))?;
        Ok(WriteResult::new(result.rows_affected()))
    }

    async fn delete_keys_by_user_id(&self, user_id: &str) -> AppResult<WriteResult> {
        let sql = format!("DELETE FROM {} WHERE user_id = ?", self.keys);
        let result = sqlx::query(&sql)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::from_sqlx("Failed to delete keys", e))?;
        Ok(WriteResult::new(result.rows_affected()))
    }
}
