use ::libsql::{Connection, Database, Row, Value};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use super::super::encoding::text_timestamp;
use super::super::session_store::SessionStoreProcessor;
use super::values;
use crate::backend::{DatabaseType, SessionStore};
use crate::error::{AppError, AppResult};
use crate::models::{Key, NewUser, Session, SessionUpdate, User, WriteResult};
use crate::schema::{SchemaMapping, KEYS, SESSIONS, USERS};

/// Session-store adapter over the libsql connection.
///
/// Reads and single-statement writes share the backend's connection.
/// `set_user` opens its own stream so its transaction never captures
/// statements issued concurrently by other callers.
pub struct LibsqlSessionStore {
    db: Arc<Database>,
    conn: Connection,
    users: String,
    sessions: String,
    keys: String,
}

impl LibsqlSessionStore {
    pub fn new(db: Arc<Database>, conn: Connection) -> Self {
        let mapping = SchemaMapping::new(DatabaseType::Libsql);
        Self {
            db,
            conn,
            users: mapping.table(&USERS),
            sessions: mapping.table(&SESSIONS),
            keys: mapping.table(&KEYS),
        }
    }

    async fn execute(&self, context: &str, sql: &str, params: Vec<Value>) -> AppResult<u64> {
        self.conn
            .execute(sql, params)
            .await
            .map_err(|e| AppError::from_libsql(context, e))
    }

    async fn fetch<T>(
        &self,
        context: &str,
        sql: &str,
        params: Vec<Value>,
        decode: fn(&Row) -> AppResult<T>,
    ) -> AppResult<Vec<T>> {
        let mut rows = self
            .conn
            .query(sql, params)
            .await
            .map_err(|e| AppError::from_libsql(context, e))?;

        let mut items = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| AppError::from_libsql(context, e))?
        {
            items.push(decode(&row)?);
        }
        Ok(items)
    }

    async fn insert_user(&self, conn: &Connection, user_id: &str, key: Option<&Key>) -> AppResult<()> {
        let sql = format!(
            "INSERT INTO {} ({}) VALUES (?1, ?2)",
            self.users,
            USERS.column_list()
        );
        conn.execute(&sql, vec![values::text(user_id), Value::Text(text_timestamp::now())])
            .await
            .map_err(|e| AppError::from_libsql("Failed to insert user", e))?;

        if let Some(key) = key {
            let sql = format!(
                "INSERT INTO {} ({}) VALUES (?1, ?2, ?3)",
                self.keys,
                KEYS.column_list()
            );
            conn.execute(
                &sql,
                vec![
                    values::text(&key.id),
                    values::text(&key.user_id),
                    values::opt_text(key.hashed_password.as_deref()),
                ],
            )
            .await
            .map_err(|e| AppError::from_libsql("Failed to insert key", e))?;
        }

        Ok(())
    }
}

fn row_to_user(row: &Row) -> AppResult<User> {
    let created_at = values::get_text(row, 1, "created_at")?;
    Ok(User {
        id: values::get_text(row, 0, "id")?,
        created_at: text_timestamp::decode(&created_at)?,
    })
}

fn row_to_session(row: &Row) -> AppResult<Session> {
    Ok(Session {
        id: values::get_text(row, 0, "id")?,
        user_id: values::get_text(row, 1, "user_id")?,
        active_expires: values::get_bigint(row, 2, "active_expires")?,
        idle_expires: values::get_bigint(row, 3, "idle_expires")?,
    })
}

fn row_to_key(row: &Row) -> AppResult<Key> {
    Ok(Key {
        id: values::get_text(row, 0, "id")?,
        user_id: values::get_text(row, 1, "user_id")?,
        hashed_password: values::get_opt_text(row, 2, "hashed_password")?,
    })
}

#[async_trait]
impl SessionStore for LibsqlSessionStore {
    async fn get_user(&self, id: &str) -> AppResult<Option<User>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = ?1",
            USERS.column_list(),
            self.users
        );
        let users = self
            .fetch("Failed to fetch user", &sql, vec![values::text(id)], row_to_user)
            .await?;
        Ok(users.into_iter().next())
    }

    async fn set_user(&self, user: &NewUser, key: Option<&Key>) -> AppResult<String> {
        let user_id = SessionStoreProcessor::prepare_user_id(user)?;
        let key = key
            .map(|k| SessionStoreProcessor::key_for_user(k, &user_id))
            .transpose()?;

        let conn = self
            .db
            .connect()
            .map_err(|e| AppError::from_libsql("Failed to open transaction stream", e))?;
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| AppError::from_libsql("Failed to enable foreign keys", e))?;

        let tx = conn
            .transaction()
            .await
            .map_err(|e| AppError::from_libsql("Failed to begin transaction", e))?;

        if let Err(err) = self.insert_user(&tx, &user_id, key.as_ref()).await {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "Rollback of user creation failed");
            }
            return Err(err);
        }

        tx.commit()
            .await
            .map_err(|e| AppError::from_libsql("Failed to commit user", e))?;

        debug!(user_id = %user_id, with_key = key.is_some(), "User created");
        Ok(user_id)
    }

    async fn get_session(&self, id: &str) -> AppResult<Option<Session>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = ?1",
            SESSIONS.column_list(),
            self.sessions
        );
        let sessions = self
            .fetch("Failed to fetch session", &sql, vec![values::text(id)], row_to_session)
            .await?;
        Ok(sessions.into_iter().next())
    }

    async fn get_sessions_by_user_id(&self, user_id: &str) -> AppResult<Vec<Session>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE user_id = ?1",
            SESSIONS.column_list(),
            self.sessions
        );
        self.fetch(
            "Failed to fetch sessions",
            &sql,
            vec![values::text(user_id)],
            row_to_session,
        )
        .await
    }

    async fn set_session(&self, session: &Session) -> AppResult<()> {
        let sql = format!(
            "INSERT INTO {} ({}) VALUES (?1, ?2, ?3, ?4)",
            self.sessions,
            SESSIONS.column_list()
        );
        self.execute(
            "Failed to insert session",
            &sql,
            vec![
                values::text(&session.id),
                values::text(&session.user_id),
                values::blob_bigint(session.active_expires),
                values::blob_bigint(session.idle_expires),
            ],
        )
        .await?;
        Ok(())
    }

    async fn update_session(&self, id: &str, update: &SessionUpdate) -> AppResult<WriteResult> {
        if update.is_empty() {
            return Ok(WriteResult::new(0));
        }
        let changes = SessionStoreProcessor::session_changes(update);

        let mut assignments = Vec::with_capacity(changes.len());
        let mut params = Vec::with_capacity(changes.len() + 1);
        for (column, value) in changes {
            params.push(values::blob_bigint(value));
            assignments.push(format!("{} = ?{}", column, params.len()));
        }
        params.push(values::text(id));

        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?{}",
            self.sessions,
            assignments.join(", "),
            params.len()
        );
        let rows = self.execute("Failed to update session", &sql, params).await?;
        Ok(WriteResult::new(rows))
    }

    async fn delete_session(&self, id: &str) -> AppResult<WriteResult> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", self.sessions);
        let rows = self
            .execute("Failed to delete session", &sql, vec![values::text(id)])
            .await?;
        Ok(WriteResult::new(rows))
    }

    async fn delete_sessions_by_user_id(&self, user_id: &str) -> AppResult<WriteResult> {
        let sql = format!("DELETE FROM {} WHERE user_id = ?1", self.sessions);
        let rows = self
            .execute("Failed to delete sessions", &sql, vec![values::text(user_id)])
            .await?;
        Ok(WriteResult::new(rows))
    }

    async fn get_key(&self, id: &str) -> AppResult<Option<Key>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = ?1",
            KEYS.column_list(),
            self.keys
        );
        let keys = self
            .fetch("Failed to fetch key", &sql, vec![values::text(id)], row_to_key)
            .await?;
        Ok(keys.into_iter().next())
    }

    async fn get_keys_by_user_id(&self, user_id: &str) -> AppResult<Vec<Key>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE user_id = ?1",
            KEYS.column_list(),
            self.keys
        );
        self.fetch("Failed to fetch keys", &sql, vec![values::text(user_id)], row_to_key)
            .await
    }

    async fn set_key(&self, key: &Key) -> AppResult<()> {
        let sql = format!(
            "INSERT INTO {} ({}) VALUES (?1, ?2, ?3)",
            self.keys,
            KEYS.column_list()
        );
        self.execute(
            "Failed to insert key",
            &sql,
            vec![
                values::text(&key.id),
                values::text(&key.user_id),
                values::opt_text(key.hashed_password.as_deref()),
            ],
        )
        .await?;
        Ok(())
    }

    async fn update_key(
        &self,
        id: &str,
        hashed_password: Option<&str>,
    ) -> AppResult<WriteResult> {
        let sql = format!("UPDATE {} SET hashed_password = ?1 WHERE id = ?2", self.keys);
        let rows = self
            .execute(
                "Failed to update key",
                &sql,
                vec![values::opt_text(hashed_password), values::text(id)],
            )
            .await?;
        Ok(WriteResult::new(rows))
    }

    async fn delete_key(&self, id: &str) -> AppResult<WriteResult> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", self.keys);
        let rows = self
            .execute("Failed to delete key", &sql, vec![values::text(id)])
            .await?;
        Ok(WriteResult::new(rows))
    }

    async fn delete_keys_by_user_id(&self, user_id: &str) -> AppResult<WriteResult> {
        let sql = format!("DELETE FROM {} WHERE user_id = ?1", self.keys);
        let rows = self
            .execute("Failed to delete keys", &sql, vec![values::text(user_id)])
            .await?;
        Ok(WriteResult::new(rows))
    }
}
