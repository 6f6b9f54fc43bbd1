use crate::error::{AppError, AppResult};
use crate::models::{Key, NewUser, SessionUpdate};

/// Shared checks for the session-store adapters
pub struct SessionStoreProcessor;

impl SessionStoreProcessor {
    /// Resolve the id of a user about to be created
    pub fn prepare_user_id(user: &NewUser) -> AppResult<String> {
        match user.id.as_deref() {
            Some(id) if id.trim().is_empty() => Err(AppError::constraint("User id cannot be empty")),
            Some(id) => Ok(id.to_string()),
            None => Ok(crate::utils::generate_id()),
        }
    }

    /// The first key created together with a user always belongs to it
    pub fn key_for_user(key: &Key, user_id: &str) -> AppResult<Key> {
        if key.id.trim().is_empty() {
            return Err(AppError::constraint("Key id cannot be empty"));
        }
        Ok(Key {
            id: key.id.clone(),
            user_id: user_id.to_string(),
            hashed_password: key.hashed_password.clone(),
        })
    }

    /// Session columns touched by an update, in declaration order
    pub fn session_changes(update: &SessionUpdate) -> Vec<(&'static str, i64)> {
        let mut changes = Vec::new();
        if let Some(active) = update.active_expires {
            changes.push(("active_expires", active));
        }
        if let Some(idle) = update.idle_expires {
            changes.push(("idle_expires", idle));
        }
        changes
    }
}
