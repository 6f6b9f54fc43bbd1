use thiserror::Error;

/// Engine-specific error kept intact so callers can inspect backend detail.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Libsql(#[from] libsql::Error),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error at `{field}`: {message}")]
    Configuration { field: String, message: String },

    #[error("Connection error ({driver}): {message}")]
    Connection { driver: String, message: String },

    #[error("Constraint violation: {message}")]
    Constraint {
        message: String,
        #[source]
        source: Option<BackendError>,
    },

    #[error("{context}: {source}")]
    Database {
        context: String,
        #[source]
        source: BackendError,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn configuration(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn connection(driver: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection {
            driver: driver.into(),
            message: message.into(),
        }
    }

    /// Constraint violation detected before reaching the engine
    pub fn constraint(message: impl Into<String>) -> Self {
        Self::Constraint {
            message: message.into(),
            source: None,
        }
    }

    pub fn is_constraint(&self) -> bool {
        matches!(self, Self::Constraint { .. })
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    /// Classify an sqlx failure: integrity violations become `Constraint`,
    /// everything else is reported as a `Database` error with context.
    pub fn from_sqlx(context: &str, err: sqlx::Error) -> Self {
        use sqlx::error::ErrorKind;

        let constraint_message = match &err {
            sqlx::Error::Database(db_err) => match db_err.kind() {
                ErrorKind::UniqueViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::ForeignKeyViolation
                | ErrorKind::CheckViolation => Some(db_err.message().to_string()),
                _ => None,
            },
            _ => None,
        };

        match constraint_message {
            Some(message) => Self::Constraint {
                message: format!("{}: {}", context, message),
                source: Some(BackendError::Sqlx(err)),
            },
            None => Self::Database {
                context: context.to_string(),
                source: BackendError::Sqlx(err),
            },
        }
    }

    /// Classify a libsql failure. Remote (hrana) errors only expose the
    /// SQLite message text, so detection goes by the "constraint failed" marker.
    pub fn from_libsql(context: &str, err: libsql::Error) -> Self {
        let message = err.to_string();
        if message.contains("constraint failed") || message.contains("SQLITE_CONSTRAINT") {
            Self::Constraint {
                message: format!("{}: {}", context, message),
                source: Some(BackendError::Libsql(err)),
            }
        } else {
            Self::Database {
                context: context.to_string(),
                source: BackendError::Libsql(err),
            }
        }
    }
}
