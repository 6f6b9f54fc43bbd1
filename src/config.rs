use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::backend::database::DatabaseBackendConfig;
use crate::backend::DatabaseType;
use crate::error::{AppError, AppResult};
use crate::password::{Argon2Hasher, HashAlgorithm, HashingConfig};

/// Environment variables read by the application
const ENV_KEYS: [&str; 11] = [
    "HASH_ALGORITHM",
    "HASH_MEM",
    "HASH_ITERATIONS",
    "DB_DRIVER",
    "DB_URI",
    "DB_AUTH_TOKEN",
    "DB_MAX_CONNECTIONS",
    "DB_CONNECTION_TIMEOUT",
    "MAX_BOOKMARK_TITLE_LENGTH",
    "MAX_BOOKMARK_DESC_LENGTH",
    "LOG_LEVEL",
];

/// Application configuration, read once at startup.
///
/// Sources, later ones winning: built-in defaults, an optional YAML file,
/// then the environment (`DB_DRIVER`, `DB_URI`, ...).
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AppConfig {
    pub hash_algorithm: String,
    /// Argon2 memory cost in KiB
    pub hash_mem: u32,
    pub hash_iterations: u32,
    pub db_driver: String,
    pub db_uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_auth_token: Option<String>,
    pub db_max_connections: u32,
    /// Seconds
    pub db_connection_timeout: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_bookmark_title_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_bookmark_desc_length: Option<u32>,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            hash_algorithm: "argon2id".to_string(),
            hash_mem: 19456,
            hash_iterations: 2,
            db_driver: "sqlite".to_string(),
            db_uri: "bookmarks.db".to_string(),
            db_auth_token: None,
            db_max_connections: 10,
            db_connection_timeout: 30,
            max_bookmark_title_length: None,
            max_bookmark_desc_length: None,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Figment with every configuration source layered in order
    pub fn figment(config_file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));
        if let Some(path) = config_file {
            figment = figment.merge(Yaml::file(path));
        }
        figment.merge(Env::raw().only(&ENV_KEYS))
    }

    /// Load and validate. Fails on the first invalid field.
    pub fn load(config_file: Option<&Path>) -> AppResult<Self> {
        if let Some(path) = config_file {
            if !path.exists() {
                return Err(AppError::configuration(
                    "config",
                    format!("Config file not found: {}", path.display()),
                ));
            }
        }
        Self::from_figment(&Self::figment(config_file))
    }

    pub fn from_figment(figment: &Figment) -> AppResult<Self> {
        let config: AppConfig = figment.extract().map_err(|e| {
            let field = if e.path.is_empty() {
                "config".to_string()
            } else {
                e.path.join(".").to_ascii_uppercase()
            };
            AppError::configuration(field, e.to_string())
        })?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        self.db_driver
            .parse::<DatabaseType>()
            .map_err(|message| AppError::configuration("DB_DRIVER", message))?;

        if self.db_uri.trim().is_empty() {
            return Err(AppError::configuration("DB_URI", "cannot be empty"));
        }

        if self.db_max_connections == 0 {
            return Err(AppError::configuration(
                "DB_MAX_CONNECTIONS",
                "must be greater than 0",
            ));
        }

        Self::required_length("MAX_BOOKMARK_TITLE_LENGTH", self.max_bookmark_title_length)?;
        Self::required_length("MAX_BOOKMARK_DESC_LENGTH", self.max_bookmark_desc_length)?;

        // Builds the hasher once so rejected argon2 parameters surface here.
        Argon2Hasher::new(&self.hashing_config()?)?;

        Ok(())
    }

    fn required_length(field: &str, value: Option<u32>) -> AppResult<u32> {
        match value {
            None => Err(AppError::configuration(field, "is required")),
            Some(0) => Err(AppError::configuration(field, "must be greater than 0")),
            Some(length) => Ok(length),
        }
    }

    pub fn database_type(&self) -> DatabaseType {
        DatabaseType::select(Some(&self.db_driver))
    }

    pub fn hashing_config(&self) -> AppResult<HashingConfig> {
        Ok(HashingConfig {
            algorithm: self.hash_algorithm.parse::<HashAlgorithm>()?,
            memory_kib: self.hash_mem,
            iterations: self.hash_iterations,
        })
    }

    /// Maximum bookmark title length for request validation upstream
    pub fn max_bookmark_title_length(&self) -> u32 {
        self.max_bookmark_title_length.unwrap_or_default()
    }

    /// Maximum bookmark description length for request validation upstream
    pub fn max_bookmark_desc_length(&self) -> u32 {
        self.max_bookmark_desc_length.unwrap_or_default()
    }

    /// Connection settings consumed by the backend factory
    pub fn database_backend_config(&self) -> DatabaseBackendConfig {
        DatabaseBackendConfig::new(self.database_type(), self.db_uri.clone())
            .with_auth_token(self.db_auth_token.clone())
            .with_max_connections(self.db_max_connections)
            .with_connection_timeout(self.db_connection_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn required_lengths(jail: &mut Jail) {
        jail.set_env("MAX_BOOKMARK_TITLE_LENGTH", "255");
        jail.set_env("MAX_BOOKMARK_DESC_LENGTH", "1024");
    }

    #[test]
    fn test_defaults_with_required_lengths() {
        Jail::expect_with(|jail| {
            required_lengths(jail);
            let config = AppConfig::load(None).unwrap();

            assert_eq!(config.db_driver, "sqlite");
            assert_eq!(config.db_uri, "bookmarks.db");
            assert_eq!(config.hash_algorithm, "argon2id");
            assert_eq!(config.hash_mem, 19456);
            assert_eq!(config.hash_iterations, 2);
            assert_eq!(config.max_bookmark_title_length(), 255);
            assert_eq!(config.max_bookmark_desc_length(), 1024);
            assert_eq!(config.database_type(), DatabaseType::SQLite);
            Ok(())
        });
    }

    #[test]
    fn test_missing_required_length() {
        Jail::expect_with(|jail| {
            jail.set_env("MAX_BOOKMARK_DESC_LENGTH", "1024");
            let err = AppConfig::load(None).unwrap_err();
            match err {
                AppError::Configuration { field, .. } => {
                    assert_eq!(field, "MAX_BOOKMARK_TITLE_LENGTH")
                }
                other => panic!("unexpected error: {}", other),
            }
            Ok(())
        });
    }

    #[test]
    fn test_unknown_driver_rejected() {
        Jail::expect_with(|jail| {
            required_lengths(jail);
            jail.set_env("DB_DRIVER", "oracle");
            let err = AppConfig::load(None).unwrap_err();
            assert!(matches!(err, AppError::Configuration { ref field, .. } if field == "DB_DRIVER"));
            Ok(())
        });
    }

    #[test]
    fn test_unknown_hash_algorithm_rejected() {
        Jail::expect_with(|jail| {
            required_lengths(jail);
            jail.set_env("HASH_ALGORITHM", "md5");
            let err = AppConfig::load(None).unwrap_err();
            assert!(
                matches!(err, AppError::Configuration { ref field, .. } if field == "HASH_ALGORITHM")
            );
            Ok(())
        });
    }

    #[test]
    fn test_non_numeric_value_names_field() {
        Jail::expect_with(|jail| {
            required_lengths(jail);
            jail.set_env("HASH_MEM", "lots");
            let err = AppConfig::load(None).unwrap_err();
            assert!(matches!(err, AppError::Configuration { ref field, .. } if field == "HASH_MEM"));
            Ok(())
        });
    }

    #[test]
    fn test_yaml_file_then_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "bookmarks.yaml",
                r#"
db_driver: postgres
db_uri: postgres://app:secret@db/bookmarks
max_bookmark_title_length: 100
max_bookmark_desc_length: 500
"#,
            )?;
            jail.set_env("DB_MAX_CONNECTIONS", "4");

            let config = AppConfig::load(Some(Path::new("bookmarks.yaml"))).unwrap();
            let backend = config.database_backend_config();

            assert_eq!(backend.database_type, DatabaseType::PostgreSQL);
            assert_eq!(backend.connection_url, "postgres://app:secret@db/bookmarks");
            assert_eq!(backend.max_connections, 4);
            assert!(backend.auth_token.is_none());
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_yaml() {
        Jail::expect_with(|jail| {
            jail.create_file("bookmarks.yaml", "db_uri: from-file.db\n")?;
            required_lengths(jail);
            jail.set_env("DB_URI", "from-env.db");
            jail.set_env("DB_AUTH_TOKEN", "tok");

            let config = AppConfig::load(Some(Path::new("bookmarks.yaml"))).unwrap();
            assert_eq!(config.db_uri, "from-env.db");
            assert_eq!(config.db_auth_token.as_deref(), Some("tok"));
            Ok(())
        });
    }

    #[test]
    fn test_missing_config_file() {
        let err = AppConfig::load(Some(Path::new("/nonexistent/bookmarks.yaml"))).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_rejected_argon2_parameters() {
        Jail::expect_with(|jail| {
            required_lengths(jail);
            jail.set_env("HASH_ITERATIONS", "0");
            let err = AppConfig::load(None).unwrap_err();
            assert!(
                matches!(err, AppError::Configuration { ref field, .. } if field == "HASH_ITERATIONS")
            );
            Ok(())
        });
    }
}
