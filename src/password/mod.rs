use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod argon2_hasher;

pub use argon2_hasher::Argon2Hasher;

/// Argon2 variant used for new password hashes (`HASH_ALGORITHM`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Argon2i,
    Argon2d,
    Argon2id,
}

impl Default for HashAlgorithm {
    fn default() -> Self {
        Self::Argon2id
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Argon2i => write!(f, "argon2i"),
            Self::Argon2d => write!(f, "argon2d"),
            Self::Argon2id => write!(f, "argon2id"),
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "argon2i" => Ok(Self::Argon2i),
            "argon2d" => Ok(Self::Argon2d),
            "argon2id" => Ok(Self::Argon2id),
            other => Err(AppError::configuration(
                "HASH_ALGORITHM",
                format!(
                    "unsupported algorithm '{}', expected argon2i, argon2d or argon2id",
                    other
                ),
            )),
        }
    }
}

/// Hashing parameters handed to the authentication layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashingConfig {
    pub algorithm: HashAlgorithm,
    /// Memory cost in KiB
    pub memory_kib: u32,
    pub iterations: u32,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::Argon2id,
            memory_kib: 19456,
            iterations: 2,
        }
    }
}

/// Abstract trait for password hashing algorithms
pub trait PasswordHasher: Send + Sync {
    /// Hash a plaintext password into a PHC string
    fn hash_password(&self, password: &str) -> AppResult<String>;

    /// Verify a plaintext password against a PHC string
    fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool>;

    fn algorithm(&self) -> HashAlgorithm;
}

/// Build the hasher described by the configuration
pub fn hasher_from_config(config: &HashingConfig) -> AppResult<Box<dyn PasswordHasher>> {
    Ok(Box::new(Argon2Hasher::new(config)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algorithm_parse() {
        assert_eq!("argon2id".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Argon2id);
        assert_eq!("Argon2i".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Argon2i);
        let err = "bcrypt".parse::<HashAlgorithm>().unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_default_config() {
        let config = HashingConfig::default();
        assert_eq!(config.algorithm, HashAlgorithm::Argon2id);
        assert_eq!(config.memory_kib, 19456);
        assert_eq!(config.iterations, 2);
    }
}
