use super::{HashAlgorithm, HashingConfig, PasswordHasher};
use crate::error::{AppError, AppResult};
use argon2::{
    password_hash::SaltString, Algorithm, Argon2, Params, PasswordHash,
    PasswordHasher as Argon2PasswordHasher, PasswordVerifier, Version,
};

/// Argon2 password hasher with configurable variant and cost
///
/// Parallelism is fixed at 1. Verification reads the parameters from the
/// stored PHC string, so hashes made under older settings keep verifying.
pub struct Argon2Hasher {
    algorithm: HashAlgorithm,
    argon2: Argon2<'static>,
}

impl Argon2Hasher {
    pub fn new(config: &HashingConfig) -> AppResult<Self> {
        let params = Params::new(config.memory_kib, config.iterations, 1, None).map_err(|e| {
            let field = if matches!(e, argon2::Error::TimeTooSmall) {
                "HASH_ITERATIONS"
            } else {
                "HASH_MEM"
            };
            AppError::configuration(field, format!("Invalid Argon2 parameters: {}", e))
        })?;

        let variant = match config.algorithm {
            HashAlgorithm::Argon2i => Algorithm::Argon2i,
            HashAlgorithm::Argon2d => Algorithm::Argon2d,
            HashAlgorithm::Argon2id => Algorithm::Argon2id,
        };

        Ok(Self {
            algorithm: config.algorithm,
            argon2: Argon2::new(variant, Version::V0x13, params),
        })
    }

    fn generate_salt(&self) -> SaltString {
        SaltString::generate(&mut rand::thread_rng())
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = self.generate_salt();

        let password_hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| {
                AppError::Internal(format!("Failed to hash password with {}: {}", self.algorithm, e))
            })?;

        Ok(password_hash.to_string())
    }

    fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AppError::BadRequest(format!("Malformed password hash: {}", e)))?;

        match self
            .argon2
            .verify_password(password.as_bytes(), &parsed_hash)
        {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AppError::Internal(format!(
                "Failed to verify password: {}",
                e
            ))),
        }
    }

    fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }
}
