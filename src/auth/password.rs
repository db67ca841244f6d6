//! Password hashing

use argon2::{
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;

use crate::config::AuthConfig;
use crate::error::{BankError, BankResult};

/// Argon2id hasher with configurable cost.
#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
    /// Hash of no real password, verified against when there is no user.
    decoy: String,
}

impl PasswordHasher {
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> BankResult<Self> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| BankError::Config(format!("invalid argon2 parameters: {}", e)))?;
        let mut hasher = Self {
            params,
            decoy: String::new(),
        };
        hasher.decoy = hasher.hash("decoy-password-without-an-owner")?;
        Ok(hasher)
    }

    pub fn from_config(config: &AuthConfig) -> BankResult<Self> {
        Self::new(
            config.argon2_memory_kib,
            config.argon2_iterations,
            config.argon2_parallelism,
        )
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a password into a PHC string (salt included).
    pub fn hash(&self, password: &str) -> BankResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| BankError::Internal(format!("password hashing failed: {}", e)))
    }

    /// Verify a password against a stored hash. A malformed hash is an error,
    /// a mismatch is `Ok(false)`.
    pub fn verify(&self, password: &str, password_hash: &str) -> BankResult<bool> {
        let parsed = PasswordHash::new(password_hash)
            .map_err(|e| BankError::Internal(format!("stored password hash is invalid: {}", e)))?;
        // params come from the PHC string, so older hashes keep verifying
        Ok(self.argon2().verify_password(password.as_bytes(), &parsed).is_ok())
    }

    /// Spend the cost of one verification without a stored hash, so an
    /// unknown username takes as long to reject as a wrong password.
    pub fn verify_decoy(&self, password: &str) {
        if let Err(e) = self.verify(password, &self.decoy) {
            tracing::warn!("decoy verification failed: {}", e);
        }
    }
}
