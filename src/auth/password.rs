//! Argon2id credential hashing.
//!
//! Hashing is CPU-bound and runs on the blocking pool. Each hash gets a fresh
//! random salt and is stored as a self-describing PHC string, so hashes made
//! with older cost parameters still verify.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tokio::task;

use crate::config::HashCost;
use crate::error::{AppError, AppResult};

/// Salted one-way hasher for user passwords.
#[derive(Clone)]
pub struct CredentialHasher {
    params: Params,
}

impl CredentialHasher {
    /// Build a hasher with the given cost.
    pub fn new(cost: HashCost) -> AppResult<Self> {
        let params = Params::new(cost.memory_kib, cost.time_cost, cost.parallelism, None)
            .map_err(|e| AppError::Internal(format!("Invalid hash parameters: {e}")))?;
        Ok(Self { params })
    }

    /// Hash `plaintext` with a fresh random salt.
    pub async fn hash(&self, plaintext: &str) -> AppResult<String> {
        let params = self.params.clone();
        let plaintext = plaintext.to_string();

        task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
                .hash_password(plaintext.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
        })
        .await
        .map_err(|e| AppError::Internal(format!("Password hashing task panicked: {e}")))?
    }

    /// Check `plaintext` against a stored hash.
    ///
    /// A stored value that is not a valid PHC string never matches.
    pub async fn verify(&self, plaintext: &str, stored_hash: &str) -> bool {
        let plaintext = plaintext.to_string();
        let stored_hash = stored_hash.to_string();

        let result = task::spawn_blocking(move || {
            let Ok(parsed_hash) = PasswordHash::new(&stored_hash) else {
                return false;
            };
            Argon2::default()
                .verify_password(plaintext.as_bytes(), &parsed_hash)
                .is_ok()
        })
        .await;

        match result {
            Ok(valid) => valid,
            Err(e) => {
                tracing::error!("Password verification task panicked: {}", e);
                false
            }
        }
    }
}

impl std::fmt::Debug for CredentialHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialHasher")
            .field("memory_kib", &self.params.m_cost())
            .field("time_cost", &self.params.t_cost())
            .field("parallelism", &self.params.p_cost())
            .finish()
    }
}
