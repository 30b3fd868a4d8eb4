use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use async_trait::async_trait;

use mm_core::ports::{HashError, PasswordHasherPort};

/// Argon2id digests with a random per-password salt.
pub struct Argon2PasswordHasher;

#[async_trait]
impl PasswordHasherPort for Argon2PasswordHasher {
    async fn hash(&self, plain: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let digest = argon2
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| HashError(e.to_string()))?;
        Ok(digest.to_string())
    }

    async fn verify(&self, plain: &str, digest: &str) -> Result<bool, HashError> {
        let parsed = PasswordHash::new(digest).map_err(|e| HashError(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok())
    }
}
