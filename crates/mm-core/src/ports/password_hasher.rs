use async_trait::async_trait;

/// Opaque password hashing service.
///
/// The sync engine never inspects digests; it stores what `hash` returns
/// and trusts `verify` for local credential checks.
#[async_trait]
pub trait PasswordHasherPort: Send + Sync {
    async fn hash(&self, plain: &str) -> Result<String, HashError>;

    async fn verify(&self, plain: &str, digest: &str) -> Result<bool, HashError>;
}

#[derive(Debug, thiserror::Error)]
#[error("password hashing failed: {0}")]
pub struct HashError(pub String);
