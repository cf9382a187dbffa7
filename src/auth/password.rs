//! bcrypt password hashing.
//!
//! bcrypt is deliberately slow, so request handlers go through the async
//! wrappers which run the work on the blocking pool.

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),
    #[error("password task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub fn hash_password(password: &str, cost: u32) -> Result<String, PasswordError> {
    Ok(bcrypt::hash(password, cost)?)
}

/// Compare a plaintext password against a stored hash.
///
/// A malformed stored hash counts as a mismatch rather than an error.
pub fn verify_password(password: &str, hash: &str) -> bool {
    if hash.is_empty() {
        return false;
    }
    bcrypt::verify(password, hash).unwrap_or(false)
}

pub async fn hash_password_async(password: String, cost: u32) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_password(&password, cost)).await?
}

pub async fn verify_password_async(password: String, hash: String) -> Result<bool, PasswordError> {
    Ok(tokio::task::spawn_blocking(move || verify_password(&password, &hash)).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("segredo123", 4).unwrap();
        assert!(hash.starts_with("$2"));
        assert!(verify_password("segredo123", &hash));
        assert!(!verify_password("segredo124", &hash));
    }

    #[test]
    fn malformed_hash_never_matches() {
        assert!(!verify_password("anything", "plaintext-not-a-hash"));
        assert!(!verify_password("anything", ""));
    }

    #[tokio::test]
    async fn async_wrappers_agree_with_sync_versions() {
        let hash = hash_password_async("banca-segura".to_string(), 4).await.unwrap();
        assert!(verify_password_async("banca-segura".to_string(), hash.clone()).await.unwrap());
        assert!(!verify_password_async("outra".to_string(), hash).await.unwrap());
    }
}
