//! Stateless password-hashing capability.
//!
//! Injected into the account service at construction so there is no
//! process-wide encoder singleton and tests can substitute a cheap double.

/// Errors raised by hashing adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PasswordHashError {
    #[error("password hashing failed: {message}")]
    Hash { message: String },
}

impl PasswordHashError {
    pub fn hash(message: impl Into<String>) -> Self {
        Self::Hash {
            message: message.into(),
        }
    }
}

/// One-way adaptive hashing of stored credentials. Plain text is never
/// stored or compared; verification happens against the stored hash only.
#[cfg_attr(test, mockall::automock)]
pub trait PasswordHasher: Send + Sync {
    /// Hash a plain-text password for storage.
    fn hash(&self, password: &str) -> Result<String, PasswordHashError>;

    /// Check a plain-text password against a stored hash.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordHashError>;
}
