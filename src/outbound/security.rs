//! bcrypt adapter for the password-hasher port.

use crate::domain::ports::{PasswordHashError, PasswordHasher};

/// Hashes passwords with bcrypt. Stateless; the cost factor is fixed at
/// construction so tests can trade strength for speed.
#[derive(Debug, Clone, Copy)]
pub struct BcryptPasswordHasher {
    cost: u32,
}

impl BcryptPasswordHasher {
    /// Hasher with an explicit cost factor (minimum 4).
    pub fn with_cost(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptPasswordHasher {
    fn default() -> Self {
        Self {
            cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl PasswordHasher for BcryptPasswordHasher {
    fn hash(&self, password: &str) -> Result<String, PasswordHashError> {
        bcrypt::hash(password, self.cost).map_err(|err| PasswordHashError::hash(err.to_string()))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordHashError> {
        bcrypt::verify(password, hash).map_err(|err| PasswordHashError::hash(err.to_string()))
    }
}
