//! Password hashing.
//!
//! Passwords are stored as bcrypt strings (`$2b$<cost>$<salt><digest>`), which carry
//! their own salt and cost. Both calls are CPU-bound and run on the blocking pool.

use serde::{Deserialize, Serialize};

pub use bcrypt::DEFAULT_COST;

/// Lowest cost bcrypt accepts (for tests and throwaway stores)
pub const MIN_COST: u32 = 4;

/// Stored form of a password
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PasswordHash(String);

impl PasswordHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Hash a password with a fresh random salt
pub fn hash_password(password: &str, cost: u32) -> Result<PasswordHash, bcrypt::BcryptError> {
    bcrypt::hash(password, cost).map(PasswordHash)
}

/// Check a password against a stored hash
///
/// A stored value that is not a bcrypt string is an error, not a mismatch.
pub fn verify_password(password: &str, stored: &PasswordHash) -> Result<bool, bcrypt::BcryptError> {
    bcrypt::verify(password, stored.as_str())
}
