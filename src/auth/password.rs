//! Password Hashing
//! Mission: One-way salted hashes for stored credentials

use anyhow::{Context, Result};
use tracing::warn;

/// Lowest work factor bcrypt accepts
pub const MIN_COST: u32 = 4;
/// Highest work factor bcrypt accepts
pub const MAX_COST: u32 = 31;

/// bcrypt wrapper carrying the configured work factor
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl PasswordHasher {
    /// Cost is clamped into `MIN_COST..=MAX_COST`.
    pub fn new(cost: u32) -> Self {
        Self {
            cost: cost.clamp(MIN_COST, MAX_COST),
        }
    }

    /// Cheapest accepted work factor, for tests and throwaway stores
    pub fn fastest() -> Self {
        Self::new(MIN_COST)
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a plaintext password. Output differs on every call (random salt).
    pub fn hash(&self, plaintext: &str) -> Result<String> {
        bcrypt::hash(plaintext, self.cost).context("Failed to hash password")
    }

    /// Check a plaintext password against a stored hash.
    ///
    /// A stored value that is not a bcrypt hash counts as a mismatch.
    pub fn verify(&self, plaintext: &str, hash: &str) -> bool {
        match bcrypt::verify(plaintext, hash) {
            Ok(valid) => valid,
            Err(e) => {
                warn!("Stored password hash is unreadable: {}", e);
                false
            }
        }
    }
}
