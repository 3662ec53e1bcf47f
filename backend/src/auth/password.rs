//! Password hashing using bcrypt
//!
//! Provides salted, cost-parameterized password hashing and verification.
//!
//! # Performance Considerations
//!
//! bcrypt is intentionally CPU-intensive. Request handlers use the `_async`
//! variants, which run on the blocking thread pool.

use anyhow::Result;

/// Password hashing service
///
/// Holds the configured bcrypt work factor. Cheap to clone.
#[derive(Debug, Clone, Copy)]
pub struct PasswordService {
    cost: u32,
}

impl Default for PasswordService {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl PasswordService {
    /// Create a hasher with the given bcrypt cost
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a password (blocking operation)
    ///
    /// Every call draws a fresh salt, so hashing the same password twice
    /// yields different strings.
    pub fn hash(&self, password: &str) -> Result<String> {
        bcrypt::hash(password, self.cost)
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))
    }

    /// Hash a password asynchronously (non-blocking)
    pub async fn hash_async(&self, password: String) -> Result<String> {
        let service = *self;
        tokio::task::spawn_blocking(move || service.hash(&password))
            .await
            .map_err(|e| anyhow::anyhow!("Task join error: {}", e))?
    }

    /// Verify a password against a hash (blocking operation)
    ///
    /// A malformed hash never matches.
    pub fn verify(password: &str, hash: &str) -> bool {
        bcrypt::verify(password, hash).unwrap_or(false)
    }

    /// Verify a password asynchronously (non-blocking)
    pub async fn verify_async(password: String, hash: String) -> Result<bool> {
        tokio::task::spawn_blocking(move || Self::verify(&password, &hash))
            .await
            .map_err(|e| anyhow::anyhow!("Task join error: {}", e))
    }

    /// Spend roughly the cost of one verification and discard the result
    ///
    /// Used when a login names an unknown email, so both failure paths take
    /// about as long. Hashing and verifying cost the same at a given cost.
    pub async fn burn_verification(&self, password: String) -> Result<()> {
        self.hash_async(password).await.map(|_| ())
    }
}
