//! Password hashing and verification (bcrypt).
//!
//! Only the register/login flow touches passwords; token validation never
//! does. bcrypt runs on the blocking thread pool so a login burst cannot
//! stall the async runtime.

use bcrypt::{hash, verify};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("hashing failed: {0}")]
    Hashing(String),
}

#[derive(Clone)]
pub struct PasswordVerifier {
    cost: u32,
}

impl PasswordVerifier {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub async fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        let plaintext = plaintext.to_string();
        let cost = self.cost;

        tokio::task::spawn_blocking(move || {
            hash(plaintext, cost).map_err(|e| PasswordError::Hashing(e.to_string()))
        })
        .await
        .map_err(|e| PasswordError::Hashing(format!("join error: {}", e)))?
    }

    /// `false` both for a mismatch and for an unparseable stored hash; a bad
    /// hash is logged but presented to the caller as bad credentials.
    pub async fn matches(&self, plaintext: &str, password_hash: &str) -> bool {
        let plaintext = plaintext.to_string();
        let password_hash = password_hash.to_string();

        let result =
            tokio::task::spawn_blocking(move || verify(plaintext, &password_hash)).await;

        match result {
            Ok(Ok(matched)) => matched,
            Ok(Err(e)) => {
                warn!(error = %e, "stored password hash failed to verify");
                false
            }
            Err(e) => {
                warn!(error = %e, "password verification task failed");
                false
            }
        }
    }
}
