use crate::core::error::{AppError, Result};

/// One-way salted password hashing (bcrypt). Both operations run on the
/// blocking pool so request workers are never stalled by the key schedule.
#[derive(Debug, Clone, Copy)]
pub struct PasswordService {
    cost: u32,
}

impl PasswordService {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub async fn hash(&self, password: &str) -> Result<String> {
        let password = password.to_owned();
        let cost = self.cost;

        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
            .map_err(|e| {
                tracing::error!("Failed to hash password: {}", e);
                AppError::Internal(format!("Failed to hash password: {}", e))
            })
    }

    /// Uses bcrypt's own comparison. A malformed stored hash counts as a mismatch.
    pub async fn verify(&self, password: &str, hashed_password: &str) -> Result<bool> {
        let password = password.to_owned();
        let hashed_password = hashed_password.to_owned();

        let verified = tokio::task::spawn_blocking(move || {
            bcrypt::verify(password, &hashed_password).unwrap_or_else(|e| {
                tracing::warn!("Stored password hash could not be parsed: {}", e);
                false
            })
        })
        .await
        .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))?;

        Ok(verified)
    }
}
