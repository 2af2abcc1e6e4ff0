/*
 * Responsibility
 * - Register/login request/response DTOs
 * - validate() does format checks only; credential checks live in the flow
 */
use serde::{Deserialize, Serialize};

use crate::services::auth::flow::Registration;

// bcrypt truncates at 72 bytes.
const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 72;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.email.trim().is_empty() || !self.email.contains('@') {
            return Err("a valid email is required");
        }
        if self.first_name.trim().is_empty() {
            return Err("first_name is required");
        }
        if self.last_name.trim().is_empty() {
            return Err("last_name is required");
        }
        if self.password.len() < MIN_PASSWORD_LENGTH {
            return Err("password must be at least 8 characters");
        }
        if self.password.len() > MAX_PASSWORD_LENGTH {
            return Err("password must be at most 72 characters");
        }
        Ok(())
    }

    pub fn into_registration(self) -> Registration {
        Registration {
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            password: self.password,
            confirm_password: self.confirm_password,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.email.trim().is_empty() {
            return Err("email is required");
        }
        if self.password.is_empty() {
            return Err("password is required");
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub first_name: String,
    pub last_name: String,
    pub user_email: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    /// Always "Bearer".
    pub token_type: String,
    /// Seconds until expiry.
    pub expires_in: u64,
}
