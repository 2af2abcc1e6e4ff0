/*
 * Responsibility
 * - Shared context bound to the Router (AppState)
 * - Clone is cheap: everything inside is Arc
 */
use std::sync::Arc;

use crate::repos::user_repo::UserStore;
use crate::services::auth::{flow::AuthFlow, token::TokenService};

#[derive(Clone)]
pub struct AppState {
    /// Register/login orchestration.
    pub auth: Arc<AuthFlow>,
    /// Token issuance and verification. Holds the process-lifetime key.
    pub tokens: Arc<TokenService>,
    /// User lookup used by the authentication middleware.
    pub users: Arc<dyn UserStore>,
}

impl AppState {
    pub fn new(auth: Arc<AuthFlow>, tokens: Arc<TokenService>, users: Arc<dyn UserStore>) -> Self {
        Self {
            auth,
            tokens,
            users,
        }
    }
}
