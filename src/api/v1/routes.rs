/*
 * Responsibility
 * - v1 URL structure
 * - Bearer authentication is layered over this whole router in app.rs;
 *   /users/me is the enforced (401 on anonymous) surface
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use crate::api::v1::handlers::{
    auth::{login, register_admin, register_user},
    health::health,
    users::me,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(register_user))
        .route("/auth/admin/register", post(register_admin))
        .route("/auth/login", post(login))
        .route("/users/me", get(me))
}
