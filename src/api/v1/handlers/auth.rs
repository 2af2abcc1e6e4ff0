/*
 * Responsibility
 * - /auth register/login handlers
 * - Json extractor → DTO validation → flow call → DTO mapping
 */
use axum::{Json, extract::State, http::StatusCode};

use crate::api::v1::dto::auth::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use crate::error::AppError;
use crate::repos::user_repo::Role;
use crate::state::AppState;

pub async fn register_user(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    register(state, req, Role::User).await
}

pub async fn register_admin(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    register(state, req, Role::Admin).await
}

async fn register(
    state: AppState,
    req: RegisterRequest,
    role: Role,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    req.validate()
        .map_err(|m| AppError::InvalidRequest(m.to_string()))?;

    let user = state.auth.register(req.into_registration(), role).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            first_name: user.first_name,
            last_name: user.last_name,
            user_email: user.email,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    req.validate()
        .map_err(|m| AppError::InvalidRequest(m.to_string()))?;

    let out = state.auth.login(&req.email, &req.password).await?;

    Ok(Json(LoginResponse {
        access_token: out.access_token,
        token_type: out.token_type.to_string(),
        expires_in: out.expires_in,
    }))
}
