use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::state::AppState;

use super::{Principal, SecurityContext};

/// Extractor for handlers that require an authenticated caller.
///
/// The authenticate middleware is advisory and always forwards the request;
/// this extractor is where anonymous callers are actually rejected (401).
pub struct CurrentUser(pub Principal);

impl FromRequestParts<AppState> for CurrentUser
where
    AppState: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SecurityContext>()
            .and_then(|ctx| ctx.current_principal().cloned())
            .map(CurrentUser)
            .ok_or(AppError::Unauthorized)
    }
}
