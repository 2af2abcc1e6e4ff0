/*
 * Responsibility
 * - Authenticated-profile handler
 * - CurrentUser rejects anonymous callers with 401; the middleware itself
 *   never does
 */
use axum::Json;

use crate::api::v1::dto::users::MeResponse;
use crate::api::v1::extractors::CurrentUser;

pub async fn me(CurrentUser(principal): CurrentUser) -> Json<MeResponse> {
    Json(MeResponse {
        id: principal.user_id,
        email: principal.username,
        role: principal.role.to_string(),
        authorities: principal.authorities,
    })
}
