/*
 * Responsibility
 * - Response DTO for the authenticated-profile endpoint
 */
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: i64,
    pub email: String,
    pub role: String,
    pub authorities: Vec<String>,
}
