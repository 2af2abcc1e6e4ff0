/*!
 * Security context extractor
 *
 * Responsibility:
 * - Give handlers the request-scoped security context (and the authenticated
 *   principal inside it)
 * - HTTP / axum wiring stays in core; the types themselves live in types
 *
 * Public API:
 * - SecurityContext, Principal, RequestDetails
 * - CurrentUser
 */

mod core;
mod types;

pub use core::CurrentUser;
pub use types::{Principal, RequestDetails, SecurityContext};
