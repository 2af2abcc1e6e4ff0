/*
 * Responsibility
 * - The types handlers see for "who is calling"
 * - The authenticate middleware verifies the bearer token and installs a
 *   SecurityContext into request extensions; handlers only read these types
 *
 * Notes
 * - Request-scoped by construction: the context travels with the request,
 *   never through process-wide or thread-local state
 */

use std::net::SocketAddr;

use crate::repos::user_repo::{Role, UserRecord};

/// Metadata captured from the request at the moment of authentication.
/// Opaque to authorization decisions; useful for audit logs.
#[derive(Debug, Clone, Default)]
pub struct RequestDetails {
    /// Peer address, when the listener provides connect info.
    pub remote_addr: Option<SocketAddr>,
    /// x-request-id header, set by the request-id layer.
    pub request_id: Option<String>,
}

/// The authenticated identity attached to a request.
///
/// Authorities are derived from the user record looked up during this
/// request, not from the token's embedded role claim, so a role change takes
/// effect without reissuing tokens.
#[derive(Debug, Clone)]
pub struct Principal {
    pub username: String,
    pub user_id: i64,
    pub role: Role,
    pub authorities: Vec<String>,
    pub details: RequestDetails,
}

impl Principal {
    pub fn from_user(user: &UserRecord, details: RequestDetails) -> Self {
        Self {
            username: user.email.clone(),
            user_id: user.id,
            role: user.role,
            authorities: user.authorities(),
            details,
        }
    }
}

/// Request-scoped holder of the current principal, if any.
///
/// Exactly one of these exists per in-flight request once the authenticate
/// middleware has run. An authenticated context is never replaced within the
/// same request; a second authentication pass is a no-op.
#[derive(Debug, Clone, Default)]
pub struct SecurityContext {
    principal: Option<Principal>,
}

impl SecurityContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(principal: Principal) -> Self {
        Self {
            principal: Some(principal),
        }
    }

    pub fn current_principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }
}
