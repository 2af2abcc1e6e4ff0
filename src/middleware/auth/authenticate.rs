//! Bearer-token authentication → SecurityContext in request extensions.
//!
//! This middleware is advisory: it converts `Authorization: Bearer <token>`
//! into an authenticated principal when everything checks out, and otherwise
//! forwards the request untouched. It never rejects. Enforcement belongs to
//! the handlers (CurrentUser extractor) so that public endpoints and
//! anonymous traffic flow through the same stack.

use std::net::SocketAddr;

use axum::{
    Router,
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderName, Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::{Principal, RequestDetails, SecurityContext};
use crate::state::AppState;

const BEARER_PREFIX: &str = "Bearer ";

/// Apply bearer authentication to a router.
///
/// Ex:
/// ```ignore
/// let v1 = middleware::auth::apply(api::v1::routes(), state.clone());
/// app = app.nest("/api/v1", v1);
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8's from_fn cannot take a State extractor; from_fn_with_state
    // passes the state explicitly.
    router.layer(middleware::from_fn_with_state(state, authenticate))
}

async fn authenticate(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    // Extract everything the resolver needs from the request up front. The
    // resolver awaits a DB lookup, and `Body` is `!Sync`, so a borrow of
    // `Request<Body>` held across that await would make the middleware future
    // `!Send` and fail the from_fn layer. The token (`&str`) and the owned
    // details we pass below are all `Send`.
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    // A context established earlier in the chain wins: authentication happens
    // at most once per request.
    let already_authenticated = req
        .extensions()
        .get::<SecurityContext>()
        .map(SecurityContext::is_authenticated)
        .unwrap_or(false);
    let details = request_details(&req);

    if let Some(principal) =
        resolve_principal(&state, authorization, already_authenticated, details).await
    {
        // Construct a fresh context and install it. Never mutate a context
        // object already attached to the request: another party could
        // observe it half-populated.
        req.extensions_mut()
            .insert(SecurityContext::authenticated(principal));
    } else if req.extensions().get::<SecurityContext>().is_none() {
        // Downstream always finds exactly one context per request.
        req.extensions_mut().insert(SecurityContext::anonymous());
    }

    // Forward unconditionally, authenticated or not.
    next.run(req).await
}

/// Resolve the request to an authenticated principal.
///
/// Every failure mode collapses to None: missing header, wrong scheme, bad
/// signature, unknown subject, expired token. A bad credential makes the
/// request anonymous; it is never an error visible to the caller at this
/// layer.
async fn resolve_principal(
    state: &AppState,
    authorization: Option<&str>,
    already_authenticated: bool,
    details: RequestDetails,
) -> Option<Principal> {
    let auth = authorization?;
    let token = auth.strip_prefix(BEARER_PREFIX)?;

    let subject = match state.tokens.extract_subject(token) {
        Ok(subject) => subject,
        Err(err) => {
            tracing::debug!(error = %err, "bearer token rejected");
            return None;
        }
    };
    if subject.is_empty() {
        return None;
    }

    if already_authenticated {
        return None;
    }

    let user = match state.users.find_by_email(&subject).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            tracing::debug!(subject = %subject, "no account for token subject");
            return None;
        }
        Err(err) => {
            tracing::warn!(error = %err, "user lookup failed during authentication");
            return None;
        }
    };

    if !state.tokens.is_valid(token, &user) {
        tracing::debug!(subject = %subject, "token failed validation against the account");
        return None;
    }

    // The embedded role claim is audit-only; authorities come from the
    // record looked up above.
    let role_claim = state.tokens.extract_claim(token, "userRole").ok();
    tracing::debug!(
        user_id = user.id,
        role_claim = ?role_claim,
        remote_addr = ?details.remote_addr,
        request_id = ?details.request_id,
        "request authenticated"
    );

    Some(Principal::from_user(&user, details))
}

fn request_details(req: &Request<Body>) -> RequestDetails {
    RequestDetails {
        remote_addr: req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0),
        request_id: req
            .headers()
            .get(HeaderName::from_static("x-request-id"))
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned),
    }
}
