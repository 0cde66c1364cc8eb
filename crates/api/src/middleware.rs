use axum::{
    extract::{Request, State},
    http::header::SET_COOKIE,
    middleware::Next,
    response::{IntoResponse, Response},
};

use storefront_auth::{Identity, ValidatedToken};

use crate::app::errors::ApiError;
use crate::context::IdentityContext;
use crate::session::{self, JWT_COOKIE, SessionCarrier};

/// Identity resolver.
///
/// - no cookie: guest, nothing attached to the response
/// - valid cookie: the claim's identity, plus a refreshed cookie unless the
///   handler already set one (login, logout)
/// - cookie present but invalid or expired: `401 Session expired` and the
///   cookie is revoked
pub async fn resolve_identity(
    State(sessions): State<SessionCarrier>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(token) = session::read_cookie(req.headers(), JWT_COOKIE) else {
        req.extensions_mut()
            .insert(IdentityContext::new(Identity::GUEST));
        return next.run(req).await;
    };

    let ValidatedToken { identity, claim } = match sessions.codec().validate(&token) {
        Ok(validated) => validated,
        Err(e) => {
            tracing::info!(reason = %e, "rejecting session cookie");
            return session_expired(&sessions);
        }
    };

    let refreshed = match sessions.refresh(&claim) {
        Ok(cookie) => cookie,
        Err(e) => return ApiError::from(e).into_response(),
    };

    req.extensions_mut().insert(IdentityContext::new(identity));
    let mut response = next.run(req).await;

    if !session::sets_cookie(response.headers(), JWT_COOKIE) {
        response.headers_mut().append(SET_COOKIE, refreshed);
    }
    response
}

fn session_expired(sessions: &SessionCarrier) -> Response {
    let mut response = ApiError::SessionExpired.into_response();
    response
        .headers_mut()
        .append(SET_COOKIE, sessions.revocation_cookie());
    response
}
