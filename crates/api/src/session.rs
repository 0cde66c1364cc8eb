//! Session Carrier: binds session tokens to cookies.

use std::sync::Arc;
use std::time::Duration;

use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use storefront_auth::{Identity, IdentityClaim, TOKEN_TTL, TokenCodec, TokenError};

/// Cookie carrying the session token of the token flow.
pub const JWT_COOKIE: &str = "jwt_access_token";

/// Cookie set by the cookie flow.
pub const ACCESS_COOKIE: &str = "access_token";

/// Issues, refreshes and revokes session cookies.
#[derive(Debug, Clone)]
pub struct SessionCarrier {
    codec: Arc<TokenCodec>,
    secure: bool,
}

impl SessionCarrier {
    pub fn new(codec: TokenCodec, secure: bool) -> Self {
        Self {
            codec: Arc::new(codec),
            secure,
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Sign a fresh token for `identity` and wrap it in a `Set-Cookie` value.
    pub fn issue(&self, name: &str, identity: Identity) -> Result<HeaderValue, TokenError> {
        let issued = self.codec.issue(identity, TOKEN_TTL)?;
        self.cookie(name, &issued.token, TOKEN_TTL)
    }

    /// Sliding refresh: same subject and role, new expiry.
    pub fn refresh(&self, claim: &IdentityClaim) -> Result<HeaderValue, TokenError> {
        let issued = self.codec.reissue(claim)?;
        self.cookie(JWT_COOKIE, &issued.token, TOKEN_TTL)
    }

    /// Overwrite the session cookie with a token that never validates and
    /// expires immediately.
    pub fn revocation_cookie(&self) -> HeaderValue {
        let token = self.codec.revocation_token().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to sign revocation token; clearing cookie value");
            String::new()
        });
        match self.cookie(JWT_COOKIE, &token, Duration::ZERO) {
            Ok(value) => value,
            Err(_) => HeaderValue::from_static("jwt_access_token=; Path=/; HttpOnly; Max-Age=0"),
        }
    }

    /// `204 No Content` with the revocation cookie attached.
    pub fn revoke(&self) -> Response {
        let mut response = StatusCode::NO_CONTENT.into_response();
        response
            .headers_mut()
            .append(SET_COOKIE, self.revocation_cookie());
        response
    }

    fn cookie(&self, name: &str, value: &str, max_age: Duration) -> Result<HeaderValue, TokenError> {
        let cookie = build_cookie(name, value, max_age, self.secure);
        HeaderValue::from_str(&cookie)
            .map_err(|e| TokenError::Malformed(format!("token is not a valid cookie value: {e}")))
    }
}

fn build_cookie(name: &str, value: &str, max_age: Duration, secure: bool) -> String {
    let mut cookie = format!(
        "{name}={value}; Path=/; HttpOnly; Max-Age={}; SameSite=Lax",
        max_age.as_secs()
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Value of cookie `name`, if present and non-empty.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Whether the response already sets cookie `name`.
pub fn sets_cookie(headers: &HeaderMap, name: &str) -> bool {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| {
            value
                .split_once('=')
                .is_some_and(|(key, _)| key.trim() == name)
        })
}

#[cfg(test)]
mod tests {
    use storefront_auth::{Role, SigningAlgorithm};
    use storefront_core::UserId;

    use super::*;

    fn carrier(secure: bool) -> SessionCarrier {
        SessionCarrier::new(TokenCodec::new(b"test-secret", SigningAlgorithm::Hs256), secure)
    }

    fn user() -> Identity {
        Identity::new(UserId::new(7), Role::User).unwrap()
    }

    #[test]
    fn issued_cookie_is_http_only_with_hour_lifetime() {
        let value = carrier(false).issue(JWT_COOKIE, user()).unwrap();
        let value = value.to_str().unwrap();
        assert!(value.starts_with("jwt_access_token="));
        assert!(value.contains("HttpOnly"));
        assert!(value.contains("Max-Age=3600"));
        assert!(!value.contains("Secure"));
    }

    #[test]
    fn secure_attribute_follows_configuration() {
        let value = carrier(true).issue(ACCESS_COOKIE, user()).unwrap();
        let value = value.to_str().unwrap();
        assert!(value.starts_with("access_token="));
        assert!(value.ends_with("; Secure"));
    }

    #[test]
    fn revocation_cookie_expires_immediately_and_never_validates() {
        let carrier = carrier(false);
        let value = carrier.revocation_cookie();
        let value = value.to_str().unwrap();
        assert!(value.contains("Max-Age=0"));

        let token = value
            .strip_prefix("jwt_access_token=")
            .and_then(|rest| rest.split(';').next())
            .unwrap();
        assert!(carrier.codec().validate(token).is_err());
    }

    #[test]
    fn revoke_is_no_content_with_cookie() {
        let response = carrier(false).revoke();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(sets_cookie(response.headers(), JWT_COOKIE));
    }

    #[test]
    fn read_cookie_finds_named_pair_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; jwt_access_token=abc.def.ghi; lang=ru"),
        );
        assert_eq!(read_cookie(&headers, JWT_COOKIE).as_deref(), Some("abc.def.ghi"));
        assert_eq!(read_cookie(&headers, ACCESS_COOKIE), None);
    }

    #[test]
    fn empty_cookie_counts_as_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("jwt_access_token="));
        assert_eq!(read_cookie(&headers, JWT_COOKIE), None);
    }

    #[test]
    fn sets_cookie_matches_exact_name() {
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("access_token=x; Path=/"));
        assert!(sets_cookie(&headers, ACCESS_COOKIE));
        assert!(!sets_cookie(&headers, JWT_COOKIE));
    }
}
