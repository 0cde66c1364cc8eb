use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use storefront_core::UserId;

use crate::{Identity, Role};

/// Signed session payload.
///
/// Field names are part of the cookie wire format: `id`, `role`, `exp`
/// (seconds since the Unix epoch).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaim {
    pub id: i64,
    pub role: Role,
    pub exp: i64,
}

impl IdentityClaim {
    pub fn new(identity: Identity, expires_at: DateTime<Utc>) -> Self {
        Self {
            id: identity.id().get(),
            role: identity.role(),
            exp: expires_at.timestamp(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("claim subject does not match its role")]
    SubjectRoleMismatch,
}

/// Deterministically validate decoded claims and resolve them to an identity.
///
/// Note: this validates the *claims* only. Signature verification is done by
/// [`crate::TokenCodec`].
pub fn validate_claims(
    claim: &IdentityClaim,
    now: DateTime<Utc>,
) -> Result<Identity, TokenValidationError> {
    if now.timestamp() >= claim.exp {
        return Err(TokenValidationError::Expired);
    }
    Identity::new(UserId::new(claim.id), claim.role)
        .map_err(|_| TokenValidationError::SubjectRoleMismatch)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn user(id: i64) -> Identity {
        Identity::new(UserId::new(id), Role::User).unwrap()
    }

    #[test]
    fn unexpired_claim_resolves_to_identity() {
        let now = Utc::now();
        let claim = IdentityClaim::new(user(4), now + Duration::hours(1));
        assert_eq!(validate_claims(&claim, now), Ok(user(4)));
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let now = Utc::now();
        let claim = IdentityClaim::new(user(4), now);
        assert_eq!(validate_claims(&claim, now), Err(TokenValidationError::Expired));
    }

    #[test]
    fn guest_claim_with_subject_is_rejected() {
        let now = Utc::now();
        let claim = IdentityClaim {
            id: 9,
            role: Role::Guest,
            exp: (now + Duration::hours(1)).timestamp(),
        };
        assert_eq!(
            validate_claims(&claim, now),
            Err(TokenValidationError::SubjectRoleMismatch)
        );
    }
}
