//! Identity Token Codec: signed, expiring session tokens.

use core::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::claims::{TokenValidationError, validate_claims};
use crate::{Identity, IdentityClaim};

/// Lifetime of every issued or reissued session token.
pub const TOKEN_TTL: Duration = Duration::from_secs(3600);

/// HMAC family used to sign session tokens.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum SigningAlgorithm {
    #[default]
    Hs256,
    Hs384,
    Hs512,
}

impl SigningAlgorithm {
    fn to_jwt(self) -> Algorithm {
        match self {
            SigningAlgorithm::Hs256 => Algorithm::HS256,
            SigningAlgorithm::Hs384 => Algorithm::HS384,
            SigningAlgorithm::Hs512 => Algorithm::HS512,
        }
    }
}

impl FromStr for SigningAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "HS256" => Ok(SigningAlgorithm::Hs256),
            "HS384" => Ok(SigningAlgorithm::Hs384),
            "HS512" => Ok(SigningAlgorithm::Hs512),
            other => Err(format!("unsupported signing algorithm '{other}'")),
        }
    }
}

/// Any reason a token is not accepted. There is no partial trust.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,

    #[error("token signature is invalid")]
    BadSignature,

    #[error("token is malformed: {0}")]
    Malformed(String),

    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl From<TokenValidationError> for TokenError {
    fn from(e: TokenValidationError) -> Self {
        match e {
            TokenValidationError::Expired => TokenError::Expired,
            TokenValidationError::SubjectRoleMismatch => TokenError::Malformed(e.to_string()),
        }
    }
}

/// A freshly signed token together with the claim it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub claim: IdentityClaim,
}

/// A token that passed every check, with the identity its claim resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedToken {
    pub identity: Identity,
    pub claim: IdentityClaim,
}

/// Issues and validates session tokens with a symmetric key.
#[derive(Clone)]
pub struct TokenCodec {
    algorithm: Algorithm,
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl core::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(secret: &[u8], algorithm: SigningAlgorithm) -> Self {
        let algorithm = algorithm.to_jwt();
        let mut validation = Validation::new(algorithm);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);
        Self {
            algorithm,
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Sign a claim for `identity` expiring `ttl` from now.
    pub fn issue(&self, identity: Identity, ttl: Duration) -> Result<IssuedToken, TokenError> {
        self.issue_at(identity, ttl, Utc::now())
    }

    pub fn issue_at(
        &self,
        identity: Identity,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenError> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| TokenError::Signing(format!("ttl out of range: {e}")))?;
        let claim = IdentityClaim::new(identity, now + ttl);
        let token = encode(&Header::new(self.algorithm), &claim, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))?;
        Ok(IssuedToken { token, claim })
    }

    /// Verify signature and expiry, then resolve the claim.
    pub fn validate(&self, token: &str) -> Result<ValidatedToken, TokenError> {
        let data = decode::<IdentityClaim>(token, &self.decoding, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::BadSignature,
                _ => TokenError::Malformed(e.to_string()),
            },
        )?;
        let identity = validate_claims(&data.claims, Utc::now())?;
        Ok(ValidatedToken {
            identity,
            claim: data.claims,
        })
    }

    /// Same subject and role, new expiry.
    pub fn reissue(&self, claim: &IdentityClaim) -> Result<IssuedToken, TokenError> {
        let identity = validate_claims(claim, Utc::now())?;
        self.issue(identity, TOKEN_TTL)
    }

    /// A signed token with an empty claim set, used to overwrite a cookie on
    /// logout. It never validates.
    pub fn revocation_token(&self) -> Result<String, TokenError> {
        encode(&Header::new(self.algorithm), &Map::<String, Value>::new(), &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }
}
