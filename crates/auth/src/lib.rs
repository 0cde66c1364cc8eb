//! `storefront-auth`: identity, session tokens and role checks.
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod authorize;
pub mod claims;
pub mod password;
pub mod principal;
pub mod roles;
pub mod token;

pub use authorize::{AuthzError, authorize, ensure_declared};
pub use claims::{IdentityClaim, TokenValidationError, validate_claims};
pub use password::{PasswordHashError, hash_password, verify_password};
pub use principal::Identity;
pub use roles::{Role, UnknownRole};
pub use token::{IssuedToken, SigningAlgorithm, TOKEN_TTL, TokenCodec, TokenError, ValidatedToken};
