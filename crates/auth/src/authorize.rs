use thiserror::Error;

use storefront_core::UserId;

use crate::{Identity, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: role '{required}' required, caller is '{actual}'")]
    Forbidden { required: Role, actual: Role },

    #[error("declared identity ({declared_id}, {declared_role}) does not match session ({actual_id}, {actual_role})")]
    DeclarationMismatch {
        declared_id: UserId,
        declared_role: Role,
        actual_id: UserId,
        actual_role: Role,
    },
}

/// Require the caller to hold exactly `required`.
///
/// - No IO
/// - No panics
/// - Pure policy check (roles are not hierarchical)
pub fn authorize(identity: &Identity, required: Role) -> Result<(), AuthzError> {
    if identity.role() == required {
        Ok(())
    } else {
        Err(AuthzError::Forbidden {
            required,
            actual: identity.role(),
        })
    }
}

/// Check that an identity declared out-of-band by the client (e.g. live
/// channel query parameters) is the one the session resolved to.
pub fn ensure_declared(
    identity: &Identity,
    declared_id: UserId,
    declared_role: Role,
) -> Result<(), AuthzError> {
    if identity.id() == declared_id && identity.role() == declared_role {
        Ok(())
    } else {
        Err(AuthzError::DeclarationMismatch {
            declared_id,
            declared_role,
            actual_id: identity.id(),
            actual_role: identity.role(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn who(id: i64, role: Role) -> Identity {
        Identity::new(UserId::new(id), role).unwrap()
    }

    #[test]
    fn exact_role_is_required() {
        assert!(authorize(&who(1, Role::User), Role::User).is_ok());
        assert_eq!(
            authorize(&who(1, Role::Admin), Role::User),
            Err(AuthzError::Forbidden {
                required: Role::User,
                actual: Role::Admin
            })
        );
        assert!(authorize(&Identity::GUEST, Role::User).is_err());
    }

    #[test]
    fn declared_identity_must_match_session() {
        let user = who(3, Role::User);
        assert!(ensure_declared(&user, UserId::new(3), Role::User).is_ok());
        assert!(ensure_declared(&user, UserId::new(3), Role::Admin).is_err());
        assert!(ensure_declared(&user, UserId::new(4), Role::User).is_err());
        assert!(ensure_declared(&Identity::GUEST, UserId::GUEST, Role::Guest).is_ok());
    }
}
