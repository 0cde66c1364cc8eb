use serde::{Deserialize, Serialize};

use storefront_core::{DomainError, UserId};

use crate::Role;

/// The resolved caller of a request or live connection.
///
/// # Invariants
/// - `id == 0` iff `role == Guest`.
/// - Non-guest identities carry a positive id.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawIdentity", into = "RawIdentity")]
pub struct Identity {
    id: UserId,
    role: Role,
}

impl Identity {
    /// The anonymous identity used when no session is presented.
    pub const GUEST: Identity = Identity {
        id: UserId::GUEST,
        role: Role::Guest,
    };

    pub fn new(id: UserId, role: Role) -> Result<Self, DomainError> {
        match role {
            Role::Guest if id == UserId::GUEST => Ok(Self::GUEST),
            Role::Guest => Err(DomainError::invariant(format!(
                "guest identity must have id 0, got {id}"
            ))),
            Role::User | Role::Admin if id.is_positive() => Ok(Self { id, role }),
            Role::User | Role::Admin => Err(DomainError::invariant(format!(
                "{role} identity requires a positive id, got {id}"
            ))),
        }
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_guest(&self) -> bool {
        self.role.is_guest()
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self::GUEST
    }
}

#[derive(Serialize, Deserialize)]
struct RawIdentity {
    id: i64,
    role: Role,
}

impl TryFrom<RawIdentity> for Identity {
    type Error = DomainError;

    fn try_from(raw: RawIdentity) -> Result<Self, Self::Error> {
        Identity::new(UserId::new(raw.id), raw.role)
    }
}

impl From<Identity> for RawIdentity {
    fn from(identity: Identity) -> Self {
        RawIdentity {
            id: identity.id.get(),
            role: identity.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guest_requires_zero_id() {
        assert_eq!(Identity::new(UserId::new(0), Role::Guest), Ok(Identity::GUEST));
        assert!(Identity::new(UserId::new(5), Role::Guest).is_err());
    }

    #[test]
    fn authenticated_roles_require_positive_id() {
        assert!(Identity::new(UserId::new(0), Role::User).is_err());
        assert!(Identity::new(UserId::new(-3), Role::Admin).is_err());
        let admin = Identity::new(UserId::new(7), Role::Admin).unwrap();
        assert_eq!(admin.id().get(), 7);
        assert!(!admin.is_guest());
    }

    #[test]
    fn serializes_as_id_and_role() {
        let json = serde_json::to_value(Identity::GUEST).unwrap();
        assert_eq!(json, serde_json::json!({"id": 0, "role": "guest"}));

        let bad: Result<Identity, _> = serde_json::from_value(serde_json::json!({"id": 0, "role": "user"}));
        assert!(bad.is_err());
    }
}
