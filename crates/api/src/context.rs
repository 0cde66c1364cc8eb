use storefront_auth::{Identity, Role};
use storefront_core::UserId;

/// Identity resolved for the current request.
///
/// Inserted by the identity resolver on every identity-gated route. Guests
/// carry [`Identity::GUEST`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct IdentityContext {
    identity: Identity,
}

impl IdentityContext {
    pub fn new(identity: Identity) -> Self {
        Self { identity }
    }

    pub fn identity(&self) -> Identity {
        self.identity
    }

    pub fn user_id(&self) -> UserId {
        self.identity.id()
    }

    pub fn role(&self) -> Role {
        self.identity.role()
    }
}
