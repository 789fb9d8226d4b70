//! Access policy: a pure role check applied before each privileged entry
//! point. The auth provider upstream has already authenticated the actor;
//! the core trusts the supplied identity and role.

use model::Role;
use uuid::Uuid;

use crate::ServiceError;

/// An authenticated actor, as supplied by the auth provider.
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
    /// Display name, denormalized into reviews.
    pub name: String,
}

impl Actor {
    pub fn new(id: Uuid, role: Role, name: impl Into<String>) -> Self {
        Self {
            id,
            role,
            name: name.into(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Allows the operation when the actor's role is one of `allowed`.
pub fn authorize(role: Role, allowed: &[Role]) -> Result<(), ServiceError> {
    if allowed.contains(&role) {
        Ok(())
    } else {
        Err(ServiceError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listed_roles_are_allowed() {
        assert!(authorize(Role::Admin, &[Role::Admin]).is_ok());
        assert!(authorize(Role::Owner, &[Role::Owner, Role::Admin]).is_ok());
    }

    #[test]
    fn unlisted_roles_are_forbidden() {
        let err = authorize(Role::Tenant, &[Role::Admin]).unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden));
    }
}
