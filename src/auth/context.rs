use crate::errors::ServiceError;
use crate::types::{Permission, UserRole};
use uuid::Uuid;

/// Represents the authenticated caller of the current operation.
/// Sessions and sign-in live with the external identity provider.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// The ID of the authenticated user
    pub user_id: Uuid,

    /// The role of the authenticated user
    pub role: UserRole,
}

impl AuthContext {
    /// Create a new authentication context
    pub fn new(user_id: Uuid, role: UserRole) -> Self {
        Self { user_id, role }
    }

    /// Create a new authentication context for internal system operations
    pub fn internal_system_context() -> Self {
        Self {
            user_id: Uuid::nil(),
            role: UserRole::Admin,
        }
    }

    /// Check if user has a specific permission
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.role.has_permission(permission)
    }

    /// Authorize a specific permission, returning an error if not allowed
    pub fn authorize(&self, permission: Permission) -> Result<(), ServiceError> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            Err(ServiceError::PermissionDenied(format!(
                "User does not have permission: {:?}",
                permission
            )))
        }
    }

    /// Authorize multiple permissions, requiring all of them
    pub fn authorize_all(&self, permissions: &[Permission]) -> Result<(), ServiceError> {
        if self.role.has_permissions(permissions) {
            Ok(())
        } else {
            Err(ServiceError::PermissionDenied(
                "User does not have all required permissions".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorize() {
        let viewer = AuthContext::new(Uuid::new_v4(), UserRole::Viewer);
        assert!(viewer.authorize(Permission::ViewClients).is_ok());
        assert!(matches!(
            viewer.authorize(Permission::DeleteClients),
            Err(ServiceError::PermissionDenied(_))
        ));

        let system = AuthContext::internal_system_context();
        assert!(system.authorize_all(&[Permission::ManageLookups, Permission::DeleteClients]).is_ok());
    }
}
