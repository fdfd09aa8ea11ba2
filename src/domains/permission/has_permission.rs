use serde::{Deserialize, Serialize};

// --- User Role Definition ---

/// Role of the signed-in registry user, as asserted by the identity provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    Admin,
    Clinician,
    Viewer,
}

// --- Permission Enum Definition ---

/// Permission enum representing individual permissions in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    // Client permissions
    ViewClients,
    CreateClients,
    EditClients,
    DeleteClients,

    // Clinical history (drugs, complications, investigations, admissions, ...)
    ViewClinicalRecords,
    EditClinicalRecords,
    DeleteClinicalRecords,

    // Master lists, choices and geography
    ManageLookups,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Clinician => "clinician",
            UserRole::Viewer => "viewer",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(UserRole::Admin),
            "clinician" => Some(UserRole::Clinician),
            "viewer" => Some(UserRole::Viewer),
            _ => None,
        }
    }

    /// Check if the role grants a specific permission
    pub fn has_permission(&self, permission: Permission) -> bool {
        match self {
            UserRole::Admin => true,
            UserRole::Clinician => !matches!(permission, Permission::ManageLookups),
            UserRole::Viewer => matches!(
                permission,
                Permission::ViewClients | Permission::ViewClinicalRecords
            ),
        }
    }

    /// Check if the user has all of the specified permissions
    pub fn has_permissions(&self, permissions: &[Permission]) -> bool {
        permissions.iter().all(|p| self.has_permission(*p))
    }
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ViewClients => "view_clients",
            Permission::CreateClients => "create_clients",
            Permission::EditClients => "edit_clients",
            Permission::DeleteClients => "delete_clients",
            Permission::ViewClinicalRecords => "view_clinical_records",
            Permission::EditClinicalRecords => "edit_clinical_records",
            Permission::DeleteClinicalRecords => "delete_clinical_records",
            Permission::ManageLookups => "manage_lookups",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "view_clients" => Some(Permission::ViewClients),
            "create_clients" => Some(Permission::CreateClients),
            "edit_clients" => Some(Permission::EditClients),
            "delete_clients" => Some(Permission::DeleteClients),
            "view_clinical_records" => Some(Permission::ViewClinicalRecords),
            "edit_clinical_records" => Some(Permission::EditClinicalRecords),
            "delete_clinical_records" => Some(Permission::DeleteClinicalRecords),
            "manage_lookups" => Some(Permission::ManageLookups),
            _ => None,
        }
    }
}
