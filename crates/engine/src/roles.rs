//! Staff roles, protected resources and the default access policy.

use crate::EngineError;

/// Role of a staff account.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    #[default]
    Operator,
}

impl Role {
    /// Canonical role string used by the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Operator => "operator",
        }
    }

    /// Permissions granted when no explicit `user_permissions` row exists.
    ///
    /// Admins are never restricted. Operators read students and payment
    /// types and may record (create/update) payments.
    #[must_use]
    pub const fn default_permissions(self, resource: Resource) -> PermissionSet {
        match self {
            Self::Admin => PermissionSet::ALL,
            Self::Operator => match resource {
                Resource::Users => PermissionSet::NONE,
                Resource::Students | Resource::PaymentTypes => PermissionSet::READ_ONLY,
                Resource::Payments => PermissionSet {
                    can_read: true,
                    can_create: true,
                    can_update: true,
                    can_delete: false,
                },
            },
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Role {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim() {
            "admin" => Ok(Self::Admin),
            "operator" => Ok(Self::Operator),
            _ => Err(EngineError::InvalidField(
                "Role harus admin atau operator".to_string(),
            )),
        }
    }
}

/// A resource guarded by permissions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Resource {
    Users,
    Students,
    Payments,
    PaymentTypes,
}

impl Resource {
    pub const ALL: [Resource; 4] = [
        Resource::Users,
        Resource::Students,
        Resource::Payments,
        Resource::PaymentTypes,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Students => "students",
            Self::Payments => "payments",
            Self::PaymentTypes => "payment_types",
        }
    }
}

impl TryFrom<&str> for Resource {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim() {
            "users" => Ok(Self::Users),
            "students" => Ok(Self::Students),
            "payments" => Ok(Self::Payments),
            "payment_types" => Ok(Self::PaymentTypes),
            other => Err(EngineError::InvalidField(format!(
                "permission tidak dikenal: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
}

impl Action {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// CRUD flags for one resource.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PermissionSet {
    pub can_read: bool,
    pub can_create: bool,
    pub can_update: bool,
    pub can_delete: bool,
}

impl PermissionSet {
    pub const ALL: PermissionSet = PermissionSet {
        can_read: true,
        can_create: true,
        can_update: true,
        can_delete: true,
    };

    pub const NONE: PermissionSet = PermissionSet {
        can_read: false,
        can_create: false,
        can_update: false,
        can_delete: false,
    };

    pub const READ_ONLY: PermissionSet = PermissionSet {
        can_read: true,
        can_create: false,
        can_update: false,
        can_delete: false,
    };

    #[must_use]
    pub const fn allows(self, action: Action) -> bool {
        match action {
            Action::Read => self.can_read,
            Action::Create => self.can_create,
            Action::Update => self.can_update,
            Action::Delete => self.can_delete,
        }
    }
}

/// Effective permissions of a user on one resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Permission {
    pub resource: Resource,
    pub set: PermissionSet,
    /// `true` when the flags come from a stored override instead of the role
    /// default.
    pub explicit: bool,
}

/// The authenticated staff member performing an operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Actor {
    pub id: i32,
    pub username: String,
    pub role: Role,
    pub nama_lengkap: String,
}

impl Actor {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
