//! Role and permission vocabularies from the Skoola API schema.
//!
//! The API serializes roles, staff statuses, and permission names as plain
//! strings; these closed enums and membership predicates narrow them at the
//! client boundary. Unknown strings are simply not members — there is no
//! failure mode beyond `false`.

use serde::{Deserialize, Serialize};

/// Staff roles recognized by the Skoola backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Admin,
    Teacher,
    Registrar,
    Accountant,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::SuperAdmin,
        Role::Admin,
        Role::Teacher,
        Role::Registrar,
        Role::Accountant,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Admin => "admin",
            Role::Teacher => "teacher",
            Role::Registrar => "registrar",
            Role::Accountant => "accountant",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|r| r.as_str() == s)
    }

    /// Whether this role may manage users and role assignments.
    pub fn can_manage_users(&self) -> bool {
        matches!(self, Role::SuperAdmin | Role::Admin)
    }
}

/// Employment status values for staff records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffStatus {
    Active,
    Inactive,
    Suspended,
}

impl StaffStatus {
    pub const ALL: [StaffStatus; 3] = [
        StaffStatus::Active,
        StaffStatus::Inactive,
        StaffStatus::Suspended,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StaffStatus::Active => "active",
            StaffStatus::Inactive => "inactive",
            StaffStatus::Suspended => "suspended",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.as_str() == s)
    }
}

/// Permission names granted through role assignments.
pub const PERMISSIONS: [&str; 10] = [
    "classes:read",
    "classes:write",
    "students:read",
    "students:write",
    "staff:read",
    "staff:write",
    "timetables:read",
    "timetables:write",
    "users:manage",
    "roles:manage",
];

/// Whether `s` names a role the backend recognizes.
pub fn is_role_name(s: &str) -> bool {
    Role::from_name(s).is_some()
}

/// Whether `s` names a staff status the backend recognizes.
pub fn is_staff_status(s: &str) -> bool {
    StaffStatus::from_name(s).is_some()
}

/// Whether `s` names a known permission.
pub fn is_permission_name(s: &str) -> bool {
    PERMISSIONS.contains(&s)
}
