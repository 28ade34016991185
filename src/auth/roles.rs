//! Role and Authority Model
//! Mission: Map each role to its fixed set of permission strings

use serde::{Deserialize, Serialize};
use std::fmt;

pub const USER_AUTHORITIES: &[&str] = &["user:read"];
pub const MEMBER_AUTHORITIES: &[&str] = &["user:read", "user:update"];
pub const EC_AUTHORITIES: &[&str] = &["user:read", "user:update", "user:create"];
pub const ADMIN_AUTHORITIES: &[&str] = &["user:read", "user:update", "user:create", "user:delete"];

/// User roles for RBAC. The set is closed; role-to-authority
/// mapping is fixed at compile time and immutable.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Role {
    #[serde(rename = "ROLE_USER")]
    User,
    #[serde(rename = "ROLE_MEMBER")]
    Member,
    #[serde(rename = "ROLE_EC")]
    Ec,
    #[serde(rename = "ROLE_ADMIN")]
    Admin,
}

impl Role {
    /// Authority strings granted by this role. Always non-empty.
    pub fn authorities(&self) -> &'static [&'static str] {
        match self {
            Role::User => USER_AUTHORITIES,
            Role::Member => MEMBER_AUTHORITIES,
            Role::Ec => EC_AUTHORITIES,
            Role::Admin => ADMIN_AUTHORITIES,
        }
    }

    /// Canonical name as persisted (`ROLE_*`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "ROLE_USER",
            Role::Member => "ROLE_MEMBER",
            Role::Ec => "ROLE_EC",
            Role::Admin => "ROLE_ADMIN",
        }
    }

    /// Parse a role name from client or database input.
    ///
    /// Case-insensitive; the `ROLE_` prefix is optional so both
    /// `"admin"` and `"ROLE_ADMIN"` resolve to [`Role::Admin`].
    pub fn parse(s: &str) -> Result<Self, UnknownRoleError> {
        let normalized = s.trim().to_uppercase();
        let name = normalized.strip_prefix("ROLE_").unwrap_or(&normalized);
        match name {
            "USER" => Ok(Role::User),
            "MEMBER" => Ok(Role::Member),
            "EC" => Ok(Role::Ec),
            "ADMIN" => Ok(Role::Admin),
            _ => Err(UnknownRoleError(s.to_string())),
        }
    }
}

/// Role name not in the static table. A deployment/configuration
/// bug, not a runtime condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRoleError(pub String);

impl fmt::Display for UnknownRoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role: {}", self.0)
    }
}

impl std::error::Error for UnknownRoleError {}
