//! Registrant model - accounts that own applications and manage the registry.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// Role of a registrant.
///
/// Serialized as `ROLE_USER`, `ROLE_ADMIN` or `ROLE_OWNER`. Any other value
/// decodes to [`Role::Unknown`], which is never granted anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    User,
    Admin,
    Owner,
    Unknown,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "ROLE_USER",
            Role::Admin => "ROLE_ADMIN",
            Role::Owner => "ROLE_OWNER",
            Role::Unknown => "ROLE_UNKNOWN",
        }
    }

    /// ADMIN or OWNER.
    pub fn is_privileged(&self) -> bool {
        matches!(self, Role::Admin | Role::Owner)
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        Role::from(value.as_str())
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        match value {
            "ROLE_USER" => Role::User,
            "ROLE_ADMIN" => Role::Admin,
            "ROLE_OWNER" => Role::Owner,
            _ => Role::Unknown,
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registrant entity.
///
/// An empty `password_hash` means no password has been set yet: the account
/// cannot log in until an email verification sets one.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Registrant {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub active: bool,
    /// Unix seconds of the last successful login, 0 if never.
    pub last_login: i64,
}

impl Registrant {
    /// A self-registered account: inactive, lowest privilege, no password.
    pub fn new_registration(email: String, name: String) -> Self {
        Self {
            id: 0,
            email,
            password_hash: String::new(),
            name,
            role: Role::User,
            active: false,
            last_login: 0,
        }
    }

    pub fn has_password(&self) -> bool {
        !self.password_hash.is_empty()
    }
}
