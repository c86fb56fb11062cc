//! Canonical role tags used for role-scoped dispatch.
//!
//! Callers hand roles around in several shapes (a bare string in any casing,
//! or the whole user object carrying `userRole`). [`RoleInput`] captures those
//! shapes and [`RoleInput::resolve`] folds them into the closed [`Role`] set
//! once, at the boundary.

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::Record;

/// Dashboard role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    Admin,
    BusinessOwner,
    Buyer,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::BusinessOwner, Role::Buyer];

    /// Canonical wire tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::BusinessOwner => "business_owner",
            Role::Buyer => "buyer",
        }
    }

    /// Resolve any accepted role representation; unknown shapes yield `None`.
    pub fn resolve(input: impl Into<RoleInput>) -> Option<Role> {
        input.into().resolve()
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    /// Accepts the canonical tag plus camelCase, kebab-case and spaced forms.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let folded: String = raw
            .trim()
            .chars()
            .filter(|ch| !matches!(ch, '_' | '-' | ' '))
            .flat_map(char::to_lowercase)
            .collect();

        match folded.as_str() {
            "admin" | "administrator" | "superadmin" => Ok(Role::Admin),
            "businessowner" | "owner" => Ok(Role::BusinessOwner),
            "buyer" => Ok(Role::Buyer),
            _ => Err(UnknownRole(raw.to_string())),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = UnknownRole;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

/// User-object keys checked for the role, in order.
const USER_ROLE_KEYS: [&str; 3] = ["userRole", "user_role", "role"];

/// A role as callers happen to hold it.
#[derive(Debug, Clone, PartialEq)]
pub enum RoleInput {
    /// Already canonical.
    Role(Role),
    /// A bare role string in any accepted spelling.
    Tag(String),
    /// A user record carrying the role under one of the known keys.
    User(Record),
}

impl RoleInput {
    /// Classify a raw JSON value; anything other than a string or object is rejected.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(tag) => Some(RoleInput::Tag(tag.clone())),
            Value::Object(user) => Some(RoleInput::User(user.clone())),
            _ => None,
        }
    }

    pub fn resolve(&self) -> Option<Role> {
        match self {
            RoleInput::Role(role) => Some(*role),
            RoleInput::Tag(tag) => tag.parse().ok(),
            RoleInput::User(user) => USER_ROLE_KEYS
                .iter()
                .filter_map(|key| user.get(*key).and_then(Value::as_str))
                .find_map(|tag| tag.parse().ok()),
        }
    }
}

impl From<Role> for RoleInput {
    fn from(role: Role) -> Self {
        RoleInput::Role(role)
    }
}

impl From<&str> for RoleInput {
    fn from(tag: &str) -> Self {
        RoleInput::Tag(tag.to_string())
    }
}

impl From<String> for RoleInput {
    fn from(tag: String) -> Self {
        RoleInput::Tag(tag)
    }
}

impl From<Record> for RoleInput {
    fn from(user: Record) -> Self {
        RoleInput::User(user)
    }
}

impl From<&Record> for RoleInput {
    fn from(user: &Record) -> Self {
        RoleInput::User(user.clone())
    }
}
