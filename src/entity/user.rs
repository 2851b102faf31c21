//! Users - only the role flag and status matter to the engine

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::types::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Beekeeper,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => f.write_str("admin"),
            Role::Beekeeper => f.write_str("beekeeper"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "beekeeper" => Ok(Role::Beekeeper),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UserStatus {
    #[default]
    Active,
    Disabled,
    Pending,
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UserStatus::Active => "Active",
            UserStatus::Disabled => "Disabled",
            UserStatus::Pending => "Pending",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub status: UserStatus,
}

impl User {
    pub fn new(username: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        Self {
            id: UserId::new(),
            username: username.into(),
            name: name.into(),
            role,
            status: UserStatus::Active,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }
}

/// Account details supplied by an admin; the engine assigns the id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub name: String,
    pub role: Role,
}

impl NewUser {
    pub fn new(username: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            name: name.into(),
            role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        let user = User::new("ana", "Ana Rojas", Role::Admin);
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["role"], "admin");
        assert_eq!(json["status"], "Active");
        assert!(user.is_admin());
    }

    #[test]
    fn test_new_user_is_active() {
        let user = User::new("luis", "Luis", Role::Beekeeper);
        assert!(user.is_active());
        assert!(!user.is_admin());
    }

    #[test]
    fn test_role_parse_and_display() {
        assert_eq!("Admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!(Role::Beekeeper.to_string(), "beekeeper");
        assert!("queen".parse::<Role>().is_err());
    }
}
