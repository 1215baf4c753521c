use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Closed role set. Serialized with the `ROLE_` prefix the authorization
/// table and clients expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    #[serde(rename = "ROLE_ADMIN")]
    Admin,
    #[serde(rename = "ROLE_USER")]
    User,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "ROLE_ADMIN",
            UserRole::User => "ROLE_USER",
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ROLE_ADMIN" => Ok(UserRole::Admin),
            "ROLE_USER" => Ok(UserRole::User),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    /// Unique, case-sensitive business key used for lookups and as the
    /// token subject.
    pub username: String,
    pub password_hash: String,
    pub role: UserRole,
}

impl User {
    pub fn new(name: impl Into<String>, username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            username: username.into(),
            password_hash: password_hash.into(),
            role: UserRole::User,
        }
    }
}
