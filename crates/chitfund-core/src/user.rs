// crates/chitfund-core/src/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::Role;

/// An operator account.
///
/// `password_hash` is an argon2 PHC string. Use [`UserSummary`] for anything
/// sent back to clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserAccount {
    pub id: Uuid,
    /// Lowercased, trimmed, unique.
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub name: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Public view of a user account (no password hash).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub name: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&UserAccount> for UserSummary {
    fn from(u: &UserAccount) -> Self {
        Self {
            id: u.id,
            username: u.username.clone(),
            role: u.role,
            name: u.name.clone(),
            email: u.email.clone(),
            created_at: u.created_at,
        }
    }
}

/// Canonical form of a username: trimmed and lowercased.
pub fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_username() {
        assert_eq!(normalize_username("  Admin "), "admin");
    }

    #[test]
    fn test_summary_omits_hash() {
        let user = UserAccount {
            id: Uuid::now_v7(),
            username: "admin".into(),
            password_hash: "$argon2id$...".into(),
            role: Role::Admin,
            name: "Admin".into(),
            email: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&UserSummary::from(&user)).unwrap();
        assert!(!json.contains("argon2"));
        assert!(json.contains("\"role\":\"admin\""));
    }
}
