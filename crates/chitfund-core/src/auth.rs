// crates/chitfund-core/src/auth.rs
//
// Roles, capabilities, and the server-side session value.
//
// Role hierarchy: User < Admin < SuperAdmin.
//   - User:       read funds, members, ledger
//   - Admin:      + mutate funds/members, run draws, administer users
//   - SuperAdmin: + irreversible bulk purge

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ChitError;

/// Account role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
    #[serde(rename = "superadmin")]
    SuperAdmin,
}

/// Something a request may need permission to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Read funds, members, search results, and the ledger.
    ViewFunds,
    /// Create/delete funds, change rosters, run draws.
    ManageFunds,
    /// Create and import members.
    ManageMembers,
    /// List, create, and delete user accounts.
    ManageUsers,
    /// Irreversible bulk deletion.
    PurgeData,
}

impl Role {
    /// Whether this role grants `capability`.
    pub fn allows(self, capability: Capability) -> bool {
        match capability {
            Capability::ViewFunds => true,
            Capability::ManageFunds | Capability::ManageMembers | Capability::ManageUsers => {
                self >= Role::Admin
            }
            Capability::PurgeData => self == Role::SuperAdmin,
        }
    }

    /// Whether this role is admin or above.
    pub fn is_admin(self) -> bool {
        self >= Role::Admin
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::SuperAdmin => "superadmin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ChitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            "superadmin" => Ok(Role::SuperAdmin),
            other => Err(ChitError::Validation(format!("Unknown role: {}", other))),
        }
    }
}

/// A resolved, server-side session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    /// Opaque session identifier embedded in the client token.
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
    pub name: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Require `capability`, or fail with `Forbidden`.
    pub fn require(&self, capability: Capability) -> Result<(), ChitError> {
        if self.role.allows(capability) {
            Ok(())
        } else {
            Err(ChitError::Forbidden(format!(
                "Role '{}' lacks {:?}",
                self.role, capability
            )))
        }
    }
}
