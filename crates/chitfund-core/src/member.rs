// crates/chitfund-core/src/member.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ChitError;

/// A registered member of one or more funds.
///
/// `member_id` is the generated human-readable code (e.g. `AGR0421K`). It is
/// globally unique and is the reference funds hold in their active rosters.
/// Members are immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Member {
    /// Generated identifier, `^[A-Z]{3}\d{4}[A-Z]$`.
    pub member_id: String,
    /// Display name.
    pub name: String,
    /// Mobile number as entered (used for lookups).
    pub mobile: String,
    /// Contact email.
    pub email: String,
    /// Free-form location (town, district).
    pub location: String,
    /// National ID number (Aadhaar in India).
    pub national_id: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Member {
    /// Build a member record from validated details and a freshly generated identifier.
    pub fn new(member_id: String, details: MemberDetails, created_at: DateTime<Utc>) -> Self {
        Self {
            member_id,
            name: details.name,
            mobile: details.mobile,
            email: details.email,
            location: details.location,
            national_id: details.national_id,
            created_at,
        }
    }
}

/// The caller-supplied identity fields of a member, before an identifier is assigned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemberDetails {
    pub name: String,
    pub mobile: String,
    pub email: String,
    pub location: String,
    pub national_id: String,
}

impl MemberDetails {
    /// Trim every field and reject the record if any required field is empty.
    pub fn normalized(self) -> Result<Self, ChitError> {
        let details = Self {
            name: self.name.trim().to_string(),
            mobile: self.mobile.trim().to_string(),
            email: self.email.trim().to_string(),
            location: self.location.trim().to_string(),
            national_id: self.national_id.trim().to_string(),
        };

        let missing: Vec<&str> = [
            ("name", &details.name),
            ("mobile", &details.mobile),
            ("email", &details.email),
            ("location", &details.location),
            ("national_id", &details.national_id),
        ]
        .iter()
        .filter(|(_, v)| v.is_empty())
        .map(|(k, _)| *k)
        .collect();

        if !missing.is_empty() {
            return Err(ChitError::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }

        Ok(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details() -> MemberDetails {
        MemberDetails {
            name: "  Lakshmi Nair ".to_string(),
            mobile: "9847012345".to_string(),
            email: "lakshmi@example.com".to_string(),
            location: "Thrissur".to_string(),
            national_id: "1234 5678 9012".to_string(),
        }
    }

    #[test]
    fn test_normalized_trims_fields() {
        let d = details().normalized().unwrap();
        assert_eq!(d.name, "Lakshmi Nair");
    }

    #[test]
    fn test_normalized_rejects_missing_fields() {
        let mut d = details();
        d.email = "   ".to_string();
        d.location = String::new();
        let err = d.normalized().unwrap_err();
        match err {
            ChitError::Validation(msg) => {
                assert!(msg.contains("email"));
                assert!(msg.contains("location"));
                assert!(!msg.contains("mobile"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
