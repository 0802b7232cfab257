use thiserror::Error;

/// Service-wide error type.
///
/// Every variant maps onto an HTTP-equivalent status via [`ChitError::status_code`],
/// which the RPC layer copies into the response envelope.
#[derive(Debug, Error)]
pub enum ChitError {
    /// Missing or malformed required input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Referenced fund, member, or user does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// No session, or the session token did not resolve.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Session resolved but the role lacks the capability.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Duplicate unique identifier, or a stale version on write.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Draw precondition: the active roster is smaller than required.
    #[error("Insufficient members: {required} required, {available} active")]
    InsufficientMembers { required: usize, available: usize },

    /// Draw precondition: every active member has already won in this fund.
    #[error("No eligible members: all active members are previous winners")]
    NoEligibleMembers,

    /// The identifier generator could not find a free identifier.
    #[error("Member ID generation exhausted after {attempts} attempts")]
    GenerationExhausted { attempts: u32 },

    /// Storage layer error (RocksDB unreachable, corrupt, etc.).
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Password hashing or token signing error.
    #[error("Crypto error: {0}")]
    Crypto(String),
}

impl ChitError {
    /// HTTP-equivalent status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ChitError::Validation(_)
            | ChitError::InsufficientMembers { .. }
            | ChitError::NoEligibleMembers => 400,
            ChitError::Unauthorized(_) => 401,
            ChitError::Forbidden(_) => 403,
            ChitError::NotFound(_) => 404,
            ChitError::Conflict(_) => 409,
            ChitError::GenerationExhausted { .. }
            | ChitError::Storage(_)
            | ChitError::Serialization(_)
            | ChitError::Crypto(_) => 500,
        }
    }

    /// Stable machine-readable tag for this error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ChitError::Validation(_) => "validation",
            ChitError::NotFound(_) => "not_found",
            ChitError::Unauthorized(_) => "unauthorized",
            ChitError::Forbidden(_) => "forbidden",
            ChitError::Conflict(_) => "conflict",
            ChitError::InsufficientMembers { .. } => "insufficient_members",
            ChitError::NoEligibleMembers => "no_eligible_members",
            ChitError::GenerationExhausted { .. } => "generation_exhausted",
            ChitError::Storage(_) => "upstream_failure",
            ChitError::Serialization(_) => "serialization",
            ChitError::Crypto(_) => "crypto",
        }
    }
}

impl From<serde_json::Error> for ChitError {
    fn from(e: serde_json::Error) -> Self {
        ChitError::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ChitError::Validation("x".into()).status_code(), 400);
        assert_eq!(ChitError::NoEligibleMembers.status_code(), 400);
        assert_eq!(
            ChitError::InsufficientMembers {
                required: 3,
                available: 2
            }
            .status_code(),
            400
        );
        assert_eq!(ChitError::Unauthorized("x".into()).status_code(), 401);
        assert_eq!(ChitError::Forbidden("x".into()).status_code(), 403);
        assert_eq!(ChitError::NotFound("x".into()).status_code(), 404);
        assert_eq!(ChitError::Conflict("x".into()).status_code(), 409);
        assert_eq!(
            ChitError::GenerationExhausted { attempts: 1000 }.status_code(),
            500
        );
        assert_eq!(ChitError::Storage("down".into()).status_code(), 500);
    }

    #[test]
    fn test_insufficient_members_message() {
        let err = ChitError::InsufficientMembers {
            required: 3,
            available: 2,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient members: 3 required, 2 active"
        );
        assert_eq!(err.kind(), "insufficient_members");
    }
}
