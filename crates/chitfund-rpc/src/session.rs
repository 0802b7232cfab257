// crates/chitfund-rpc/src/session.rs
//
// Server-side session table.
//
// Clients hold `{session_uuid}.{hex hmac}` tokens. A token resolves only if
// its MAC verifies under this process's secret AND the session id is still
// in the table and unexpired. Sessions are in memory: restarting the daemon
// logs everyone out.

use std::collections::HashMap;

use chrono::{Duration, Utc};
use tokio::sync::{Mutex, MutexGuard, RwLock};
use uuid::Uuid;

use chitfund_core::auth::Session;
use chitfund_core::crypto::{sign_session_token, verify_session_token, SECRET_LEN};
use chitfund_core::error::ChitError;
use chitfund_core::user::UserAccount;

/// Default session lifetime: 7 days.
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24 * 7;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session";

pub struct SessionManager {
    secret: [u8; SECRET_LEN],
    ttl: Duration,
    sessions: RwLock<HashMap<Uuid, Session>>,
    /// Serializes account bootstrap and creation so uniqueness checks hold.
    account_gate: Mutex<()>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("ttl_hours", &self.ttl.num_hours())
            .finish()
    }
}

impl SessionManager {
    pub fn new(secret: [u8; SECRET_LEN], ttl_hours: i64) -> Self {
        Self {
            secret,
            ttl: Duration::hours(ttl_hours.max(1)),
            sessions: RwLock::new(HashMap::new()),
            account_gate: Mutex::new(()),
        }
    }

    /// Session lifetime in seconds (cookie `Max-Age`).
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl.num_seconds()
    }

    /// Hold while checking and creating accounts.
    pub async fn account_gate(&self) -> MutexGuard<'_, ()> {
        self.account_gate.lock().await
    }

    /// Open a session for `user` and return its client token.
    pub async fn issue(&self, user: &UserAccount) -> Result<(String, Session), ChitError> {
        let now = Utc::now();
        let session = Session {
            session_id: Uuid::now_v7(),
            user_id: user.id,
            username: user.username.clone(),
            role: user.role,
            name: user.name.clone(),
            issued_at: now,
            expires_at: now + self.ttl,
        };
        let token = sign_session_token(&self.secret, &session.session_id)?;
        self.sessions
            .write()
            .await
            .insert(session.session_id, session.clone());
        tracing::debug!(user = %session.username, "Session issued");
        Ok((token, session))
    }

    /// Resolve a client token into a live session.
    ///
    /// # Errors
    /// `Unauthorized` for a missing, forged, unknown, or expired token.
    pub async fn resolve(&self, token: Option<&str>) -> Result<Session, ChitError> {
        let token = token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ChitError::Unauthorized("Not authenticated".to_string()))?;
        let session_id = verify_session_token(&self.secret, token)?;

        let session = self
            .sessions
            .read()
            .await
            .get(&session_id)
            .cloned()
            .ok_or_else(|| ChitError::Unauthorized("Session not found".to_string()))?;

        if session.is_expired(Utc::now()) {
            self.sessions.write().await.remove(&session_id);
            return Err(ChitError::Unauthorized("Session expired".to_string()));
        }
        Ok(session)
    }

    /// End the session behind `token`. Returns whether one was removed.
    pub async fn revoke(&self, token: &str) -> bool {
        match verify_session_token(&self.secret, token) {
            Ok(id) => self.sessions.write().await.remove(&id).is_some(),
            Err(_) => false,
        }
    }

    /// End every session belonging to `user_id`.
    pub async fn revoke_user(&self, user_id: &Uuid) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.user_id != *user_id);
        before - sessions.len()
    }

    /// Drop expired sessions. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(now));
        before - sessions.len()
    }

    pub async fn active_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chitfund_core::auth::Role;
    use chitfund_core::crypto::generate_secret;

    fn user(role: Role) -> UserAccount {
        UserAccount {
            id: Uuid::now_v7(),
            username: "operator".to_string(),
            password_hash: "unused".to_string(),
            role,
            name: "Operator".to_string(),
            email: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_issue_and_resolve() {
        let mgr = SessionManager::new(generate_secret(), DEFAULT_SESSION_TTL_HOURS);
        let (token, issued) = mgr.issue(&user(Role::Admin)).await.unwrap();

        let resolved = mgr.resolve(Some(&token)).await.unwrap();
        assert_eq!(resolved, issued);
        assert_eq!(resolved.role, Role::Admin);
        assert_eq!(
            (resolved.expires_at - resolved.issued_at).num_hours(),
            DEFAULT_SESSION_TTL_HOURS
        );
    }

    #[tokio::test]
    async fn test_missing_and_forged_tokens() {
        let mgr = SessionManager::new(generate_secret(), 1);
        assert!(matches!(mgr.resolve(None).await, Err(ChitError::Unauthorized(_))));
        assert!(matches!(
            mgr.resolve(Some("garbage")).await,
            Err(ChitError::Unauthorized(_))
        ));

        // A token signed under another secret does not resolve.
        let other = SessionManager::new(generate_secret(), 1);
        let (token, _) = other.issue(&user(Role::User)).await.unwrap();
        assert!(matches!(
            mgr.resolve(Some(&token)).await,
            Err(ChitError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_revoke() {
        let mgr = SessionManager::new(generate_secret(), 1);
        let u = user(Role::User);
        let (t1, _) = mgr.issue(&u).await.unwrap();
        let (t2, _) = mgr.issue(&u).await.unwrap();

        assert!(mgr.revoke(&t1).await);
        assert!(!mgr.revoke(&t1).await);
        assert!(mgr.resolve(Some(&t1)).await.is_err());
        assert!(mgr.resolve(Some(&t2)).await.is_ok());

        assert_eq!(mgr.revoke_user(&u.id).await, 1);
        assert_eq!(mgr.active_count().await, 0);
    }

    #[tokio::test]
    async fn test_expired_session_rejected() {
        let mgr = SessionManager::new(generate_secret(), 1);
        let (token, session) = mgr.issue(&user(Role::User)).await.unwrap();
        {
            let mut table = mgr.sessions.write().await;
            if let Some(s) = table.get_mut(&session.session_id) {
                s.expires_at = Utc::now() - Duration::seconds(1);
            }
        }
        assert!(matches!(
            mgr.resolve(Some(&token)).await,
            Err(ChitError::Unauthorized(_))
        ));
        assert_eq!(mgr.purge_expired().await, 0);
        assert_eq!(mgr.active_count().await, 0);
    }
}
