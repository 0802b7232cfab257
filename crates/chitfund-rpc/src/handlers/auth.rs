// crates/chitfund-rpc/src/handlers/auth.rs
//
// Auth handlers: Login, Bootstrap, Session, Logout.
// All four are public; the session itself is resolved here.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use chitfund_core::auth::Role;
use chitfund_core::crypto::{hash_password, verify_password};
use chitfund_core::error::ChitError;
use chitfund_core::traits::UserStore;
use chitfund_core::user::{normalize_username, UserAccount, UserSummary};

use crate::session::SessionManager;

// ---------------------------------------------------------------------------
// Password work
// ---------------------------------------------------------------------------

// Argon2 is CPU-bound; both helpers run it on the blocking pool.

fn join_failed(e: tokio::task::JoinError) -> ChitError {
    ChitError::Crypto(format!("Password task failed: {}", e))
}

async fn hash_off_runtime(password: &str) -> Result<String, ChitError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(join_failed)?
}

/// Check a password against the stored hash, or against a fixed placeholder
/// hash when there is no account, so both paths cost one verification.
async fn verify_off_runtime(password: &str, stored_hash: Option<&str>) -> Result<bool, ChitError> {
    let password = password.to_string();
    let stored_hash = stored_hash.map(str::to_string);
    tokio::task::spawn_blocking(move || match stored_hash {
        Some(hash) => verify_password(&password, &hash),
        None => verify_password(&password, placeholder_hash()?).map(|_| false),
    })
    .await
    .map_err(join_failed)?
}

fn placeholder_hash() -> Result<&'static str, ChitError> {
    static PLACEHOLDER: OnceLock<String> = OnceLock::new();
    if let Some(hash) = PLACEHOLDER.get() {
        return Ok(hash);
    }
    let hash = hash_password("chitfund-no-such-account")?;
    Ok(PLACEHOLDER.get_or_init(|| hash))
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Session token; also set as the `session` cookie.
    pub token: String,
    pub user: UserSummary,
    pub expires_at: DateTime<Utc>,
}

/// Verify credentials and open a session.
///
/// Unknown user and wrong password produce the same error.
pub async fn handle_login(
    users: &dyn UserStore,
    sessions: &SessionManager,
    request: LoginRequest,
) -> Result<LoginResponse, ChitError> {
    let username = normalize_username(&request.username);
    if username.is_empty() || request.password.is_empty() {
        return Err(ChitError::Validation(
            "Username and password are required".to_string(),
        ));
    }

    let invalid = || ChitError::Unauthorized("Invalid username or password".to_string());
    let user = users.find_user_by_username(&username).await?;
    let stored_hash = user.as_ref().map(|u| u.password_hash.clone());
    let verified = verify_off_runtime(&request.password, stored_hash.as_deref()).await?;
    let user = match user {
        Some(user) if verified => user,
        _ => {
            tracing::warn!(username = %username, "Login failed");
            return Err(invalid());
        }
    };

    let (token, session) = sessions.issue(&user).await?;
    tracing::info!(username = %user.username, role = %user.role, "Login succeeded");
    Ok(LoginResponse {
        token,
        user: UserSummary::from(&user),
        expires_at: session.expires_at,
    })
}

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

/// Create the first superadmin. Refused once any admin-level account exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapRequest {
    pub username: String,
    pub password: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Validate account fields and build a new record with a hashed password.
pub(crate) async fn new_account(
    username: &str,
    password: &str,
    name: &str,
    email: Option<String>,
    role: Role,
) -> Result<UserAccount, ChitError> {
    let username = normalize_username(username);
    let name = name.trim().to_string();
    if username.is_empty() || password.is_empty() || name.is_empty() {
        return Err(ChitError::Validation(
            "Username, password, and name are required".to_string(),
        ));
    }

    Ok(UserAccount {
        id: Uuid::now_v7(),
        username,
        password_hash: hash_off_runtime(password).await?,
        role,
        name,
        email: email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty()),
        created_at: Utc::now(),
    })
}

pub async fn handle_bootstrap(
    users: &dyn UserStore,
    sessions: &SessionManager,
    request: BootstrapRequest,
) -> Result<UserSummary, ChitError> {
    let _gate = sessions.account_gate().await;

    if users.list_users().await?.iter().any(|u| u.role.is_admin()) {
        return Err(ChitError::Conflict("Admin user already exists".to_string()));
    }

    let account = new_account(
        &request.username,
        &request.password,
        &request.name,
        request.email,
        Role::SuperAdmin,
    )
    .await?;
    users.insert_user(&account).await?;
    tracing::info!(username = %account.username, "Bootstrap superadmin created");
    Ok(UserSummary::from(&account))
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionRequest {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
    pub name: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<SessionUser>,
}

/// Describe the caller's session. Absence is not an error.
pub async fn handle_session(
    sessions: &SessionManager,
    token: Option<&str>,
    _request: SessionRequest,
) -> Result<SessionResponse, ChitError> {
    Ok(match sessions.resolve(token).await {
        Ok(s) => SessionResponse {
            authenticated: true,
            user: Some(SessionUser {
                user_id: s.user_id,
                username: s.username,
                role: s.role,
                name: s.name,
                expires_at: s.expires_at,
            }),
        },
        Err(_) => SessionResponse {
            authenticated: false,
            user: None,
        },
    })
}

// ---------------------------------------------------------------------------
// Logout
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogoutRequest {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub logged_out: bool,
}

pub async fn handle_logout(
    sessions: &SessionManager,
    token: Option<&str>,
    _request: LogoutRequest,
) -> Result<LogoutResponse, ChitError> {
    let logged_out = match token {
        Some(t) => sessions.revoke(t).await,
        None => false,
    };
    Ok(LogoutResponse { logged_out })
}
