// crates/chitfund-rpc/src/middleware.rs
//
// Middleware for the RPC server: transport-level logging interceptor,
// per-method access rules, session token extraction, and the request
// outcome log.

use std::time::Duration;

use tonic::{Request, Status};

use chitfund_core::auth::Capability;

use crate::session::SESSION_COOKIE;

/// Logging interceptor for incoming requests.
///
/// Logs the user agent and whether credentials were presented. Header values
/// that may carry session tokens are never logged.
pub fn logging_interceptor(req: Request<()>) -> Result<Request<()>, Status> {
    let metadata = req.metadata();
    let user_agent = metadata
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");
    let has_credentials =
        metadata.get("authorization").is_some() || metadata.get("cookie").is_some();
    tracing::debug!(user_agent, has_credentials, "Incoming RPC request");
    Ok(req)
}

/// Who may call a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// No session required.
    Public,
    /// A live session whose role grants the capability.
    Requires(Capability),
}

/// Access rule for `method`, or `None` if the method does not exist.
pub fn access_for(method: &str) -> Option<Access> {
    use Capability::*;

    let access = match method {
        "auth/login" | "auth/bootstrap" | "auth/session" | "auth/logout" => Access::Public,

        "members/list" | "members/get" | "funds/list" | "funds/get" | "funds/members"
        | "funds/schedule" | "search/member" | "ledger/list" | "admin/counts" => {
            Access::Requires(ViewFunds)
        }

        "members/create" | "members/import" => Access::Requires(ManageMembers),

        "funds/create" | "funds/add_members" | "funds/remove_member" | "funds/delete"
        | "draw/single" | "draw/three" => Access::Requires(ManageFunds),

        "users/list" | "users/create" | "users/delete" => Access::Requires(ManageUsers),

        "admin/purge" => Access::Requires(PurgeData),

        _ => return None,
    };
    Some(access)
}

/// Pull the session token from `Authorization: Bearer` or the session cookie.
///
/// The bearer header wins when both are present.
pub fn extract_token(headers: &http::HeaderMap) -> Option<String> {
    if let Some(token) = headers
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        return Some(token.to_string());
    }

    headers
        .get_all(http::header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// `Set-Cookie` value that stores `token` for `max_age_secs`.
pub fn session_cookie(token: &str, max_age_secs: i64) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE, token, max_age_secs
    )
}

/// `Set-Cookie` value that clears the session cookie.
pub fn clear_session_cookie() -> String {
    format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", SESSION_COOKIE)
}

/// Log a completed dispatch.
pub fn log_outcome(method: &str, code: u16, elapsed: Duration) {
    let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
    if code >= 500 {
        tracing::error!(method, code, elapsed_ms, "RPC call failed");
    } else if code >= 400 {
        tracing::warn!(method, code, elapsed_ms, "RPC call rejected");
    } else {
        tracing::info!(method, code, elapsed_ms, "RPC call");
    }
}
