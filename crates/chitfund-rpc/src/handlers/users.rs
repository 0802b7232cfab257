// crates/chitfund-rpc/src/handlers/users.rs
//
// User administration handlers: ListUsers, CreateUser, DeleteUser.
// Gated on ManageUsers by the dispatcher; the caller's session is passed in
// for the rules that depend on who is asking.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use chitfund_core::auth::{Role, Session};
use chitfund_core::error::ChitError;
use chitfund_core::traits::UserStore;
use chitfund_core::user::UserSummary;

use crate::handlers::auth::new_account;
use crate::session::SessionManager;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListUsersRequest {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListUsersResponse {
    pub users: Vec<UserSummary>,
}

pub async fn handle_list_users(
    users: &dyn UserStore,
    _request: ListUsersRequest,
) -> Result<ListUsersResponse, ChitError> {
    let users = users.list_users().await?;
    Ok(ListUsersResponse {
        users: users.iter().map(UserSummary::from).collect(),
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    /// `user` (default) or `admin`.
    #[serde(default)]
    pub role: Option<Role>,
}

/// Create an account. Only a superadmin may create admins; nobody creates
/// superadmins this way.
pub async fn handle_create_user(
    users: &dyn UserStore,
    sessions: &SessionManager,
    caller: &Session,
    request: CreateUserRequest,
) -> Result<UserSummary, ChitError> {
    let role = request.role.unwrap_or(Role::User);
    match role {
        Role::User => {}
        Role::Admin if caller.role == Role::SuperAdmin => {}
        Role::Admin => {
            return Err(ChitError::Forbidden(
                "Only a superadmin can create admin accounts".to_string(),
            ))
        }
        Role::SuperAdmin => {
            return Err(ChitError::Validation(
                "Role must be 'user' or 'admin'".to_string(),
            ))
        }
    }

    let account = new_account(
        &request.username,
        &request.password,
        &request.name,
        request.email,
        role,
    )
    .await?;

    let _gate = sessions.account_gate().await;
    users.insert_user(&account).await?;
    tracing::info!(
        username = %account.username,
        role = %account.role,
        created_by = %caller.username,
        "User created"
    );
    Ok(UserSummary::from(&account))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteUserRequest {
    pub id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteUserResponse {
    pub deleted: bool,
    /// Sessions ended along with the account.
    pub sessions_revoked: usize,
}

/// Delete an account and end its sessions. Callers cannot delete themselves.
pub async fn handle_delete_user(
    users: &dyn UserStore,
    sessions: &SessionManager,
    caller: &Session,
    request: DeleteUserRequest,
) -> Result<DeleteUserResponse, ChitError> {
    if request.id == caller.user_id {
        return Err(ChitError::Validation(
            "Cannot delete your own account".to_string(),
        ));
    }

    let target = users
        .get_user(&request.id)
        .await?
        .ok_or_else(|| ChitError::NotFound(format!("User {} not found", request.id)))?;
    if target.role > caller.role {
        return Err(ChitError::Forbidden(
            "Cannot delete an account with a higher role".to_string(),
        ));
    }

    let deleted = users.delete_user(&request.id).await?;
    let sessions_revoked = sessions.revoke_user(&request.id).await;
    tracing::info!(username = %target.username, deleted_by = %caller.username, "User deleted");
    Ok(DeleteUserResponse {
        deleted,
        sessions_revoked,
    })
}
