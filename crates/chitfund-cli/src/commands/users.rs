// crates/chitfund-cli/src/commands/users.rs
//
// `chitfund users {list, create, delete}`: operator account management.
// Admin and above only; creating an admin needs a superadmin.

use clap::{Subcommand, ValueEnum};
use uuid::Uuid;

use chitfund_core::auth::Role;
use chitfund_core::user::UserSummary;
use chitfund_rpc::handlers::users::{
    CreateUserRequest, DeleteUserRequest, DeleteUserResponse, ListUsersRequest, ListUsersResponse,
};

use crate::output::{emit, format_json, OutputFormat, UserRow};
use crate::rpc_client::{CliError, RpcClient};

/// Roles an operator can assign.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RoleArg {
    User,
    Admin,
}

impl From<RoleArg> for Role {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::User => Role::User,
            RoleArg::Admin => Role::Admin,
        }
    }
}

/// User subcommands.
#[derive(Debug, Subcommand)]
pub enum UsersCmd {
    /// List operator accounts.
    List,
    /// Create an operator account.
    Create {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long, value_enum, default_value = "user")]
        role: RoleArg,
    },
    /// Delete an account and end its sessions.
    Delete {
        #[arg(long)]
        id: Uuid,
    },
}

/// Run the users subcommand.
pub async fn run(client: &RpcClient, format: OutputFormat, cmd: &UsersCmd) -> Result<(), CliError> {
    match cmd {
        UsersCmd::List => {
            let resp: ListUsersResponse = client.call("users/list", &ListUsersRequest {}).await?;
            emit(format, &resp, |r| r.users.iter().map(UserRow::from).collect());
        }
        UsersCmd::Create {
            username,
            password,
            name,
            email,
            role,
        } => {
            let user: UserSummary = client
                .call(
                    "users/create",
                    &CreateUserRequest {
                        username: username.clone(),
                        password: password.clone(),
                        name: name.clone(),
                        email: email.clone(),
                        role: Some((*role).into()),
                    },
                )
                .await?;
            if format == OutputFormat::Json {
                println!("{}", format_json(&user));
            } else {
                println!("Created {} {} ({})", user.role.as_str(), user.username, user.id);
            }
        }
        UsersCmd::Delete { id } => {
            let resp: DeleteUserResponse = client
                .call("users/delete", &DeleteUserRequest { id: *id })
                .await?;
            println!(
                "Deleted user {}; {} sessions ended",
                id, resp.sessions_revoked
            );
        }
    }

    Ok(())
}
