// crates/chitfund-cli/src/commands/auth.rs
//
// `chitfund auth {login, logout, session, bootstrap}`: session management.

use clap::Subcommand;

use chitfund_core::user::UserSummary;
use chitfund_rpc::handlers::auth::{
    BootstrapRequest, LoginRequest, LoginResponse, LogoutRequest, LogoutResponse,
    SessionRequest, SessionResponse,
};

use crate::output::{format_json, OutputFormat};
use crate::rpc_client::{clear_token, save_token, token_path, CliError, RpcClient};

/// Authentication subcommands.
#[derive(Debug, Subcommand)]
pub enum AuthCmd {
    /// Log in and save the session token locally.
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// End the current session and forget the saved token.
    Logout,
    /// Show who the saved token belongs to.
    Session,
    /// Create the first superadmin account on a fresh install.
    Bootstrap {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        /// Display name.
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: Option<String>,
    },
}

/// Run the auth subcommand.
pub async fn run(client: &RpcClient, format: OutputFormat, cmd: &AuthCmd) -> Result<(), CliError> {
    match cmd {
        AuthCmd::Login { username, password } => {
            let resp: LoginResponse = client
                .call(
                    "auth/login",
                    &LoginRequest {
                        username: username.clone(),
                        password: password.clone(),
                    },
                )
                .await?;
            save_token(&resp.token)?;
            if format == OutputFormat::Json {
                println!("{}", format_json(&resp.user));
            } else {
                println!(
                    "Logged in as {} ({})",
                    resp.user.username,
                    resp.user.role.as_str()
                );
                println!("  Expires: {}", resp.expires_at.format("%Y-%m-%d %H:%M UTC"));
                if let Some(path) = token_path() {
                    println!("  Token saved to {}", path.display());
                }
            }
        }
        AuthCmd::Logout => {
            let resp: LogoutResponse = client.call("auth/logout", &LogoutRequest {}).await?;
            clear_token()?;
            if resp.logged_out {
                println!("Logged out.");
            } else {
                println!("No active session.");
            }
        }
        AuthCmd::Session => {
            let resp: SessionResponse = client.call("auth/session", &SessionRequest {}).await?;
            if format == OutputFormat::Json {
                println!("{}", format_json(&resp));
                return Ok(());
            }
            match resp.user {
                Some(user) if resp.authenticated => {
                    println!("Authenticated");
                    println!("  Username: {}", user.username);
                    println!("  Name:     {}", user.name);
                    println!("  Role:     {}", user.role.as_str());
                    println!("  Expires:  {}", user.expires_at.format("%Y-%m-%d %H:%M UTC"));
                }
                _ => println!("Not authenticated."),
            }
        }
        AuthCmd::Bootstrap {
            username,
            password,
            name,
            email,
        } => {
            let user: UserSummary = client
                .call(
                    "auth/bootstrap",
                    &BootstrapRequest {
                        username: username.clone(),
                        password: password.clone(),
                        name: name.clone(),
                        email: email.clone(),
                    },
                )
                .await?;
            println!("Created superadmin {}. Log in with `chitfund auth login`.", user.username);
        }
    }

    Ok(())
}
