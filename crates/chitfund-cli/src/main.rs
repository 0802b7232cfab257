// crates/chitfund-cli/src/main.rs
//
// CLI entrypoint for chit fund administration.
//
// Every subcommand is a JSON-RPC call to a running chitfund-daemon. Log in
// once with `chitfund auth login`; the session token is reused by later
// commands until it expires or `chitfund auth logout` is run.

mod commands;
mod output;
mod rpc_client;

use clap::{Parser, Subcommand};
use commands::admin::AdminCmd;
use commands::auth::AuthCmd;
use commands::draw::DrawCmd;
use commands::funds::FundsCmd;
use commands::ledger::LedgerCmd;
use commands::members::MembersCmd;
use commands::search::SearchCmd;
use commands::users::UsersCmd;
use output::OutputFormat;
use rpc_client::RpcClient;

/// Chit fund administration CLI.
#[derive(Parser, Debug)]
#[command(
    name = "chitfund",
    version = "0.1.0",
    about = "Chit fund administration: members, funds, draws, and the winner ledger"
)]
struct Cli {
    /// RPC endpoint for the chitfund-daemon.
    #[arg(long, global = true, default_value = "http://localhost:50051")]
    rpc: String,

    /// Print raw JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Log in, log out, or bootstrap the first account.
    #[command(subcommand)]
    Auth(AuthCmd),

    /// Member registry: list, get, create, import.
    #[command(subcommand)]
    Members(MembersCmd),

    /// Fund management, rosters, and payout schedules.
    #[command(subcommand)]
    Funds(FundsCmd),

    /// Run a draw for a fund.
    #[command(subcommand)]
    Draw(DrawCmd),

    /// Find a member by ID or mobile number.
    Search(SearchCmd),

    /// Winner ledger across all funds.
    #[command(subcommand)]
    Ledger(LedgerCmd),

    /// Operator accounts.
    #[command(subcommand)]
    Users(UsersCmd),

    /// Data counts and purge.
    #[command(subcommand)]
    Admin(AdminCmd),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = RpcClient::new(&cli.rpc);
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Table
    };

    match &cli.command {
        Commands::Auth(cmd) => commands::auth::run(&client, format, cmd).await?,
        Commands::Members(cmd) => commands::members::run(&client, format, cmd).await?,
        Commands::Funds(cmd) => commands::funds::run(&client, format, cmd).await?,
        Commands::Draw(cmd) => commands::draw::run(&client, format, cmd).await?,
        Commands::Search(cmd) => commands::search::run(&client, format, cmd).await?,
        Commands::Ledger(cmd) => commands::ledger::run(&client, format, cmd).await?,
        Commands::Users(cmd) => commands::users::run(&client, format, cmd).await?,
        Commands::Admin(cmd) => commands::admin::run(&client, format, cmd).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_draw_three() {
        let cli = Cli::try_parse_from([
            "chitfund",
            "--json",
            "draw",
            "three",
            "--fund",
            "0190a1b2-c3d4-7e5f-8a9b-0c1d2e3f4a5b",
        ])
        .unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Draw(DrawCmd::Three { .. })));
    }

    #[test]
    fn test_search_requires_a_key() {
        assert!(Cli::try_parse_from(["chitfund", "search"]).is_err());
        assert!(Cli::try_parse_from(["chitfund", "search", "--mobile", "98"]).is_ok());
    }
}
