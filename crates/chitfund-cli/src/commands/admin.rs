// crates/chitfund-cli/src/commands/admin.rs
//
// `chitfund admin {counts, purge}`: data maintenance.

use clap::{Subcommand, ValueEnum};

use chitfund_engine::DataCounts;
use chitfund_rpc::handlers::admin::{CountsRequest, PurgeRequest, PurgeResponse};

use crate::output::{format_json, OutputFormat};
use crate::rpc_client::{CliError, RpcClient};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ScopeArg {
    All,
    Members,
    Funds,
    Winners,
}

impl ScopeArg {
    fn as_str(self) -> &'static str {
        match self {
            ScopeArg::All => "all",
            ScopeArg::Members => "members",
            ScopeArg::Funds => "funds",
            ScopeArg::Winners => "winners",
        }
    }
}

/// Admin subcommands.
#[derive(Debug, Subcommand)]
pub enum AdminCmd {
    /// Show how many members, funds, and winner records exist.
    Counts,
    /// Permanently delete data. Superadmin only.
    Purge {
        #[arg(long, value_enum)]
        scope: ScopeArg,
        /// Required; purging cannot be undone.
        #[arg(long)]
        yes: bool,
    },
}

/// Run the admin subcommand.
pub async fn run(client: &RpcClient, format: OutputFormat, cmd: &AdminCmd) -> Result<(), CliError> {
    match cmd {
        AdminCmd::Counts => {
            let counts: DataCounts = client.call("admin/counts", &CountsRequest {}).await?;
            if format == OutputFormat::Json {
                println!("{}", format_json(&counts));
            } else {
                println!("Members:        {}", counts.members);
                println!("Funds:          {}", counts.funds);
                println!("Winner records: {}", counts.total_winners);
            }
        }
        AdminCmd::Purge { scope, yes } => {
            if !yes {
                eprintln!(
                    "Refusing to purge {} without --yes. This cannot be undone.",
                    scope.as_str()
                );
                return Ok(());
            }
            let resp: PurgeResponse = client
                .call(
                    "admin/purge",
                    &PurgeRequest {
                        scope: scope.as_str().to_string(),
                    },
                )
                .await?;
            if format == OutputFormat::Json {
                println!("{}", format_json(&resp));
            } else {
                println!(
                    "Purged {}: {} members deleted, {} funds deleted, {} funds cleared",
                    scope.as_str(),
                    resp.report.members_deleted,
                    resp.report.funds_deleted,
                    resp.report.funds_updated
                );
            }
        }
    }

    Ok(())
}
