// crates/chitfund-cli/src/commands/draw.rs
//
// `chitfund draw {single, three} --fund <id>`: run a draw.

use clap::Subcommand;
use uuid::Uuid;

use chitfund_rpc::handlers::draw::{DrawRequest, DrawResponse};

use crate::output::{emit, format_amount, OutputFormat, WinnerRow};
use crate::rpc_client::{CliError, RpcClient};

/// Draw subcommands.
#[derive(Debug, Subcommand)]
pub enum DrawCmd {
    /// Draw one winner, paid the monthly amount.
    Single {
        #[arg(long)]
        fund: Uuid,
    },
    /// Draw three winners, each paid a quarter of the collection.
    Three {
        #[arg(long)]
        fund: Uuid,
    },
}

/// Run the draw subcommand.
pub async fn run(client: &RpcClient, format: OutputFormat, cmd: &DrawCmd) -> Result<(), CliError> {
    let (method, fund) = match cmd {
        DrawCmd::Single { fund } => ("draw/single", fund),
        DrawCmd::Three { fund } => ("draw/three", fund),
    };

    let resp: DrawResponse = client.call(method, &DrawRequest { fund_id: *fund }).await?;
    emit(format, &resp, |r| r.outcome.winners.iter().map(WinnerRow::from).collect());
    if format == OutputFormat::Table {
        let total: u64 = resp.outcome.winners.iter().map(|w| w.amount).sum();
        println!(
            "Paid {}; {} members remain",
            format_amount(total),
            resp.outcome.remaining_members
        );
    }

    Ok(())
}
