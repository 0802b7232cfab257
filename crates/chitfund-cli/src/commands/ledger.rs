// crates/chitfund-cli/src/commands/ledger.rs
//
// `chitfund ledger {list, export}`: the winner ledger across all funds.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use serde::Serialize;

use chitfund_engine::LedgerEntry;
use chitfund_rpc::handlers::search::{LedgerRequest, LedgerResponse};

use crate::output::{emit, format_amount, LedgerRow, OutputFormat};
use crate::rpc_client::{CliError, RpcClient};

/// Ledger subcommands.
#[derive(Debug, Subcommand)]
pub enum LedgerCmd {
    /// Print every winner record, newest first.
    List,
    /// Write the ledger to a CSV file.
    Export {
        #[arg(long, default_value = "winners.csv")]
        out: PathBuf,
    },
}

/// One CSV line of the exported ledger.
#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    #[serde(rename = "Fund")]
    fund: &'a str,
    #[serde(rename = "Member ID")]
    member_id: &'a str,
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Date Won")]
    date_won: String,
    #[serde(rename = "Amount")]
    amount: u64,
}

impl<'a> From<&'a LedgerEntry> for ExportRow<'a> {
    fn from(e: &'a LedgerEntry) -> Self {
        Self {
            fund: &e.fund_name,
            member_id: &e.member_id,
            name: &e.member_name,
            date_won: e.date_won.format("%Y-%m-%d").to_string(),
            amount: e.amount,
        }
    }
}

/// Write entries as CSV with a header row.
fn write_csv(path: &Path, entries: &[LedgerEntry]) -> Result<(), CliError> {
    let mut writer = csv::Writer::from_path(path)?;
    for entry in entries {
        writer.serialize(ExportRow::from(entry))?;
    }
    writer.flush()?;
    Ok(())
}

/// Run the ledger subcommand.
pub async fn run(client: &RpcClient, format: OutputFormat, cmd: &LedgerCmd) -> Result<(), CliError> {
    let resp: LedgerResponse = client.call("ledger/list", &LedgerRequest {}).await?;

    match cmd {
        LedgerCmd::List => {
            emit(format, &resp, |r| r.entries.iter().map(LedgerRow::from).collect());
            if format == OutputFormat::Table {
                println!("Total paid: {}", format_amount(resp.total_paid));
            }
        }
        LedgerCmd::Export { out } => {
            write_csv(out, &resp.entries)?;
            println!("Wrote {} rows to {}", resp.entries.len(), out.display());
        }
    }

    Ok(())
}
