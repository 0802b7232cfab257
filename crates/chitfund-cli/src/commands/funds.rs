// crates/chitfund-cli/src/commands/funds.rs
//
// `chitfund funds ...`: fund lifecycle, roster, and schedule commands.

use clap::{Subcommand, ValueEnum};
use uuid::Uuid;

use chitfund_core::fund::Fund;
use chitfund_engine::{AddMembersReport, DistributionSchedule, FundDetail, RemovalMode, RemovalReport};
use chitfund_rpc::handlers::funds::{
    AddMembersRequest, CreateFundRequest, DeleteFundResponse, FundIdRequest, FundMembersResponse,
    ListFundsRequest, ListFundsResponse, RemoveMemberRequest,
};

use crate::output::{
    emit, format_amount, format_json, FundRow, MemberRow, OutputFormat, ScheduleTableRow,
    WinnerRow,
};
use crate::rpc_client::{CliError, RpcClient};

/// How far `remove-member` reaches.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RemovalArg {
    /// Remove from this fund only.
    ThisFund,
    /// Remove from every fund the member is active in.
    AllFunds,
    /// Report where the member is active; change nothing.
    CheckOnly,
}

impl From<RemovalArg> for RemovalMode {
    fn from(arg: RemovalArg) -> Self {
        match arg {
            RemovalArg::ThisFund => RemovalMode::ThisFund,
            RemovalArg::AllFunds => RemovalMode::AllFunds,
            RemovalArg::CheckOnly => RemovalMode::CheckOnly,
        }
    }
}

/// Fund subcommands.
#[derive(Debug, Subcommand)]
pub enum FundsCmd {
    /// List all funds, newest first.
    List,
    /// Show a fund with its roster and winner history.
    Get {
        #[arg(long)]
        id: Uuid,
    },
    /// List a fund's active members.
    Members {
        #[arg(long)]
        id: Uuid,
    },
    /// Show the projected payout schedule.
    Schedule {
        #[arg(long)]
        id: Uuid,
    },
    /// Create a fund.
    Create {
        #[arg(long)]
        name: String,
        /// Capacity used for payout calculations.
        #[arg(long)]
        total_members: u32,
        /// Day of month the draw is held (1-31).
        #[arg(long)]
        draw_day: u8,
        /// Monthly contribution per member, in rupees.
        #[arg(long)]
        monthly_amount: u64,
        /// Initial member (repeatable).
        #[arg(long = "member")]
        members: Vec<String>,
    },
    /// Add existing members to a fund.
    AddMembers {
        #[arg(long)]
        id: Uuid,
        #[arg(long = "member", required = true)]
        members: Vec<String>,
    },
    /// Remove a member from a fund.
    RemoveMember {
        #[arg(long)]
        id: Uuid,
        #[arg(long)]
        member: String,
        #[arg(long, value_enum, default_value = "this-fund")]
        mode: RemovalArg,
    },
    /// Delete a fund and its winner history.
    Delete {
        #[arg(long)]
        id: Uuid,
    },
}

/// Run the funds subcommand.
pub async fn run(client: &RpcClient, format: OutputFormat, cmd: &FundsCmd) -> Result<(), CliError> {
    match cmd {
        FundsCmd::List => {
            let resp: ListFundsResponse = client
                .call("funds/list", &ListFundsRequest { expand: false })
                .await?;
            emit(format, &resp, |r| {
                r.funds.iter().map(|d| FundRow::from(&d.fund)).collect()
            });
        }
        FundsCmd::Get { id } => {
            let detail: FundDetail = client
                .call("funds/get", &FundIdRequest { fund_id: *id })
                .await?;
            if format == OutputFormat::Json {
                println!("{}", format_json(&detail));
                return Ok(());
            }
            print_fund_summary(&detail.fund);
            println!();
            println!("Active members");
            emit(format, &detail, |d| d.members.iter().map(MemberRow::from).collect());
            println!();
            println!("Winners");
            emit(format, &detail, |d| {
                d.fund.winner_history.iter().map(WinnerRow::from).collect()
            });
        }
        FundsCmd::Members { id } => {
            let resp: FundMembersResponse = client
                .call("funds/members", &FundIdRequest { fund_id: *id })
                .await?;
            emit(format, &resp, |r| r.members.iter().map(MemberRow::from).collect());
        }
        FundsCmd::Schedule { id } => {
            let schedule: DistributionSchedule = client
                .call("funds/schedule", &FundIdRequest { fund_id: *id })
                .await?;
            if format == OutputFormat::Table {
                println!(
                    "Collection per round: {}  Payout per winner: {}  Completed rounds: {}",
                    format_amount(schedule.total_collection),
                    format_amount(schedule.payout_per_winner),
                    schedule.completed_rounds
                );
            }
            emit(format, &schedule, |s| {
                s.rows.iter().map(ScheduleTableRow::from).collect()
            });
        }
        FundsCmd::Create {
            name,
            total_members,
            draw_day,
            monthly_amount,
            members,
        } => {
            let fund: Fund = client
                .call(
                    "funds/create",
                    &CreateFundRequest {
                        name: name.clone(),
                        total_members: *total_members,
                        draw_day: *draw_day,
                        monthly_amount: *monthly_amount,
                        member_ids: members.clone(),
                    },
                )
                .await?;
            if format == OutputFormat::Json {
                println!("{}", format_json(&fund));
            } else {
                println!("Created fund {} ({})", fund.name, fund.id);
            }
        }
        FundsCmd::AddMembers { id, members } => {
            let report: AddMembersReport = client
                .call(
                    "funds/add_members",
                    &AddMembersRequest {
                        fund_id: *id,
                        member_ids: members.clone(),
                    },
                )
                .await?;
            if format == OutputFormat::Json {
                println!("{}", format_json(&report));
            } else {
                println!(
                    "Added {} members; {} now active",
                    report.added, report.active_members
                );
            }
        }
        FundsCmd::RemoveMember { id, member, mode } => {
            let report: RemovalReport = client
                .call(
                    "funds/remove_member",
                    &RemoveMemberRequest {
                        fund_id: *id,
                        member_id: member.clone(),
                        mode: (*mode).into(),
                    },
                )
                .await?;
            if format == OutputFormat::Json {
                println!("{}", format_json(&report));
                return Ok(());
            }
            for fund in &report.removed_from {
                println!("Removed {} from {}", member, fund.name);
            }
            if !report.other_funds.is_empty() {
                println!("Still active in:");
                for fund in &report.other_funds {
                    println!("  {} ({})", fund.name, fund.id);
                }
            }
        }
        FundsCmd::Delete { id } => {
            let resp: DeleteFundResponse = client
                .call("funds/delete", &FundIdRequest { fund_id: *id })
                .await?;
            println!("Deleted fund {}", resp.deleted);
        }
    }

    Ok(())
}

fn print_fund_summary(fund: &Fund) {
    println!("{}", fund.name);
    println!("  ID:             {}", fund.id);
    println!("  Members:        {}/{}", fund.active_members.len(), fund.total_members);
    println!("  Monthly amount: {}", format_amount(fund.monthly_amount));
    println!("  Collection:     {}", format_amount(fund.total_collection()));
    println!("  Draw day:       {}", fund.draw_day);
    println!("  Paid out:       {}", format_amount(fund.total_paid_out()));
}
