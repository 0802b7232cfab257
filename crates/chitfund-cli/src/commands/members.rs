// crates/chitfund-cli/src/commands/members.rs
//
// `chitfund members {list, get, create, import}`: member registry commands.

use std::path::PathBuf;

use clap::Subcommand;
use uuid::Uuid;

use chitfund_core::member::{Member, MemberDetails};
use chitfund_engine::ImportReport;
use chitfund_rpc::handlers::members::{
    GetMemberRequest, ImportMembersRequest, ListMembersRequest, ListMembersResponse,
};

use crate::output::{emit, format_json, MemberRow, OutputFormat};
use crate::rpc_client::{CliError, RpcClient};

/// Member subcommands.
#[derive(Debug, Subcommand)]
pub enum MembersCmd {
    /// List all members, newest first.
    List,
    /// Show one member.
    Get {
        #[arg(long)]
        id: String,
    },
    /// Register a member. The member ID is generated by the daemon.
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        mobile: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        location: String,
        #[arg(long)]
        national_id: String,
    },
    /// Import members from a CSV file
    /// (columns: Name, Mobile, Email, Location, Aadhar).
    Import {
        /// Path to the CSV file.
        #[arg(long)]
        file: PathBuf,
        /// Attach every imported member to this fund (repeatable).
        #[arg(long = "fund")]
        funds: Vec<Uuid>,
    },
}

/// Run the members subcommand.
pub async fn run(client: &RpcClient, format: OutputFormat, cmd: &MembersCmd) -> Result<(), CliError> {
    match cmd {
        MembersCmd::List => {
            let resp: ListMembersResponse =
                client.call("members/list", &ListMembersRequest {}).await?;
            emit(format, &resp, |r| r.members.iter().map(MemberRow::from).collect());
            if format == OutputFormat::Table {
                println!("{} members", resp.count);
            }
        }
        MembersCmd::Get { id } => {
            let member: Member = client
                .call(
                    "members/get",
                    &GetMemberRequest {
                        member_id: id.clone(),
                    },
                )
                .await?;
            emit(format, &member, |m| vec![MemberRow::from(m)]);
        }
        MembersCmd::Create {
            name,
            mobile,
            email,
            location,
            national_id,
        } => {
            let details = MemberDetails {
                name: name.clone(),
                mobile: mobile.clone(),
                email: email.clone(),
                location: location.clone(),
                national_id: national_id.clone(),
            };
            let member: Member = client.call("members/create", &details).await?;
            if format == OutputFormat::Json {
                println!("{}", format_json(&member));
            } else {
                println!("Created member {} ({})", member.member_id, member.name);
            }
        }
        MembersCmd::Import { file, funds } => {
            let data = std::fs::read_to_string(file)?;
            let report: ImportReport = client
                .call(
                    "members/import",
                    &ImportMembersRequest {
                        data,
                        fund_ids: funds.clone(),
                    },
                )
                .await?;
            emit(format, &report, |r| r.members.iter().map(MemberRow::from).collect());
            if format == OutputFormat::Table {
                println!("Imported {} members", report.count);
                for warning in &report.warnings {
                    eprintln!("warning: {}", warning);
                }
            }
        }
    }

    Ok(())
}
