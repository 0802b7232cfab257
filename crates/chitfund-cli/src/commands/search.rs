// crates/chitfund-cli/src/commands/search.rs
//
// `chitfund search`: look up a member and their winnings across funds.

use clap::Args;

use chitfund_engine::MemberSearchResult;
use chitfund_rpc::handlers::search::SearchMemberRequest;

use crate::output::{format_amount, format_json, OutputFormat};
use crate::rpc_client::{CliError, RpcClient};

/// Member search. The member ID wins if both are given.
#[derive(Debug, Args)]
pub struct SearchCmd {
    #[arg(long, required_unless_present = "mobile")]
    pub member_id: Option<String>,

    #[arg(long)]
    pub mobile: Option<String>,
}

/// Run the search command.
pub async fn run(client: &RpcClient, format: OutputFormat, cmd: &SearchCmd) -> Result<(), CliError> {
    let result: MemberSearchResult = client
        .call(
            "search/member",
            &SearchMemberRequest {
                member_id: cmd.member_id.clone(),
                mobile: cmd.mobile.clone(),
            },
        )
        .await?;

    if format == OutputFormat::Json {
        println!("{}", format_json(&result));
        return Ok(());
    }

    let Some(member) = result.member.filter(|_| result.found) else {
        println!("Member not found.");
        return Ok(());
    };

    println!("{} ({})", member.name, member.member_id);
    println!("  Mobile:   {}", member.mobile);
    println!("  Email:    {}", member.email);
    println!("  Location: {}", member.location);
    println!();
    if result.winning_history.is_empty() {
        println!("No winnings yet.");
    } else {
        println!("Winnings");
        for win in &result.winning_history {
            println!(
                "  {}  {}  {}",
                win.date_won.format("%Y-%m-%d"),
                format_amount(win.amount),
                win.fund_name
            );
        }
    }

    Ok(())
}
