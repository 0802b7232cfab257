// crates/chitfund-engine/src/reporting.rs
//
// Read-side queries across all funds: member search with winning history,
// the winner ledger, data counts, and bulk purge.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use chitfund_core::error::ChitError;
use chitfund_core::member::Member;
use chitfund_core::traits::{FundStore, MemberStore};

/// How to look a member up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberQuery {
    MemberId(String),
    Mobile(String),
}

/// One win of the searched member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinningEntry {
    pub fund_name: String,
    pub date_won: DateTime<Utc>,
    pub amount: u64,
}

/// Search result. A miss is `found: false`, not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberSearchResult {
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member: Option<Member>,
    pub winning_history: Vec<WinningEntry>,
}

/// One ledger row: a winner record with its fund's name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub fund_id: uuid::Uuid,
    pub fund_name: String,
    pub member_id: String,
    pub member_name: String,
    pub date_won: DateTime<Utc>,
    pub amount: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataCounts {
    pub members: usize,
    pub funds: usize,
    pub total_winners: usize,
}

/// What `purge` deletes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurgeScope {
    All,
    Members,
    Funds,
    Winners,
}

impl std::str::FromStr for PurgeScope {
    type Err = ChitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(PurgeScope::All),
            "members" => Ok(PurgeScope::Members),
            "funds" | "sets" => Ok(PurgeScope::Funds),
            "winners" => Ok(PurgeScope::Winners),
            other => Err(ChitError::Validation(format!(
                "Invalid purge scope '{}'. Use: all, members, funds, winners",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeReport {
    pub members_deleted: usize,
    pub funds_deleted: usize,
    /// Funds whose winner history was cleared.
    pub funds_updated: usize,
}

/// Find a member by identifier or mobile and collect their wins across all funds.
pub async fn search_member(
    members: &dyn MemberStore,
    funds: &dyn FundStore,
    query: &MemberQuery,
) -> Result<MemberSearchResult, ChitError> {
    let member = match query {
        MemberQuery::MemberId(id) if !id.trim().is_empty() => members.get_member(id.trim()).await?,
        MemberQuery::Mobile(mobile) if !mobile.trim().is_empty() => {
            members.find_member_by_mobile(mobile.trim()).await?
        }
        _ => {
            return Err(ChitError::Validation(
                "Mobile or Member ID is required".to_string(),
            ))
        }
    };

    let Some(member) = member else {
        return Ok(MemberSearchResult {
            found: false,
            member: None,
            winning_history: Vec::new(),
        });
    };

    let winning_history = funds
        .list_funds()
        .await?
        .iter()
        .flat_map(|fund| {
            fund.winner_history
                .iter()
                .filter(|w| w.member_id == member.member_id)
                .map(|w| WinningEntry {
                    fund_name: fund.name.clone(),
                    date_won: w.date_won,
                    amount: w.amount,
                })
        })
        .collect();

    Ok(MemberSearchResult {
        found: true,
        member: Some(member),
        winning_history,
    })
}

/// Every winner record across all funds, newest first.
pub async fn ledger(funds: &dyn FundStore) -> Result<Vec<LedgerEntry>, ChitError> {
    let mut entries: Vec<LedgerEntry> = funds
        .list_funds()
        .await?
        .into_iter()
        .flat_map(|fund| {
            let fund_id = fund.id;
            let fund_name = fund.name;
            fund.winner_history.into_iter().map(move |w| LedgerEntry {
                fund_id,
                fund_name: fund_name.clone(),
                member_id: w.member_id,
                member_name: w.member_name,
                date_won: w.date_won,
                amount: w.amount,
            })
        })
        .collect();
    entries.sort_by(|a, b| b.date_won.cmp(&a.date_won));
    Ok(entries)
}

pub async fn counts(
    members: &dyn MemberStore,
    funds: &dyn FundStore,
) -> Result<DataCounts, ChitError> {
    let member_count = members.member_ids().await?.len();
    let all_funds = funds.list_funds().await?;
    Ok(DataCounts {
        members: member_count,
        funds: all_funds.len(),
        total_winners: all_funds.iter().map(|f| f.winner_history.len()).sum(),
    })
}

/// Bulk-delete data. Deleting funds also deletes their winner history.
/// Callers go through `FundRegistry::purge`, which holds the fund locks.
pub(crate) async fn purge(
    members: &dyn MemberStore,
    funds: &dyn FundStore,
    scope: PurgeScope,
) -> Result<PurgeReport, ChitError> {
    let mut report = PurgeReport::default();
    match scope {
        PurgeScope::All => {
            report.members_deleted = members.purge_members().await?;
            report.funds_deleted = funds.purge_funds().await?;
        }
        PurgeScope::Members => {
            report.members_deleted = members.purge_members().await?;
        }
        PurgeScope::Funds => {
            report.funds_deleted = funds.purge_funds().await?;
        }
        PurgeScope::Winners => {
            report.funds_updated = funds.clear_winner_history().await?;
        }
    }
    warn!(
        ?scope,
        members_deleted = report.members_deleted,
        funds_deleted = report.funds_deleted,
        funds_updated = report.funds_updated,
        "Data purged"
    );
    Ok(report)
}
