// crates/chitfund-rpc/src/handlers/search.rs
//
// Member search and winner ledger handlers.

use serde::{Deserialize, Serialize};

use chitfund_core::error::ChitError;
use chitfund_engine::registry::FundRegistry;
use chitfund_engine::reporting::{self, LedgerEntry, MemberQuery, MemberSearchResult};

/// Search by member identifier or mobile. The identifier wins if both are given.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchMemberRequest {
    #[serde(default)]
    pub member_id: Option<String>,
    #[serde(default)]
    pub mobile: Option<String>,
}

impl SearchMemberRequest {
    fn into_query(self) -> Result<MemberQuery, ChitError> {
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        match (non_empty(self.member_id), non_empty(self.mobile)) {
            (Some(id), _) => Ok(MemberQuery::MemberId(id)),
            (None, Some(mobile)) => Ok(MemberQuery::Mobile(mobile)),
            (None, None) => Err(ChitError::Validation(
                "Mobile or Member ID is required".to_string(),
            )),
        }
    }
}

pub async fn handle_search_member(
    registry: &FundRegistry,
    request: SearchMemberRequest,
) -> Result<MemberSearchResult, ChitError> {
    let query = request.into_query()?;
    reporting::search_member(
        registry.member_store().as_ref(),
        registry.fund_store().as_ref(),
        &query,
    )
    .await
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerRequest {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerResponse {
    /// Newest first.
    pub entries: Vec<LedgerEntry>,
    pub total_paid: u64,
}

pub async fn handle_ledger(
    registry: &FundRegistry,
    _request: LedgerRequest,
) -> Result<LedgerResponse, ChitError> {
    let entries = reporting::ledger(registry.fund_store().as_ref()).await?;
    let total_paid = entries.iter().map(|e| e.amount).sum();
    Ok(LedgerResponse {
        entries,
        total_paid,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_selection() {
        let both = SearchMemberRequest {
            member_id: Some("AGR0001A".into()),
            mobile: Some("999".into()),
        };
        assert_eq!(
            both.into_query().unwrap(),
            MemberQuery::MemberId("AGR0001A".into())
        );

        let mobile = SearchMemberRequest {
            member_id: Some("  ".into()),
            mobile: Some("999".into()),
        };
        assert_eq!(mobile.into_query().unwrap(), MemberQuery::Mobile("999".into()));

        assert!(SearchMemberRequest::default().into_query().is_err());
    }
}
