// crates/chitfund-rpc/src/handlers/funds.rs
//
// Fund handlers: ListFunds, GetFund, FundMembers, FundSchedule, CreateFund,
// AddMembers, RemoveMember, DeleteFund.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use chitfund_core::error::ChitError;
use chitfund_core::fund::{Fund, FundConfig};
use chitfund_core::member::Member;
use chitfund_engine::distribution::DistributionSchedule;
use chitfund_engine::registry::{
    AddMembersReport, FundDetail, FundRegistry, RemovalMode, RemovalReport,
};

/// Requests addressed to a single fund.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundIdRequest {
    pub fund_id: Uuid,
}

// ---------------------------------------------------------------------------
// ListFunds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListFundsRequest {
    /// Expand each fund's active roster into member records.
    #[serde(default)]
    pub expand: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListFundsResponse {
    pub funds: Vec<FundDetail>,
}

pub async fn handle_list_funds(
    registry: &FundRegistry,
    request: ListFundsRequest,
) -> Result<ListFundsResponse, ChitError> {
    let funds = if request.expand {
        registry.list_fund_details().await?
    } else {
        registry
            .list_funds()
            .await?
            .into_iter()
            .map(|fund| FundDetail {
                fund,
                members: Vec::new(),
            })
            .collect()
    };
    Ok(ListFundsResponse { funds })
}

// ---------------------------------------------------------------------------
// GetFund / FundMembers / FundSchedule
// ---------------------------------------------------------------------------

pub async fn handle_get_fund(
    registry: &FundRegistry,
    request: FundIdRequest,
) -> Result<FundDetail, ChitError> {
    registry.fund_detail(&request.fund_id).await
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundMembersResponse {
    pub members: Vec<Member>,
}

pub async fn handle_fund_members(
    registry: &FundRegistry,
    request: FundIdRequest,
) -> Result<FundMembersResponse, ChitError> {
    Ok(FundMembersResponse {
        members: registry.fund_members(&request.fund_id).await?,
    })
}

pub async fn handle_fund_schedule(
    registry: &FundRegistry,
    request: FundIdRequest,
) -> Result<DistributionSchedule, ChitError> {
    registry.schedule(&request.fund_id).await
}

// ---------------------------------------------------------------------------
// CreateFund
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFundRequest {
    pub name: String,
    pub total_members: u32,
    pub draw_day: u8,
    pub monthly_amount: u64,
    /// Initial roster. Members must exist.
    #[serde(default)]
    pub member_ids: Vec<String>,
}

pub async fn handle_create_fund(
    registry: &FundRegistry,
    request: CreateFundRequest,
) -> Result<Fund, ChitError> {
    let config = FundConfig {
        name: request.name,
        total_members: request.total_members,
        draw_day: request.draw_day,
        monthly_amount: request.monthly_amount,
    };
    registry.create_fund(config, request.member_ids).await
}

// ---------------------------------------------------------------------------
// AddMembers / RemoveMember
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddMembersRequest {
    pub fund_id: Uuid,
    pub member_ids: Vec<String>,
}

pub async fn handle_add_members(
    registry: &FundRegistry,
    request: AddMembersRequest,
) -> Result<AddMembersReport, ChitError> {
    registry
        .add_members(&request.fund_id, request.member_ids)
        .await
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveMemberRequest {
    pub fund_id: Uuid,
    pub member_id: String,
    /// `this_fund` (default), `all_funds`, or `check_only`.
    #[serde(default)]
    pub mode: RemovalMode,
}

pub async fn handle_remove_member(
    registry: &FundRegistry,
    request: RemoveMemberRequest,
) -> Result<RemovalReport, ChitError> {
    registry
        .remove_member(&request.fund_id, &request.member_id, request.mode)
        .await
}

// ---------------------------------------------------------------------------
// DeleteFund
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteFundResponse {
    pub deleted: Uuid,
}

pub async fn handle_delete_fund(
    registry: &FundRegistry,
    request: FundIdRequest,
) -> Result<DeleteFundResponse, ChitError> {
    registry.delete_fund(&request.fund_id).await?;
    Ok(DeleteFundResponse {
        deleted: request.fund_id,
    })
}
