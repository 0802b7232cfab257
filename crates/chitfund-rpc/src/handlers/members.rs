// crates/chitfund-rpc/src/handlers/members.rs
//
// Member handlers: ListMembers, GetMember, CreateMember, ImportMembers.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use chitfund_core::error::ChitError;
use chitfund_core::member::{Member, MemberDetails};
use chitfund_engine::import::{import_members, ImportReport};
use chitfund_engine::registry::FundRegistry;

// ---------------------------------------------------------------------------
// ListMembers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListMembersRequest {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListMembersResponse {
    /// Newest first.
    pub members: Vec<Member>,
    pub count: usize,
}

pub async fn handle_list_members(
    registry: &FundRegistry,
    _request: ListMembersRequest,
) -> Result<ListMembersResponse, ChitError> {
    let members = registry.list_members().await?;
    Ok(ListMembersResponse {
        count: members.len(),
        members,
    })
}

// ---------------------------------------------------------------------------
// GetMember
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetMemberRequest {
    pub member_id: String,
}

pub async fn handle_get_member(
    registry: &FundRegistry,
    request: GetMemberRequest,
) -> Result<Member, ChitError> {
    registry.get_member(request.member_id.trim()).await
}

// ---------------------------------------------------------------------------
// CreateMember
// ---------------------------------------------------------------------------

/// Field names follow the member record; the identifier is generated.
pub type CreateMemberRequest = MemberDetails;

pub async fn handle_create_member(
    registry: &FundRegistry,
    request: CreateMemberRequest,
) -> Result<Member, ChitError> {
    registry.create_member(request).await
}

// ---------------------------------------------------------------------------
// ImportMembers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportMembersRequest {
    /// Delimited text with a header row.
    pub data: String,
    /// Funds to attach the imported members to.
    #[serde(default)]
    pub fund_ids: Vec<Uuid>,
}

pub async fn handle_import_members(
    registry: &FundRegistry,
    request: ImportMembersRequest,
) -> Result<ImportReport, ChitError> {
    if request.data.trim().is_empty() {
        return Err(ChitError::Validation("No file provided".to_string()));
    }
    import_members(registry, &request.data, &request.fund_ids).await
}
