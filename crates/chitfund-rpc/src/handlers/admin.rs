// crates/chitfund-rpc/src/handlers/admin.rs
//
// Admin handlers: Counts, Purge.
// Purge is gated on PurgeData (superadmin only) by the dispatcher.

use serde::{Deserialize, Serialize};

use chitfund_core::auth::Session;
use chitfund_core::error::ChitError;
use chitfund_engine::registry::FundRegistry;
use chitfund_engine::reporting::{self, DataCounts, PurgeReport, PurgeScope};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CountsRequest {}

pub async fn handle_counts(
    registry: &FundRegistry,
    _request: CountsRequest,
) -> Result<DataCounts, ChitError> {
    reporting::counts(
        registry.member_store().as_ref(),
        registry.fund_store().as_ref(),
    )
    .await
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurgeRequest {
    /// `all`, `members`, `funds`, or `winners`.
    pub scope: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurgeResponse {
    pub scope: PurgeScope,
    #[serde(flatten)]
    pub report: PurgeReport,
}

pub async fn handle_purge(
    registry: &FundRegistry,
    caller: &Session,
    request: PurgeRequest,
) -> Result<PurgeResponse, ChitError> {
    let scope: PurgeScope = request.scope.parse()?;
    tracing::warn!(scope = ?scope, by = %caller.username, "Purge requested");
    let report = registry.purge(scope).await?;
    Ok(PurgeResponse { scope, report })
}
