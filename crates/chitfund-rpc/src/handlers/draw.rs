// crates/chitfund-rpc/src/handlers/draw.rs
//
// Draw handlers: DrawSingle, DrawThree.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use chitfund_core::error::ChitError;
use chitfund_engine::draw::DrawOutcome;
use chitfund_engine::registry::{DrawMode, FundRegistry};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawRequest {
    pub fund_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawResponse {
    pub fund_id: Uuid,
    pub mode: DrawMode,
    #[serde(flatten)]
    pub outcome: DrawOutcome,
}

/// Run a draw of the given mode against one fund.
pub async fn handle_draw(
    registry: &FundRegistry,
    mode: DrawMode,
    request: DrawRequest,
) -> Result<DrawResponse, ChitError> {
    let outcome = registry.draw(&request.fund_id, mode).await?;
    Ok(DrawResponse {
        fund_id: request.fund_id,
        mode,
        outcome,
    })
}
