// crates/chitfund-engine/src/registry.rs
//
// Fund and member registry service.
//
// Wraps the member and fund stores with the operations the RPC layer
// exposes. Every read-modify-write of a fund runs under that fund's async
// mutex and is written back with a version compare-and-swap, so concurrent
// draws or roster edits on one fund cannot lose updates. Member creation is
// serialized so generated identifiers never race each other. Lock entries
// exist only for funds that exist: a lookup that misses drops its entry,
// and deleting or purging funds clears them.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info};
use uuid::Uuid;

use chitfund_core::error::ChitError;
use chitfund_core::fund::{Fund, FundConfig};
use chitfund_core::member::{Member, MemberDetails};
use chitfund_core::member_id::{generate_member_id, validate_prefix, DEFAULT_PREFIX};
use chitfund_core::traits::{FundStore, MemberStore};

use crate::distribution::DistributionSchedule;
use crate::draw::{draw_single_winner, draw_three_winners, DrawOutcome};
use crate::reporting::{self, PurgeReport, PurgeScope};

/// Which draw policy to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawMode {
    Single,
    Three,
}

/// How `remove_member` should treat the member's other funds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalMode {
    /// Remove from the named fund only.
    #[default]
    ThisFund,
    /// Remove from every fund whose roster contains the member.
    AllFunds,
    /// Change nothing; report the other funds containing the member.
    CheckOnly,
}

/// Fund identity used in reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundRef {
    pub id: Uuid,
    pub name: String,
}

impl From<&Fund> for FundRef {
    fn from(fund: &Fund) -> Self {
        Self {
            id: fund.id,
            name: fund.name.clone(),
        }
    }
}

/// Result of `remove_member`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovalReport {
    /// Funds the member was actually removed from.
    pub removed_from: Vec<FundRef>,
    /// Other funds (besides the named one) whose rosters contain the member.
    pub other_funds: Vec<FundRef>,
}

/// Result of `add_members`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddMembersReport {
    pub added: usize,
    pub active_members: usize,
}

/// A fund with its active roster expanded into member records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundDetail {
    #[serde(flatten)]
    pub fund: Fund,
    pub members: Vec<Member>,
}

/// Registry service over the member and fund stores.
pub struct FundRegistry {
    members: Arc<dyn MemberStore>,
    funds: Arc<dyn FundStore>,
    /// Per-fund write locks, created on first use and dropped with the fund.
    fund_locks: std::sync::Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
    /// Serializes identifier generation plus insertion.
    member_gate: AsyncMutex<()>,
    rng: std::sync::Mutex<Box<dyn RngCore + Send>>,
    member_id_prefix: String,
}

impl FundRegistry {
    /// Create a registry with an entropy-seeded random source and the default prefix.
    pub fn new(members: Arc<dyn MemberStore>, funds: Arc<dyn FundStore>) -> Self {
        Self {
            members,
            funds,
            fund_locks: std::sync::Mutex::new(HashMap::new()),
            member_gate: AsyncMutex::new(()),
            rng: std::sync::Mutex::new(Box::new(StdRng::from_entropy())),
            member_id_prefix: DEFAULT_PREFIX.to_string(),
        }
    }

    /// Replace the random source (seeded sources make draws reproducible).
    pub fn with_rng<R: RngCore + Send + 'static>(mut self, rng: R) -> Self {
        self.rng = std::sync::Mutex::new(Box::new(rng));
        self
    }

    /// Set the member identifier prefix.
    pub fn with_member_id_prefix(mut self, prefix: &str) -> Result<Self, ChitError> {
        validate_prefix(prefix)?;
        self.member_id_prefix = prefix.to_string();
        Ok(self)
    }

    pub fn member_store(&self) -> &Arc<dyn MemberStore> {
        &self.members
    }

    pub fn fund_store(&self) -> &Arc<dyn FundStore> {
        &self.funds
    }

    fn lock_for(&self, fund_id: Uuid) -> Result<Arc<AsyncMutex<()>>, ChitError> {
        let mut locks = self
            .fund_locks
            .lock()
            .map_err(|_| ChitError::Storage("Fund lock table poisoned".to_string()))?;
        Ok(locks
            .entry(fund_id)
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone())
    }

    fn forget_lock(&self, fund_id: &Uuid) {
        if let Ok(mut locks) = self.fund_locks.lock() {
            locks.remove(fund_id);
        }
    }

    #[cfg(test)]
    fn lock_count(&self) -> usize {
        self.fund_locks.lock().map(|l| l.len()).unwrap_or(0)
    }

    /// Take the fund's write lock and load it. A miss removes the lock entry
    /// again so unknown ids leave nothing behind.
    async fn lock_fund(&self, fund_id: &Uuid) -> Result<(OwnedMutexGuard<()>, Fund), ChitError> {
        let guard = self.lock_for(*fund_id)?.lock_owned().await;
        match self.funds.get_fund(fund_id).await {
            Ok(Some(fund)) => Ok((guard, fund)),
            Ok(None) => {
                drop(guard);
                self.forget_lock(fund_id);
                Err(ChitError::NotFound(format!("Fund {} not found", fund_id)))
            }
            Err(e) => Err(e),
        }
    }

    fn generate_ids(
        &self,
        count: usize,
        existing: &mut HashSet<String>,
    ) -> Result<Vec<String>, ChitError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| ChitError::Storage("Random source poisoned".to_string()))?;
        let mut ids = Vec::with_capacity(count);
        for _ in 0..count {
            let id = generate_member_id(&self.member_id_prefix, existing, &mut **rng)?;
            existing.insert(id.clone());
            ids.push(id);
        }
        Ok(ids)
    }

    fn run_draw(
        &self,
        mode: DrawMode,
        fund: &mut Fund,
        directory: &HashMap<String, Member>,
    ) -> Result<DrawOutcome, ChitError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| ChitError::Storage("Random source poisoned".to_string()))?;
        let now = Utc::now();
        match mode {
            DrawMode::Single => draw_single_winner(fund, directory, now, &mut **rng),
            DrawMode::Three => draw_three_winners(fund, directory, now, &mut **rng),
        }
    }

    async fn load_fund(&self, fund_id: &Uuid) -> Result<Fund, ChitError> {
        self.funds
            .get_fund(fund_id)
            .await?
            .ok_or_else(|| ChitError::NotFound(format!("Fund {} not found", fund_id)))
    }

    /// Resolve the fund's active roster into member records, skipping dangling references.
    async fn resolve_roster(&self, fund: &Fund) -> Result<HashMap<String, Member>, ChitError> {
        let mut directory = HashMap::with_capacity(fund.active_members.len());
        for id in &fund.active_members {
            if let Some(member) = self.members.get_member(id).await? {
                directory.insert(id.clone(), member);
            }
        }
        Ok(directory)
    }

    async fn require_members(&self, member_ids: &[String]) -> Result<(), ChitError> {
        let mut missing = Vec::new();
        for id in member_ids {
            if self.members.get_member(id).await?.is_none() {
                missing.push(id.as_str());
            }
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ChitError::NotFound(format!(
                "Members not found: {}",
                missing.join(", ")
            )))
        }
    }

    // ---------------------------------------------------------------
    // Members
    // ---------------------------------------------------------------

    /// Register one member under a freshly generated identifier.
    pub async fn create_member(&self, details: MemberDetails) -> Result<Member, ChitError> {
        let mut created = self.create_members(vec![details]).await?;
        created
            .pop()
            .ok_or_else(|| ChitError::Storage("Member batch came back empty".to_string()))
    }

    /// Register a batch of members atomically.
    ///
    /// Identifiers avoid every stored identifier and every identifier already
    /// assigned earlier in the batch. Nothing is inserted if any record is
    /// invalid or generation fails.
    pub async fn create_members(&self, batch: Vec<MemberDetails>) -> Result<Vec<Member>, ChitError> {
        let details = batch
            .into_iter()
            .map(MemberDetails::normalized)
            .collect::<Result<Vec<_>, _>>()?;
        if details.is_empty() {
            return Err(ChitError::Validation("No members supplied".to_string()));
        }

        let _gate = self.member_gate.lock().await;
        let mut existing = self.members.member_ids().await?;
        let ids = self.generate_ids(details.len(), &mut existing)?;

        let now = Utc::now();
        let members: Vec<Member> = ids
            .into_iter()
            .zip(details)
            .map(|(id, d)| Member::new(id, d, now))
            .collect();

        self.members.insert_members(&members).await?;
        info!(count = members.len(), "Members registered");
        Ok(members)
    }

    pub async fn list_members(&self) -> Result<Vec<Member>, ChitError> {
        self.members.list_members().await
    }

    pub async fn get_member(&self, member_id: &str) -> Result<Member, ChitError> {
        self.members
            .get_member(member_id)
            .await?
            .ok_or_else(|| ChitError::NotFound(format!("Member {} not found", member_id)))
    }

    // ---------------------------------------------------------------
    // Funds
    // ---------------------------------------------------------------

    /// Create a fund. Initial members must already exist.
    pub async fn create_fund(
        &self,
        config: FundConfig,
        initial_members: Vec<String>,
    ) -> Result<Fund, ChitError> {
        config.validate()?;
        self.require_members(&initial_members).await?;

        let fund = Fund::new(config, initial_members, Utc::now())?;
        self.funds.insert_fund(&fund).await?;
        info!(
            fund = %fund.id,
            name = %fund.name,
            total_members = fund.total_members,
            monthly_amount = fund.monthly_amount,
            active_members = fund.active_members.len(),
            "Fund created"
        );
        Ok(fund)
    }

    pub async fn get_fund(&self, fund_id: &Uuid) -> Result<Fund, ChitError> {
        debug!(fund = %fund_id, "Loading fund");
        self.load_fund(fund_id).await
    }

    pub async fn list_funds(&self) -> Result<Vec<Fund>, ChitError> {
        self.funds.list_funds().await
    }

    async fn expand(&self, fund: Fund) -> Result<FundDetail, ChitError> {
        let mut directory = self.resolve_roster(&fund).await?;
        let members = fund
            .active_members
            .iter()
            .filter_map(|id| directory.remove(id))
            .collect();
        Ok(FundDetail { fund, members })
    }

    /// The fund's active members as member records, in roster order.
    pub async fn fund_members(&self, fund_id: &Uuid) -> Result<Vec<Member>, ChitError> {
        Ok(self.fund_detail(fund_id).await?.members)
    }

    /// A fund with its roster expanded.
    pub async fn fund_detail(&self, fund_id: &Uuid) -> Result<FundDetail, ChitError> {
        let fund = self.load_fund(fund_id).await?;
        self.expand(fund).await
    }

    /// Every fund with its roster expanded, newest first.
    pub async fn list_fund_details(&self) -> Result<Vec<FundDetail>, ChitError> {
        let funds = self.funds.list_funds().await?;
        let mut details = Vec::with_capacity(funds.len());
        for fund in funds {
            details.push(self.expand(fund).await?);
        }
        Ok(details)
    }

    /// Union existing members into a fund's roster.
    pub async fn add_members(
        &self,
        fund_id: &Uuid,
        member_ids: Vec<String>,
    ) -> Result<AddMembersReport, ChitError> {
        if member_ids.is_empty() {
            return Err(ChitError::Validation("Member IDs are required".to_string()));
        }
        self.require_members(&member_ids).await?;

        let (_guard, mut fund) = self.lock_fund(fund_id).await?;
        let added = fund.add_members(member_ids);
        if added > 0 {
            self.funds.update_fund(&fund).await?;
        }
        info!(fund = %fund_id, added, active_members = fund.active_members.len(), "Members added to fund");

        Ok(AddMembersReport {
            added,
            active_members: fund.active_members.len(),
        })
    }

    /// Remove a member from one fund, from every fund, or only report where it is.
    pub async fn remove_member(
        &self,
        fund_id: &Uuid,
        member_id: &str,
        mode: RemovalMode,
    ) -> Result<RemovalReport, ChitError> {
        let member_id = member_id.trim();
        if member_id.is_empty() {
            return Err(ChitError::Validation("Member ID is required".to_string()));
        }

        let fund = self.load_fund(fund_id).await?;
        let other_funds: Vec<FundRef> = self
            .funds
            .list_funds()
            .await?
            .iter()
            .filter(|f| f.id != *fund_id && f.is_active(member_id))
            .map(FundRef::from)
            .collect();

        let targets: Vec<Uuid> = match mode {
            RemovalMode::CheckOnly => {
                return Ok(RemovalReport {
                    removed_from: Vec::new(),
                    other_funds,
                })
            }
            RemovalMode::ThisFund => vec![fund.id],
            RemovalMode::AllFunds => std::iter::once(fund.id)
                .chain(other_funds.iter().map(|f| f.id))
                .collect(),
        };

        let mut removed_from = Vec::new();
        for target in targets {
            let (_guard, mut current) = match self.lock_fund(&target).await {
                Ok(locked) => locked,
                Err(ChitError::NotFound(_)) if target != *fund_id => continue,
                Err(e) => return Err(e),
            };
            if current.remove_member(member_id) {
                self.funds.update_fund(&current).await?;
                removed_from.push(FundRef::from(&current));
            }
        }

        info!(
            member_id,
            mode = ?mode,
            removed_from = removed_from.len(),
            "Member removed from fund roster"
        );
        Ok(RemovalReport {
            removed_from,
            other_funds,
        })
    }

    /// Delete a fund and its history.
    pub async fn delete_fund(&self, fund_id: &Uuid) -> Result<(), ChitError> {
        let lock = self.lock_for(*fund_id)?;
        let deleted = {
            let _guard = lock.lock().await;
            self.funds.delete_fund(fund_id).await
        };
        self.forget_lock(fund_id);
        if !deleted? {
            return Err(ChitError::NotFound(format!("Fund {} not found", fund_id)));
        }
        info!(fund = %fund_id, "Fund deleted");
        Ok(())
    }

    /// Run a draw and persist the winners atomically with the roster change.
    pub async fn draw(&self, fund_id: &Uuid, mode: DrawMode) -> Result<DrawOutcome, ChitError> {
        let (_guard, mut fund) = self.lock_fund(fund_id).await?;
        let directory = self.resolve_roster(&fund).await?;
        let outcome = self.run_draw(mode, &mut fund, &directory)?;
        self.funds.update_fund(&fund).await?;
        Ok(outcome)
    }

    /// Bulk-delete data while holding every fund's write lock, so in-flight
    /// draws and roster edits finish first and later ones see the result.
    pub async fn purge(&self, scope: PurgeScope) -> Result<PurgeReport, ChitError> {
        let mut ids: Vec<Uuid> = self.funds.list_funds().await?.iter().map(|f| f.id).collect();
        // Sorted acquisition; every other path holds at most one fund lock.
        ids.sort();
        let mut guards = Vec::with_capacity(ids.len());
        for id in &ids {
            guards.push(self.lock_for(*id)?.lock_owned().await);
        }
        let _gate = match scope {
            PurgeScope::All | PurgeScope::Members => Some(self.member_gate.lock().await),
            PurgeScope::Funds | PurgeScope::Winners => None,
        };

        let report = reporting::purge(self.members.as_ref(), self.funds.as_ref(), scope).await?;

        drop(guards);
        if matches!(scope, PurgeScope::All | PurgeScope::Funds) {
            for id in &ids {
                self.forget_lock(id);
            }
        }
        Ok(report)
    }

    /// Distribution schedule for a fund, marked with its draw progress.
    pub async fn schedule(&self, fund_id: &Uuid) -> Result<DistributionSchedule, ChitError> {
        let fund = self.load_fund(fund_id).await?;
        Ok(DistributionSchedule::compute(fund.total_members, fund.monthly_amount)
            .with_progress(fund.winner_history.len()))
    }
}
