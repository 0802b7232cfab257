// crates/chitfund-core/src/fund.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ChitError;

/// A chit fund: a named group pooling a fixed monthly contribution.
///
/// `active_members` holds the member identifiers still in the draw, in
/// insertion order and without duplicates. `winner_history` is append-only.
/// `version` is bumped by the store on every successful write and is used
/// to reject stale read-modify-write cycles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Fund {
    pub id: Uuid,
    /// Display name, e.g. "50K Group".
    pub name: String,
    /// Configured capacity. Payouts are computed from this, not the roster size.
    pub total_members: u32,
    /// Day of month the draw is held (1-31).
    pub draw_day: u8,
    /// Fixed monthly contribution per member.
    pub monthly_amount: u64,
    /// Members still eligible to be drawn.
    pub active_members: Vec<String>,
    /// Past winners, oldest first.
    pub winner_history: Vec<WinnerRecord>,
    /// Optimistic concurrency counter.
    #[serde(default)]
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One entry in a fund's winner history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WinnerRecord {
    pub member_id: String,
    /// Member name at the time of the win.
    pub member_name: String,
    pub date_won: DateTime<Utc>,
    pub amount: u64,
}

/// Configuration supplied when creating a fund.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundConfig {
    pub name: String,
    pub total_members: u32,
    pub draw_day: u8,
    pub monthly_amount: u64,
}

impl FundConfig {
    /// Check the configuration bounds.
    pub fn validate(&self) -> Result<(), ChitError> {
        if self.name.trim().is_empty() {
            return Err(ChitError::Validation("Fund name is required".to_string()));
        }
        if self.total_members == 0 {
            return Err(ChitError::Validation(
                "total_members must be greater than 0".to_string(),
            ));
        }
        if !(1..=31).contains(&self.draw_day) {
            return Err(ChitError::Validation(format!(
                "draw_day must be between 1 and 31, got {}",
                self.draw_day
            )));
        }
        if self.monthly_amount == 0 {
            return Err(ChitError::Validation(
                "monthly_amount must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Fund {
    /// Create a fund from a validated configuration and an initial roster.
    ///
    /// Duplicate identifiers in `initial_members` are collapsed, keeping the
    /// first occurrence.
    pub fn new(config: FundConfig, initial_members: Vec<String>, now: DateTime<Utc>) -> Result<Self, ChitError> {
        config.validate()?;
        let mut fund = Self {
            id: Uuid::now_v7(),
            name: config.name.trim().to_string(),
            total_members: config.total_members,
            draw_day: config.draw_day,
            monthly_amount: config.monthly_amount,
            active_members: Vec::new(),
            winner_history: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        };
        fund.add_members(initial_members);
        Ok(fund)
    }

    /// Total collection for one round: capacity times monthly amount.
    pub fn total_collection(&self) -> u64 {
        u64::from(self.total_members).saturating_mul(self.monthly_amount)
    }

    /// Whether `member_id` is on the active roster.
    pub fn is_active(&self, member_id: &str) -> bool {
        self.active_members.iter().any(|m| m == member_id)
    }

    /// Whether `member_id` already appears in this fund's winner history.
    pub fn has_won(&self, member_id: &str) -> bool {
        self.winner_history.iter().any(|w| w.member_id == member_id)
    }

    /// Union `member_ids` into the active roster. Returns how many were new.
    pub fn add_members<I>(&mut self, member_ids: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let mut added = 0;
        for id in member_ids {
            if !self.is_active(&id) {
                self.active_members.push(id);
                added += 1;
            }
        }
        added
    }

    /// Remove `member_id` from the active roster. Returns whether it was present.
    pub fn remove_member(&mut self, member_id: &str) -> bool {
        let before = self.active_members.len();
        self.active_members.retain(|m| m != member_id);
        self.active_members.len() != before
    }

    /// Sum of all payouts recorded in this fund.
    pub fn total_paid_out(&self) -> u64 {
        self.winner_history.iter().map(|w| w.amount).sum()
    }
}
