// crates/chitfund-core/src/traits.rs

use std::collections::HashSet;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::ChitError;
use crate::fund::Fund;
use crate::member::Member;
use crate::user::UserAccount;

/// Persistent member registry.
///
/// Implemented by chitfund-store (RocksDB and in-memory backends).
#[async_trait]
pub trait MemberStore: Send + Sync {
    /// Insert a batch of members atomically.
    ///
    /// Fails with `ChitError::Conflict` (and inserts nothing) if any
    /// identifier already exists or repeats within the batch.
    async fn insert_members(&self, members: &[Member]) -> Result<(), ChitError>;

    /// Retrieve a member by identifier.
    async fn get_member(&self, member_id: &str) -> Result<Option<Member>, ChitError>;

    /// Find the first member registered with `mobile`.
    async fn find_member_by_mobile(&self, mobile: &str) -> Result<Option<Member>, ChitError>;

    /// List all members, newest first.
    async fn list_members(&self) -> Result<Vec<Member>, ChitError>;

    /// All identifiers currently in use.
    async fn member_ids(&self) -> Result<HashSet<String>, ChitError>;

    /// Delete every member. Returns the number deleted.
    async fn purge_members(&self) -> Result<usize, ChitError>;
}

/// Persistent fund registry.
#[async_trait]
pub trait FundStore: Send + Sync {
    /// Insert a new fund. Fails with `Conflict` if the id exists.
    async fn insert_fund(&self, fund: &Fund) -> Result<(), ChitError>;

    /// Retrieve a fund by id.
    async fn get_fund(&self, id: &Uuid) -> Result<Option<Fund>, ChitError>;

    /// List all funds, newest first.
    async fn list_funds(&self) -> Result<Vec<Fund>, ChitError>;

    /// Write back a fund read earlier (roster and history move together).
    ///
    /// Compare-and-swap on `fund.version`: fails with `Conflict` if the
    /// stored version differs, `NotFound` if the fund is gone. On success
    /// returns the new version (`fund.version + 1`).
    async fn update_fund(&self, fund: &Fund) -> Result<u64, ChitError>;

    /// Delete a fund and its history. Returns whether it existed.
    async fn delete_fund(&self, id: &Uuid) -> Result<bool, ChitError>;

    /// Delete every fund. Returns the number deleted.
    async fn purge_funds(&self) -> Result<usize, ChitError>;

    /// Clear the winner history of every fund. Returns the number of funds modified.
    async fn clear_winner_history(&self) -> Result<usize, ChitError>;
}

/// Persistent operator accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user. Fails with `Conflict` if the username is taken.
    async fn insert_user(&self, user: &UserAccount) -> Result<(), ChitError>;

    async fn get_user(&self, id: &Uuid) -> Result<Option<UserAccount>, ChitError>;

    /// Look up by normalized username.
    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserAccount>, ChitError>;

    /// List all users, newest first.
    async fn list_users(&self) -> Result<Vec<UserAccount>, ChitError>;

    /// Delete a user. Returns whether it existed.
    async fn delete_user(&self, id: &Uuid) -> Result<bool, ChitError>;
}
