// crates/chitfund-store/src/memory.rs
//
// In-memory store implementing the member, fund, and user traits.
//
// Used by tests and by the daemon's `in_memory` mode. Semantics match
// `RocksStore`: atomic member batches, username uniqueness, and
// compare-and-swap fund updates on `Fund::version`.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use chitfund_core::error::ChitError;
use chitfund_core::fund::Fund;
use chitfund_core::member::Member;
use chitfund_core::traits::{FundStore, MemberStore, UserStore};
use chitfund_core::user::UserAccount;

#[derive(Debug, Default)]
struct Tables {
    members: HashMap<String, Member>,
    funds: HashMap<Uuid, Fund>,
    users: HashMap<Uuid, UserAccount>,
}

/// Volatile store backed by hash maps behind a single `RwLock`.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Tables>, ChitError> {
        self.tables
            .read()
            .map_err(|_| ChitError::Storage("InMemoryStore lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Tables>, ChitError> {
        self.tables
            .write()
            .map_err(|_| ChitError::Storage("InMemoryStore lock poisoned".to_string()))
    }
}

#[async_trait]
impl MemberStore for InMemoryStore {
    async fn insert_members(&self, members: &[Member]) -> Result<(), ChitError> {
        let mut t = self.write()?;
        let mut seen = HashSet::with_capacity(members.len());
        for m in members {
            if !seen.insert(m.member_id.as_str()) || t.members.contains_key(&m.member_id) {
                return Err(ChitError::Conflict(format!(
                    "Member ID {} already exists",
                    m.member_id
                )));
            }
        }
        for m in members {
            t.members.insert(m.member_id.clone(), m.clone());
        }
        Ok(())
    }

    async fn get_member(&self, member_id: &str) -> Result<Option<Member>, ChitError> {
        Ok(self.read()?.members.get(member_id).cloned())
    }

    async fn find_member_by_mobile(&self, mobile: &str) -> Result<Option<Member>, ChitError> {
        Ok(self
            .read()?
            .members
            .values()
            .filter(|m| m.mobile == mobile)
            .min_by_key(|m| m.created_at)
            .cloned())
    }

    async fn list_members(&self) -> Result<Vec<Member>, ChitError> {
        let mut members: Vec<Member> = self.read()?.members.values().cloned().collect();
        members.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(members)
    }

    async fn member_ids(&self) -> Result<HashSet<String>, ChitError> {
        Ok(self.read()?.members.keys().cloned().collect())
    }

    async fn purge_members(&self) -> Result<usize, ChitError> {
        let mut t = self.write()?;
        let n = t.members.len();
        t.members.clear();
        Ok(n)
    }
}

#[async_trait]
impl FundStore for InMemoryStore {
    async fn insert_fund(&self, fund: &Fund) -> Result<(), ChitError> {
        let mut t = self.write()?;
        if t.funds.contains_key(&fund.id) {
            return Err(ChitError::Conflict(format!("Fund {} already exists", fund.id)));
        }
        t.funds.insert(fund.id, fund.clone());
        Ok(())
    }

    async fn get_fund(&self, id: &Uuid) -> Result<Option<Fund>, ChitError> {
        Ok(self.read()?.funds.get(id).cloned())
    }

    async fn list_funds(&self) -> Result<Vec<Fund>, ChitError> {
        let mut funds: Vec<Fund> = self.read()?.funds.values().cloned().collect();
        funds.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(funds)
    }

    async fn update_fund(&self, fund: &Fund) -> Result<u64, ChitError> {
        let mut t = self.write()?;
        let stored = t
            .funds
            .get_mut(&fund.id)
            .ok_or_else(|| ChitError::NotFound(format!("Fund {} not found", fund.id)))?;

        if stored.version != fund.version {
            return Err(ChitError::Conflict(format!(
                "Fund {} was modified concurrently (expected version {}, found {})",
                fund.id, fund.version, stored.version
            )));
        }

        let mut next = fund.clone();
        next.version = fund.version + 1;
        next.updated_at = Utc::now();
        *stored = next;
        Ok(stored.version)
    }

    async fn delete_fund(&self, id: &Uuid) -> Result<bool, ChitError> {
        Ok(self.write()?.funds.remove(id).is_some())
    }

    async fn purge_funds(&self) -> Result<usize, ChitError> {
        let mut t = self.write()?;
        let n = t.funds.len();
        t.funds.clear();
        Ok(n)
    }

    async fn clear_winner_history(&self) -> Result<usize, ChitError> {
        let mut t = self.write()?;
        let now = Utc::now();
        let mut modified = 0;
        for fund in t.funds.values_mut() {
            if !fund.winner_history.is_empty() {
                fund.winner_history.clear();
                fund.version += 1;
                fund.updated_at = now;
                modified += 1;
            }
        }
        Ok(modified)
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn insert_user(&self, user: &UserAccount) -> Result<(), ChitError> {
        let mut t = self.write()?;
        if t.users.values().any(|u| u.username == user.username) {
            return Err(ChitError::Conflict(format!(
                "Username '{}' already exists",
                user.username
            )));
        }
        t.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn get_user(&self, id: &Uuid) -> Result<Option<UserAccount>, ChitError> {
        Ok(self.read()?.users.get(id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserAccount>, ChitError> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<UserAccount>, ChitError> {
        let mut users: Vec<UserAccount> = self.read()?.users.values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn delete_user(&self, id: &Uuid) -> Result<bool, ChitError> {
        Ok(self.write()?.users.remove(id).is_some())
    }
}
