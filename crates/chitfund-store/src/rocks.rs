// crates/chitfund-store/src/rocks.rs
//
// RocksDB-backed persistent storage for members, funds, and users.
//
// Key format:
//   - Member:    `member:{member_id}`          -> JSON-serialized Member
//   - Mobile:    `mobile:{mobile}:{member_id}` -> empty value (index only)
//   - Fund:      `fund:{uuid}`                 -> JSON-serialized Fund
//   - User:      `user:{uuid}`                 -> JSON-serialized UserAccount
//   - Username:  `username:{username}`         -> user uuid (UTF-8)
//
// Multi-key writes go through a WriteBatch so a record and its index
// entries land together. Check-then-write sequences (uniqueness checks,
// fund version compare-and-swap) are serialized by `write_guard`.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use rocksdb::{DBWithThreadMode, MultiThreaded, Options, WriteBatch};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use chitfund_core::error::ChitError;
use chitfund_core::fund::Fund;
use chitfund_core::member::Member;
use chitfund_core::traits::{FundStore, MemberStore, UserStore};
use chitfund_core::user::UserAccount;

const MEMBER_PREFIX: &str = "member:";
const MOBILE_PREFIX: &str = "mobile:";
const FUND_PREFIX: &str = "fund:";
const USER_PREFIX: &str = "user:";
const USERNAME_PREFIX: &str = "username:";

/// RocksDB wrapper implementing the member, fund, and user store traits.
#[derive(Debug)]
pub struct RocksStore {
    db: DBWithThreadMode<MultiThreaded>,
    path: String,
    write_guard: Mutex<()>,
}

impl RocksStore {
    /// Open a RocksDB database at the given filesystem path.
    ///
    /// Creates the database directory if it does not exist.
    pub fn open(path: &str) -> Result<Self, ChitError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);

        let db = DBWithThreadMode::<MultiThreaded>::open(&opts, path)
            .map_err(|e| ChitError::Storage(format!("Failed to open RocksDB at {}: {}", path, e)))?;

        tracing::info!("RocksDB store opened at {}", path);

        Ok(Self {
            db,
            path: path.to_string(),
            write_guard: Mutex::new(()),
        })
    }

    /// Filesystem path the store was opened at.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Flush memtables to disk. Called by the daemon on shutdown.
    pub fn flush(&self) -> Result<(), ChitError> {
        self.db
            .flush()
            .map_err(|e| ChitError::Storage(format!("RocksDB flush failed: {}", e)))
    }

    fn member_key(member_id: &str) -> Vec<u8> {
        format!("{}{}", MEMBER_PREFIX, member_id).into_bytes()
    }

    fn mobile_key(mobile: &str, member_id: &str) -> Vec<u8> {
        format!("{}{}:{}", MOBILE_PREFIX, mobile, member_id).into_bytes()
    }

    fn fund_key(id: &Uuid) -> Vec<u8> {
        format!("{}{}", FUND_PREFIX, id).into_bytes()
    }

    fn user_key(id: &Uuid) -> Vec<u8> {
        format!("{}{}", USER_PREFIX, id).into_bytes()
    }

    fn username_key(username: &str) -> Vec<u8> {
        format!("{}{}", USERNAME_PREFIX, username).into_bytes()
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>, ChitError> {
        self.write_guard
            .lock()
            .map_err(|_| ChitError::Storage("RocksStore write guard poisoned".to_string()))
    }

    /// Get raw bytes from RocksDB, mapping errors to ChitError::Storage.
    fn get_raw(&self, key: &[u8]) -> Result<Option<Vec<u8>>, ChitError> {
        self.db
            .get(key)
            .map_err(|e| ChitError::Storage(format!("RocksDB get failed: {}", e)))
    }

    /// Put raw bytes into RocksDB, mapping errors to ChitError::Storage.
    fn put_raw(&self, key: &[u8], value: &[u8]) -> Result<(), ChitError> {
        self.db
            .put(key, value)
            .map_err(|e| ChitError::Storage(format!("RocksDB put failed: {}", e)))
    }

    fn write_batch(&self, batch: WriteBatch) -> Result<(), ChitError> {
        self.db
            .write(batch)
            .map_err(|e| ChitError::Storage(format!("RocksDB batch write failed: {}", e)))
    }

    fn get_json<T: DeserializeOwned>(&self, key: &[u8]) -> Result<Option<T>, ChitError> {
        match self.get_raw(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Collect every (key, value) pair under `prefix`.
    fn scan_prefix(&self, prefix: &str) -> Result<Vec<(Box<[u8]>, Box<[u8]>)>, ChitError> {
        let prefix = prefix.as_bytes();
        let mut out = Vec::new();

        for item in self.db.prefix_iterator(prefix) {
            let (key, value) = item
                .map_err(|e| ChitError::Storage(format!("RocksDB iteration error: {}", e)))?;
            // Stop once the prefix no longer matches.
            if !key.starts_with(prefix) {
                break;
            }
            out.push((key, value));
        }

        Ok(out)
    }

    fn scan_json<T: DeserializeOwned>(&self, prefix: &str) -> Result<Vec<T>, ChitError> {
        self.scan_prefix(prefix)?
            .into_iter()
            .map(|(_, value)| serde_json::from_slice(&value).map_err(ChitError::from))
            .collect()
    }

    fn delete_prefix(&self, prefix: &str) -> Result<usize, ChitError> {
        let entries = self.scan_prefix(prefix)?;
        let mut batch = WriteBatch::default();
        for (key, _) in &entries {
            batch.delete(key);
        }
        self.write_batch(batch)?;
        Ok(entries.len())
    }

    pub fn get_member_sync(&self, member_id: &str) -> Result<Option<Member>, ChitError> {
        self.get_json(&Self::member_key(member_id))
    }

    pub fn get_fund_sync(&self, id: &Uuid) -> Result<Option<Fund>, ChitError> {
        self.get_json(&Self::fund_key(id))
    }
}

#[async_trait]
impl MemberStore for RocksStore {
    async fn insert_members(&self, members: &[Member]) -> Result<(), ChitError> {
        let _guard = self.lock()?;

        let mut seen = HashSet::with_capacity(members.len());
        for member in members {
            if !seen.insert(member.member_id.as_str())
                || self.get_raw(&Self::member_key(&member.member_id))?.is_some()
            {
                return Err(ChitError::Conflict(format!(
                    "Member ID {} already exists",
                    member.member_id
                )));
            }
        }

        let mut batch = WriteBatch::default();
        for member in members {
            batch.put(Self::member_key(&member.member_id), serde_json::to_vec(member)?);
            // Secondary mobile index (empty value, existence is the signal).
            batch.put(Self::mobile_key(&member.mobile, &member.member_id), b"");
        }
        self.write_batch(batch)?;

        tracing::debug!("Inserted {} member(s)", members.len());
        Ok(())
    }

    async fn get_member(&self, member_id: &str) -> Result<Option<Member>, ChitError> {
        self.get_member_sync(member_id)
    }

    async fn find_member_by_mobile(&self, mobile: &str) -> Result<Option<Member>, ChitError> {
        let prefix = format!("{}{}:", MOBILE_PREFIX, mobile);
        let mut matches = Vec::new();
        for (key, _) in self.scan_prefix(&prefix)? {
            let member_id = std::str::from_utf8(&key[prefix.len()..]).unwrap_or("");
            if let Some(member) = self.get_member_sync(member_id)? {
                matches.push(member);
            }
        }
        // Oldest registration wins when a mobile is shared.
        matches.sort_by_key(|m| m.created_at);
        Ok(matches.into_iter().next())
    }

    async fn list_members(&self) -> Result<Vec<Member>, ChitError> {
        let mut members: Vec<Member> = self.scan_json(MEMBER_PREFIX)?;
        members.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(members)
    }

    async fn member_ids(&self) -> Result<HashSet<String>, ChitError> {
        Ok(self
            .scan_prefix(MEMBER_PREFIX)?
            .into_iter()
            .filter_map(|(key, _)| {
                std::str::from_utf8(&key[MEMBER_PREFIX.len()..])
                    .ok()
                    .map(str::to_string)
            })
            .collect())
    }

    async fn purge_members(&self) -> Result<usize, ChitError> {
        let _guard = self.lock()?;
        self.delete_prefix(MOBILE_PREFIX)?;
        let deleted = self.delete_prefix(MEMBER_PREFIX)?;
        tracing::warn!("Purged {} member(s)", deleted);
        Ok(deleted)
    }
}

#[async_trait]
impl FundStore for RocksStore {
    async fn insert_fund(&self, fund: &Fund) -> Result<(), ChitError> {
        let _guard = self.lock()?;
        let key = Self::fund_key(&fund.id);
        if self.get_raw(&key)?.is_some() {
            return Err(ChitError::Conflict(format!("Fund {} already exists", fund.id)));
        }
        self.put_raw(&key, &serde_json::to_vec(fund)?)
    }

    async fn get_fund(&self, id: &Uuid) -> Result<Option<Fund>, ChitError> {
        self.get_fund_sync(id)
    }

    async fn list_funds(&self) -> Result<Vec<Fund>, ChitError> {
        let mut funds: Vec<Fund> = self.scan_json(FUND_PREFIX)?;
        funds.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(funds)
    }

    async fn update_fund(&self, fund: &Fund) -> Result<u64, ChitError> {
        let _guard = self.lock()?;

        let stored = self
            .get_fund_sync(&fund.id)?
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
        self.put_raw(&Self::fund_key(&fund.id), &serde_json::to_vec(&next)?)?;

        Ok(next.version)
    }

    async fn delete_fund(&self, id: &Uuid) -> Result<bool, ChitError> {
        let _guard = self.lock()?;
        let key = Self::fund_key(id);
        if self.get_raw(&key)?.is_none() {
            return Ok(false);
        }
        self.db
            .delete(&key)
            .map_err(|e| ChitError::Storage(format!("RocksDB delete failed: {}", e)))?;
        Ok(true)
    }

    async fn purge_funds(&self) -> Result<usize, ChitError> {
        let _guard = self.lock()?;
        let deleted = self.delete_prefix(FUND_PREFIX)?;
        tracing::warn!("Purged {} fund(s)", deleted);
        Ok(deleted)
    }

    async fn clear_winner_history(&self) -> Result<usize, ChitError> {
        let _guard = self.lock()?;
        let funds: Vec<Fund> = self.scan_json(FUND_PREFIX)?;
        let now = Utc::now();

        let mut batch = WriteBatch::default();
        let mut modified = 0;
        for mut fund in funds {
            if fund.winner_history.is_empty() {
                continue;
            }
            fund.winner_history.clear();
            fund.version += 1;
            fund.updated_at = now;
            batch.put(Self::fund_key(&fund.id), serde_json::to_vec(&fund)?);
            modified += 1;
        }
        self.write_batch(batch)?;
        Ok(modified)
    }
}

#[async_trait]
impl UserStore for RocksStore {
    async fn insert_user(&self, user: &UserAccount) -> Result<(), ChitError> {
        let _guard = self.lock()?;
        let name_key = Self::username_key(&user.username);
        if self.get_raw(&name_key)?.is_some() {
            return Err(ChitError::Conflict(format!(
                "Username '{}' already exists",
                user.username
            )));
        }

        let mut batch = WriteBatch::default();
        batch.put(Self::user_key(&user.id), serde_json::to_vec(user)?);
        batch.put(name_key, user.id.to_string().as_bytes());
        self.write_batch(batch)
    }

    async fn get_user(&self, id: &Uuid) -> Result<Option<UserAccount>, ChitError> {
        self.get_json(&Self::user_key(id))
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserAccount>, ChitError> {
        let Some(raw) = self.get_raw(&Self::username_key(username))? else {
            return Ok(None);
        };
        let id_str = std::str::from_utf8(&raw)
            .map_err(|e| ChitError::Storage(format!("Corrupt username index: {}", e)))?;
        let id = Uuid::parse_str(id_str)
            .map_err(|e| ChitError::Storage(format!("Corrupt username index: {}", e)))?;
        self.get_json(&Self::user_key(&id))
    }

    async fn list_users(&self) -> Result<Vec<UserAccount>, ChitError> {
        let mut users: Vec<UserAccount> = self.scan_json(USER_PREFIX)?;
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn delete_user(&self, id: &Uuid) -> Result<bool, ChitError> {
        let _guard = self.lock()?;
        let Some(user) = self.get_json::<UserAccount>(&Self::user_key(id))? else {
            return Ok(false);
        };
        let mut batch = WriteBatch::default();
        batch.delete(Self::user_key(id));
        batch.delete(Self::username_key(&user.username));
        self.write_batch(batch)?;
        Ok(true)
    }
}
