// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded user store backed by redb.
//!
//! Records are stored as JSON bytes keyed by subject id. All mutations run
//! inside a single write transaction, which is what makes the login upsert
//! atomic under concurrent requests for the same subject.

use std::path::Path;

use chrono::Utc;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use super::users::{ProfileUpdate, UserRecord};
use crate::auth::Identity;

/// Primary table: subject id → serialized UserRecord (JSON bytes).
const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// Default page size for listings.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Maximum page size; larger requests are clamped.
pub const MAX_PAGE_SIZE: u64 = 100;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("not found: {0}")]
    NotFound(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Embedded ACID user store.
pub struct UserStore {
    db: Database,
}

impl UserStore {
    /// Open (or create) the store at the given path.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = Database::create(path)?;

        // Pre-create the table so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Upsert the record for a verified identity.
    ///
    /// Creates the record on first sight, otherwise overwrites the
    /// provider-sourced fields and stamps the login time. Idempotent for
    /// identical claims up to the timestamps.
    pub fn sync_identity(&self, identity: &Identity) -> StoreResult<UserRecord> {
        let now = Utc::now();

        let write_txn = self.db.begin_write()?;
        let record = {
            let mut table = write_txn.open_table(USERS)?;
            let existing = match table.get(identity.sub.as_str())? {
                Some(value) => Some(serde_json::from_slice::<UserRecord>(value.value())?),
                None => None,
            };

            let record = match existing {
                Some(mut record) => {
                    record.apply_identity(identity, now);
                    record
                }
                None => UserRecord::from_identity(identity, now),
            };

            let json = serde_json::to_vec(&record)?;
            table.insert(identity.sub.as_str(), json.as_slice())?;
            record
        };
        write_txn.commit()?;

        Ok(record)
    }

    /// Look up a record by subject id.
    pub fn get(&self, sub: &str) -> StoreResult<Option<UserRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(USERS)?;
        match table.get(sub)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Apply an allow-listed profile update.
    pub fn update_profile(&self, sub: &str, update: &ProfileUpdate) -> StoreResult<UserRecord> {
        self.modify(sub, |record, now| record.apply_update(update, now))
    }

    /// Soft-delete: flip `enabled` off, retain the record.
    pub fn disable(&self, sub: &str) -> StoreResult<UserRecord> {
        self.modify(sub, |record, now| {
            record.enabled = false;
            record.updated_at = now;
        })
    }

    /// Paginated listing in ascending subject-id order.
    ///
    /// `page` is 1-based and clamped to ≥ 1; `limit` is clamped to
    /// `1..=MAX_PAGE_SIZE`. Returns the page and the total record count.
    pub fn list(&self, page: u64, limit: u64) -> StoreResult<(Vec<UserRecord>, u64)> {
        let page = page.max(1);
        let limit = normalize_limit(limit);

        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(USERS)?;

        // Single scan: collect the requested page while counting the total.
        let skip = (page - 1).saturating_mul(limit);
        let mut total = 0u64;
        let mut records = Vec::with_capacity(limit as usize);
        for entry in table.iter()? {
            let (_, value) = entry?;
            if total >= skip && (records.len() as u64) < limit {
                records.push(serde_json::from_slice(value.value())?);
            }
            total += 1;
        }

        Ok((records, total))
    }

    /// Total number of records.
    pub fn count(&self) -> StoreResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(USERS)?;
        Ok(table.iter()?.count() as u64)
    }

    /// Read-modify-write inside one write transaction.
    fn modify<F>(&self, sub: &str, apply: F) -> StoreResult<UserRecord>
    where
        F: FnOnce(&mut UserRecord, chrono::DateTime<Utc>),
    {
        let now = Utc::now();

        let write_txn = self.db.begin_write()?;
        let record = {
            let mut table = write_txn.open_table(USERS)?;
            let mut record = match table.get(sub)? {
                Some(value) => serde_json::from_slice::<UserRecord>(value.value())?,
                None => return Err(StoreError::NotFound(format!("user {sub}"))),
            };

            apply(&mut record, now);

            let json = serde_json::to_vec(&record)?;
            table.insert(sub, json.as_slice())?;
            record
        };
        write_txn.commit()?;

        Ok(record)
    }
}

/// Clamp a requested page size into `1..=MAX_PAGE_SIZE`.
pub fn normalize_limit(limit: u64) -> u64 {
    limit.clamp(1, MAX_PAGE_SIZE)
}
