//! # Record Store Seam
//!
//! [`VibeStore`] is the custody service's only view of durable state. The
//! service is the sole writer of status transitions; the store is a dumb
//! keeper of records with no transition opinions of its own, so every
//! implementation stays interchangeable: [`MemoryVibeStore`] here for
//! development and tests, a Postgres implementation in the API crate for
//! deployment.
//!
//! Updates are partial: a [`RecordPatch`] carries only the fields to write,
//! mirroring how the service persists one lifecycle step at a time (attach
//! asset, attach media, mark claimed) without rewriting whole records.
//!
//! Sequence numbers are display-only ordinals computed as count-plus-one at
//! reservation time. Two concurrent reservations may draw the same number;
//! nothing downstream depends on uniqueness.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use thiserror::Error;

use vv_core::{Handle, VibeId};

use crate::record::{ClaimStatus, CustodyRecord};

// ─── Errors ──────────────────────────────────────────────────────────

/// Errors from record store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A record with this identifier already exists.
    #[error("record {id} already exists")]
    Duplicate {
        /// The colliding identifier.
        id: VibeId,
    },

    /// The backing store failed (connection, query, constraint).
    #[error("store backend error: {detail}")]
    Backend {
        /// Backend-reported failure detail.
        detail: String,
    },

    /// Stored data cannot be interpreted as a valid record.
    #[error("corrupt record {id}: {detail}")]
    Corrupt {
        /// The affected record identifier.
        id: VibeId,
        /// What could not be interpreted.
        detail: String,
    },
}

// ─── Partial Updates ─────────────────────────────────────────────────

/// A partial update to a [`CustodyRecord`]. `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordPatch {
    /// Set the asset (mint) address.
    pub asset_address: Option<String>,
    /// Set the metadata document pointer.
    pub metadata_pointer: Option<String>,
    /// Set the collectible image pointer.
    pub image_pointer: Option<String>,
    /// Set the custody status.
    pub status: Option<ClaimStatus>,
    /// Set the claimer's wallet address.
    pub claimer_address: Option<String>,
    /// Set the claim timestamp.
    pub claimed_at: Option<DateTime<Utc>>,
}

impl RecordPatch {
    /// Patch attaching the in-flight mint address.
    pub fn asset(asset_address: String) -> Self {
        Self {
            asset_address: Some(asset_address),
            ..Self::default()
        }
    }

    /// Patch attaching final media pointers after upload.
    pub fn media(metadata_pointer: String, image_pointer: String) -> Self {
        Self {
            metadata_pointer: Some(metadata_pointer),
            image_pointer: Some(image_pointer),
            ..Self::default()
        }
    }

    /// Patch recording the terminal claim transition.
    pub fn claimed(claimer_address: Option<String>, at: DateTime<Utc>) -> Self {
        Self {
            status: Some(ClaimStatus::Claimed),
            claimer_address,
            claimed_at: Some(at),
            ..Self::default()
        }
    }

    /// Patch filling in the claimer on a self-healed record.
    pub fn claimer(claimer_address: String) -> Self {
        Self {
            claimer_address: Some(claimer_address),
            ..Self::default()
        }
    }

    /// Apply this patch to a record in place.
    pub fn apply(&self, record: &mut CustodyRecord) {
        if let Some(asset_address) = &self.asset_address {
            record.asset_address = Some(asset_address.clone());
        }
        if let Some(metadata_pointer) = &self.metadata_pointer {
            record.metadata_pointer = Some(metadata_pointer.clone());
        }
        if let Some(image_pointer) = &self.image_pointer {
            record.image_pointer = Some(image_pointer.clone());
        }
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(claimer_address) = &self.claimer_address {
            record.claimer_address = Some(claimer_address.clone());
        }
        if let Some(claimed_at) = self.claimed_at {
            record.claimed_at = Some(claimed_at);
        }
    }
}

// ─── Store Trait ─────────────────────────────────────────────────────

/// Durable home of custody records.
#[async_trait]
pub trait VibeStore: Send + Sync {
    /// Insert a new record. Fails on identifier collision.
    async fn create(&self, record: CustodyRecord) -> Result<CustodyRecord, StoreError>;

    /// Fetch a record by identifier.
    async fn get(&self, id: &VibeId) -> Result<Option<CustodyRecord>, StoreError>;

    /// Apply a partial update. Returns the updated record, or `None` when
    /// no record has this identifier.
    async fn update(
        &self,
        id: &VibeId,
        patch: RecordPatch,
    ) -> Result<Option<CustodyRecord>, StoreError>;

    /// Remove a record. Removing an absent record is not an error.
    async fn delete(&self, id: &VibeId) -> Result<(), StoreError>;

    /// The next display ordinal (current record count plus one).
    async fn next_sequence_number(&self) -> Result<i64, StoreError>;

    /// The pending record addressed to `handle`, if any. Case-insensitive.
    async fn find_live_by_handle(
        &self,
        handle: &Handle,
    ) -> Result<Option<CustodyRecord>, StoreError>;

    /// The claimed record addressed to `handle`, if any. Case-insensitive.
    async fn find_claimed_by_handle(
        &self,
        handle: &Handle,
    ) -> Result<Option<CustodyRecord>, StoreError>;

    /// All records, newest first.
    async fn list(&self) -> Result<Vec<CustodyRecord>, StoreError>;
}

// ─── In-Memory Implementation ────────────────────────────────────────

/// Thread-safe in-memory store for development and tests.
#[derive(Debug, Default)]
pub struct MemoryVibeStore {
    records: RwLock<HashMap<VibeId, CustodyRecord>>,
}

impl MemoryVibeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VibeStore for MemoryVibeStore {
    async fn create(&self, record: CustodyRecord) -> Result<CustodyRecord, StoreError> {
        let mut records = self.records.write();
        if records.contains_key(&record.id) {
            return Err(StoreError::Duplicate {
                id: record.id.clone(),
            });
        }
        records.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn get(&self, id: &VibeId) -> Result<Option<CustodyRecord>, StoreError> {
        Ok(self.records.read().get(id).cloned())
    }

    async fn update(
        &self,
        id: &VibeId,
        patch: RecordPatch,
    ) -> Result<Option<CustodyRecord>, StoreError> {
        let mut records = self.records.write();
        Ok(records.get_mut(id).map(|record| {
            patch.apply(record);
            record.clone()
        }))
    }

    async fn delete(&self, id: &VibeId) -> Result<(), StoreError> {
        self.records.write().remove(id);
        Ok(())
    }

    async fn next_sequence_number(&self) -> Result<i64, StoreError> {
        Ok(self.records.read().len() as i64 + 1)
    }

    async fn find_live_by_handle(
        &self,
        handle: &Handle,
    ) -> Result<Option<CustodyRecord>, StoreError> {
        let records = self.records.read();
        Ok(records
            .values()
            .filter(|r| r.status == ClaimStatus::Pending && r.recipient_handle.matches(handle))
            .min_by_key(|r| r.created_at)
            .cloned())
    }

    async fn find_claimed_by_handle(
        &self,
        handle: &Handle,
    ) -> Result<Option<CustodyRecord>, StoreError> {
        let records = self.records.read();
        Ok(records
            .values()
            .filter(|r| r.status == ClaimStatus::Claimed && r.recipient_handle.matches(handle))
            .min_by_key(|r| r.created_at)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<CustodyRecord>, StoreError> {
        let records = self.records.read();
        let mut all: Vec<CustodyRecord> = records.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
