//! Postgres-backed custody record store.
//!
//! Implements [`VibeStore`] over the `vibes` table, column-for-column with
//! [`CustodyRecord`]. The custody service is the sole writer of status
//! transitions, so this layer keeps no transition opinions of its own:
//! updates apply a [`RecordPatch`] as a single `COALESCE` statement and
//! hand back whatever the row now says.
//!
//! Handle lookups compare `LOWER()` on both sides rather than `ILIKE`:
//! `_` is a legal handle character and an `ILIKE` single-character
//! wildcard, so pattern matching would make `a_c` find `abc`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use vv_core::{Handle, VibeId};
use vv_custody::{ClaimStatus, CustodyRecord, RecordPatch, StoreError, VibeStore};

/// Postgres implementation of the custody record store.
#[derive(Debug, Clone)]
pub struct PostgresVibeStore {
    pool: PgPool,
}

impl PostgresVibeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Map a SQLx failure to the store error the custody layer understands.
fn backend(err: sqlx::Error) -> StoreError {
    StoreError::Backend {
        detail: err.to_string(),
    }
}

#[async_trait]
impl VibeStore for PostgresVibeStore {
    async fn create(&self, record: CustodyRecord) -> Result<CustodyRecord, StoreError> {
        let result = sqlx::query(
            "INSERT INTO vibes (id, recipient_handle, sender_address, masked_sender,
             asset_address, metadata_pointer, image_pointer, status,
             claimer_address, claimed_at, sequence_number, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(record.id.as_str())
        .bind(record.recipient_handle.as_str())
        .bind(&record.sender_address)
        .bind(&record.masked_sender)
        .bind(&record.asset_address)
        .bind(&record.metadata_pointer)
        .bind(&record.image_pointer)
        .bind(record.status.to_string())
        .bind(&record.claimer_address)
        .bind(record.claimed_at)
        .bind(record.sequence_number)
        .bind(record.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(record),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::Duplicate { id: record.id })
            }
            Err(err) => Err(backend(err)),
        }
    }

    async fn get(&self, id: &VibeId) -> Result<Option<CustodyRecord>, StoreError> {
        let row = sqlx::query_as::<_, VibeRow>(
            "SELECT id, recipient_handle, sender_address, masked_sender,
             asset_address, metadata_pointer, image_pointer, status,
             claimer_address, claimed_at, sequence_number, created_at
             FROM vibes WHERE id = $1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(VibeRow::into_record).transpose()
    }

    async fn update(
        &self,
        id: &VibeId,
        patch: RecordPatch,
    ) -> Result<Option<CustodyRecord>, StoreError> {
        // Patches only ever set fields, never clear them, so COALESCE
        // applies the whole patch atomically in one statement.
        let row = sqlx::query_as::<_, VibeRow>(
            "UPDATE vibes SET
                 asset_address    = COALESCE($2, asset_address),
                 metadata_pointer = COALESCE($3, metadata_pointer),
                 image_pointer    = COALESCE($4, image_pointer),
                 status           = COALESCE($5, status),
                 claimer_address  = COALESCE($6, claimer_address),
                 claimed_at       = COALESCE($7, claimed_at)
             WHERE id = $1
             RETURNING id, recipient_handle, sender_address, masked_sender,
                 asset_address, metadata_pointer, image_pointer, status,
                 claimer_address, claimed_at, sequence_number, created_at",
        )
        .bind(id.as_str())
        .bind(&patch.asset_address)
        .bind(&patch.metadata_pointer)
        .bind(&patch.image_pointer)
        .bind(patch.status.map(|s| s.to_string()))
        .bind(&patch.claimer_address)
        .bind(patch.claimed_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(VibeRow::into_record).transpose()
    }

    async fn delete(&self, id: &VibeId) -> Result<(), StoreError> {
        // Deleting an absent record is fine; callers use this to roll back
        // reservations that may or may not have landed.
        sqlx::query("DELETE FROM vibes WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn next_sequence_number(&self) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM vibes")
            .fetch_one(&self.pool)
            .await
            .map_err(backend)?;
        Ok(count + 1)
    }

    async fn find_live_by_handle(
        &self,
        handle: &Handle,
    ) -> Result<Option<CustodyRecord>, StoreError> {
        // Oldest match first, mirroring the in-memory store.
        let row = sqlx::query_as::<_, VibeRow>(
            "SELECT id, recipient_handle, sender_address, masked_sender,
             asset_address, metadata_pointer, image_pointer, status,
             claimer_address, claimed_at, sequence_number, created_at
             FROM vibes
             WHERE status = 'pending' AND LOWER(recipient_handle) = LOWER($1)
             ORDER BY created_at ASC
             LIMIT 1",
        )
        .bind(handle.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(VibeRow::into_record).transpose()
    }

    async fn find_claimed_by_handle(
        &self,
        handle: &Handle,
    ) -> Result<Option<CustodyRecord>, StoreError> {
        let row = sqlx::query_as::<_, VibeRow>(
            "SELECT id, recipient_handle, sender_address, masked_sender,
             asset_address, metadata_pointer, image_pointer, status,
             claimer_address, claimed_at, sequence_number, created_at
             FROM vibes
             WHERE status = 'claimed' AND LOWER(recipient_handle) = LOWER($1)
             ORDER BY created_at ASC
             LIMIT 1",
        )
        .bind(handle.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(VibeRow::into_record).transpose()
    }

    async fn list(&self) -> Result<Vec<CustodyRecord>, StoreError> {
        let rows = sqlx::query_as::<_, VibeRow>(
            "SELECT id, recipient_handle, sender_address, masked_sender,
             asset_address, metadata_pointer, image_pointer, status,
             claimer_address, claimed_at, sequence_number, created_at
             FROM vibes ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.into_iter().map(VibeRow::into_record).collect()
    }
}

/// Row shape of the `vibes` table.
#[derive(sqlx::FromRow)]
struct VibeRow {
    id: String,
    recipient_handle: String,
    sender_address: String,
    masked_sender: String,
    asset_address: Option<String>,
    metadata_pointer: Option<String>,
    image_pointer: Option<String>,
    status: String,
    claimer_address: Option<String>,
    claimed_at: Option<DateTime<Utc>>,
    sequence_number: Option<i64>,
    created_at: DateTime<Utc>,
}

impl VibeRow {
    fn into_record(self) -> Result<CustodyRecord, StoreError> {
        // A stored id that no longer parses cannot even name itself in a
        // Corrupt error, so it surfaces as a backend fault.
        let id = VibeId::parse(&self.id).map_err(|err| StoreError::Backend {
            detail: format!("stored id {:?} is not a vibe id: {err}", self.id),
        })?;
        let recipient_handle =
            Handle::parse(&self.recipient_handle).map_err(|err| StoreError::Corrupt {
                id: id.clone(),
                detail: format!("stored recipient handle does not parse: {err}"),
            })?;
        let status = match self.status.as_str() {
            "pending" => ClaimStatus::Pending,
            "claimed" => ClaimStatus::Claimed,
            other => {
                return Err(StoreError::Corrupt {
                    id,
                    detail: format!("unknown status {other:?}"),
                })
            }
        };

        Ok(CustodyRecord {
            id,
            recipient_handle,
            sender_address: self.sender_address,
            masked_sender: self.masked_sender,
            asset_address: self.asset_address,
            metadata_pointer: self.metadata_pointer,
            image_pointer: self.image_pointer,
            status,
            claimer_address: self.claimer_address,
            claimed_at: self.claimed_at,
            sequence_number: self.sequence_number,
            created_at: self.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> VibeRow {
        VibeRow {
            id: "abcd2345".to_string(),
            recipient_handle: "alice".to_string(),
            sender_address: "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin".to_string(),
            masked_sender: "9xQ…Fin".to_string(),
            asset_address: None,
            metadata_pointer: None,
            image_pointer: None,
            status: "pending".to_string(),
            claimer_address: None,
            claimed_at: None,
            sequence_number: Some(1),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_row_maps_to_record() {
        let record = sample_row().into_record().unwrap();
        assert_eq!(record.id.as_str(), "abcd2345");
        assert_eq!(record.recipient_handle.as_str(), "alice");
        assert_eq!(record.status, ClaimStatus::Pending);
        assert_eq!(record.sequence_number, Some(1));
    }

    #[test]
    fn test_claimed_row_maps_to_claimed_status() {
        let mut row = sample_row();
        row.status = "claimed".to_string();
        row.claimer_address = Some("So11111111111111111111111111111111111111112".to_string());
        row.claimed_at = Some(Utc::now());

        let record = row.into_record().unwrap();
        assert_eq!(record.status, ClaimStatus::Claimed);
        assert!(record.is_claimed());
    }

    #[test]
    fn test_unknown_status_is_corrupt() {
        let mut row = sample_row();
        row.status = "vanished".to_string();

        match sample_err(row) {
            StoreError::Corrupt { id, detail } => {
                assert_eq!(id.as_str(), "abcd2345");
                assert!(detail.contains("vanished"), "got: {detail}");
            }
            other => panic!("expected Corrupt, got: {other:?}"),
        }
    }

    #[test]
    fn test_bad_handle_is_corrupt() {
        let mut row = sample_row();
        row.recipient_handle = "not a handle".to_string();

        match sample_err(row) {
            StoreError::Corrupt { id, .. } => assert_eq!(id.as_str(), "abcd2345"),
            other => panic!("expected Corrupt, got: {other:?}"),
        }
    }

    #[test]
    fn test_bad_id_is_backend_fault() {
        let mut row = sample_row();
        row.id = "NOT-AN-ID".to_string();

        match sample_err(row) {
            StoreError::Backend { detail } => {
                assert!(detail.contains("NOT-AN-ID"), "got: {detail}")
            }
            other => panic!("expected Backend, got: {other:?}"),
        }
    }

    fn sample_err(row: VibeRow) -> StoreError {
        row.into_record().unwrap_err()
    }
}
