//! In-process health store.
//!
//! Useful for demos and tests: permissions can be toggled at runtime and
//! failures injected for the next read or insert.

use crate::record::{HeartRateRecord, TimeRange};
use crate::store::{
    check_record, select_in_range, HealthStore, Permission, PermissionSet, StoreError,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Health store that keeps records in memory.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: RwLock<Vec<HeartRateRecord>>,
    permissions: Mutex<PermissionSet>,
    next_read_error: Mutex<Option<StoreError>>,
    next_insert_error: Mutex<Option<StoreError>>,
    read_calls: AtomicU64,
    insert_calls: AtomicU64,
}

impl InMemoryStore {
    /// Create an empty store with read and write granted.
    pub fn new() -> Self {
        Self::with_permissions(PermissionSet::all())
    }

    /// Create an empty store with the given permissions.
    pub fn with_permissions(permissions: PermissionSet) -> Self {
        Self {
            permissions: Mutex::new(permissions),
            ..Self::default()
        }
    }

    /// Replace the granted permissions.
    pub fn set_permissions(&self, permissions: PermissionSet) {
        *lock(&self.permissions) = permissions;
    }

    /// Make the next `read_records` call fail with `error`.
    pub fn fail_next_read(&self, error: StoreError) {
        *lock(&self.next_read_error) = Some(error);
    }

    /// Make the next `insert_records` call fail with `error`.
    pub fn fail_next_insert(&self, error: StoreError) {
        *lock(&self.next_insert_error) = Some(error);
    }

    /// Number of `read_records` calls made so far.
    pub fn read_calls(&self) -> u64 {
        self.read_calls.load(Ordering::Relaxed)
    }

    /// Number of `insert_records` calls made so far.
    pub fn insert_calls(&self) -> u64 {
        self.insert_calls.load(Ordering::Relaxed)
    }

    /// Copy of every stored record.
    pub async fn records(&self) -> Vec<HeartRateRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait::async_trait]
impl HealthStore for InMemoryStore {
    async fn granted_permissions(&self) -> Result<PermissionSet, StoreError> {
        Ok(*lock(&self.permissions))
    }

    async fn read_records(&self, range: TimeRange) -> Result<Vec<HeartRateRecord>, StoreError> {
        self.read_calls.fetch_add(1, Ordering::Relaxed);
        lock(&self.permissions).require(Permission::Read)?;
        let injected = lock(&self.next_read_error).take();
        if let Some(err) = injected {
            return Err(err);
        }

        let records = self.records.read().await;
        Ok(select_in_range(&records, &range))
    }

    async fn insert_records(
        &self,
        records: Vec<HeartRateRecord>,
    ) -> Result<Vec<Uuid>, StoreError> {
        self.insert_calls.fetch_add(1, Ordering::Relaxed);
        lock(&self.permissions).require(Permission::Write)?;
        let injected = lock(&self.next_insert_error).take();
        if let Some(err) = injected {
            return Err(err);
        }
        for record in &records {
            check_record(record)?;
        }

        let ids = records.iter().map(|r| r.metadata.id).collect();
        self.records.write().await.extend(records);
        Ok(ids)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::HeartRateSample;
    use chrono::{Duration, TimeZone, Utc};

    fn record_at(hour: u32, bpm: u32) -> HeartRateRecord {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap();
        HeartRateRecord::instantaneous(HeartRateSample::new(ts.fixed_offset(), bpm))
    }

    fn whole_day() -> TimeRange {
        TimeRange::between(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_insert_then_read() {
        let store = InMemoryStore::new();
        let record = record_at(8, 65);
        let ids = store.insert_records(vec![record.clone()]).await.unwrap();

        assert_eq!(ids, vec![record.metadata.id]);
        assert_eq!(store.read_records(whole_day()).await.unwrap(), vec![record]);
        assert_eq!(store.insert_calls(), 1);
        assert_eq!(store.read_calls(), 1);
    }

    #[tokio::test]
    async fn test_read_filters_by_range() {
        let store = InMemoryStore::new();
        store
            .insert_records(vec![record_at(8, 65), record_at(20, 90)])
            .await
            .unwrap();

        let morning = TimeRange::between(
            Utc.with_ymd_and_hms(2024, 1, 1, 7, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
        );
        let found = store.read_records(morning).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].samples[0].beats_per_minute, 65);
    }

    #[tokio::test]
    async fn test_permissions_enforced() {
        let store = InMemoryStore::with_permissions(PermissionSet {
            read: false,
            write: true,
        });

        assert_eq!(
            store.read_records(whole_day()).await,
            Err(StoreError::PermissionDenied(Permission::Read))
        );

        store.set_permissions(PermissionSet {
            read: true,
            write: false,
        });
        assert_eq!(
            store.insert_records(vec![record_at(8, 65)]).await,
            Err(StoreError::PermissionDenied(Permission::Write))
        );
        assert!(store.records().await.is_empty());
    }

    #[tokio::test]
    async fn test_injected_failure_is_one_shot() {
        let store = InMemoryStore::new();
        store.fail_next_read(StoreError::Unavailable("offline".to_string()));

        assert!(store.read_records(whole_day()).await.is_err());
        assert!(store.read_records(whole_day()).await.is_ok());
    }

    #[tokio::test]
    async fn test_rejects_inverted_record() {
        let store = InMemoryStore::new();
        let mut record = record_at(8, 65);
        record.end_time = record.start_time - Duration::milliseconds(1);

        assert!(matches!(
            store.insert_records(vec![record]).await,
            Err(StoreError::InvalidRecord(_))
        ));
    }
}
