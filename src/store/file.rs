//! JSON file backed health store used by the CLI.
//!
//! All records live in a single pretty-printed JSON array. Consent is read
//! from configuration when the store is opened.

use crate::record::{HeartRateRecord, TimeRange};
use crate::store::{
    check_record, select_in_range, HealthStore, Permission, PermissionSet, StoreError,
};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use uuid::Uuid;

/// File name used inside the data directory.
pub const RECORDS_FILE: &str = "heart_rate_records.json";

/// Health store persisting records to a JSON file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    permissions: PermissionSet,
    /// Serializes read-modify-write cycles on the file
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open a store at `path` with the given consent.
    ///
    /// The file is created lazily on the first insert.
    pub fn new(path: impl Into<PathBuf>, permissions: PermissionSet) -> Self {
        Self {
            path: path.into(),
            permissions,
            write_lock: Mutex::new(()),
        }
    }

    /// Open the records file inside a data directory.
    pub fn in_dir(data_dir: &Path, permissions: PermissionSet) -> Self {
        Self::new(data_dir.join(RECORDS_FILE), permissions)
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Total number of stored records, regardless of consent.
    pub async fn record_count(&self) -> Result<usize, StoreError> {
        Ok(self.load_all().await?.len())
    }

    async fn load_all(&self) -> Result<Vec<HeartRateRecord>, StoreError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::Io(e.to_string())),
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&content).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    async fn save_all(&self, records: &[HeartRateRecord]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Io(e.to_string()))?;
        }

        let json = serde_json::to_string_pretty(records)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        // Write to a sibling file first so a failed write leaves the old data intact.
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))
    }
}

#[async_trait::async_trait]
impl HealthStore for JsonFileStore {
    async fn granted_permissions(&self) -> Result<PermissionSet, StoreError> {
        Ok(self.permissions)
    }

    async fn read_records(&self, range: TimeRange) -> Result<Vec<HeartRateRecord>, StoreError> {
        self.permissions.require(Permission::Read)?;

        let records = self.load_all().await?;
        let selected = select_in_range(&records, &range);
        tracing::debug!(
            path = %self.path.display(),
            total = records.len(),
            selected = selected.len(),
            "read heart rate records"
        );
        Ok(selected)
    }

    async fn insert_records(
        &self,
        records: Vec<HeartRateRecord>,
    ) -> Result<Vec<Uuid>, StoreError> {
        self.permissions.require(Permission::Write)?;
        for record in &records {
            check_record(record)?;
        }

        let _guard = self.write_lock.lock().await;
        let mut stored = self.load_all().await?;
        let ids: Vec<Uuid> = records.iter().map(|r| r.metadata.id).collect();
        stored.extend(records);
        self.save_all(&stored).await?;

        tracing::debug!(
            path = %self.path.display(),
            inserted = ids.len(),
            "wrote heart rate records"
        );
        Ok(ids)
    }
}
