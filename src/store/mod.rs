//! Health data store abstraction.
//!
//! The sync controller only talks to a [`HealthStore`]. Reads and writes are
//! gated by separately granted permissions, mirroring platform health APIs.

pub mod file;
pub mod memory;

use crate::record::{HeartRateRecord, TimeRange};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use file::JsonFileStore;
pub use memory::InMemoryStore;

/// A permission the user has to grant before store calls succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Read heart rate records
    Read,
    /// Write heart rate records
    Write,
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Permission::Read => write!(f, "read heart rate"),
            Permission::Write => write!(f, "write heart rate"),
        }
    }
}

/// Which permissions are currently granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PermissionSet {
    pub read: bool,
    pub write: bool,
}

impl PermissionSet {
    /// Both read and write granted.
    pub fn all() -> Self {
        Self {
            read: true,
            write: true,
        }
    }

    /// Check whether a single permission is granted.
    pub fn allows(&self, permission: Permission) -> bool {
        match permission {
            Permission::Read => self.read,
            Permission::Write => self.write,
        }
    }

    /// Permissions still missing, in read/write order.
    pub fn missing(&self) -> Vec<Permission> {
        [Permission::Read, Permission::Write]
            .into_iter()
            .filter(|p| !self.allows(*p))
            .collect()
    }

    /// Fail with `PermissionDenied` unless `permission` is granted.
    pub fn require(&self, permission: Permission) -> Result<(), StoreError> {
        if self.allows(permission) {
            Ok(())
        } else {
            Err(StoreError::PermissionDenied(permission))
        }
    }
}

/// Errors returned by a health store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The user has not granted the required permission
    PermissionDenied(Permission),
    /// Reading or writing the backing storage failed
    Io(String),
    /// The store cannot be reached
    Unavailable(String),
    /// Stored data could not be encoded or decoded
    Serialization(String),
    /// A record violates the store's constraints
    InvalidRecord(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::PermissionDenied(p) => write!(f, "Permission denied: {p}"),
            StoreError::Io(e) => write!(f, "Store IO error: {e}"),
            StoreError::Unavailable(e) => write!(f, "Store unavailable: {e}"),
            StoreError::Serialization(e) => write!(f, "Store serialization error: {e}"),
            StoreError::InvalidRecord(e) => write!(f, "Invalid record: {e}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// A consent-gated store of heart rate records.
#[async_trait::async_trait]
pub trait HealthStore: Send + Sync {
    /// Permissions the user has granted to this application.
    async fn granted_permissions(&self) -> Result<PermissionSet, StoreError>;

    /// Read every record whose interval overlaps `range`.
    async fn read_records(&self, range: TimeRange) -> Result<Vec<HeartRateRecord>, StoreError>;

    /// Insert records, returning their ids once the write is confirmed.
    async fn insert_records(&self, records: Vec<HeartRateRecord>)
        -> Result<Vec<Uuid>, StoreError>;
}

/// Check the constraints every stored record must satisfy.
pub(crate) fn check_record(record: &HeartRateRecord) -> Result<(), StoreError> {
    if record.end_time < record.start_time {
        return Err(StoreError::InvalidRecord(format!(
            "record {} ends before it starts",
            record.metadata.id
        )));
    }
    if record.samples.is_empty() {
        return Err(StoreError::InvalidRecord(format!(
            "record {} has no samples",
            record.metadata.id
        )));
    }
    Ok(())
}

/// Records from `records` that overlap `range`.
pub(crate) fn select_in_range(
    records: &[HeartRateRecord],
    range: &TimeRange,
) -> Vec<HeartRateRecord> {
    records
        .iter()
        .filter(|r| r.overlaps(range))
        .cloned()
        .collect()
}
