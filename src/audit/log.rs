//! Access log for health store traffic.
//!
//! Counts how often heart rate data was read and written so the user can
//! see what the application did with their consent. Only counters are kept,
//! never the readings themselves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// File name used inside the data directory.
pub const ACCESS_LOG_FILE: &str = "access_log.json";

/// Access statistics for the current session.
#[derive(Debug)]
pub struct AccessLog {
    /// Completed load requests
    loads: AtomicU64,
    /// Completed save requests
    saves: AtomicU64,
    /// Samples returned by loads
    samples_read: AtomicU64,
    /// Samples written by saves
    samples_written: AtomicU64,
    /// Store calls that failed
    failures: AtomicU64,
    /// Session start time
    session_start: DateTime<Utc>,
    /// Path for persisting stats
    persist_path: Option<PathBuf>,
}

impl AccessLog {
    /// Create a new access log.
    pub fn new() -> Self {
        Self {
            loads: AtomicU64::new(0),
            saves: AtomicU64::new(0),
            samples_read: AtomicU64::new(0),
            samples_written: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create an access log that continues from counters saved at `path`.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);

        if let Err(e) = log.load() {
            tracing::warn!("Could not load previous access log: {e}");
        }

        log
    }

    /// Record a completed load returning `samples` samples.
    pub fn record_load(&self, samples: usize) {
        self.loads.fetch_add(1, Ordering::Relaxed);
        self.samples_read.fetch_add(samples as u64, Ordering::Relaxed);
    }

    /// Record a confirmed save of `samples` samples.
    pub fn record_save(&self, samples: usize) {
        self.saves.fetch_add(1, Ordering::Relaxed);
        self.samples_written.fetch_add(samples as u64, Ordering::Relaxed);
    }

    /// Record a failed store call.
    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn stats(&self) -> AccessStats {
        AccessStats {
            loads: self.loads.load(Ordering::Relaxed),
            saves: self.saves.load(Ordering::Relaxed),
            samples_read: self.samples_read.load(Ordering::Relaxed),
            samples_written: self.samples_written.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Access Statistics:\n\
             - Loads: {}\n\
             - Saves: {}\n\
             - Samples read: {}\n\
             - Samples written: {}\n\
             - Failed store calls: {}\n\
             - Session started: {}\n\
             - Session duration: {} seconds",
            stats.loads,
            stats.saves,
            stats.samples_read,
            stats.samples_written,
            stats.failures,
            stats.session_start.format("%Y-%m-%d %H:%M:%S UTC"),
            stats.session_duration_secs
        )
    }

    /// Save stats to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedStats {
                loads: stats.loads,
                saves: stats.saves,
                samples_read: stats.samples_read,
                samples_written: stats.samples_written,
                failures: stats.failures,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;
            std::fs::write(path, json)?;
        }
        Ok(())
    }

    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedStats =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;

                self.loads.store(persisted.loads, Ordering::Relaxed);
                self.saves.store(persisted.saves, Ordering::Relaxed);
                self.samples_read
                    .store(persisted.samples_read, Ordering::Relaxed);
                self.samples_written
                    .store(persisted.samples_written, Ordering::Relaxed);
                self.failures.store(persisted.failures, Ordering::Relaxed);
            }
        }
        Ok(())
    }
}

impl Default for AccessLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of access statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessStats {
    pub loads: u64,
    pub saves: u64,
    pub samples_read: u64,
    pub samples_written: u64,
    pub failures: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Stats format for persistence.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedStats {
    loads: u64,
    saves: u64,
    samples_read: u64,
    samples_written: u64,
    failures: u64,
    last_updated: DateTime<Utc>,
}

/// Thread-safe shared access log.
pub type SharedAccessLog = Arc<AccessLog>;

/// Create a new shared access log.
pub fn create_shared_log() -> SharedAccessLog {
    Arc::new(AccessLog::new())
}

/// Create a new shared access log with persistence.
pub fn create_shared_log_with_persistence(path: PathBuf) -> SharedAccessLog {
    Arc::new(AccessLog::with_persistence(path))
}
